//! The completeness filter.
//!
//! A station is only usable when it reported every hour of the requested
//! range. Partial series are dropped rather than gap-filled.

use std::collections::HashMap;

use tracing::debug;

use crate::station::Station;

/// Keep the candidates whose observation series has exactly `expected_len`
/// entries, attaching that series. Candidate order is preserved, so a
/// distance-ordered input stays distance-ordered.
pub fn retain_complete(
    candidates: Vec<Station>,
    observations: &HashMap<String, Vec<(i64, f64)>>,
    expected_len: usize,
) -> Vec<Station> {
    candidates
        .into_iter()
        .filter_map(|mut station| {
            let series = observations.get(&station.id)?;
            if series.len() != expected_len {
                debug!(
                    station = %station.id,
                    observed = series.len(),
                    expected = expected_len,
                    "Dropping incomplete station"
                );
                return None;
            }
            station.observations = series.clone();
            Some(station)
        })
        .collect()
}
