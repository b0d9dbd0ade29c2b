//! Half-hour to hourly conversion.

/// Outcome of converting one cell's half-hour samples.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyValues {
    pub values: Vec<f64>,
    /// Samples replaced by the fill value.
    pub missing: usize,
}

/// Options controlling missing-value handling and rounding.
#[derive(Debug, Clone, Copy)]
pub struct HourlyOptions {
    pub fill_value: f64,
    pub sentinel_threshold: f64,
    pub round_decimals: u32,
}

impl Default for HourlyOptions {
    fn default() -> Self {
        Self {
            fill_value: -1.0,
            sentinel_threshold: -9999.0,
            round_decimals: 5,
        }
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Sum consecutive half-hour samples into hourly values.
///
/// Samples at or below the sentinel threshold, and NaN, are missing and take
/// `fill_value` before rounding. The default fill of -1 means a missing half
/// hour pulls the hourly sum down by one; callers that want gaps flagged can
/// watch the `missing` count. An odd trailing sample forms its own value.
pub fn half_hour_to_hourly(raw: &[f32], options: &HourlyOptions) -> HourlyValues {
    let mut missing = 0;
    let cleaned: Vec<f64> = raw
        .iter()
        .map(|&v| {
            let v = v as f64;
            if v.is_nan() || v <= options.sentinel_threshold {
                missing += 1;
                options.fill_value
            } else {
                v
            }
        })
        .map(|v| round_to(v, options.round_decimals))
        .collect();

    let values = cleaned.chunks(2).map(|pair| pair.iter().sum()).collect();
    HourlyValues { values, missing }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_filled_then_summed() {
        let out = half_hour_to_hourly(&[1.0, 2.0, -9999.0, 4.0], &HourlyOptions::default());
        assert_eq!(out.values, vec![3.0, 3.0]);
        assert_eq!(out.missing, 1);
    }

    #[test]
    fn test_archive_sentinel_and_nan() {
        let out = half_hour_to_hourly(&[-9999.9, f32::NAN], &HourlyOptions::default());
        assert_eq!(out.values, vec![-2.0]);
        assert_eq!(out.missing, 2);
    }

    #[test]
    fn test_configurable_fill() {
        let options = HourlyOptions {
            fill_value: 0.0,
            ..Default::default()
        };
        let out = half_hour_to_hourly(&[-9999.0, 4.0], &options);
        assert_eq!(out.values, vec![4.0]);
    }

    #[test]
    fn test_rounding_strips_f32_noise() {
        let out = half_hour_to_hourly(&[0.1, 0.2], &HourlyOptions::default());
        // 0.1f32 widens to 0.10000000149; rounding brings it back.
        assert!((out.values[0] - 0.3).abs() < 1e-12);
        assert_eq!(out.missing, 0);
    }

    #[test]
    fn test_output_length_is_half() {
        let raw = vec![0.5f32; 48];
        let out = half_hour_to_hourly(&raw, &HourlyOptions::default());
        assert_eq!(out.values.len(), 24);
        assert!(out.values.iter().all(|&v| v == 1.0));
    }
}
