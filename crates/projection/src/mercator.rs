//! Spherical (Web) Mercator, EPSG:3857.

use std::f64::consts::PI;

/// Spherical Mercator on the WGS84 semi-major axis.
#[derive(Debug, Clone, Copy)]
pub struct WebMercator {
    /// Sphere radius (meters)
    pub radius: f64,
}

impl Default for WebMercator {
    fn default() -> Self {
        Self { radius: 6378137.0 }
    }
}

impl WebMercator {
    /// Convert projected metres to (lon, lat) in degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let to_deg = 180.0 / PI;
        let lon = x / self.radius * to_deg;
        let lat = (2.0 * (y / self.radius).exp().atan() - PI / 2.0) * to_deg;
        (lon, lat)
    }

    /// Convert (lon, lat) in degrees to projected metres.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let to_rad = PI / 180.0;
        let x = self.radius * lon_deg * to_rad;
        let y = self.radius * (PI / 4.0 + lat_deg * to_rad / 2.0).tan().ln();
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        let (lon, lat) = WebMercator::default().inverse(0.0, 0.0);
        assert!(lon.abs() < 1e-12);
        assert!(lat.abs() < 1e-12);
    }

    #[test]
    fn test_antimeridian() {
        let (lon, _) = WebMercator::default().inverse(20037508.342789244, 0.0);
        assert!((lon - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_oslo() {
        let merc = WebMercator::default();
        let (x, y) = merc.forward(10.75, 59.91);
        let (lon, lat) = merc.inverse(x, y);
        assert!((lon - 10.75).abs() < 1e-9);
        assert!((lat - 59.91).abs() < 1e-9);
    }
}
