//! Transverse Mercator on an ellipsoid, as used by the UTM zones.
//!
//! The inverse series follows Snyder, "Map Projections: A Working Manual"
//! (USGS PP 1395), eqs. 8-18 to 8-25. Accuracy is well below a metre inside
//! a zone, which is far finer than the 0.1° precipitation grid.

use std::f64::consts::PI;

/// Ellipsoid and zone parameters for a Transverse Mercator projection.
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    /// Semi-major axis (meters)
    pub a: f64,
    /// First eccentricity squared
    pub e2: f64,
    /// Central meridian in degrees
    pub lon0: f64,
    /// Scale factor on the central meridian
    pub k0: f64,
    /// False easting (meters)
    pub false_easting: f64,
    /// False northing (meters)
    pub false_northing: f64,
}

impl TransverseMercator {
    /// WGS84 semi-major axis.
    pub const WGS84_A: f64 = 6378137.0;
    /// WGS84 inverse flattening.
    pub const WGS84_INV_F: f64 = 298.257223563;
    /// GRS80 inverse flattening (ETRS89 zones).
    pub const GRS80_INV_F: f64 = 298.257222101;

    /// Create a UTM zone projection.
    ///
    /// # Arguments
    /// * `zone` - UTM zone number, 1..=60
    /// * `south` - true for the southern hemisphere false northing
    /// * `inv_f` - inverse flattening of the ellipsoid
    pub fn utm(zone: u32, south: bool, inv_f: f64) -> Self {
        let f = 1.0 / inv_f;
        Self {
            a: Self::WGS84_A,
            e2: f * (2.0 - f),
            lon0: (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0,
            k0: 0.9996,
            false_easting: 500000.0,
            false_northing: if south { 10000000.0 } else { 0.0 },
        }
    }

    /// Convert easting/northing to (lon, lat) in degrees.
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let to_deg = 180.0 / PI;
        let e2 = self.e2;
        let ep2 = e2 / (1.0 - e2);
        let x = easting - self.false_easting;
        let y = northing - self.false_northing;

        // Footpoint latitude
        let m = y / self.k0;
        let mu = m / (self.a * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2.powi(3) / 256.0));
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let sin1 = phi1.sin();
        let cos1 = phi1.cos();
        let tan1 = phi1.tan();
        let n1 = self.a / (1.0 - e2 * sin1 * sin1).sqrt();
        let t1 = tan1 * tan1;
        let c1 = ep2 * cos1 * cos1;
        let r1 = self.a * (1.0 - e2) / (1.0 - e2 * sin1 * sin1).powf(1.5);
        let d = x / (n1 * self.k0);

        let lat = phi1
            - (n1 * tan1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let lon = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / cos1;

        (self.lon0 + lon * to_deg, lat * to_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_central_meridian_equator() {
        let tm = TransverseMercator::utm(32, false, TransverseMercator::WGS84_INV_F);
        let (lon, lat) = tm.inverse(500000.0, 0.0);
        assert!((lon - 9.0).abs() < 1e-9);
        assert!(lat.abs() < 1e-9);
    }

    #[test]
    fn test_central_meridian_keeps_longitude() {
        let tm = TransverseMercator::utm(33, false, TransverseMercator::GRS80_INV_F);
        let (lon, lat) = tm.inverse(500000.0, 6650000.0);
        assert!((lon - 15.0).abs() < 1e-9);
        // 6650 km of meridian arc is just under 60°N
        assert!(lat > 59.9 && lat < 60.0, "lat = {}", lat);
    }

    #[test]
    fn test_oslo_zone_32() {
        // Oslo sentrum in EPSG:32632
        let tm = TransverseMercator::utm(32, false, TransverseMercator::WGS84_INV_F);
        let (lon, lat) = tm.inverse(597_000.0, 6_643_000.0);
        assert!((lon - 10.74).abs() < 0.05, "lon = {}", lon);
        assert!((lat - 59.91).abs() < 0.05, "lat = {}", lat);
    }

    #[test]
    fn test_southern_hemisphere() {
        let tm = TransverseMercator::utm(23, true, TransverseMercator::WGS84_INV_F);
        let (lon, lat) = tm.inverse(500000.0, 10000000.0);
        assert!((lon + 45.0).abs() < 1e-9);
        assert!(lat.abs() < 1e-9);
    }
}
