//! EPSG code parsing and dispatch to the inverse projections.

use thiserror::Error;

use crate::mercator::WebMercator;
use crate::transverse_mercator::TransverseMercator;

/// Errors raised while resolving a request CRS.
#[derive(Debug, Error, PartialEq)]
pub enum ProjectionError {
    /// The string is not of the form `EPSG:<code>` or a bare code.
    #[error("Invalid CRS identifier: {0}")]
    InvalidIdentifier(String),

    /// The code parsed but no inverse is implemented for it.
    #[error("Unsupported CRS: EPSG:{0}")]
    Unsupported(u32),
}

/// A coordinate reference system accepted on requests.
#[derive(Debug, Clone, Default)]
pub enum Crs {
    /// Geographic WGS84, axis order lon/lat.
    #[default]
    Wgs84,
    /// EPSG:3857.
    WebMercator(WebMercator),
    /// UTM zone (WGS84 326xx/327xx or ETRS89 258xx).
    Utm { epsg: u32, projection: TransverseMercator },
}

impl Crs {
    /// Resolve `EPSG:25833`, `epsg:4326` or a bare `32632`.
    pub fn parse(identifier: &str) -> Result<Self, ProjectionError> {
        let trimmed = identifier.trim();
        let code_str = match trimmed.split_once(':') {
            Some((authority, code)) if authority.eq_ignore_ascii_case("EPSG") => code,
            Some(_) => return Err(ProjectionError::InvalidIdentifier(trimmed.to_string())),
            None => trimmed,
        };
        let code: u32 = code_str
            .trim()
            .parse()
            .map_err(|_| ProjectionError::InvalidIdentifier(trimmed.to_string()))?;
        Self::from_epsg(code)
    }

    /// Build the CRS for a numeric EPSG code.
    pub fn from_epsg(code: u32) -> Result<Self, ProjectionError> {
        match code {
            4326 => Ok(Crs::Wgs84),
            3857 => Ok(Crs::WebMercator(WebMercator::default())),
            32601..=32660 => Ok(Crs::Utm {
                epsg: code,
                projection: TransverseMercator::utm(code - 32600, false, TransverseMercator::WGS84_INV_F),
            }),
            32701..=32760 => Ok(Crs::Utm {
                epsg: code,
                projection: TransverseMercator::utm(code - 32700, true, TransverseMercator::WGS84_INV_F),
            }),
            25828..=25838 => Ok(Crs::Utm {
                epsg: code,
                projection: TransverseMercator::utm(code - 25800, false, TransverseMercator::GRS80_INV_F),
            }),
            other => Err(ProjectionError::Unsupported(other)),
        }
    }

    /// EPSG code of this CRS.
    pub fn epsg(&self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::WebMercator(_) => 3857,
            Crs::Utm { epsg, .. } => *epsg,
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, Crs::Wgs84)
    }

    /// Convert an (x, y) pair in this CRS to (lon, lat) in WGS84 degrees.
    pub fn to_wgs84(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Crs::Wgs84 => (x, y),
            Crs::WebMercator(merc) => merc.inverse(x, y),
            Crs::Utm { projection, .. } => projection.inverse(x, y),
        }
    }
}
