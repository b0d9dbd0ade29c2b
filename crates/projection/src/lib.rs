//! Coordinate reference system transformations.
//!
//! Request geometries may arrive in a projected CRS. Everything downstream
//! (cell lookup, station discovery, forecasts) works in WGS84 degrees, so this
//! crate only implements the inverse direction for the handful of CRSs the
//! service accepts.

pub mod crs;
pub mod mercator;
pub mod transverse_mercator;

pub use crs::{Crs, ProjectionError};
pub use mercator::WebMercator;
pub use transverse_mercator::TransverseMercator;
