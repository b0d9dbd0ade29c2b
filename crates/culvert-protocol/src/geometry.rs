//! WKT query geometry parsing.
//!
//! Requests carry a `POINT`, `POLYGON` or `MULTIPOLYGON` in the CRS named by
//! the `crs` parameter. Coordinates are parsed first, reprojected to WGS84
//! and only then checked against the geographic ranges, so projected inputs
//! such as UTM eastings pass through.

use geo::{Area, Centroid, Coord, LineString, MultiPolygon, Polygon};
use projection::{Crs, ProjectionError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Errors that can occur when parsing a geometry.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    /// Invalid WKT format.
    #[error("Invalid WKT format: {0}")]
    InvalidWkt(String),

    /// A coordinate did not parse as a number.
    #[error("Invalid coordinate value: {0}")]
    InvalidCoordinate(String),

    /// Coordinate out of the WGS84 range after reprojection.
    #[error("Coordinate out of range: {0}")]
    OutOfRange(String),

    /// The request CRS could not be resolved.
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

/// Bounding box in WGS84 degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.west <= other.east
            && self.east >= other.west
            && self.south <= other.north
            && self.north >= other.south
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.west && lon <= self.east && lat >= self.south && lat <= self.north
    }
}

/// A request geometry in WGS84 degrees, axis order (lon, lat).
#[derive(Debug, Clone, PartialEq)]
pub enum QueryGeometry {
    Point { lon: f64, lat: f64 },
    /// One exterior ring per polygon; a plain `POLYGON` has exactly one.
    Area { polygons: Vec<Vec<(f64, f64)>> },
}

impl QueryGeometry {
    /// Parse any supported WKT geometry.
    pub fn parse(wkt: &str, crs: &Crs) -> Result<Self, GeometryError> {
        let upper = wkt.trim().to_uppercase();
        if upper.starts_with("POINT") {
            Self::parse_point(wkt, crs)
        } else if upper.starts_with("POLYGON") || upper.starts_with("MULTIPOLYGON") {
            Self::parse_area(wkt, crs)
        } else {
            Err(GeometryError::InvalidWkt(
                "Expected POINT, POLYGON or MULTIPOLYGON".to_string(),
            ))
        }
    }

    /// Parse a WKT POINT.
    ///
    /// Accepts `POINT(x y)`, `POINT (x y)` and the bare `x,y` form.
    pub fn parse_point(wkt: &str, crs: &Crs) -> Result<Self, GeometryError> {
        let wkt = wkt.trim();
        let (x, y) = if wkt.to_uppercase().starts_with("POINT") {
            parse_wkt_point(wkt)?
        } else if wkt.contains(',') {
            parse_simple_coords(wkt)?
        } else {
            return Err(GeometryError::InvalidWkt(
                "Expected POINT(lon lat) or lon,lat format".to_string(),
            ));
        };
        let (lon, lat) = reproject(crs, x, y)?;
        Ok(QueryGeometry::Point { lon, lat })
    }

    /// Parse a WKT POLYGON or MULTIPOLYGON. Interior rings are ignored.
    pub fn parse_area(wkt: &str, crs: &Crs) -> Result<Self, GeometryError> {
        let wkt = wkt.trim();
        let upper = wkt.to_uppercase();
        let rings = if upper.starts_with("MULTIPOLYGON") {
            parse_wkt_multipolygon(wkt)?
        } else if upper.starts_with("POLYGON") {
            vec![parse_wkt_polygon(wkt)?]
        } else {
            return Err(GeometryError::InvalidWkt(
                "Expected POLYGON or MULTIPOLYGON format".to_string(),
            ));
        };

        let polygons = rings
            .into_iter()
            .map(|ring| {
                ring.into_iter()
                    .map(|(x, y)| reproject(crs, x, y))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(QueryGeometry::Area { polygons })
    }

    pub fn is_point(&self) -> bool {
        matches!(self, QueryGeometry::Point { .. })
    }

    /// Bounding box of all coordinates.
    pub fn bbox(&self) -> BoundingBox {
        match self {
            QueryGeometry::Point { lon, lat } => BoundingBox {
                west: *lon,
                south: *lat,
                east: *lon,
                north: *lat,
            },
            QueryGeometry::Area { polygons } => {
                let mut bbox = BoundingBox {
                    west: f64::MAX,
                    south: f64::MAX,
                    east: f64::MIN,
                    north: f64::MIN,
                };
                for (lon, lat) in polygons.iter().flatten() {
                    bbox.west = bbox.west.min(*lon);
                    bbox.east = bbox.east.max(*lon);
                    bbox.south = bbox.south.min(*lat);
                    bbox.north = bbox.north.max(*lat);
                }
                bbox
            }
        }
    }

    /// The geometry as `geo` polygons. `None` for points.
    pub fn to_multi_polygon(&self) -> Option<MultiPolygon<f64>> {
        match self {
            QueryGeometry::Point { .. } => None,
            QueryGeometry::Area { polygons } => Some(MultiPolygon::new(
                polygons.iter().map(|ring| ring_to_polygon(ring)).collect(),
            )),
        }
    }

    /// Planar area in square degrees. Zero for points.
    pub fn area(&self) -> f64 {
        self.to_multi_polygon()
            .map(|mp| mp.unsigned_area())
            .unwrap_or(0.0)
    }

    /// Representative point: the point itself or the area centroid.
    ///
    /// Degenerate polygons with no area fall back to the bbox centre.
    pub fn centroid(&self) -> (f64, f64) {
        match self {
            QueryGeometry::Point { lon, lat } => (*lon, *lat),
            QueryGeometry::Area { .. } => {
                let centroid = self.to_multi_polygon().and_then(|mp| mp.centroid());
                match centroid {
                    Some(p) => (p.x(), p.y()),
                    None => {
                        let b = self.bbox();
                        ((b.west + b.east) / 2.0, (b.south + b.north) / 2.0)
                    }
                }
            }
        }
    }

    /// WKT for each point or polygon, in WGS84.
    ///
    /// Multipolygons are split because the station network only accepts
    /// single polygons as a search geometry.
    pub fn to_wkt_parts(&self) -> Vec<String> {
        match self {
            QueryGeometry::Point { lon, lat } => vec![format!("POINT({} {})", lon, lat)],
            QueryGeometry::Area { polygons } => polygons
                .iter()
                .map(|ring| {
                    let coords: Vec<String> =
                        ring.iter().map(|(lon, lat)| format!("{} {}", lon, lat)).collect();
                    format!("POLYGON(({}))", coords.join(", "))
                })
                .collect(),
        }
    }
}

/// Build a `geo` polygon from an exterior ring of (lon, lat) pairs.
pub fn ring_to_polygon(ring: &[(f64, f64)]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = ring.iter().map(|&(x, y)| Coord { x, y }).collect();
    Polygon::new(LineString::from(coords), vec![])
}

/// Great-circle distance between two WGS84 points in kilometres.
pub fn haversine_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().asin()
}

fn reproject(crs: &Crs, x: f64, y: f64) -> Result<(f64, f64), GeometryError> {
    let (lon, lat) = crs.to_wgs84(x, y);
    validate_coordinates(lon, lat)?;
    Ok((lon, lat))
}

fn validate_coordinates(lon: f64, lat: f64) -> Result<(), GeometryError> {
    if !(-180.0..=180.0).contains(&lon) {
        return Err(GeometryError::OutOfRange(format!(
            "Longitude {} is out of range [-180, 180]",
            lon
        )));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeometryError::OutOfRange(format!(
            "Latitude {} is out of range [-90, 90]",
            lat
        )));
    }
    Ok(())
}

fn parse_pair(pair: &str) -> Result<(f64, f64), GeometryError> {
    let parts: Vec<&str> = pair.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(GeometryError::InvalidWkt(format!(
            "Expected 'x y' format, got '{}'",
            pair.trim()
        )));
    }
    let x: f64 = parts[0]
        .parse()
        .map_err(|_| GeometryError::InvalidCoordinate(parts[0].to_string()))?;
    let y: f64 = parts[1]
        .parse()
        .map_err(|_| GeometryError::InvalidCoordinate(parts[1].to_string()))?;
    Ok((x, y))
}

fn parse_wkt_point(wkt: &str) -> Result<(f64, f64), GeometryError> {
    let start = wkt
        .find('(')
        .ok_or_else(|| GeometryError::InvalidWkt("Missing opening parenthesis".to_string()))?;
    let end = wkt
        .find(')')
        .ok_or_else(|| GeometryError::InvalidWkt("Missing closing parenthesis".to_string()))?;
    if end <= start {
        return Err(GeometryError::InvalidWkt("Invalid parenthesis order".to_string()));
    }
    parse_pair(&wkt[start + 1..end])
}

fn parse_simple_coords(coords: &str) -> Result<(f64, f64), GeometryError> {
    let parts: Vec<&str> = coords.split(',').collect();
    if parts.len() != 2 {
        return Err(GeometryError::InvalidWkt(format!(
            "Expected lon,lat format, got {} parts",
            parts.len()
        )));
    }
    let x: f64 = parts[0]
        .trim()
        .parse()
        .map_err(|_| GeometryError::InvalidCoordinate(parts[0].to_string()))?;
    let y: f64 = parts[1]
        .trim()
        .parse()
        .map_err(|_| GeometryError::InvalidCoordinate(parts[1].to_string()))?;
    Ok((x, y))
}

fn parse_wkt_polygon(wkt: &str) -> Result<Vec<(f64, f64)>, GeometryError> {
    let start = wkt
        .find("((")
        .ok_or_else(|| GeometryError::InvalidWkt("Missing opening parentheses".to_string()))?;
    let end = wkt
        .rfind("))")
        .ok_or_else(|| GeometryError::InvalidWkt("Missing closing parentheses".to_string()))?;
    if end <= start {
        return Err(GeometryError::InvalidWkt("Invalid parenthesis order".to_string()));
    }

    // Only the exterior ring; holes follow after "),(".
    let inner = &wkt[start + 2..end];
    let exterior = inner.split(')').next().unwrap_or(inner);
    parse_ring(exterior)
}

fn parse_ring(coords_str: &str) -> Result<Vec<(f64, f64)>, GeometryError> {
    let points = coords_str
        .split(',')
        .map(parse_pair)
        .collect::<Result<Vec<_>, _>>()?;

    if points.len() < 4 {
        return Err(GeometryError::InvalidWkt(
            "Polygon must have at least 4 points (including closing point)".to_string(),
        ));
    }
    if points.first() != points.last() {
        return Err(GeometryError::InvalidWkt("Polygon ring is not closed".to_string()));
    }
    Ok(points)
}

fn parse_wkt_multipolygon(wkt: &str) -> Result<Vec<Vec<(f64, f64)>>, GeometryError> {
    let start = wkt
        .find('(')
        .ok_or_else(|| GeometryError::InvalidWkt("Missing opening parenthesis".to_string()))?;
    let end = wkt
        .rfind(')')
        .ok_or_else(|| GeometryError::InvalidWkt("Missing closing parenthesis".to_string()))?;
    if end <= start {
        return Err(GeometryError::InvalidWkt("Invalid parenthesis order".to_string()));
    }

    // ((ring1)),((ring2)): collect the text of each depth-2 ring, first ring
    // of every polygon only.
    let mut polygons = Vec::new();
    let mut depth = 0;
    let mut ring_index = 0;
    let mut current = String::new();
    for ch in wkt[start + 1..end].chars() {
        match ch {
            '(' => {
                depth += 1;
                if depth == 1 {
                    ring_index = 0;
                }
            }
            ')' => {
                if depth == 2 {
                    if ring_index == 0 {
                        polygons.push(parse_ring(current.trim())?);
                    }
                    ring_index += 1;
                    current.clear();
                }
                depth -= 1;
            }
            _ if depth == 2 => current.push(ch),
            _ => {}
        }
    }

    if polygons.is_empty() {
        return Err(GeometryError::InvalidWkt(
            "MULTIPOLYGON must contain at least one polygon".to_string(),
        ));
    }
    Ok(polygons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Contains, Point};

    const SQUARE: &str = "POLYGON((10 60, 10.2 60, 10.2 60.2, 10 60.2, 10 60))";

    #[test]
    fn test_parse_point() {
        let g = QueryGeometry::parse("POINT(10.75 59.91)", &Crs::Wgs84).unwrap();
        assert_eq!(g, QueryGeometry::Point { lon: 10.75, lat: 59.91 });

        let g = QueryGeometry::parse("point (10.75 59.91)", &Crs::Wgs84).unwrap();
        assert!(g.is_point());

        let g = QueryGeometry::parse_point("10.75, 59.91", &Crs::Wgs84).unwrap();
        assert_eq!(g.centroid(), (10.75, 59.91));
    }

    #[test]
    fn test_parse_point_errors() {
        assert!(matches!(
            QueryGeometry::parse("POINT(10.75)", &Crs::Wgs84),
            Err(GeometryError::InvalidWkt(_))
        ));
        assert!(matches!(
            QueryGeometry::parse("POINT(east north)", &Crs::Wgs84),
            Err(GeometryError::InvalidCoordinate(_))
        ));
        assert!(matches!(
            QueryGeometry::parse("POINT(200 10)", &Crs::Wgs84),
            Err(GeometryError::OutOfRange(_))
        ));
        assert!(matches!(
            QueryGeometry::parse("LINESTRING(0 0, 1 1)", &Crs::Wgs84),
            Err(GeometryError::InvalidWkt(_))
        ));
    }

    #[test]
    fn test_projected_point_is_reprojected() {
        let crs = Crs::parse("EPSG:25833").unwrap();
        let g = QueryGeometry::parse("POINT(500000 6650000)", &crs).unwrap();
        let QueryGeometry::Point { lon, lat } = g else {
            panic!("expected point");
        };
        assert!((lon - 15.0).abs() < 1e-9);
        assert!(lat > 59.9 && lat < 60.0);
    }

    #[test]
    fn test_parse_polygon() {
        let g = QueryGeometry::parse(SQUARE, &Crs::Wgs84).unwrap();
        let bbox = g.bbox();
        assert_eq!(bbox.west, 10.0);
        assert_eq!(bbox.north, 60.2);
        assert!((g.area() - 0.04).abs() < 1e-9);
        let mp = g.to_multi_polygon().unwrap();
        assert!(mp.contains(&Point::new(10.1, 60.1)));
        assert!(!mp.contains(&Point::new(10.3, 60.1)));

        let (cx, cy) = g.centroid();
        assert!((cx - 10.1).abs() < 1e-9);
        assert!((cy - 60.1).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_with_hole_keeps_exterior() {
        let wkt = "POLYGON((0 0, 4 0, 4 4, 0 4, 0 0),(1 1, 2 1, 2 2, 1 2, 1 1))";
        let QueryGeometry::Area { polygons } = QueryGeometry::parse(wkt, &Crs::Wgs84).unwrap() else {
            panic!("expected area");
        };
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].len(), 5);
        assert_eq!(polygons[0][1], (4.0, 0.0));
    }

    #[test]
    fn test_parse_multipolygon() {
        let wkt = "MULTIPOLYGON(((0 0, 1 0, 1 1, 0 1, 0 0)),((5 5, 6 5, 6 6, 5 6, 5 5)))";
        let g = QueryGeometry::parse(wkt, &Crs::Wgs84).unwrap();
        let QueryGeometry::Area { polygons } = &g else {
            panic!("expected area");
        };
        assert_eq!(polygons.len(), 2);
        assert!(g.to_multi_polygon().unwrap().contains(&Point::new(5.5, 5.5)));
        assert_eq!(g.to_wkt_parts().len(), 2);
        assert!((g.area() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_unclosed_ring_rejected() {
        assert!(matches!(
            QueryGeometry::parse("POLYGON((0 0, 1 0, 1 1, 0 1))", &Crs::Wgs84),
            Err(GeometryError::InvalidWkt(_))
        ));
    }

    #[test]
    fn test_unsupported_crs_surfaces_as_projection_error() {
        let err = Crs::parse("EPSG:2056").map_err(GeometryError::from).unwrap_err();
        assert!(matches!(err, GeometryError::Projection(ProjectionError::Unsupported(2056))));
    }

    #[test]
    fn test_to_wkt_parts_point() {
        let g = QueryGeometry::Point { lon: 10.5, lat: 59.25 };
        assert_eq!(g.to_wkt_parts(), vec!["POINT(10.5 59.25)".to_string()]);
    }

    #[test]
    fn test_haversine() {
        // One degree of latitude
        let d = haversine_km(10.0, 60.0, 10.0, 61.0);
        assert!((d - 111.19).abs() < 0.1);
        assert_eq!(haversine_km(10.0, 60.0, 10.0, 60.0), 0.0);
    }

    #[test]
    fn test_bbox_intersects() {
        let a = BoundingBox { west: 0.0, south: 0.0, east: 1.0, north: 1.0 };
        let b = BoundingBox { west: 1.0, south: 0.5, east: 2.0, north: 2.0 };
        let c = BoundingBox { west: 1.5, south: 0.0, east: 2.0, north: 1.0 };
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains(0.5, 0.5));
    }
}
