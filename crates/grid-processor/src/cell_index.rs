//! Grid cell lookup.
//!
//! A [`CellIndex`] answers "which archive cells intersect this bounding
//! box". Cells are identified by a `column,row` label that addresses the
//! spatial axes of the dense array.

use std::collections::HashSet;
use std::path::Path;

use culvert_protocol::BoundingBox;
use geo::{BoundingRect, Coord, LineString, MultiPolygon, Polygon, Rect};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::config::CellIndexConfig;
use crate::error::{GridProcessorError, Result};

/// A cell of the dense archive and the band indices to read from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub column: usize,
    pub row: usize,
    /// Inclusive `(start, end)` half-hour indices.
    pub band_range: (usize, usize),
}

impl GridCell {
    pub fn label(&self) -> String {
        format!("{},{}", self.column, self.row)
    }
}

/// A cell returned by an index lookup.
#[derive(Debug, Clone)]
pub struct CellRecord {
    pub label: String,
    pub column: usize,
    pub row: usize,
    pub polygon: MultiPolygon<f64>,
}

/// Parse a `column,row` label.
pub fn parse_label(label: &str) -> Result<(usize, usize)> {
    let mut parts = label.split(',');
    let (Some(col), Some(row), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(GridProcessorError::InvalidLabel(label.to_string()));
    };
    let col = col
        .trim()
        .parse()
        .map_err(|_| GridProcessorError::InvalidLabel(label.to_string()))?;
    let row = row
        .trim()
        .parse()
        .map_err(|_| GridProcessorError::InvalidLabel(label.to_string()))?;
    Ok((col, row))
}

/// Lookup of archive cells by bounding box.
pub trait CellIndex: Send + Sync {
    /// Cells whose footprint intersects `bbox`, deduplicated by label.
    fn cells_in_bbox(&self, bbox: &BoundingBox) -> Result<Vec<CellRecord>>;
}

/// Build the index described by `config`.
pub fn open_cell_index(config: &CellIndexConfig) -> Result<Box<dyn CellIndex>> {
    match config {
        CellIndexConfig::Regular {
            origin_lon,
            origin_lat,
            resolution,
            columns,
            rows,
        } => Ok(Box::new(RegularCellIndex::new(
            *origin_lon,
            *origin_lat,
            *resolution,
            *columns,
            *rows,
        ))),
        CellIndexConfig::GeoJson { path } => Ok(Box::new(GeoJsonCellIndex::load(path)?)),
    }
}

fn rect_polygon(west: f64, south: f64, east: f64, north: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![
            (west, south),
            (east, south),
            (east, north),
            (west, north),
            (west, south),
        ]),
        vec![],
    )
}

/// A regular lon/lat grid, column 0 at `origin_lon`, row 0 at `origin_lat`.
#[derive(Debug, Clone)]
pub struct RegularCellIndex {
    /// Western edge of column 0 (degrees)
    pub origin_lon: f64,
    /// Southern edge of row 0 (degrees)
    pub origin_lat: f64,
    /// Cell size (degrees)
    pub resolution: f64,
    pub columns: usize,
    pub rows: usize,
}

impl RegularCellIndex {
    // Guards against 190.0 / 0.1 landing a hair under 1900.
    const EPSILON: f64 = 1e-9;

    pub fn new(origin_lon: f64, origin_lat: f64, resolution: f64, columns: usize, rows: usize) -> Self {
        Self {
            origin_lon,
            origin_lat,
            resolution,
            columns,
            rows,
        }
    }

    /// The 0.1° global IMERG grid.
    pub fn imerg() -> Self {
        Self::new(-180.0, -90.0, 0.1, 3600, 1800)
    }

    fn extent(&self) -> BoundingBox {
        BoundingBox {
            west: self.origin_lon,
            south: self.origin_lat,
            east: self.origin_lon + self.columns as f64 * self.resolution,
            north: self.origin_lat + self.rows as f64 * self.resolution,
        }
    }

    fn axis_index(&self, value: f64, origin: f64, count: usize) -> usize {
        let i = ((value - origin) / self.resolution + Self::EPSILON).floor();
        (i.max(0.0) as usize).min(count - 1)
    }

    /// Cell containing (lon, lat), if inside the grid.
    pub fn cell_at(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        if !self.extent().contains(lon, lat) {
            return None;
        }
        Some((
            self.axis_index(lon, self.origin_lon, self.columns),
            self.axis_index(lat, self.origin_lat, self.rows),
        ))
    }

    pub fn cell_polygon(&self, column: usize, row: usize) -> Polygon<f64> {
        let west = self.origin_lon + column as f64 * self.resolution;
        let south = self.origin_lat + row as f64 * self.resolution;
        rect_polygon(west, south, west + self.resolution, south + self.resolution)
    }
}

impl CellIndex for RegularCellIndex {
    fn cells_in_bbox(&self, bbox: &BoundingBox) -> Result<Vec<CellRecord>> {
        if !self.extent().intersects(bbox) {
            return Ok(Vec::new());
        }
        let col0 = self.axis_index(bbox.west, self.origin_lon, self.columns);
        let col1 = self.axis_index(bbox.east, self.origin_lon, self.columns);
        let row0 = self.axis_index(bbox.south, self.origin_lat, self.rows);
        let row1 = self.axis_index(bbox.north, self.origin_lat, self.rows);

        let mut cells = Vec::with_capacity((col1 - col0 + 1) * (row1 - row0 + 1));
        for row in row0..=row1 {
            for column in col0..=col1 {
                cells.push(CellRecord {
                    label: format!("{},{}", column, row),
                    column,
                    row,
                    polygon: MultiPolygon::new(vec![self.cell_polygon(column, row)]),
                });
            }
        }
        Ok(cells)
    }
}

#[derive(Deserialize)]
struct RawCollection {
    features: Vec<RawFeature>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: serde_json::Map<String, Value>,
    geometry: Option<RawGeometry>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

fn rings_to_polygon(rings: &[Vec<[f64; 2]>]) -> Option<Polygon<f64>> {
    let to_line = |ring: &Vec<[f64; 2]>| {
        LineString::from(ring.iter().map(|&[x, y]| Coord { x, y }).collect::<Vec<_>>())
    };
    let (exterior, holes) = rings.split_first()?;
    Some(Polygon::new(to_line(exterior), holes.iter().map(to_line).collect()))
}

impl RawGeometry {
    fn into_multi_polygon(self) -> MultiPolygon<f64> {
        match self {
            RawGeometry::Polygon { coordinates } => {
                MultiPolygon::new(rings_to_polygon(&coordinates).into_iter().collect())
            }
            RawGeometry::MultiPolygon { coordinates } => MultiPolygon::new(
                coordinates
                    .iter()
                    .filter_map(|rings| rings_to_polygon(rings))
                    .collect(),
            ),
        }
    }
}

/// Cells read from a GeoJSON FeatureCollection.
///
/// Each feature needs a polygon geometry and a `label` property of the form
/// `column,row`.
pub struct GeoJsonCellIndex {
    cells: Vec<(CellRecord, Rect<f64>)>,
}

impl GeoJsonCellIndex {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GridProcessorError::CellIndex(format!("{}: {}", path.display(), e))
        })?;
        let index = Self::from_geojson(&text)?;
        info!(path = %path.display(), cells = index.len(), "Loaded cell index");
        Ok(index)
    }

    pub fn from_geojson(text: &str) -> Result<Self> {
        let collection: RawCollection = serde_json::from_str(text)
            .map_err(|e| GridProcessorError::CellIndex(e.to_string()))?;

        let mut cells = Vec::with_capacity(collection.features.len());
        for feature in collection.features {
            let label = match feature.properties.get("label") {
                Some(Value::String(s)) => s.clone(),
                _ => {
                    return Err(GridProcessorError::CellIndex(
                        "feature without a string 'label' property".to_string(),
                    ))
                }
            };
            let (column, row) = parse_label(&label)?;
            let Some(geometry) = feature.geometry else {
                return Err(GridProcessorError::CellIndex(format!(
                    "cell {} has no geometry",
                    label
                )));
            };
            let polygon = geometry.into_multi_polygon();
            let Some(rect) = polygon.bounding_rect() else {
                return Err(GridProcessorError::CellIndex(format!(
                    "cell {} has an empty geometry",
                    label
                )));
            };
            cells.push((
                CellRecord {
                    label,
                    column,
                    row,
                    polygon,
                },
                rect,
            ));
        }
        Ok(Self { cells })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl CellIndex for GeoJsonCellIndex {
    fn cells_in_bbox(&self, bbox: &BoundingBox) -> Result<Vec<CellRecord>> {
        let mut seen = HashSet::new();
        Ok(self
            .cells
            .iter()
            .filter(|(_, rect)| {
                bbox.intersects(&BoundingBox {
                    west: rect.min().x,
                    south: rect.min().y,
                    east: rect.max().x,
                    north: rect.max().y,
                })
            })
            .filter(|(cell, _)| seen.insert(cell.label.clone()))
            .map(|(cell, _)| cell.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::cell_index_geojson;

    fn bbox(west: f64, south: f64, east: f64, north: f64) -> BoundingBox {
        BoundingBox {
            west,
            south,
            east,
            north,
        }
    }

    #[test]
    fn test_parse_label() {
        assert_eq!(parse_label("1907,1499").unwrap(), (1907, 1499));
        assert_eq!(parse_label(" 3, 4 ").unwrap(), (3, 4));
        for bad in ["", "12", "1,2,3", "a,b", "-1,2"] {
            assert!(
                matches!(parse_label(bad), Err(GridProcessorError::InvalidLabel(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_regular_cell_at() {
        let index = RegularCellIndex::imerg();
        assert_eq!(index.cell_at(10.0, 60.0), Some((1900, 1500)));
        assert_eq!(index.cell_at(10.05, 60.05), Some((1900, 1500)));
        assert_eq!(index.cell_at(-180.0, -90.0), Some((0, 0)));
        assert_eq!(index.cell_at(180.0, 90.0), Some((3599, 1799)));
        assert_eq!(index.cell_at(181.0, 0.0), None);
    }

    #[test]
    fn test_regular_cells_in_bbox() {
        let index = RegularCellIndex::new(0.0, 0.0, 1.0, 10, 10);
        let cells = index.cells_in_bbox(&bbox(1.5, 2.5, 3.5, 2.7)).unwrap();
        let labels: Vec<&str> = cells.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["1,2", "2,2", "3,2"]);
    }

    #[test]
    fn test_regular_bbox_outside_grid() {
        let index = RegularCellIndex::new(0.0, 0.0, 1.0, 10, 10);
        assert!(index.cells_in_bbox(&bbox(20.0, 20.0, 21.0, 21.0)).unwrap().is_empty());
    }

    #[test]
    fn test_geojson_index_filters_and_dedupes() {
        let mut text = cell_index_geojson(0.0, 0.0, 1.0, 3, 3);
        // Duplicate the first feature to check label dedupe
        let mut value: Value = serde_json::from_str(&text).unwrap();
        let first = value["features"][0].clone();
        value["features"].as_array_mut().unwrap().push(first);
        text = value.to_string();

        let index = GeoJsonCellIndex::from_geojson(&text).unwrap();
        assert_eq!(index.len(), 10);

        let cells = index.cells_in_bbox(&bbox(0.2, 0.2, 0.8, 0.8)).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!((cells[0].column, cells[0].row), (0, 0));

        let cells = index.cells_in_bbox(&bbox(0.5, 0.5, 1.5, 0.6)).unwrap();
        let labels: Vec<&str> = cells.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["0,0", "1,0"]);
    }

    #[test]
    fn test_geojson_index_rejects_bad_label() {
        let text = r#"{"type":"FeatureCollection","features":[{"type":"Feature",
            "properties":{"label":"oops"},
            "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}}]}"#;
        assert!(matches!(
            GeoJsonCellIndex::from_geojson(text),
            Err(GridProcessorError::InvalidLabel(_))
        ));
    }

    #[test]
    fn test_open_cell_index_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Grid.geojson");
        std::fs::write(&path, cell_index_geojson(10.0, 60.0, 0.1, 2, 2)).unwrap();

        let index = open_cell_index(&CellIndexConfig::GeoJson { path }).unwrap();
        let cells = index.cells_in_bbox(&bbox(10.0, 60.0, 10.2, 60.2)).unwrap();
        assert_eq!(cells.len(), 4);
    }
}
