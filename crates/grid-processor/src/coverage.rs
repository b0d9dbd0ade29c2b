//! Coverage weights: the share of a query geometry each cell accounts for.

use culvert_protocol::QueryGeometry;
use geo::{Area, BooleanOps, Intersects, MultiPolygon, Point};
use tracing::debug;

use crate::cell_index::{CellIndex, GridCell};
use crate::error::Result;

/// Intersections smaller than this (square degrees) are edge contacts.
const MIN_WEIGHT: f64 = 1e-12;

/// Fraction of `geometry` (area `geometry_area`) covered by `cell`.
///
/// A degenerate geometry with zero area gives every cell it touches full
/// weight and every other cell none.
pub fn coverage_weight(cell: &MultiPolygon<f64>, geometry: &MultiPolygon<f64>, geometry_area: f64) -> f64 {
    if geometry_area == 0.0 {
        return if cell.intersects(geometry) { 1.0 } else { 0.0 };
    }
    cell.intersection(geometry).unsigned_area() / geometry_area
}

/// Locate the cells for `geometry` and weight each one.
///
/// A point resolves to the first cell containing it, weight 1.0. A polygon
/// resolves to every cell it overlaps, weighted by overlap / polygon area;
/// weights are not renormalised, so their sum falls short of 1.0 where the
/// polygon leaves the grid.
pub fn resolve_cells(
    index: &dyn CellIndex,
    geometry: &QueryGeometry,
    band_range: (usize, usize),
) -> Result<Vec<(GridCell, f64)>> {
    let candidates = index.cells_in_bbox(&geometry.bbox())?;
    let to_cell = |column, row| GridCell {
        column,
        row,
        band_range,
    };

    match geometry {
        QueryGeometry::Point { lon, lat } => {
            let point = Point::new(*lon, *lat);
            Ok(candidates
                .into_iter()
                .find(|c| c.polygon.intersects(&point))
                .map(|c| vec![(to_cell(c.column, c.row), 1.0)])
                .unwrap_or_default())
        }
        QueryGeometry::Area { .. } => {
            let Some(area_polygon) = geometry.to_multi_polygon() else {
                return Ok(Vec::new());
            };
            let area = geometry.area();
            let mut cells = Vec::with_capacity(candidates.len());
            for c in candidates {
                let weight = coverage_weight(&c.polygon, &area_polygon, area);
                if weight > MIN_WEIGHT {
                    cells.push((to_cell(c.column, c.row), weight));
                } else {
                    debug!(label = %c.label, "Dropping cell outside polygon");
                }
            }
            Ok(cells)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_index::RegularCellIndex;
    use projection::Crs;

    fn unit_grid() -> RegularCellIndex {
        RegularCellIndex::new(0.0, 0.0, 1.0, 10, 10)
    }

    fn polygon(wkt: &str) -> QueryGeometry {
        QueryGeometry::parse(wkt, &Crs::Wgs84).unwrap()
    }

    #[test]
    fn test_point_resolves_to_single_full_weight_cell() {
        let geometry = QueryGeometry::Point { lon: 3.4, lat: 5.6 };
        let cells = resolve_cells(&unit_grid(), &geometry, (0, 47)).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].0.label(), "3,5");
        assert_eq!(cells[0].0.band_range, (0, 47));
        assert_eq!(cells[0].1, 1.0);
    }

    #[test]
    fn test_point_outside_grid_has_no_cells() {
        let geometry = QueryGeometry::Point { lon: -20.0, lat: 5.0 };
        assert!(resolve_cells(&unit_grid(), &geometry, (0, 1)).unwrap().is_empty());
    }

    #[test]
    fn test_polygon_exactly_one_cell() {
        let geometry = polygon("POLYGON((2 2, 3 2, 3 3, 2 3, 2 2))");
        let cells = resolve_cells(&unit_grid(), &geometry, (0, 1)).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].0.label(), "2,2");
        assert!((cells[0].1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_split_over_two_cells() {
        let geometry = polygon("POLYGON((2.5 2, 3.5 2, 3.5 3, 2.5 3, 2.5 2))");
        let cells = resolve_cells(&unit_grid(), &geometry, (0, 1)).unwrap();
        assert_eq!(cells.len(), 2);
        for (_, weight) in &cells {
            assert!((weight - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_polygon_leaving_grid_is_not_renormalised() {
        // Half of the polygon lies west of the grid origin.
        let geometry = polygon("POLYGON((-0.5 0, 0.5 0, 0.5 1, -0.5 1, -0.5 0))");
        let cells = resolve_cells(&unit_grid(), &geometry, (0, 1)).unwrap();
        let total: f64 = cells.iter().map(|(_, w)| w).sum();
        assert!((total - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_triangle_drops_untouched_bbox_cells() {
        let geometry = polygon("POLYGON((0 0, 2 0, 0 2, 0 0))");
        let cells = resolve_cells(&unit_grid(), &geometry, (0, 1)).unwrap();
        let labels: Vec<String> = cells.iter().map(|(c, _)| c.label()).collect();
        // The 1,1 cell only touches the hypotenuse at a corner.
        assert_eq!(labels, vec!["0,0", "1,0", "0,1"]);
        let total: f64 = cells.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_collinear_ring_keeps_only_cells_on_the_line() {
        let geometry = QueryGeometry::Area {
            polygons: vec![vec![(0.5, 0.5), (1.5, 1.5), (2.5, 2.5), (0.5, 0.5)]],
        };
        assert_eq!(geometry.area(), 0.0);

        let cells = resolve_cells(&unit_grid(), &geometry, (0, 1)).unwrap();
        let labels: Vec<String> = cells.iter().map(|(c, _)| c.label()).collect();
        // The diagonal crosses the 1,1 and 2,2 corners, so corner cells touch it too.
        for off_line in ["2,0", "0,2"] {
            assert!(!labels.iter().any(|l| l == off_line), "{} is off the line", off_line);
        }
        for on_line in ["0,0", "1,1", "2,2"] {
            assert!(labels.iter().any(|l| l == on_line), "{} lies on the line", on_line);
        }
        assert!(cells.iter().all(|(_, w)| *w == 1.0));
    }

    #[test]
    fn test_flat_ring_weights_touched_cells_only() {
        let geometry = QueryGeometry::Area {
            polygons: vec![vec![(0.2, 0.5), (1.8, 0.5), (0.2, 0.5)]],
        };
        let cells = resolve_cells(&unit_grid(), &geometry, (0, 1)).unwrap();
        let labels: Vec<String> = cells.iter().map(|(c, _)| c.label()).collect();
        assert_eq!(labels, vec!["0,0", "1,0"]);
        let total: f64 = cells.iter().map(|(_, w)| w).sum();
        assert_eq!(total, 2.0);
    }
}
