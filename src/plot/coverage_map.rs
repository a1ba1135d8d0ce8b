//! SVG coverage map.
//!
//! Layers, bottom to top: outlines of the sectors touched by the contour,
//! covered municipalities filled one colour each, urban sectors reached (red
//! outline), the dashed protected contour and the station marker.
//!
//! Plotters is built without font support, so the map carries no text.

use std::path::{Path, PathBuf};

use geo::{BoundingRect, LineString, MultiPolygon, Rect, coord};
use plotters::prelude::*;

use crate::coverage::CoverageGeometry;
use crate::error::EngineError;

const MAP_SIZE: (u32, u32) = (1000, 1000);
const PADDING: f64 = 0.05;

/// Create an empty, uniquely named map file in `dir`:
/// `img_<process>_<random>.svg`, with `/` -> `-` and `.` -> `_`.
///
/// The file outlives this call; whoever receives the path deletes it.
pub fn temp_map_path(dir: &Path, process_number: &str) -> Result<PathBuf, EngineError> {
    let name = process_number.trim().replace('/', "-").replace('.', "_");
    let file = tempfile::Builder::new()
        .prefix(&format!("img_{name}_"))
        .suffix(".svg")
        .tempfile_in(dir)
        .map_err(|e| EngineError::output("coverage map", dir, e))?;
    let (_, path) = file.keep().map_err(|e| EngineError::output("coverage map", dir, e))?;
    Ok(path)
}

/// Draw the map to `path`.
pub fn render_coverage_map(path: &Path, geometry: &CoverageGeometry) -> Result<(), EngineError> {
    let render_err = |e: &dyn std::fmt::Display| EngineError::output("coverage map", path, e);

    let (x_range, y_range) = view_bounds(geometry);

    let root = SVGBackend::new(path, MAP_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| render_err(&e))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| render_err(&e))?;

    let outline = BLACK.mix(0.6).stroke_width(1);
    chart
        .draw_series(
            geometry
                .touched_sectors
                .iter()
                .flat_map(rings)
                .map(|ring| PathElement::new(ring, outline)),
        )
        .map_err(|e| render_err(&e))?;

    for (i, municipality) in geometry.covered_municipalities.iter().enumerate() {
        let fill = Palette99::pick(i).mix(0.6).filled();
        chart
            .draw_series(municipality.0.iter().map(|poly| Polygon::new(points(poly.exterior()), fill)))
            .map_err(|e| render_err(&e))?;
    }

    chart
        .draw_series(
            geometry
                .reached_urban_sectors
                .iter()
                .flat_map(rings)
                .map(|ring| PathElement::new(ring, RED.stroke_width(1))),
        )
        .map_err(|e| render_err(&e))?;

    // Dashed contour: every other edge of the ring.
    let contour = points(geometry.contour.exterior());
    chart
        .draw_series(
            contour
                .windows(2)
                .step_by(2)
                .map(|edge| PathElement::new(edge.to_vec(), RED.stroke_width(2))),
        )
        .map_err(|e| render_err(&e))?;

    let station = (geometry.station.x(), geometry.station.y());
    chart
        .draw_series([
            Circle::new(station, 6, YELLOW.filled()),
            Circle::new(station, 6, BLACK.stroke_width(2)),
        ])
        .map_err(|e| render_err(&e))?;

    root.present().map_err(|e| render_err(&e))?;
    tracing::debug!(path = %path.display(), "wrote coverage map");
    Ok(())
}

fn rings(mp: &MultiPolygon<f64>) -> Vec<Vec<(f64, f64)>> {
    mp.0.iter()
        .flat_map(|poly| std::iter::once(poly.exterior()).chain(poly.interiors()))
        .map(points)
        .collect()
}

fn points(ring: &LineString<f64>) -> Vec<(f64, f64)> {
    ring.coords().map(|c| (c.x, c.y)).collect()
}

/// Axis ranges covering every layer, padded, with equal ground scale on both
/// axes (a degree of longitude shrinks with `cos(lat)`).
fn view_bounds(geometry: &CoverageGeometry) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let mut rect = geometry.contour.bounding_rect().unwrap_or(Rect::new(
        coord! { x: geometry.station.x(), y: geometry.station.y() },
        coord! { x: geometry.station.x(), y: geometry.station.y() },
    ));
    for mp in geometry.touched_sectors.iter().chain(&geometry.covered_municipalities) {
        if let Some(r) = mp.bounding_rect() {
            rect = Rect::new(
                coord! { x: rect.min().x.min(r.min().x), y: rect.min().y.min(r.min().y) },
                coord! { x: rect.max().x.max(r.max().x), y: rect.max().y.max(r.max().y) },
            );
        }
    }

    let center = rect.center();
    let cos_lat = center.y.to_radians().cos().max(0.1);
    let half_w = (rect.width() * cos_lat).max(rect.height()).max(1e-3) * (0.5 + PADDING);
    let half_x = half_w / cos_lat;
    let half_y = half_w;
    (
        (center.x - half_x)..(center.x + half_x),
        (center.y - half_y)..(center.y + half_y),
    )
}

#[cfg(test)]
mod tests {
    use geo::{Point, Polygon};

    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
            vec![],
        )
    }

    fn geometry() -> CoverageGeometry {
        CoverageGeometry {
            contour: square(-46.6, -23.6, -46.4, -23.4),
            station: Point::new(-46.5, -23.5),
            touched_sectors: vec![MultiPolygon(vec![square(-46.7, -23.7, -46.5, -23.5)])],
            covered_municipalities: vec![MultiPolygon(vec![square(-46.7, -23.7, -46.5, -23.5)])],
            reached_urban_sectors: vec![MultiPolygon(vec![square(-46.55, -23.55, -46.5, -23.5)])],
        }
    }

    #[test]
    fn temp_paths_are_sanitized_and_unique() {
        let dir = tempfile::tempdir().unwrap();
        let first = temp_map_path(dir.path(), "53500.012345/2024-11").unwrap();
        let second = temp_map_path(dir.path(), "53500.012345/2024-11").unwrap();

        let name = first.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("img_53500_012345-2024-11_"), "{name}");
        assert!(name.ends_with(".svg"));
        assert!(first.starts_with(dir.path()));
        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
    }

    #[test]
    fn renders_svg_with_every_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.svg");
        render_coverage_map(&path, &geometry()).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn view_keeps_everything_in_frame() {
        let (x, y) = view_bounds(&geometry());
        assert!(x.start < -46.7 && x.end > -46.4);
        assert!(y.start < -23.7 && y.end > -23.4);
    }
}
