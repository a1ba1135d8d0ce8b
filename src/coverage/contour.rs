//! Protected-contour polygon construction.

use std::f64::consts::TAU;

use geo::{BoundingRect, LineString, Point, Polygon, Rect};

use crate::error::EngineError;
use crate::geodesy::Polyconic;
use crate::tables::ContourRadius;

/// Vertices used to approximate the buffered circle.
pub const CONTOUR_SEGMENTS: usize = 64;

/// Circular protected contour around the proposed station, in lon/lat degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtectedContour {
    pub station: Point<f64>,
    pub radius: ContourRadius,
    pub polygon: Polygon<f64>,
    pub bbox: Rect<f64>,
}

/// Build the contour by buffering in the metric frame and projecting back.
///
/// The circle is drawn in Brazil Polyconic metres around the projected station,
/// then every vertex is inverse-projected, so the radius is a ground distance
/// rather than a distance in degrees.
pub fn protected_contour(
    latitude: f64,
    longitude: f64,
    radius: ContourRadius,
) -> Result<ProtectedContour, EngineError> {
    if !(latitude.is_finite() && longitude.is_finite()) || latitude.abs() > 90.0 || longitude.abs() > 180.0 {
        return Err(EngineError::Geometry(format!(
            "station coordinates out of range: lat {latitude}, lon {longitude}"
        )));
    }
    if !(radius.km.is_finite() && radius.km > 0.0) {
        return Err(EngineError::Geometry(format!("invalid contour radius {} km", radius.km)));
    }

    let projection = Polyconic::brazil();
    let (cx, cy) = projection.forward(longitude, latitude);
    let radius_m = radius.km * 1000.0;

    let mut ring = Vec::with_capacity(CONTOUR_SEGMENTS + 1);
    for k in 0..CONTOUR_SEGMENTS {
        let angle = TAU * k as f64 / CONTOUR_SEGMENTS as f64;
        let (x, y) = (cx + radius_m * angle.cos(), cy + radius_m * angle.sin());
        ring.push(projection.inverse(x, y)?);
    }
    ring.push(ring[0]);

    let polygon = Polygon::new(LineString::from(ring), vec![]);
    let bbox = polygon
        .bounding_rect()
        .ok_or_else(|| EngineError::Geometry("empty protected contour".to_string()))?;

    Ok(ProtectedContour {
        station: Point::new(longitude, latitude),
        radius,
        polygon,
        bbox,
    })
}

#[cfg(test)]
mod tests {
    use geo::{Contains, CoordsIter};

    use super::*;
    use crate::tables::RadiusSource;

    fn radius(km: f64) -> ContourRadius {
        ContourRadius {
            km,
            source: RadiusSource::Flat,
        }
    }

    fn haversine_km((lon1, lat1): (f64, f64), (lon2, lat2): (f64, f64)) -> f64 {
        let (p1, p2) = (lat1.to_radians(), lat2.to_radians());
        let dp = p2 - p1;
        let dl = (lon2 - lon1).to_radians();
        let h = (dp / 2.0).sin().powi(2) + p1.cos() * p2.cos() * (dl / 2.0).sin().powi(2);
        2.0 * 6_371.0088 * h.sqrt().asin()
    }

    #[test]
    fn vertices_lie_at_ground_radius_on_central_meridian() {
        let contour = protected_contour(-15.0, -54.0, radius(30.0)).unwrap();
        assert_eq!(contour.polygon.exterior().coords_count(), CONTOUR_SEGMENTS + 1);
        for c in contour.polygon.exterior().coords() {
            let d = haversine_km((-54.0, -15.0), (c.x, c.y));
            assert!((d - 30.0).abs() < 0.3, "vertex at {d} km");
        }
    }

    #[test]
    fn contour_contains_station_and_is_not_a_degree_circle() {
        let contour = protected_contour(-23.5475, -46.6361, radius(12.5)).unwrap();
        assert!(contour.polygon.contains(&contour.station));
        // At 23.5°S a degree of longitude is shorter than a degree of latitude,
        // so the ground circle is wider than it is tall in degrees.
        let width = contour.bbox.width();
        let height = contour.bbox.height();
        assert!(width > height * 1.05, "width {width} height {height}");
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(
            protected_contour(-23.0, -46.0, radius(0.0)),
            Err(EngineError::Geometry(_))
        ));
        assert!(matches!(
            protected_contour(f64::NAN, -46.0, radius(10.0)),
            Err(EngineError::Geometry(_))
        ));
    }
}
