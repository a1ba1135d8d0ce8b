//! American Polyconic projection on the GRS80 ellipsoid.
//!
//! Contours are buffered in SIRGAS 2000 / Brazil Polyconic (EPSG:5880): a metric
//! frame covering the whole country, so a fixed radius in metres means the same
//! ground distance at every latitude. Geographic coordinates are SIRGAS 2000
//! (EPSG:4674), which shares the GRS80 ellipsoid, so no datum shift is involved.
//!
//! Forward formulas follow Snyder, *Map Projections: A Working Manual* (1987), §18.
//! The inverse is solved numerically (Newton on the forward mapping), which stays
//! well-behaved through the equator where the closed-form inverse divides by
//! `sin 2φ`.

use nalgebra::{Matrix2, Vector2};

use crate::error::EngineError;

/// GRS80 semi-major axis (metres).
const GRS80_A: f64 = 6_378_137.0;
/// GRS80 inverse flattening.
const GRS80_INV_F: f64 = 298.257_222_101;

const MAX_NEWTON_ITERS: usize = 30;
/// Convergence tolerance on the projected residual (metres).
const NEWTON_TOL_M: f64 = 1e-6;
/// Finite-difference step for the Jacobian (radians, ~0.6 m on the ground).
const JACOBIAN_STEP: f64 = 1e-7;
/// Below this |φ| the forward mapping uses its equatorial limit.
const EQUATOR_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
pub struct Polyconic {
    a: f64,
    e2: f64,
    lon0: f64,
    false_easting: f64,
    false_northing: f64,
    m0: f64,
}

impl Polyconic {
    /// SIRGAS 2000 / Brazil Polyconic (EPSG:5880).
    pub fn brazil() -> Self {
        Self::new(GRS80_A, GRS80_INV_F, 0.0, -54.0, 5_000_000.0, 10_000_000.0)
    }

    pub fn new(a: f64, inv_f: f64, lat0_deg: f64, lon0_deg: f64, false_easting: f64, false_northing: f64) -> Self {
        let f = 1.0 / inv_f;
        let e2 = f * (2.0 - f);
        let mut proj = Self {
            a,
            e2,
            lon0: lon0_deg.to_radians(),
            false_easting,
            false_northing,
            m0: 0.0,
        };
        proj.m0 = proj.meridian_arc(lat0_deg.to_radians());
        proj
    }

    /// Project geographic degrees `(lon, lat)` to metres `(x, y)`.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let v = self.forward_rad(lon_deg.to_radians(), lat_deg.to_radians());
        (v.x, v.y)
    }

    /// Inverse-project metres `(x, y)` back to geographic degrees `(lon, lat)`.
    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), EngineError> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(EngineError::Geometry(format!("non-finite projected point ({x}, {y})")));
        }
        let target = Vector2::new(x, y);

        // Initial guess: meridian arc is ~a·φ and parallels are ~a·cosφ·Δλ.
        let phi = (y - self.false_northing + self.m0) / self.a;
        let lam = self.lon0 + (x - self.false_easting) / (self.a * phi.cos().max(0.1));
        let mut p = Vector2::new(lam, phi);

        for _ in 0..MAX_NEWTON_ITERS {
            let residual = self.forward_rad(p.x, p.y) - target;
            if residual.norm() <= NEWTON_TOL_M {
                return Ok((p.x.to_degrees(), p.y.to_degrees()));
            }
            let jacobian = self.jacobian(p);
            let inverse = jacobian
                .try_inverse()
                .ok_or_else(|| EngineError::Geometry(format!("singular projection Jacobian at ({x:.3}, {y:.3})")))?;
            p -= inverse * residual;
        }

        Err(EngineError::Geometry(format!(
            "inverse projection did not converge for ({x:.3}, {y:.3})"
        )))
    }

    fn forward_rad(&self, lam: f64, phi: f64) -> Vector2<f64> {
        let dlam = lam - self.lon0;
        let (x, y) = if phi.abs() < EQUATOR_EPS {
            (self.a * dlam, self.meridian_arc(phi) - self.m0)
        } else {
            let sin_phi = phi.sin();
            let n = self.a / (1.0 - self.e2 * sin_phi * sin_phi).sqrt();
            let e = dlam * sin_phi;
            let n_cot = n / phi.tan();
            // 1 - cos E written as 2 sin²(E/2) to avoid cancellation near the equator.
            let half = (e / 2.0).sin();
            (
                n_cot * e.sin(),
                self.meridian_arc(phi) - self.m0 + n_cot * 2.0 * half * half,
            )
        };
        Vector2::new(x + self.false_easting, y + self.false_northing)
    }

    fn jacobian(&self, p: Vector2<f64>) -> Matrix2<f64> {
        let h = JACOBIAN_STEP;
        let d_lam = (self.forward_rad(p.x + h, p.y) - self.forward_rad(p.x - h, p.y)) / (2.0 * h);
        let d_phi = (self.forward_rad(p.x, p.y + h) - self.forward_rad(p.x, p.y - h)) / (2.0 * h);
        Matrix2::from_columns(&[d_lam, d_phi])
    }

    /// Distance along the meridian from the equator to latitude `phi` (radians).
    fn meridian_arc(&self, phi: f64) -> f64 {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        self.a
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }
}
