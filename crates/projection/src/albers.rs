//! Albers Equal-Area Conic projection.
//!
//! Preserves area rather than angle; used for CONUS-scale statistical grids
//! (EPSG:5070 is an instance of this family). Formulas follow Snyder's
//! ellipsoidal Albers equations (14-1 through 14-13, 3-16).

use std::f64::consts::{FRAC_PI_2, PI};

use crate::ellipsoid::Ellipsoid;
use crate::error::ProjectionError;

const MAX_ITER: usize = 15;
const TOLERANCE: f64 = 1e-10;

/// Albers Equal-Area Conic projection parameters.
#[derive(Debug, Clone)]
pub struct Albers {
    lon0: f64,
    ellipsoid: Ellipsoid,
    e: f64,
    e2: f64,
    n: f64,
    c: f64,
    rho0: f64,
}

impl Albers {
    /// Build an Albers equal-area conic projection.
    pub fn new(
        lon0_deg: f64,
        lat0_deg: f64,
        latin1_deg: f64,
        latin2_deg: f64,
        ellipsoid: Ellipsoid,
    ) -> Result<Self, ProjectionError> {
        for v in [lon0_deg, lat0_deg, latin1_deg, latin2_deg] {
            if !v.is_finite() {
                return Err(ProjectionError::InvalidArgument(
                    "albers equal-area parameters must be finite".into(),
                ));
            }
        }
        let e = ellipsoid.eccentricity();
        let e2 = e * e;
        let (major, _) = ellipsoid.semi_axes();

        let lat0 = lat0_deg.to_radians();
        let lat1 = latin1_deg.to_radians();
        let lat2 = latin2_deg.to_radians();

        let m = |phi: f64| phi.cos() / (1.0 - e2 * phi.sin().powi(2)).sqrt();
        let q = |phi: f64| {
            let s = phi.sin();
            (1.0 - e2) * (s / (1.0 - e2 * s * s) - (1.0 / (2.0 * e)) * ((1.0 - e * s) / (1.0 + e * s)).ln())
        };
        let q_sphere = |phi: f64| 2.0 * phi.sin();

        let (m1, m2, q1, q2, q0) = if e > 1e-9 {
            (m(lat1), m(lat2), q(lat1), q(lat2), q(lat0))
        } else {
            (lat1.cos(), lat2.cos(), q_sphere(lat1), q_sphere(lat2), q_sphere(lat0))
        };

        let n = if (lat1 - lat2).abs() < 1e-12 {
            lat1.sin()
        } else {
            (m1 * m1 - m2 * m2) / (q2 - q1)
        };
        if !n.is_finite() || n == 0.0 {
            return Err(ProjectionError::InvalidArgument(
                "degenerate standard parallels for albers equal-area conic".into(),
            ));
        }

        let c = m1 * m1 + n * q1;
        let rho0_sq = (c - n * q0) / (n * n);
        if rho0_sq < 0.0 {
            return Err(ProjectionError::InvalidArgument(
                "albers equal-area: latitude of origin outside the valid domain".into(),
            ));
        }
        let rho0 = major * rho0_sq.sqrt();

        Ok(Self {
            lon0: lon0_deg.to_radians(),
            ellipsoid,
            e,
            e2,
            n,
            c,
            rho0,
        })
    }

    pub fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    fn q_of(&self, phi: f64) -> f64 {
        if self.e > 1e-9 {
            let s = phi.sin();
            (1.0 - self.e2)
                * (s / (1.0 - self.e2 * s * s)
                    - (1.0 / (2.0 * self.e)) * ((1.0 - self.e * s) / (1.0 + self.e * s)).ln())
        } else {
            2.0 * phi.sin()
        }
    }

    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Result<(f64, f64), ProjectionError> {
        let (major, _) = self.ellipsoid.semi_axes();
        let lon = lon_deg.to_radians();
        let lat = lat_deg.to_radians();

        let q = self.q_of(lat);
        let rho_sq = (self.c - self.n * q) / (self.n * self.n);
        if rho_sq < 0.0 || !rho_sq.is_finite() {
            return Err(ProjectionError::DomainError(
                "albers equal-area: non-finite rho".into(),
            ));
        }
        let rho = major * rho_sq.sqrt();

        let mut dlon = lon - self.lon0;
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }
        let theta = self.n * dlon;

        let x = rho * theta.sin();
        let y = self.rho0 - rho * theta.cos();
        Ok((x, y))
    }

    pub fn unproject(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let (major, _) = self.ellipsoid.semi_axes();
        let dy = self.rho0 - y;
        let rho = (x * x + dy * dy).sqrt() * self.n.signum();
        let theta = x.atan2(dy) * self.n.signum();

        let q = (self.c - (rho / major).powi(2) * self.n * self.n) / self.n;

        // Snyder eq. 3-16: fixed-iteration-count solve for geodetic
        // latitude from the authalic parameter q. Falls back to the closest
        // pole on non-convergence.
        let mut phi = (q / 2.0).asin();
        if self.e > 1e-9 {
            for _ in 0..MAX_ITER {
                let s = phi.sin();
                let one_minus = 1.0 - self.e2 * s * s;
                let correction = one_minus * one_minus / (2.0 * phi.cos())
                    * (q / (1.0 - self.e2) - s / one_minus
                        + (1.0 / (2.0 * self.e)) * ((1.0 - self.e * s) / (1.0 + self.e * s)).ln());
                let next = phi + correction;
                if !next.is_finite() {
                    phi = if q > 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 };
                    break;
                }
                if (next - phi).abs() < TOLERANCE {
                    phi = next;
                    break;
                }
                phi = next;
            }
        }
        if !phi.is_finite() {
            phi = if q > 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 };
        }

        let lon = self.lon0 + theta / self.n;
        Ok((lon.to_degrees(), phi.to_degrees()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_conus_albers() {
        // Approximates EPSG:5070 (CONUS Albers).
        let proj = Albers::new(-96.0, 23.0, 29.5, 45.5, Ellipsoid::WGS84).unwrap();
        for &(lon, lat) in &[(-100.0, 40.0), (-80.0, 35.0), (-110.0, 30.0)] {
            let (x, y) = proj.project(lon, lat).unwrap();
            let (lon2, lat2) = proj.unproject(x, y).unwrap();
            assert!((lon - lon2).abs() < 1e-5, "lon {} vs {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-5, "lat {} vs {}", lat, lat2);
        }
    }

    #[test]
    fn origin_maps_to_zero() {
        let proj = Albers::new(-96.0, 23.0, 29.5, 45.5, Ellipsoid::WGS84).unwrap();
        let (x, y) = proj.project(-96.0, 23.0).unwrap();
        assert!(x.abs() < 1e-6);
        assert!(y.abs() < 1e-6);
    }
}
