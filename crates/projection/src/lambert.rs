//! Lambert Conformal Conic projection.
//!
//! This projection is commonly used for weather data including HRRR/NAM.
//! It maps a cone tangent or secant to the ellipsoid onto a flat plane.
//!
//! The projection parameters are:
//! - `lon0`: the central meridian.
//! - `lat0`: the latitude of origin (where `rho0` is evaluated).
//! - `latin1`/`latin2`: the standard parallels (equal for a tangent cone).
//! - `ellipsoid`: the reference ellipsoid (ellipsoidal Snyder formulas; pass
//!   [`crate::Ellipsoid::SPHERE`] for the spherical form used by most NWP grids).

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::ellipsoid::Ellipsoid;
use crate::error::ProjectionError;

const MAX_ITER: usize = 15;
const TOLERANCE: f64 = 1e-10;

/// Lambert Conformal Conic projection parameters.
#[derive(Debug, Clone)]
pub struct LambertConformal {
    lon0: f64,
    ellipsoid: Ellipsoid,
    e: f64,
    n: f64,
    f: f64,
    rho0: f64,
}

impl LambertConformal {
    /// Build a Lambert Conformal Conic projection.
    ///
    /// All latitude/longitude parameters are in degrees. `lat0` is the
    /// latitude of origin (often equal to `latin1` for one-standard-parallel
    /// setups); `lon0` is the central meridian.
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
                    "lambert conformal parameters must be finite".into(),
                ));
            }
        }
        let lat0 = lat0_deg.to_radians();
        let lat1 = latin1_deg.to_radians();
        let lat2 = latin2_deg.to_radians();
        let e = ellipsoid.eccentricity();

        let m = |phi: f64| phi.cos() / (1.0 - e * e * phi.sin().powi(2)).sqrt();
        let t = |phi: f64| {
            ((FRAC_PI_4 - phi / 2.0).tan())
                / (((1.0 - e * phi.sin()) / (1.0 + e * phi.sin())).powf(e / 2.0))
        };

        let m1 = m(lat1);
        let t1 = t(lat1);
        let t0 = t(lat0);

        let n = if (lat1 - lat2).abs() < 1e-12 {
            lat1.sin()
        } else {
            let m2 = m(lat2);
            let t2 = t(lat2);
            (m1.ln() - m2.ln()) / (t1.ln() - t2.ln())
        };
        if !n.is_finite() || n == 0.0 {
            return Err(ProjectionError::InvalidArgument(
                "degenerate standard parallels for lambert conformal conic".into(),
            ));
        }

        let f = m1 / (n * t1.powf(n));
        let (major, _) = ellipsoid.semi_axes();
        let rho0 = major * f * t0.powf(n);

        Ok(Self {
            lon0: lon0_deg.to_radians(),
            ellipsoid,
            e,
            n,
            f,
            rho0,
        })
    }

    pub fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    fn t_of(&self, phi: f64) -> f64 {
        let e = self.e;
        ((FRAC_PI_4 - phi / 2.0).tan()) / (((1.0 - e * phi.sin()) / (1.0 + e * phi.sin())).powf(e / 2.0))
    }

    /// Project geographic coordinates (degrees) to planar (x, y) in meters.
    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Result<(f64, f64), ProjectionError> {
        let lon = lon_deg.to_radians();
        let lat = lat_deg.to_radians();
        let (major, _) = self.ellipsoid.semi_axes();

        let t = self.t_of(lat);
        let rho = major * self.f * t.powf(self.n);
        if !rho.is_finite() {
            return Err(ProjectionError::DomainError(
                "lambert conformal conic: non-finite rho".into(),
            ));
        }

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

    /// Unproject planar (x, y) in meters back to geographic coordinates (degrees).
    pub fn unproject(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let (major, _) = self.ellipsoid.semi_axes();
        let dy = self.rho0 - y;
        let mut rho = (x * x + dy * dy).sqrt();
        if self.n < 0.0 {
            rho = -rho;
        }
        let theta = x.atan2(dy) * self.n.signum();

        let t = (rho / (major * self.f)).powf(1.0 / self.n);
        if !t.is_finite() {
            return Err(ProjectionError::DomainError(
                "lambert conformal conic: non-finite inverse parameter".into(),
            ));
        }

        let mut phi = FRAC_PI_2 - 2.0 * t.atan();
        let e = self.e;
        for _ in 0..MAX_ITER {
            let factor = ((1.0 - e * phi.sin()) / (1.0 + e * phi.sin())).powf(e / 2.0);
            let next = FRAC_PI_2 - 2.0 * (t * factor).atan();
            if (next - phi).abs() < TOLERANCE {
                phi = next;
                break;
            }
            phi = next;
        }
        if !phi.is_finite() {
            phi = if self.n > 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 };
        }

        let lon = self.lon0 + theta / self.n;
        Ok((lon.to_degrees(), phi.to_degrees()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hrrr_first_grid_point_roundtrips() {
        let proj =
            LambertConformal::new(-97.5, 38.5, 38.5, 38.5, Ellipsoid::SPHERE).unwrap();
        let (x, y) = proj.project(-122.719528, 21.138123).unwrap();
        let (lon, lat) = proj.unproject(x, y).unwrap();
        assert!((lon - (-122.719528)).abs() < 1e-4);
        assert!((lat - 21.138123).abs() < 1e-4);
    }

    #[test]
    fn roundtrip_away_from_poles() {
        let proj = LambertConformal::new(-97.5, 38.5, 33.0, 45.0, Ellipsoid::WGS84).unwrap();
        for &(lon, lat) in &[(-100.0, 40.0), (-80.0, 35.0), (-110.0, 45.0)] {
            let (x, y) = proj.project(lon, lat).unwrap();
            let (lon2, lat2) = proj.unproject(x, y).unwrap();
            assert!((lon - lon2).abs() < 1e-6, "lon {} vs {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-6, "lat {} vs {}", lat, lat2);
        }
    }
}
