//! Polar stereographic projection.
//!
//! Conformal azimuthal projection centered on a pole; used for polar
//! satellite swaths and high-latitude model grids. Formulas follow Snyder's
//! "Map Projections: A Working Manual" section on the polar aspect of the
//! stereographic projection (equations 21-29 through 21-40).

use std::f64::consts::FRAC_PI_2;

use crate::ellipsoid::Ellipsoid;
use crate::error::ProjectionError;

const MAX_ITER: usize = 15;
const TOLERANCE: f64 = 1e-10;

/// Which pole the projection plane is centered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pole {
    North,
    South,
}

/// Polar stereographic projection parameters.
#[derive(Debug, Clone)]
pub struct Stereographic {
    lon0: f64,
    pole: Pole,
    ellipsoid: Ellipsoid,
    e: f64,
    /// `a * m(lat_ts) / t(lat_ts)`, the scale factor baked into `rho`.
    scale: f64,
}

impl Stereographic {
    /// Build a polar stereographic projection.
    ///
    /// `secant_lat_deg` is the latitude of true scale; its sign selects the
    /// pole (non-negative latitude selects the north polar aspect, negative
    /// selects the south). Pass `90.0`/`-90.0` for the tangent (scale = 1 at
    /// the pole) case. `lon0_deg` is the central meridian.
    pub fn new(
        lon0_deg: f64,
        secant_lat_deg: f64,
        ellipsoid: Ellipsoid,
    ) -> Result<Self, ProjectionError> {
        if !lon0_deg.is_finite() || !secant_lat_deg.is_finite() {
            return Err(ProjectionError::InvalidArgument(
                "stereographic parameters must be finite".into(),
            ));
        }
        let pole = if secant_lat_deg >= 0.0 {
            Pole::North
        } else {
            Pole::South
        };
        let e = ellipsoid.eccentricity();
        let (major, _) = ellipsoid.semi_axes();
        let lat_ts = secant_lat_deg.abs().to_radians();

        let scale = if (lat_ts - FRAC_PI_2).abs() < 1e-12 {
            2.0 * major / ((1.0 + e).powf(1.0 + e) * (1.0 - e).powf(1.0 - e)).sqrt()
        } else {
            let sin_ts = lat_ts.sin();
            let m_ts = lat_ts.cos() / (1.0 - e * e * sin_ts * sin_ts).sqrt();
            let t_ts = Self::t_raw(lat_ts, e);
            major * m_ts / t_ts
        };
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ProjectionError::InvalidArgument(
                "stereographic: degenerate secant latitude".into(),
            ));
        }

        Ok(Self {
            lon0: lon0_deg.to_radians(),
            pole,
            ellipsoid,
            e,
            scale,
        })
    }

    pub fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    fn t_raw(phi: f64, e: f64) -> f64 {
        ((std::f64::consts::FRAC_PI_4 - phi / 2.0).tan())
            / (((1.0 - e * phi.sin()) / (1.0 + e * phi.sin())).powf(e / 2.0))
    }

    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Result<(f64, f64), ProjectionError> {
        // Reduce to the north-polar case by mirroring latitude/longitude for
        // the south pole, then mirror the result back.
        let (lat, dlon) = match self.pole {
            Pole::North => (lat_deg.to_radians(), lon_deg.to_radians() - self.lon0),
            Pole::South => (-lat_deg.to_radians(), -(lon_deg.to_radians() - self.lon0)),
        };

        let t = Self::t_raw(lat, self.e);
        let rho = self.scale * t;
        if !rho.is_finite() {
            return Err(ProjectionError::DomainError(
                "stereographic: non-finite rho at the far pole".into(),
            ));
        }

        let x = rho * dlon.sin();
        let y_north = -rho * dlon.cos();
        let y = match self.pole {
            Pole::North => y_north,
            Pole::South => -y_north,
        };
        Ok((x, y))
    }

    pub fn unproject(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let rho = (x * x + y * y).sqrt();
        if rho < 1e-9 {
            let lat = match self.pole {
                Pole::North => 90.0,
                Pole::South => -90.0,
            };
            return Ok((self.lon0.to_degrees(), lat));
        }

        let t = rho / self.scale;
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

        let y_north = match self.pole {
            Pole::North => y,
            Pole::South => -y,
        };
        let theta = x.atan2(-y_north);
        let (lon, lat) = match self.pole {
            Pole::North => (self.lon0 + theta, phi),
            Pole::South => (self.lon0 - theta, -phi),
        };
        Ok((lon.to_degrees(), lat.to_degrees()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn north_pole_projects_near_origin() {
        let proj = Stereographic::new(-150.0, 90.0, Ellipsoid::WGS84).unwrap();
        let (x, y) = proj.project(-150.0, 89.999).unwrap();
        assert!(x.abs() < 1000.0);
        assert!(y.abs() < 1000.0);
    }

    #[test]
    fn roundtrip_away_from_poles() {
        let proj = Stereographic::new(-45.0, 70.0, Ellipsoid::WGS84).unwrap();
        for &(lon, lat) in &[(-60.0, 60.0), (-30.0, 75.0), (-45.0, 80.0)] {
            let (x, y) = proj.project(lon, lat).unwrap();
            let (lon2, lat2) = proj.unproject(x, y).unwrap();
            assert!((lon - lon2).abs() < 1e-5, "lon {} vs {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-5, "lat {} vs {}", lat, lat2);
        }
    }

    #[test]
    fn south_pole_roundtrips() {
        let proj = Stereographic::new(0.0, -71.0, Ellipsoid::WGS84).unwrap();
        let (x, y) = proj.project(20.0, -80.0).unwrap();
        let (lon, lat) = proj.unproject(x, y).unwrap();
        assert!((lon - 20.0).abs() < 1e-5);
        assert!((lat - (-80.0)).abs() < 1e-5);
    }
}
