//! Ellipsoidal Mercator projection.
//!
//! Conformal cylindrical projection; conventionally used for swath data
//! near the equator where Mercator's along-track distortion is small.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::ellipsoid::Ellipsoid;
use crate::error::ProjectionError;

const MAX_ITER: usize = 15;
const TOLERANCE: f64 = 1e-10;

/// Mercator projection parameters.
#[derive(Debug, Clone)]
pub struct Mercator {
    lon0: f64,
    ellipsoid: Ellipsoid,
    e: f64,
}

impl Mercator {
    /// Build a Mercator projection with the given central meridian (degrees).
    pub fn new(lon0_deg: f64, ellipsoid: Ellipsoid) -> Result<Self, ProjectionError> {
        if !lon0_deg.is_finite() {
            return Err(ProjectionError::InvalidArgument(
                "mercator central meridian must be finite".into(),
            ));
        }
        Ok(Self {
            lon0: lon0_deg.to_radians(),
            ellipsoid,
            e: ellipsoid.eccentricity(),
        })
    }

    pub fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Result<(f64, f64), ProjectionError> {
        let (major, _) = self.ellipsoid.semi_axes();
        let lon = lon_deg.to_radians();
        let lat = lat_deg.to_radians();

        let mut dlon = lon - self.lon0;
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }

        let e = self.e;
        let esin = e * lat.sin();
        let y = major
            * ((FRAC_PI_4 + lat / 2.0).tan() * ((1.0 - esin) / (1.0 + esin)).powf(e / 2.0)).ln();
        if !y.is_finite() {
            return Err(ProjectionError::DomainError(
                "mercator: non-finite y near the pole".into(),
            ));
        }
        let x = major * dlon;
        Ok((x, y))
    }

    pub fn unproject(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let (major, _) = self.ellipsoid.semi_axes();
        let t = (-y / major).exp();
        if !t.is_finite() {
            return Err(ProjectionError::DomainError(
                "mercator: non-finite inverse parameter".into(),
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

        let lon = self.lon0 + x / major;
        Ok((lon.to_degrees(), phi.to_degrees()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_near_equator() {
        let proj = Mercator::new(-90.0, Ellipsoid::WGS84).unwrap();
        for &(lon, lat) in &[(-100.0, 10.0), (-70.0, -20.0), (-90.0, 0.0)] {
            let (x, y) = proj.project(lon, lat).unwrap();
            let (lon2, lat2) = proj.unproject(x, y).unwrap();
            assert!((lon - lon2).abs() < 1e-6);
            assert!((lat - lat2).abs() < 1e-6);
        }
    }

    #[test]
    fn origin_maps_to_zero() {
        let proj = Mercator::new(0.0, Ellipsoid::SPHERE).unwrap();
        let (x, y) = proj.project(0.0, 0.0).unwrap();
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }
}
