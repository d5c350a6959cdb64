//! Identity longitude/latitude "projection".
//!
//! Used for grids that are natively defined in geographic coordinates: the
//! planar (x, y) plane is longitude/latitude in degrees, so `project` and
//! `unproject` are the identity function (and its inverse).

use crate::ellipsoid::Ellipsoid;
use crate::error::ProjectionError;

/// Identity lon/lat "projection": planar coordinates are degrees.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    ellipsoid: Ellipsoid,
}

impl Identity {
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        Self { ellipsoid }
    }

    pub fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Result<(f64, f64), ProjectionError> {
        Ok((lon_deg, lat_deg))
    }

    pub fn unproject(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        Ok((x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_roundtrips_exactly() {
        let proj = Identity::new(Ellipsoid::WGS84);
        let (x, y) = proj.project(-95.5, 35.5).unwrap();
        assert_eq!((x, y), (-95.5, 35.5));
        assert_eq!(proj.unproject(x, y).unwrap(), (-95.5, 35.5));
    }
}
