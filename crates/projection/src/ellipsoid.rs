//! Reference ellipsoid and the sphere/spheroid latitude adjuster.

use crate::error::ProjectionError;

/// A reference ellipsoid defined by its semi-major and semi-minor axes, in meters.
///
/// Construction validates that both axes are finite, positive, and that
/// `major >= minor`, per the invariant every projection relies on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    major: f64,
    minor: f64,
}

impl Ellipsoid {
    /// WGS84 reference ellipsoid.
    pub const WGS84: Ellipsoid = Ellipsoid {
        major: 6_378_137.0,
        minor: 6_356_752.314_245,
    };

    /// A perfect sphere using the WGS84 mean radius, used by projections
    /// (e.g. Lambert conformal conic for CONUS weather grids) that are
    /// conventionally defined on a spherical earth.
    pub const SPHERE: Ellipsoid = Ellipsoid {
        major: 6_371_229.0,
        minor: 6_371_229.0,
    };

    /// Construct an ellipsoid from semi-major/semi-minor axes in meters.
    pub fn new(major: f64, minor: f64) -> Result<Self, ProjectionError> {
        if !major.is_finite() || !minor.is_finite() || major <= 0.0 || minor <= 0.0 {
            return Err(ProjectionError::InvalidArgument(format!(
                "ellipsoid axes must be finite and positive, got major={major}, minor={minor}"
            )));
        }
        if major < minor {
            return Err(ProjectionError::InvalidArgument(format!(
                "ellipsoid major axis {major} must be >= minor axis {minor}"
            )));
        }
        Ok(Self { major, minor })
    }

    /// Semi-major and semi-minor axes in meters.
    pub fn semi_axes(&self) -> (f64, f64) {
        (self.major, self.minor)
    }

    /// Eccentricity `sqrt((a^2 - b^2) / a^2)`.
    pub fn eccentricity(&self) -> f64 {
        (1.0 - (self.minor * self.minor) / (self.major * self.major))
            .max(0.0)
            .sqrt()
    }

    /// Whether this ellipsoid is (within floating point tolerance) a sphere.
    pub fn is_sphere(&self) -> bool {
        (self.major - self.minor).abs() < 1e-6
    }
}

/// Corrects a latitude between the WGS84 spheroid and the perfect-sphere
/// approximation some projections are conventionally defined on (e.g. the
/// HRRR/NAM Lambert conformal grids, which are specified on a 6371.229 km
/// sphere despite observations being reported on WGS84).
///
/// `to_sphere` adjusts a WGS84 geodetic latitude to the spherical
/// (geocentric-equivalent) latitude used by the projection; the inverse
/// direction undoes it. This is the latitude adjuster the grid cell-center
/// cache applies when its projection uses a sphere.
pub fn geodetic_to_sphere_latitude(lat_deg: f64, spheroid: &Ellipsoid) -> f64 {
    if spheroid.is_sphere() {
        return lat_deg;
    }
    let (a, b) = spheroid.semi_axes();
    let lat = lat_deg.to_radians();
    let geocentric = ((b * b) / (a * a) * lat.tan()).atan();
    geocentric.to_degrees()
}

/// Inverse of [`geodetic_to_sphere_latitude`]: converts a spherical latitude
/// back to WGS84 geodetic latitude.
pub fn sphere_to_geodetic_latitude(lat_deg: f64, spheroid: &Ellipsoid) -> f64 {
    if spheroid.is_sphere() {
        return lat_deg;
    }
    let (a, b) = spheroid.semi_axes();
    let lat = lat_deg.to_radians();
    let geodetic = ((a * a) / (b * b) * lat.tan()).atan();
    geodetic.to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_axes() {
        assert!(Ellipsoid::new(f64::NAN, 1.0).is_err());
        assert!(Ellipsoid::new(-1.0, 1.0).is_err());
        assert!(Ellipsoid::new(1.0, 2.0).is_err());
    }

    #[test]
    fn wgs84_is_not_a_sphere() {
        assert!(!Ellipsoid::WGS84.is_sphere());
        assert!(Ellipsoid::SPHERE.is_sphere());
    }

    #[test]
    fn latitude_adjuster_roundtrips() {
        let lat = 42.3;
        let sphere_lat = geodetic_to_sphere_latitude(lat, &Ellipsoid::WGS84);
        let back = sphere_to_geodetic_latitude(sphere_lat, &Ellipsoid::WGS84);
        assert!((back - lat).abs() < 1e-9);
    }

    #[test]
    fn latitude_adjuster_is_identity_on_sphere() {
        assert_eq!(
            geodetic_to_sphere_latitude(10.0, &Ellipsoid::SPHERE),
            10.0
        );
    }
}
