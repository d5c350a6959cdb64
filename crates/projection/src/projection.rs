//! The tagged-variant [`Projection`] contract shared by every concrete
//! projection, plus input validation and singularity nudging.

use crate::albers::Albers;
use crate::ellipsoid::Ellipsoid;
use crate::error::ProjectionError;
use crate::identity::Identity;
use crate::lambert::LambertConformal;
use crate::mercator::Mercator;
use crate::stereographic::Stereographic;

/// Tolerance used by [`Projection::equal`] and by the singularity nudge.
pub const TOLERANCE: f64 = 1e-6;

/// A cartographic projection: one of five supported families, dispatched by
/// `match` rather than virtual dispatch, so adding a variant is a compiler
/// error at every call site until it's handled rather than a silent gap in
/// a trait-object registry.
#[derive(Debug, Clone)]
pub enum Projection {
    Lambert(LambertConformal),
    Mercator(Mercator),
    Stereographic(Stereographic),
    Albers(Albers),
    Identity(Identity),
}

impl Projection {
    /// The reference ellipsoid this projection was built on.
    pub fn ellipsoid(&self) -> Ellipsoid {
        match self {
            Projection::Lambert(p) => p.ellipsoid(),
            Projection::Mercator(p) => p.ellipsoid(),
            Projection::Stereographic(p) => p.ellipsoid(),
            Projection::Albers(p) => p.ellipsoid(),
            Projection::Identity(p) => p.ellipsoid(),
        }
    }

    /// A short discriminator, useful for log messages and grid headers.
    pub fn name(&self) -> &'static str {
        match self {
            Projection::Lambert(_) => "lcc",
            Projection::Mercator(_) => "mercator",
            Projection::Stereographic(_) => "stereographic",
            Projection::Albers(_) => "albers",
            Projection::Identity(_) => "lonlat",
        }
    }

    /// Project geographic coordinates (degrees) to planar (x, y) meters.
    ///
    /// Fails with [`ProjectionError::DomainError`] if the input is
    /// non-finite or outside `[-180, 180] x [-90, 90]`. Inputs within
    /// [`TOLERANCE`] of a pole or the anti-meridian are nudged toward the
    /// interior of the valid domain first, so that round-tripping recovers
    /// the original longitude rather than an arbitrary value picked by the
    /// singularity.
    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Result<(f64, f64), ProjectionError> {
        if !lon_deg.is_finite() || !lat_deg.is_finite() {
            return Err(ProjectionError::DomainError(format!(
                "non-finite input ({lon_deg}, {lat_deg})"
            )));
        }
        if !(-180.0..=180.0).contains(&lon_deg) || !(-90.0..=90.0).contains(&lat_deg) {
            return Err(ProjectionError::DomainError(format!(
                "input ({lon_deg}, {lat_deg}) outside [-180, 180] x [-90, 90]"
            )));
        }

        let (lon, lat) = self.nudge(lon_deg, lat_deg);
        match self {
            Projection::Lambert(p) => p.project(lon, lat),
            Projection::Mercator(p) => p.project(lon, lat),
            Projection::Stereographic(p) => p.project(lon, lat),
            Projection::Albers(p) => p.project(lon, lat),
            Projection::Identity(p) => p.project(lon, lat),
        }
    }

    /// Unproject planar (x, y) meters back to geographic coordinates (degrees).
    pub fn unproject(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ProjectionError::DomainError(format!(
                "non-finite input ({x}, {y})"
            )));
        }
        match self {
            Projection::Lambert(p) => p.unproject(x, y),
            Projection::Mercator(p) => p.unproject(x, y),
            Projection::Stereographic(p) => p.unproject(x, y),
            Projection::Albers(p) => p.unproject(x, y),
            Projection::Identity(p) => p.unproject(x, y),
        }
    }

    /// Whether two projections describe the same transform, within
    /// [`TOLERANCE`] on every parameter that affects `project`/`unproject`.
    ///
    /// Implemented by sampling a handful of probe points rather than
    /// comparing internal fields, so it stays correct regardless of how a
    /// variant caches its derived constants.
    pub fn equal(&self, other: &Projection) -> bool {
        if self.name() != other.name() {
            return false;
        }
        let (a1, a2) = self.ellipsoid().semi_axes();
        let (b1, b2) = other.ellipsoid().semi_axes();
        if (a1 - b1).abs() > TOLERANCE || (a2 - b2).abs() > TOLERANCE {
            return false;
        }
        const PROBES: [(f64, f64); 4] = [(-100.0, 35.0), (10.0, 60.0), (-170.0, -10.0), (0.0, 0.0)];
        PROBES.iter().all(|&(lon, lat)| {
            match (self.project(lon, lat), other.project(lon, lat)) {
                (Ok((x1, y1)), Ok((x2, y2))) => (x1 - x2).abs() < 1.0 && (y1 - y2).abs() < 1.0,
                (Err(_), Err(_)) => true,
                _ => false,
            }
        })
    }

    /// Nudge an input within [`TOLERANCE`] of a pole (every variant except
    /// [`Identity`] is singular there) toward the interior of the domain, so
    /// the longitude is preserved on round-trip instead of collapsing to the
    /// central meridian.
    fn nudge(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        if matches!(self, Projection::Identity(_)) {
            return (lon_deg, lat_deg);
        }
        let eps = TOLERANCE * 1e3; // a coarser nudge than the comparison tolerance
        let lat = if lat_deg >= 90.0 - eps {
            90.0 - eps
        } else if lat_deg <= -90.0 + eps {
            -90.0 + eps
        } else {
            lat_deg
        };
        // Anti-meridian: nudge a point sitting exactly on +/-180 degrees a
        // hair toward the interior so the wraparound in `dlon` always picks
        // the same branch.
        let lon = if (lon_deg - 180.0).abs() < eps {
            180.0 - eps
        } else if (lon_deg + 180.0).abs() < eps {
            -180.0 + eps
        } else {
            lon_deg
        };
        (lon, lat)
    }
}
