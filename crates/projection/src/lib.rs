//! Coordinate reference system transformations.
//!
//! Implements map projections from scratch without external dependencies:
//! Lambert conformal conic, Mercator, polar stereographic, Albers
//! equal-area, and the identity lon/lat "projection", all behind the single
//! [`Projection`] tagged-variant contract.

pub mod albers;
pub mod ellipsoid;
pub mod error;
pub mod identity;
pub mod lambert;
pub mod mercator;
pub mod projection;
pub mod stereographic;

pub use albers::Albers;
pub use ellipsoid::{geodetic_to_sphere_latitude, sphere_to_geodetic_latitude, Ellipsoid};
pub use error::ProjectionError;
pub use identity::Identity;
pub use lambert::LambertConformal;
pub use mercator::Mercator;
pub use projection::{Projection, TOLERANCE};
pub use stereographic::{Pole, Stereographic};
