//! Procedural building massing.
//!
//! - Part generation: tapering stacks, L/T/U/H/+/O splits, and CSG-clipped complex floorplans
//! - Houses with garages, sheds, porches, fences, and basements
//! - Roof families (flat, peaked, hipped, sloped, dome/onion) and rooftop details
//! - Exterior queries (sphere collision, ray trace, containment, overlap)
//!
//! The core is Z-up: parts are axis-aligned boxes with an XY footprint and a Z
//! height range. [`plugin`] converts to and from Bevy's Y-up world.

pub mod building;
pub mod csg;
pub mod details;
pub mod error;
pub mod footprint;
pub mod generator;
pub mod geom;
pub mod house;
pub mod interior;
pub mod params;
pub mod plugin;
pub mod query;
pub mod rng;
pub mod roof;
pub mod rotation;
pub mod split;
pub mod surface;

pub use building::{BuildingKind, Massing, Part, PartRole, RoofType};
pub use error::{MassingError, Result};
pub use footprint::CrossSection;
pub use generator::generate_massing;
pub use geom::Cube;
pub use interior::{InteriorGenerator, NoInterior};
pub use params::BuildingParams;
pub use plugin::{BuildingLot, BuildingMassings, MassingConfig, MassingPlugin, ResolveColliders, SphereCollider};
pub use query::{HitKind, RayHit, SphereCollision};
pub use rng::BuildingRng;
pub use surface::{DetailObject, DetailRole, RoofSurface, SurfaceRole};
