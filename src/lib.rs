//! Urban Massing - procedural building massing with real-time geometric queries.
//!
//! The [`massing`] module is the engine-independent core (apart from Bevy's math
//! types). The remaining modules make up the `massing_viewer` binary.

pub mod camera;
pub mod massing;
pub mod simulation;
pub mod ui;
