//! Hooks for interior layout, which is generated elsewhere from the finished massing.

use super::building::Massing;
use super::rng::BuildingRng;

/// Called by massing generation at fixed points; implementations own the interior data.
pub trait InteriorGenerator {
    /// Called once, after the parts are final and before roofs are added.
    fn generate_interior(&mut self, massing: &Massing, rng: &mut BuildingRng, has_complex_floorplan: bool);

    /// Called once, after geometry and interior are final and before rotation.
    fn generate_exterior_doors(&mut self, massing: &Massing, rng: &mut BuildingRng);
}

/// Generates nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInterior;

impl InteriorGenerator for NoInterior {
    fn generate_interior(&mut self, _: &Massing, _: &mut BuildingRng, _: bool) {}

    fn generate_exterior_doors(&mut self, _: &Massing, _: &mut BuildingRng) {}
}
