//! Bevy integration: generates the configured lots once and resolves sphere colliders
//! against the published massings every frame.

use bevy::prelude::*;

use super::building::{BuildingKind, Massing};
use super::generator::generate_massing;
use super::geom::Cube;
use super::interior::NoInterior;
use super::params::BuildingParams;
use super::rng::BuildingRng;

pub struct MassingPlugin;

impl Plugin for MassingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MassingConfig>()
            .init_resource::<BuildingMassings>()
            .add_systems(
                Update,
                (
                    generate_massings.run_if(should_generate_massings),
                    resolve_sphere_colliders.in_set(ResolveColliders),
                )
                    .chain(),
            );
    }
}

/// Systems that move [`SphereCollider`] entities should run before this set.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolveColliders;

/// One building lot, in massing space (Z-up). The footprint's Z range bounds the
/// building height.
#[derive(Clone, Debug)]
pub struct BuildingLot {
    pub footprint: Cube,
    pub kind: BuildingKind,
}

#[derive(Resource, Clone, Debug)]
pub struct MassingConfig {
    /// Base seed; lot `i` is generated from `(seed, i)`.
    pub seed: u32,
    pub lots: Vec<BuildingLot>,
    pub params: BuildingParams,
}

impl Default for MassingConfig {
    fn default() -> Self {
        Self {
            seed: 31415,
            lots: demo_block(),
            params: BuildingParams::default(),
        }
    }
}

/// A 4x3 block: a row of houses in front, offices behind.
fn demo_block() -> Vec<BuildingLot> {
    let mut lots = Vec::new();
    for i in 0..4 {
        let x = i as f32 * 28.0;
        lots.push(BuildingLot {
            footprint: Cube::from_bounds(x, x + 16.0, 0.0, 14.0, 0.0, 12.0),
            kind: BuildingKind::House,
        });
        for j in 1..3 {
            let y = j as f32 * 36.0;
            lots.push(BuildingLot {
                footprint: Cube::from_bounds(x, x + 24.0, y, y + 28.0, 0.0, 40.0 + 20.0 * j as f32),
                kind: BuildingKind::Office,
            });
        }
    }
    lots
}

/// Fully generated massings, published once every lot has been processed.
#[derive(Resource, Default)]
pub struct BuildingMassings {
    pub massings: Vec<Massing>,
    pub generated: bool,
}

/// A sphere pushed out of building massings each frame.
#[derive(Component, Clone, Debug)]
pub struct SphereCollider {
    pub radius: f32,
    /// Only push horizontally; never stand on tops or roofs.
    pub xy_only: bool,
    /// Massing-space center at the end of the previous frame.
    pub prev: Option<Vec3>,
    /// Massing-space normal of the last collision, if the last frame collided.
    pub contact: Option<Vec3>,
}

impl SphereCollider {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            xy_only: false,
            prev: None,
            contact: None,
        }
    }
}

/// Bevy world (Y-up) to massing space (Z-up).
pub fn to_massing_space(p: Vec3) -> Vec3 {
    Vec3::new(p.x, -p.z, p.y)
}

/// Massing space (Z-up) to Bevy world (Y-up).
pub fn from_massing_space(p: Vec3) -> Vec3 {
    Vec3::new(p.x, p.z, -p.y)
}

fn should_generate_massings(massings: Res<BuildingMassings>) -> bool {
    !massings.generated
}

fn generate_massings(config: Res<MassingConfig>, mut out: ResMut<BuildingMassings>) {
    let mut massings = Vec::with_capacity(config.lots.len());
    let mut skipped = 0;

    for (i, lot) in config.lots.iter().enumerate() {
        let mut rng = BuildingRng::from_seeds(config.seed, i as u32);
        match generate_massing(lot.kind, lot.footprint, &config.params, &mut rng, &mut NoInterior) {
            Ok(m) => massings.push(m),
            Err(e) => {
                warn!("Skipping lot {} ({:?}): {}", i, lot.kind, e);
                skipped += 1;
            }
        }
    }

    let parts: usize = massings.iter().map(|m| m.parts.len()).sum();
    let roofs: usize = massings.iter().map(|m| m.roof_surfaces.len()).sum();
    let details: usize = massings.iter().map(|m| m.details.len()).sum();
    info!(
        "Generated {} massings ({} skipped): {} parts, {} roof surfaces, {} details",
        massings.len(),
        skipped,
        parts,
        roofs,
        details
    );

    out.massings = massings;
    out.generated = true;
}

fn resolve_sphere_colliders(
    massings: Res<BuildingMassings>,
    mut colliders: Query<(&mut Transform, &mut SphereCollider)>,
) {
    if !massings.generated {
        return;
    }

    for (mut transform, mut collider) in &mut colliders {
        let mut pos = to_massing_space(transform.translation);
        let prev = collider.prev.unwrap_or(pos);
        let mut contact: Option<Vec3> = None;

        for m in &massings.massings {
            if let Some(hit) = m.resolve(pos, prev, collider.radius, collider.xy_only) {
                pos = hit.pos;
                contact = Some(contact.unwrap_or(Vec3::ZERO) + hit.normal);
            }
        }

        if contact.is_some() {
            transform.translation = from_massing_space(pos);
        }
        collider.contact = contact.map(|n| n.normalize_or_zero());
        collider.prev = Some(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn space_conversion_round_trips() {
        let p = Vec3::new(1.5, -2.0, 7.25);
        assert_eq!(from_massing_space(to_massing_space(p)), p);
        assert_eq!(to_massing_space(from_massing_space(p)), p);
        // Bevy up is massing up.
        assert_eq!(to_massing_space(Vec3::Y), Vec3::Z);
    }

    #[test]
    fn generates_once_and_resolves_colliders() {
        let mut app = App::new();
        app.add_plugins(MassingPlugin);
        app.update();

        let massings = app.world().resource::<BuildingMassings>();
        assert!(massings.generated);
        assert_eq!(massings.massings.len(), MassingConfig::default().lots.len());

        // Drop a sphere through the top part of the first massing in one frame.
        let m = &massings.massings[0];
        let top = m.top_part().unwrap().cube;
        let above = m.to_world(top.xy_center().extend(m.bcube.max.z + 2.0));
        let start = from_massing_space(above);
        let drop_to = from_massing_space(above - Vec3::Z * (m.bcube.max.z + 1.0));

        let entity = app
            .world_mut()
            .spawn((Transform::from_translation(start), SphereCollider::new(0.5)))
            .id();
        app.update();
        assert!(app.world().get::<SphereCollider>(entity).unwrap().contact.is_none());

        app.world_mut().get_mut::<Transform>(entity).unwrap().translation = drop_to;
        app.update();

        let t = app.world().get::<Transform>(entity).unwrap().translation;
        let c = app.world().get::<SphereCollider>(entity).unwrap();
        assert!(c.contact.unwrap().z > 0.5);
        assert!(t.y >= top.max.z + 0.5 - 1e-3);
        assert_relative_eq!(t.x, start.x, epsilon = 1e-3);
        assert_relative_eq!(t.z, start.z, epsilon = 1e-3);
    }
}
