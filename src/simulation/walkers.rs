//! Demo walkers: spheres that fall onto the massings and wander across roofs and streets.
//!
//! Movement only integrates velocity. Every push out of a building comes from
//! [`SphereCollider`] resolution, and walkers read the contact normal back to
//! decide whether they are standing on something.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::massing::plugin::from_massing_space;
use crate::massing::{BuildingMassings, ResolveColliders, SphereCollider};
use crate::simulation::simulation_running;

pub struct WalkerPlugin;

impl Plugin for WalkerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WalkerConfig>()
            .init_resource::<WalkersSpawned>()
            .add_systems(
                Update,
                (
                    spawn_walkers.run_if(should_spawn_walkers),
                    (walker_wander, walker_movement).chain().run_if(simulation_running),
                )
                    .chain()
                    .before(ResolveColliders),
            )
            .add_systems(Update, walker_contacts.after(ResolveColliders));
    }
}

#[derive(Resource)]
pub struct WalkerConfig {
    pub count: usize,
    pub radius: f32,
    pub speed: f32,
    pub gravity: f32,
    /// Seconds between heading changes.
    pub wander_interval: f32,
    /// Height above a building's top at which walkers are dropped.
    pub drop_height: f32,
    pub seed: u64,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            count: 40,
            radius: 0.4,
            speed: 1.4,
            gravity: 9.81,
            wander_interval: 3.0,
            drop_height: 5.0,
            seed: 88888,
        }
    }
}

#[derive(Resource, Default)]
pub struct WalkersSpawned(pub bool);

/// A wandering sphere. Velocity is in Bevy world space.
#[derive(Component)]
pub struct Walker {
    pub radius: f32,
    pub velocity: Vec3,
    pub heading: f32,
    pub grounded: bool,
    pub wander_timer: f32,
    pub rng: StdRng,
}

fn should_spawn_walkers(massings: Res<BuildingMassings>, spawned: Res<WalkersSpawned>) -> bool {
    massings.generated && !spawned.0
}

fn spawn_walkers(
    mut commands: Commands,
    config: Res<WalkerConfig>,
    massings: Res<BuildingMassings>,
    mut spawned: ResMut<WalkersSpawned>,
) {
    spawned.0 = true;
    if massings.massings.is_empty() {
        warn!("No massings to drop walkers onto");
        return;
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    for i in 0..config.count {
        let m = &massings.massings[rng.gen_range(0..massings.massings.len())];
        let bc = m.bcube;
        let p = Vec3::new(
            rng.gen_range(bc.min.x..bc.max.x),
            rng.gen_range(bc.min.y..bc.max.y),
            bc.max.z + config.drop_height,
        );

        let mut collider = SphereCollider::new(config.radius);
        // One in four only slides along walls.
        collider.xy_only = i % 4 == 3;

        commands.spawn((
            Transform::from_translation(from_massing_space(p)),
            collider,
            Walker {
                radius: config.radius,
                velocity: Vec3::ZERO,
                heading: rng.gen_range(0.0..std::f32::consts::TAU),
                grounded: false,
                wander_timer: rng.gen_range(0.0..config.wander_interval),
                rng: StdRng::seed_from_u64(config.seed ^ (i as u64 + 1)),
            },
        ));
    }

    info!("Spawned {} walkers", config.count);
}

fn walker_wander(mut walkers: Query<&mut Walker>, config: Res<WalkerConfig>, time: Res<Time>) {
    for mut walker in &mut walkers {
        walker.wander_timer -= time.delta_secs();
        if walker.wander_timer > 0.0 {
            continue;
        }
        walker.wander_timer = config.wander_interval;
        let turn = walker.rng.gen_range(-1.2..1.2);
        walker.heading += turn;
    }
}

fn walker_movement(
    mut walkers: Query<(&mut Transform, &mut Walker, &SphereCollider)>,
    config: Res<WalkerConfig>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();

    for (mut transform, mut walker, collider) in &mut walkers {
        let dir = Vec3::new(walker.heading.cos(), 0.0, walker.heading.sin());
        walker.velocity.x = dir.x * config.speed;
        walker.velocity.z = dir.z * config.speed;
        // Gravity applies even when grounded, so supported walkers keep touching
        // their support and get a contact every frame.
        walker.velocity.y -= config.gravity * dt;

        let mut p = transform.translation + walker.velocity * dt;
        // Street level. Wall-sliding walkers get no support from tops and stay on it.
        p.y = p.y.max(walker.radius);
        if collider.xy_only {
            p.y = walker.radius;
        }
        transform.translation = p;
    }
}

fn walker_contacts(mut walkers: Query<(&Transform, &mut Walker, &SphereCollider)>) {
    for (transform, mut walker, collider) in &mut walkers {
        let on_street = transform.translation.y <= walker.radius + 1.0e-3;
        let support = collider.contact.is_some_and(|n| n.z > 0.5);
        walker.grounded = on_street || support;
        if walker.grounded {
            walker.velocity.y = 0.0;
        }

        // Turn away from walls.
        if let Some(n) = collider.contact.filter(|n| n.z <= 0.5) {
            let away = from_massing_space(n);
            walker.heading = away.z.atan2(away.x);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::massing::MassingPlugin;
    use std::time::Duration;

    #[test]
    fn walkers_come_to_rest() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(MassingPlugin)
            .add_plugins(WalkerPlugin);
        // Standing still isolates falling and landing from wandering.
        app.insert_resource(WalkerConfig {
            count: 12,
            speed: 0.0,
            ..default()
        });

        // Fixed steps of 1/30 s: far longer than a drop from the tallest demo building.
        app.insert_resource(bevy::time::TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
            1.0 / 30.0,
        )));
        for _ in 0..900 {
            app.update();
        }

        let mut query = app.world_mut().query::<(&Transform, &Walker)>();
        let walkers: Vec<_> = query.iter(app.world()).collect();
        assert_eq!(walkers.len(), 12);
        for (transform, walker) in &walkers {
            assert!(transform.translation.is_finite());
            assert!(transform.translation.y >= walker.radius - 1.0e-3);
        }
        // A walker caught on a roof edge may still be sliding off.
        let grounded = walkers.iter().filter(|(_, w)| w.grounded).count();
        assert!(grounded >= 9, "{grounded} of 12 grounded");
    }
}
