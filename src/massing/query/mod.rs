//! Read-only geometric queries against a finished massing.
//!
//! All queries take world-space input, move it into the massing's local frame,
//! and move any output position or normal back. They take `&self`, keep their
//! scratch buffers on the stack, and may run concurrently from any number of threads.

mod collision;
mod containment;
mod ray;

pub use collision::SphereCollision;
pub use ray::{HitKind, RayHit};

/// Penetration depth below which a sphere is treated as resting, not colliding.
pub const COLLISION_EPS: f32 = 1.0e-4;

/// Correction passes per `resolve` call, so a push out of one part that lands in
/// another is corrected before returning.
pub const MAX_RESOLVE_PASSES: usize = 8;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::massing::building::{BuildingKind, Massing};
    use crate::massing::generator::generate_massing;
    use crate::massing::geom::Cube;
    use crate::massing::interior::NoInterior;
    use crate::massing::params::BuildingParams;
    use crate::massing::rng::BuildingRng;
    use bevy::prelude::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn massing_is_shareable() {
        assert_send_sync::<Massing>();
        assert_send_sync::<SphereCollision>();
        assert_send_sync::<RayHit>();
    }

    #[test]
    fn queries_agree_across_threads() {
        let lot = Cube::from_bounds(0.0, 30.0, 0.0, 24.0, 0.0, 36.0);
        let params = BuildingParams::default();
        let massings: Vec<Massing> = (0..16)
            .map(|s| {
                let mut rng = BuildingRng::from_seeds(s, 5);
                generate_massing(BuildingKind::Office, lot, &params, &mut rng, &mut NoInterior).unwrap()
            })
            .collect();

        let sample = |m: &Massing| {
            let mut out = Vec::new();
            for i in 0..200 {
                let f = i as f32;
                let p = Vec3::new((f * 1.7) % 32.0 - 1.0, (f * 2.3) % 26.0 - 1.0, (f * 0.9) % 40.0);
                out.push((
                    m.contains(p, 0.5),
                    m.resolve(p, p + Vec3::Z, 0.5, false),
                    m.trace(p + Vec3::splat(50.0), p, false),
                ));
            }
            out
        };
        let expected: Vec<_> = massings.iter().map(sample).collect();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| massings.iter().map(sample).collect::<Vec<_>>()))
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), expected);
            }
        });
    }
}
