use bevy::prelude::*;

use crate::massing::building::{Massing, Part};
use crate::massing::footprint::{point_in_polygon, CrossSection, PolyPoints};
use crate::massing::geom::Cube;
use crate::massing::surface::SurfaceRole;

/// What a ray hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HitKind {
    Side,
    Roof,
    Detail,
}

/// Closest hit along a segment, as a parametric distance in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub kind: HitKind,
    pub t: f32,
}

/// Relative tolerance, in part heights, for classifying a part hit as a roof hit.
const ROOF_HIT_TOLERANCE: f32 = 0.01;

impl Massing {
    /// Closest intersection of the world-space segment `p1 -> p2` with the massing.
    ///
    /// With `occlusion_only` the first part hit is returned as-is, and roof
    /// surfaces and details are not tested.
    pub fn trace(&self, p1: Vec3, p2: Vec3, occlusion_only: bool) -> Option<RayHit> {
        self.bcube.line_intersect(p1, p2)?;
        let (a, b) = (self.to_local(p1), self.to_local(p2));
        let mut scratch = PolyPoints::new();
        let mut best: Option<RayHit> = None;

        for part in &self.parts {
            let Some(t) = self.part_line_intersect(part, a, b, &mut scratch) else {
                continue;
            };
            let z = a.z + (b.z - a.z) * t;
            let tol = (ROOF_HIT_TOLERANCE * part.cube.dz()).max(1.0e-4);
            let kind = if (z - part.cube.max.z).abs() <= tol {
                HitKind::Roof
            } else {
                HitKind::Side
            };
            if occlusion_only {
                return Some(RayHit { kind, t });
            }
            keep_closest(&mut best, RayHit { kind, t });
        }
        if occlusion_only {
            return None;
        }

        for s in &self.roof_surfaces {
            if let Some(t) = s.line_intersect(a, b) {
                let kind = if s.role == SurfaceRole::Wall {
                    HitKind::Side
                } else {
                    HitKind::Roof
                };
                keep_closest(&mut best, RayHit { kind, t });
            }
        }
        for d in &self.details {
            if let Some((t, _)) = d.cube.line_intersect(a, b) {
                keep_closest(&mut best, RayHit { kind: HitKind::Detail, t });
            }
        }
        best
    }

    /// Entry parameter of local segment `a -> b` into one part; 0 if `a` starts inside.
    fn part_line_intersect(&self, part: &Part, a: Vec3, b: Vec3, scratch: &mut PolyPoints) -> Option<f32> {
        let c = &part.cube;
        let (t_box, _) = c.line_intersect(a, b)?;

        match self.part_section(part) {
            CrossSection::Rectangle => Some(t_box),
            CrossSection::Cylinder => ellipse_prism_intersect(c, a, b),
            CrossSection::Polygon { .. } => {
                self.part_polygon(part, scratch);
                polygon_prism_intersect(c, &scratch[..], a, b)
            }
        }
    }
}

fn keep_closest(best: &mut Option<RayHit>, hit: RayHit) {
    if best.map_or(true, |h| hit.t < h.t) {
        *best = Some(hit);
    }
}

/// Entry into the vertical prism over a convex outline, spanning `c`'s Z range.
fn polygon_prism_intersect(c: &Cube, pts: &[Vec2], a: Vec3, b: Vec3) -> Option<f32> {
    let d = b - a;
    if a.z >= c.min.z && a.z <= c.max.z && point_in_polygon(a.truncate(), pts) {
        return Some(0.0);
    }
    let mut best: Option<f32> = None;
    let mut keep = |t: f32| {
        if best.map_or(true, |cur| t < cur) {
            best = Some(t);
        }
    };

    if d.z.abs() > f32::EPSILON {
        for z in [c.max.z, c.min.z] {
            let t = (z - a.z) / d.z;
            if (0.0..=1.0).contains(&t) && point_in_polygon((a + d * t).truncate(), pts) {
                keep(t);
            }
        }
    }

    let (a2, d2) = (a.truncate(), d.truncate());
    for i in 0..pts.len() {
        let (p, q) = (pts[i], pts[(i + 1) % pts.len()]);
        let e = q - p;
        let denom = d2.perp_dot(e);
        if denom.abs() < 1.0e-12 {
            continue;
        }
        let w = p - a2;
        let t = w.perp_dot(e) / denom;
        let u = w.perp_dot(d2) / denom;
        if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
            continue;
        }
        let z = a.z + d.z * t;
        if z >= c.min.z && z <= c.max.z {
            keep(t);
        }
    }
    best
}

/// Entry into the vertical elliptic cylinder inscribed in `c`.
///
/// Scaling XY by the inverse radii turns the ellipse into a unit circle, where the
/// side hit is a quadratic; this is exact for elliptical as well as circular parts.
fn ellipse_prism_intersect(c: &Cube, a: Vec3, b: Vec3) -> Option<f32> {
    let radii = 0.5 * c.size().truncate();
    let ctr = c.xy_center();
    let d = b - a;
    let sa = (a.truncate() - ctr) / radii;
    let sd = d.truncate() / radii;
    let inside_xy = |p: Vec2| p.length_squared() <= 1.0;
    let z_in = |z: f32| z >= c.min.z && z <= c.max.z;

    if z_in(a.z) && inside_xy(sa) {
        return Some(0.0);
    }
    let mut best: Option<f32> = None;
    let mut keep = |t: f32| {
        if best.map_or(true, |cur| t < cur) {
            best = Some(t);
        }
    };

    if d.z.abs() > f32::EPSILON {
        for z in [c.max.z, c.min.z] {
            let t = (z - a.z) / d.z;
            if (0.0..=1.0).contains(&t) && inside_xy(sa + sd * t) {
                keep(t);
            }
        }
    }

    let qa = sd.length_squared();
    if qa > 1.0e-12 {
        let qb = 2.0 * sa.dot(sd);
        let qc = sa.length_squared() - 1.0;
        let disc = qb * qb - 4.0 * qa * qc;
        if disc >= 0.0 {
            let t = (-qb - disc.sqrt()) / (2.0 * qa);
            if (0.0..=1.0).contains(&t) && z_in(a.z + d.z * t) {
                keep(t);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::massing::building::BuildingKind;
    use crate::massing::params::{BuildingParams, N_CYL_SIDES};
    use crate::massing::roof::{add_peaked_roof, PeakedRoofSpec};
    use approx::assert_relative_eq;

    fn peaked_building() -> Massing {
        let c = Cube::from_bounds(0.0, 10.0, 0.0, 10.0, 0.0, 3.0);
        let mut m = Massing::new(BuildingKind::Office, c);
        m.add_main_part(c).unwrap();
        let spec = PeakedRoofSpec {
            ridge_dim: Some(1),
            max_dz: 1.0,
            extend: None,
        };
        add_peaked_roof(&mut m, 0, &BuildingParams::default(), spec).unwrap();
        m
    }

    #[test]
    fn vertical_ray_hits_the_ridge() {
        let m = peaked_building();
        let (p1, p2) = (Vec3::new(5.0, 5.0, 10.0), Vec3::new(5.0, 5.0, -10.0));
        let hit = m.trace(p1, p2, false).unwrap();
        assert_eq!(hit.kind, HitKind::Roof);
        assert_relative_eq!(p1.z + (p2.z - p1.z) * hit.t, 4.0, epsilon = 1e-3);
    }

    #[test]
    fn occlusion_stops_at_the_part() {
        let m = peaked_building();
        let hit = m
            .trace(Vec3::new(5.0, 5.0, 10.0), Vec3::new(5.0, 5.0, -10.0), true)
            .unwrap();
        assert_relative_eq!(hit.t, 0.35, epsilon = 1e-5);
        assert_eq!(hit.kind, HitKind::Roof);

        let side = m
            .trace(Vec3::new(-5.0, 5.0, 1.0), Vec3::new(5.0, 5.0, 1.0), true)
            .unwrap();
        assert_eq!(side.kind, HitKind::Side);
        assert_relative_eq!(side.t, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn misses_return_none() {
        let m = peaked_building();
        assert!(m
            .trace(Vec3::new(20.0, 5.0, 10.0), Vec3::new(20.0, 5.0, -10.0), false)
            .is_none());
        assert!(m
            .trace(Vec3::new(-5.0, 5.0, 8.0), Vec3::new(15.0, 5.0, 8.0), false)
            .is_none());
    }

    #[test]
    fn ellipse_side_hit_is_exact() {
        let c = Cube::from_bounds(0.0, 20.0, 0.0, 10.0, 0.0, 5.0);
        let mut m = Massing::new(BuildingKind::Office, c);
        m.add_main_part(c).unwrap();
        m.num_sides = N_CYL_SIDES;

        let hit = m
            .trace(Vec3::new(-10.0, 5.0, 2.0), Vec3::new(30.0, 5.0, 2.0), false)
            .unwrap();
        assert_relative_eq!(hit.t, 0.25, epsilon = 1e-5);
        assert_eq!(hit.kind, HitKind::Side);

        // Clips the bounding box corner but misses the ellipse.
        assert!(m
            .trace(Vec3::new(-1.0, 1.0, 2.0), Vec3::new(1.0, -1.0, 2.0), false)
            .is_none());
    }

    #[test]
    fn rotated_trace_matches_rotated_geometry() {
        let mut m = peaked_building();
        m.apply_rotation(std::f32::consts::FRAC_PI_2).unwrap();
        // A quarter turn about the center maps the square onto itself.
        let hit = m
            .trace(Vec3::new(-5.0, 2.0, 1.0), Vec3::new(5.0, 2.0, 1.0), false)
            .unwrap();
        assert_relative_eq!(hit.t, 0.5, epsilon = 1e-4);
    }
}
