use bevy::prelude::*;

use super::{COLLISION_EPS, MAX_RESOLVE_PASSES};
use crate::massing::building::{Massing, Part};
use crate::massing::footprint::{
    closest_pt_on_segment, edge_normal, nearest_edge, point_in_polygon, CrossSection, PolyPoints,
};
use crate::massing::geom::Cube;
use crate::massing::surface::SurfaceRole;

/// Relative radius difference below which an elliptical part is treated as a circle.
const NEAR_CIRCULAR: f32 = 0.01;
/// Smallest step taken when walking a wedged sphere out of the massing.
const ESCAPE_STEP: f32 = 0.1;

/// Corrected sphere center and the summed surface normal of everything it was pushed out of.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereCollision {
    pub pos: Vec3,
    pub normal: Vec3,
}

/// Accumulates corrections over one `resolve` call.
struct Contact {
    normal: Vec3,
    hit: bool,
}

impl Contact {
    fn push(&mut self, n: Vec3) {
        self.normal += n;
        self.hit = true;
    }
}

impl Massing {
    /// Push a sphere moving from `prev` to `pos` (world space) out of the massing.
    ///
    /// Returns `None` when nothing was touched; the caller keeps `pos` unchanged.
    /// With `xy_only` the sphere is only pushed horizontally and never stood on top
    /// of anything. A part whose interior holds both `prev` and the current center is
    /// skipped; that sphere is inside the building and belongs to the interior
    /// collision code. The test is repeated every pass, so a sphere pushed out of such
    /// a part by a neighbor still collides with its walls.
    pub fn resolve(&self, pos: Vec3, prev: Vec3, radius: f32, xy_only: bool) -> Option<SphereCollision> {
        if !self.bcube.expanded_by(Vec3::splat(radius)).contains_pt(pos) {
            return None;
        }
        let mut p = self.to_local(pos);
        let lprev = self.to_local(prev);
        let mut scratch = PolyPoints::new();
        let mut normal = Vec3::ZERO;
        let mut touched = false;
        let mut settled = false;

        for _ in 0..MAX_RESOLVE_PASSES {
            match self.resolve_pass(&mut p, lprev, radius, xy_only, &mut scratch) {
                Some(n) => {
                    normal += n;
                    touched = true;
                }
                None => {
                    settled = true;
                    break;
                }
            }
        }

        if !touched {
            return None;
        }
        if !settled {
            // Wedged in a gap narrower than the sphere: climb out, or slide out along
            // the summed push for wall-only spheres.
            let dir = if xy_only {
                let d = normal.truncate().normalize_or_zero();
                if d == Vec2::ZERO { Vec3::X } else { d.extend(0.0) }
            } else {
                Vec3::Z
            };
            p = self.escape(p, dir, radius, xy_only, &mut scratch);
            normal += dir;
        }
        Some(SphereCollision {
            pos: self.to_world(p),
            normal: self.dir_to_world(normal.normalize_or_zero()),
        })
    }

    /// One correction pass over every part, accessory box, and roof surface. Returns
    /// the summed normal of everything that moved the sphere.
    fn resolve_pass(
        &self,
        p: &mut Vec3,
        prev: Vec3,
        radius: f32,
        xy_only: bool,
        scratch: &mut PolyPoints,
    ) -> Option<Vec3> {
        let mut contact = Contact {
            normal: Vec3::ZERO,
            hit: false,
        };
        for part in &self.parts {
            if self.strictly_inside(part, prev, scratch) && self.strictly_inside(part, *p, scratch) {
                continue;
            }
            if let Some(n) = self.collide_part(part, p, prev, radius, xy_only, scratch) {
                contact.push(n);
            }
        }
        let boxes = self
            .fences
            .iter()
            .chain(self.driveway.iter())
            .chain(self.details.iter().map(|d| &d.cube));
        for c in boxes {
            if let Some(n) = collide_box(c, p, prev, radius, xy_only) {
                contact.push(n);
            }
        }
        if !xy_only {
            self.stand_on_roof(p, prev, radius, &mut contact);
        }
        contact.hit.then_some(contact.normal)
    }

    /// Step from `p` along `dir` until a pass at rest leaves the sphere where it is.
    ///
    /// The walk is bounded: once the sphere has moved a bcube diagonal plus a few radii,
    /// it is clear of all geometry.
    fn escape(&self, p: Vec3, dir: Vec3, radius: f32, xy_only: bool, scratch: &mut PolyPoints) -> Vec3 {
        let step = radius.max(ESCAPE_STEP);
        let reach = self.bcube.size().length() + 6.0 * radius;
        let max_steps = (reach / step).ceil() as usize + 1;

        let mut q = p;
        for _ in 0..max_steps {
            q += dir * step;
            if self.parts.iter().any(|part| self.strictly_inside(part, q, scratch)) {
                continue;
            }
            let mut rest = q;
            if self.resolve_pass(&mut rest, q, radius, xy_only, scratch).is_none() {
                break;
            }
        }
        q
    }

    fn strictly_inside(&self, part: &Part, p: Vec3, scratch: &mut PolyPoints) -> bool {
        part.cube.contains_pt_strict(p) && self.part_contains(part, p, 0.0, scratch)
    }

    fn collide_part(
        &self,
        part: &Part,
        p: &mut Vec3,
        prev: Vec3,
        radius: f32,
        xy_only: bool,
        scratch: &mut PolyPoints,
    ) -> Option<Vec3> {
        let c = &part.cube;
        match self.part_section(part) {
            CrossSection::Rectangle => collide_box(c, p, prev, radius, xy_only),
            CrossSection::Cylinder if (c.dx() - c.dy()).abs() <= NEAR_CIRCULAR * c.max_xy_len() => {
                collide_circle(c, p, prev, radius, xy_only)
            }
            CrossSection::Cylinder | CrossSection::Polygon { .. } => {
                self.part_polygon(part, scratch);
                collide_prism(c, &scratch[..], p, prev, radius, xy_only)
            }
        }
    }

    /// Support on sloped and flat roof surfaces for a sphere coming down from above.
    fn stand_on_roof(&self, p: &mut Vec3, prev: Vec3, radius: f32, contact: &mut Contact) {
        for s in &self.roof_surfaces {
            let Some(z) = s.z_at(p.truncate()) else {
                continue;
            };
            if p.z - radius >= z - COLLISION_EPS {
                continue;
            }
            // Hatches only hold a sphere that was fully above the opening.
            let above = if s.role == SurfaceRole::AccessHatch {
                prev.z - radius >= z - COLLISION_EPS
            } else {
                p.z.max(prev.z) >= z
            };
            if !above {
                continue;
            }
            p.z = z + radius;
            let n = s.normal();
            contact.push(if n.z < 0.0 { -n } else { n });
        }
    }
}

/// True if a sphere moving down from `prev` lands on a top face at `top`.
fn lands_on_top(top: f32, p: Vec3, prev: Vec3, radius: f32) -> bool {
    prev.z - radius >= top - COLLISION_EPS && p.z - radius < top - COLLISION_EPS
}

/// Box sphere test with position correction, standing on top when arriving from above.
pub(crate) fn collide_box(c: &Cube, p: &mut Vec3, prev: Vec3, radius: f32, xy_only: bool) -> Option<Vec3> {
    if xy_only {
        if p.z < c.min.z || p.z > c.max.z {
            return None;
        }
        return collide_rect_xy(c, p, radius);
    }
    if c.contains_pt_xy(p.truncate()) && p.z >= c.min.z && lands_on_top(c.max.z, *p, prev, radius) {
        p.z = c.max.z + radius;
        return Some(Vec3::Z);
    }

    let q = c.closest_pt(*p);
    let d = *p - q;
    let dist = d.length();
    if dist > 0.0 {
        if dist >= radius - COLLISION_EPS {
            return None;
        }
        let n = d / dist;
        *p = q + n * radius;
        return Some(n);
    }

    // Center inside: leave through the nearest side or top face.
    let mut best = (c.max.z - p.z, Vec3::Z);
    for dim in 0..2 {
        for (dir, sign) in [(0, -1.0), (1, 1.0)] {
            let depth = (c.d(dim, dir) - p[dim]) * sign;
            if depth < best.0 {
                let mut n = Vec3::ZERO;
                n[dim] = sign;
                best = (depth, n);
            }
        }
    }
    let (depth, n) = best;
    *p += n * (depth + radius);
    Some(n)
}

fn collide_rect_xy(c: &Cube, p: &mut Vec3, radius: f32) -> Option<Vec3> {
    let xy = p.truncate();
    let q = xy.clamp(c.min.truncate(), c.max.truncate());
    let d = xy - q;
    let dist = d.length();
    if dist > 0.0 {
        if dist >= radius - COLLISION_EPS {
            return None;
        }
        let n = d / dist;
        let out = q + n * radius;
        p.x = out.x;
        p.y = out.y;
        return Some(n.extend(0.0));
    }
    let mut best = (f32::MAX, Vec2::ZERO);
    for dim in 0..2 {
        for (dir, sign) in [(0, -1.0), (1, 1.0)] {
            let depth = (c.d(dim, dir) - xy[dim]) * sign;
            if depth < best.0 {
                let mut n = Vec2::ZERO;
                n[dim] = sign;
                best = (depth, n);
            }
        }
    }
    let (depth, n) = best;
    let out = xy + n * (depth + radius);
    p.x = out.x;
    p.y = out.y;
    Some(n.extend(0.0))
}

/// Vertical circular cylinder inscribed in `c`.
fn collide_circle(c: &Cube, p: &mut Vec3, prev: Vec3, radius: f32, xy_only: bool) -> Option<Vec3> {
    let ctr = c.xy_center();
    let r_cyl = 0.25 * (c.dx() + c.dy());
    let v = p.truncate() - ctr;
    let len = v.length();

    if !xy_only && len <= r_cyl && p.z >= c.min.z && lands_on_top(c.max.z, *p, prev, radius) {
        p.z = c.max.z + radius;
        return Some(Vec3::Z);
    }
    if p.z < c.min.z - radius || p.z > c.max.z || (xy_only && p.z < c.min.z) {
        return None;
    }
    if len >= r_cyl + radius - COLLISION_EPS {
        return None;
    }
    let n = if len > f32::EPSILON { v / len } else { Vec2::X };
    let out = ctr + n * (r_cyl + radius);
    p.x = out.x;
    p.y = out.y;
    Some(n.extend(0.0))
}

/// Vertical prism over a convex counter-clockwise outline, spanning `c`'s Z range.
fn collide_prism(c: &Cube, pts: &[Vec2], p: &mut Vec3, prev: Vec3, radius: f32, xy_only: bool) -> Option<Vec3> {
    let xy = p.truncate();
    let inside = point_in_polygon(xy, pts);

    if !xy_only && inside && p.z >= c.min.z && lands_on_top(c.max.z, *p, prev, radius) {
        p.z = c.max.z + radius;
        return Some(Vec3::Z);
    }
    if p.z < c.min.z - radius || p.z > c.max.z || (xy_only && p.z < c.min.z) {
        return None;
    }

    let (dist, edge) = nearest_edge(xy, pts);
    let q = closest_pt_on_segment(xy, pts[edge], pts[(edge + 1) % pts.len()]);
    let n = if inside {
        edge_normal(pts, edge)
    } else {
        if dist >= radius - COLLISION_EPS {
            return None;
        }
        (xy - q).normalize_or_zero()
    };
    if n == Vec2::ZERO {
        return None;
    }
    let out = q + n * radius;
    p.x = out.x;
    p.y = out.y;
    Some(n.extend(0.0))
}
