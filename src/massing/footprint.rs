//! Cross-section families and the XY outline of a part.

use bevy::prelude::*;
use smallvec::SmallVec;
use std::f32::consts::{PI, TAU};

use super::geom::Cube;
use super::params::N_CYL_SIDES;

/// Scratch buffer for a part outline; sized so a cylinder never spills to the heap.
pub type PolyPoints = SmallVec<[Vec2; 40]>;

/// Cross-section family shared by the main parts of a massing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrossSection {
    Rectangle,
    Polygon { sides: u32 },
    Cylinder,
}

impl CrossSection {
    pub fn from_num_sides(num_sides: u32) -> Self {
        match num_sides {
            4 => CrossSection::Rectangle,
            n if n >= N_CYL_SIDES => CrossSection::Cylinder,
            n => CrossSection::Polygon { sides: n },
        }
    }
}

/// Optional shaping of an N-gon outline.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PolygonShape {
    /// Fraction of the outline clipped away by one flat side (0 = none).
    pub flat_side_amt: f32,
    /// Chamfer factor of a doubled-side outline (0 = regular polygon).
    pub alt_step_factor: f32,
    /// Rotate the outline by half a side.
    pub half_offset: bool,
    pub start_angle: f32,
}

/// Outline of `cube` for the given family, counter-clockwise, spanning the cube's XY extent.
pub fn calc_poly_pts(cube: &Cube, num_sides: u32, shape: &PolygonShape, out: &mut PolyPoints) {
    out.clear();

    match CrossSection::from_num_sides(num_sides) {
        CrossSection::Rectangle => {
            out.extend(cube.xy_corners(0.0).iter().map(|p| p.truncate()));
        }
        CrossSection::Cylinder => {
            let c = cube.xy_center();
            let (rx, ry) = (0.5 * cube.dx(), 0.5 * cube.dy());
            for i in 0..N_CYL_SIDES {
                let a = TAU * i as f32 / N_CYL_SIDES as f32;
                out.push(Vec2::new(c.x + rx * a.cos(), c.y + ry * a.sin()));
            }
        }
        CrossSection::Polygon { sides } => {
            let offset = shape.start_angle;
            if shape.alt_step_factor > 0.0 && sides % 2 == 0 {
                let base_n = sides / 2;
                let step = TAU / base_n as f32;
                let delta = shape.alt_step_factor * PI / (2.0 * base_n as f32);
                let half = if shape.half_offset { 0.5 * step } else { 0.0 };

                for i in 0..base_n {
                    let a = offset + half + step * i as f32;
                    out.push(Vec2::from_angle(a - delta));
                    out.push(Vec2::from_angle(a + delta));
                }
            } else {
                let step = TAU / sides as f32;
                let half = if shape.half_offset { 0.5 * step } else { 0.0 };
                for i in 0..sides {
                    out.push(Vec2::from_angle(offset + half + step * i as f32));
                }
            }

            if shape.flat_side_amt > 0.0 {
                clip_below_y(out, 1.0 - 2.0 * shape.flat_side_amt.min(0.45));
            }
            fit_to_cube(out, cube);
        }
    }
}

/// Keep the part of a convex polygon with `y <= limit`.
fn clip_below_y(pts: &mut PolyPoints, limit: f32) {
    let src = pts.clone();
    pts.clear();

    for i in 0..src.len() {
        let a = src[i];
        let b = src[(i + 1) % src.len()];
        let a_in = a.y <= limit;
        let b_in = b.y <= limit;

        if a_in {
            pts.push(a);
        }
        if a_in != b_in {
            let t = (limit - a.y) / (b.y - a.y);
            pts.push(Vec2::new(a.x + t * (b.x - a.x), limit));
        }
    }
}

/// Affinely map the outline's bounding rectangle onto the cube's XY extent.
fn fit_to_cube(pts: &mut PolyPoints, cube: &Cube) {
    let (mut lo, mut hi) = (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN));
    for p in pts.iter() {
        lo = lo.min(*p);
        hi = hi.max(*p);
    }
    let span = (hi - lo).max(Vec2::splat(f32::EPSILON));
    let target_lo = cube.min.truncate();
    let target_span = cube.size().truncate();

    for p in pts.iter_mut() {
        *p = target_lo + (*p - lo) / span * target_span;
    }
}

/// Crossing-number point-in-polygon test; works for concave outlines too.
pub fn point_in_polygon(p: Vec2, pts: &[Vec2]) -> bool {
    let mut inside = false;
    let n = pts.len();
    let mut j = n.wrapping_sub(1);

    for i in 0..n {
        let (a, b) = (pts[i], pts[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Closest point on segment `a-b` to `p`.
pub fn closest_pt_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Distance from `p` to the nearest outline edge, with that edge's index.
pub fn nearest_edge(p: Vec2, pts: &[Vec2]) -> (f32, usize) {
    let mut best = (f32::MAX, 0);
    for i in 0..pts.len() {
        let q = closest_pt_on_segment(p, pts[i], pts[(i + 1) % pts.len()]);
        let d = p.distance(q);
        if d < best.0 {
            best = (d, i);
        }
    }
    best
}

/// Outward normal of edge `i` of a counter-clockwise outline.
pub fn edge_normal(pts: &[Vec2], i: usize) -> Vec2 {
    let e = pts[(i + 1) % pts.len()] - pts[i];
    Vec2::new(e.y, -e.x).normalize_or_zero()
}

/// Inside a convex outline, or within `radius` of its boundary.
pub fn point_in_convex_polygon_expanded(p: Vec2, pts: &[Vec2], radius: f32) -> bool {
    if point_in_polygon(p, pts) {
        return true;
    }
    radius > 0.0 && nearest_edge(p, pts).0 <= radius
}
