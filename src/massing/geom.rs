//! Axis-aligned boxes and the shared numerical predicates used by generation and queries.
//!
//! Everything here is expressed in the massing's local, unrotated, Z-up frame.

use bevy::prelude::*;

/// Tolerance for "touching but not overlapping" comparisons on positions.
pub const GEOM_EPS: f32 = 1.0e-5;

/// An axis-aligned box. `min`/`max` are indexed by dimension (0 = x, 1 = y, 2 = z).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cube {
    pub min: Vec3,
    pub max: Vec3,
}

impl Cube {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_bounds(x1: f32, x2: f32, y1: f32, y2: f32, z1: f32, z2: f32) -> Self {
        Self {
            min: Vec3::new(x1, y1, z1),
            max: Vec3::new(x2, y2, z2),
        }
    }

    /// Degenerate box containing a single point.
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Face coordinate: `dir == 0` selects the low face, anything else the high face.
    #[inline]
    pub fn d(&self, dim: usize, dir: usize) -> f32 {
        if dir == 0 {
            self.min[dim]
        } else {
            self.max[dim]
        }
    }

    #[inline]
    pub fn set_d(&mut self, dim: usize, dir: usize, value: f32) {
        if dir == 0 {
            self.min[dim] = value;
        } else {
            self.max[dim] = value;
        }
    }

    pub fn dx(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn dy(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn dz(&self) -> f32 {
        self.max.z - self.min.z
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn xy_center(&self) -> Vec2 {
        self.center().truncate()
    }

    pub fn xy_area(&self) -> f32 {
        self.dx() * self.dy()
    }

    pub fn volume(&self) -> f32 {
        self.dx() * self.dy() * self.dz()
    }

    pub fn max_xy_len(&self) -> f32 {
        self.dx().max(self.dy())
    }

    pub fn min_xy_len(&self) -> f32 {
        self.dx().min(self.dy())
    }

    pub fn is_strictly_normalized(&self) -> bool {
        self.min.cmplt(self.max).all()
    }

    /// Overlap test that treats shared faces as non-intersecting.
    pub fn intersects_no_adj(&self, other: &Cube) -> bool {
        self.min.cmplt(other.max).all() && self.max.cmpgt(other.min).all()
    }

    /// Overlap test that treats shared faces as intersecting.
    pub fn intersects(&self, other: &Cube) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    pub fn intersects_xy(&self, other: &Cube) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn intersects_xy_no_adj(&self, other: &Cube) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn contains_cube(&self, other: &Cube) -> bool {
        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    pub fn contains_cube_xy(&self, other: &Cube) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
    }

    pub fn contains_pt(&self, p: Vec3) -> bool {
        self.min.cmple(p).all() && self.max.cmpge(p).all()
    }

    pub fn contains_pt_xy(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Strict interior test on all three axes.
    pub fn contains_pt_strict(&self, p: Vec3) -> bool {
        self.min.cmplt(p).all() && self.max.cmpgt(p).all()
    }

    pub fn union_with_cube(&mut self, other: &Cube) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn union_with_pt(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn expanded_by(&self, amount: Vec3) -> Cube {
        Cube::new(self.min - amount, self.max + amount)
    }

    pub fn expanded_by_xy(&self, amount: f32) -> Cube {
        self.expanded_by(Vec3::new(amount, amount, 0.0))
    }

    /// Closest point on (or in) the box to `p`.
    pub fn closest_pt(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min, self.max)
    }

    pub fn closest_dist_sq(&self, p: Vec3) -> f32 {
        p.distance_squared(self.closest_pt(p))
    }

    pub fn sphere_intersects(&self, center: Vec3, radius: f32) -> bool {
        self.closest_dist_sq(center) <= radius * radius
    }

    /// The 4 XY corners at height `z`, in counter-clockwise order.
    pub fn xy_corners(&self, z: f32) -> [Vec3; 4] {
        [
            Vec3::new(self.min.x, self.min.y, z),
            Vec3::new(self.max.x, self.min.y, z),
            Vec3::new(self.max.x, self.max.y, z),
            Vec3::new(self.min.x, self.max.y, z),
        ]
    }

    /// Slab clip of segment `p1 -> p2`; returns the parametric entry/exit range if it hits.
    pub fn line_intersect(&self, p1: Vec3, p2: Vec3) -> Option<(f32, f32)> {
        let dir = p2 - p1;
        let mut tmin = 0.0f32;
        let mut tmax = 1.0f32;

        for dim in 0..3 {
            if dir[dim].abs() < f32::EPSILON {
                if p1[dim] < self.min[dim] || p1[dim] > self.max[dim] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir[dim];
            let mut t1 = (self.min[dim] - p1[dim]) * inv;
            let mut t2 = (self.max[dim] - p1[dim]) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            tmin = tmin.max(t1);
            tmax = tmax.min(t2);
            if tmin > tmax {
                return None;
            }
        }
        Some((tmin, tmax))
    }
}

/// Bounding cube of a point set; `None` for an empty set.
pub fn bounds_of_points(points: impl IntoIterator<Item = Vec3>) -> Option<Cube> {
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let mut bc = Cube::from_point(first);
    for p in iter {
        bc.union_with_pt(p);
    }
    Some(bc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Cube {
        Cube::from_bounds(0.0, 1.0, 0.0, 1.0, 0.0, 1.0)
    }

    #[test]
    fn touching_boxes_do_not_overlap() {
        let a = unit();
        let b = Cube::from_bounds(1.0, 2.0, 0.0, 1.0, 0.0, 1.0);
        assert!(!a.intersects_no_adj(&b));
        assert!(a.intersects(&b));
    }

    #[test]
    fn face_accessors_round_trip() {
        let mut c = unit();
        c.set_d(1, 1, 4.0);
        assert_eq!(c.d(1, 1), 4.0);
        assert_eq!(c.dy(), 4.0);
        assert!(c.is_strictly_normalized());
    }

    #[test]
    fn slab_clip_reports_entry() {
        let c = unit();
        let hit = c.line_intersect(Vec3::new(0.5, 0.5, 3.0), Vec3::new(0.5, 0.5, -1.0));
        let (t0, t1) = hit.expect("vertical segment through the box");
        assert!((t0 - 0.5).abs() < 1e-6);
        assert!((t1 - 0.75).abs() < 1e-6);
        assert!(c
            .line_intersect(Vec3::new(2.0, 0.5, 3.0), Vec3::new(2.0, 0.5, -1.0))
            .is_none());
    }
}
