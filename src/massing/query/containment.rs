use bevy::prelude::*;

use crate::massing::building::{Massing, Part};
use crate::massing::footprint::{point_in_convex_polygon_expanded, CrossSection, PolyPoints};
use crate::massing::geom::Cube;

/// `c` grown in XY by `rel` of its half-size plus `abs`.
fn expand_xy(c: &Cube, rel: f32, abs: f32) -> Cube {
    let d = 0.5 * rel * c.size().truncate() + Vec2::splat(abs);
    c.expanded_by(d.extend(0.0))
}

impl Massing {
    /// Whether `p` (world space), grown into a vertical cylinder of `xy_radius`, touches any part.
    pub fn contains(&self, p: Vec3, xy_radius: f32) -> bool {
        if !self.bcube.expanded_by_xy(xy_radius).contains_pt(p) {
            return false;
        }
        let lp = self.to_local(p);
        let mut scratch = PolyPoints::new();
        self.parts
            .iter()
            .any(|part| self.part_contains(part, lp, xy_radius, &mut scratch))
    }

    /// Local-frame containment in a single part, Z range included.
    pub(crate) fn part_contains(&self, part: &Part, p: Vec3, xy_radius: f32, scratch: &mut PolyPoints) -> bool {
        p.z >= part.cube.min.z
            && p.z <= part.cube.max.z
            && self.part_contains_xy(part, p.truncate(), xy_radius, scratch)
    }

    pub(crate) fn part_contains_xy(&self, part: &Part, p: Vec2, xy_radius: f32, scratch: &mut PolyPoints) -> bool {
        let c = &part.cube;
        if !c.expanded_by_xy(xy_radius).contains_pt_xy(p) {
            return false;
        }
        match self.part_section(part) {
            CrossSection::Rectangle => true,
            CrossSection::Cylinder => {
                let radii = 0.5 * c.size().truncate() + Vec2::splat(xy_radius);
                ((p - c.xy_center()) / radii).length_squared() <= 1.0
            }
            CrossSection::Polygon { .. } => {
                self.part_polygon(part, scratch);
                point_in_convex_polygon_expanded(p, &scratch[..], xy_radius)
            }
        }
    }

    /// Conservative footprint overlap test between two massings.
    ///
    /// Parts are grown by `expand_rel` of their half-size plus `expand_abs`. Two
    /// unrotated massings are compared box against box; otherwise nine sample points
    /// of every part are tested against the other massing, in both directions, which
    /// can report false positives near concave shapes.
    pub fn overlaps(&self, other: &Massing, expand_rel: f32, expand_abs: f32) -> bool {
        let a = expand_xy(&self.bcube, expand_rel, expand_abs);
        let b = expand_xy(&other.bcube, expand_rel, expand_abs);
        if !a.intersects_xy(&b) {
            return false;
        }
        if !self.is_rotated() && !other.is_rotated() {
            return self.parts.iter().any(|p| {
                let pe = expand_xy(&p.cube, expand_rel, expand_abs);
                other
                    .parts
                    .iter()
                    .any(|q| pe.intersects_xy(&expand_xy(&q.cube, expand_rel, expand_abs)))
            });
        }
        self.samples_inside(other, expand_rel, expand_abs) || other.samples_inside(self, expand_rel, expand_abs)
    }

    /// True if any of the nine sample points of any of our parts lies inside `other`.
    fn samples_inside(&self, other: &Massing, expand_rel: f32, expand_abs: f32) -> bool {
        let mut scratch = PolyPoints::new();

        for part in &self.parts {
            let c = expand_xy(&part.cube, expand_rel, expand_abs);
            let (lo, hi, mid) = (c.min.truncate(), c.max.truncate(), c.xy_center());
            let samples = [
                mid,
                lo,
                Vec2::new(hi.x, lo.y),
                hi,
                Vec2::new(lo.x, hi.y),
                Vec2::new(mid.x, lo.y),
                Vec2::new(hi.x, mid.y),
                Vec2::new(mid.x, hi.y),
                Vec2::new(lo.x, mid.y),
            ];
            for s in samples {
                let world = self.to_world(s.extend(c.center().z));
                let local = other.to_local(world).truncate();
                if other
                    .parts
                    .iter()
                    .any(|q| other.part_contains_xy(q, local, 0.0, &mut scratch))
                {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::massing::building::{BuildingKind, Massing};
    use crate::massing::geom::Cube;
    use crate::massing::params::N_CYL_SIDES;
    use bevy::prelude::*;

    fn boxy(c: Cube) -> Massing {
        let mut m = Massing::new(BuildingKind::Office, c);
        m.add_main_part(c).unwrap();
        m
    }

    #[test]
    fn cylinder_contains_by_ellipse() {
        let c = Cube::from_bounds(0.0, 10.0, 0.0, 4.0, 0.0, 5.0);
        let mut m = boxy(c);
        m.num_sides = N_CYL_SIDES;

        assert!(m.contains(Vec3::new(5.0, 2.0, 1.0), 0.0));
        assert!(m.contains(Vec3::new(9.9, 2.0, 1.0), 0.0));
        // Inside the box, outside the ellipse.
        assert!(!m.contains(Vec3::new(9.5, 3.8, 1.0), 0.0));
        assert!(m.contains(Vec3::new(9.5, 3.8, 1.0), 1.0));
        assert!(!m.contains(Vec3::new(5.0, 2.0, 6.0), 0.0));
    }

    #[test]
    fn polygon_contains_with_radius() {
        let c = Cube::from_bounds(0.0, 10.0, 0.0, 10.0, 0.0, 5.0);
        let mut m = boxy(c);
        m.num_sides = 8;

        assert!(m.contains(Vec3::new(5.0, 5.0, 2.0), 0.0));
        // Clipped corner of the octagon.
        assert!(!m.contains(Vec3::new(0.2, 0.2, 2.0), 0.0));
        assert!(m.contains(Vec3::new(0.2, 0.2, 2.0), 2.0));
    }

    #[test]
    fn disjoint_unrotated_massings_do_not_overlap() {
        let a = boxy(Cube::from_bounds(0.0, 10.0, 0.0, 10.0, 0.0, 5.0));
        let b = boxy(Cube::from_bounds(20.0, 30.0, 0.0, 10.0, 0.0, 5.0));
        assert!(!a.overlaps(&b, 0.0, 0.0));
        assert!(!b.overlaps(&a, 0.0, 0.0));
        assert!(a.overlaps(&b, 0.0, 5.5));
    }

    #[test]
    fn rotated_overlap_is_symmetric() {
        let mut a = boxy(Cube::from_bounds(0.0, 10.0, 0.0, 10.0, 0.0, 5.0));
        a.apply_rotation(0.3).unwrap();
        let b = boxy(Cube::from_bounds(9.0, 19.0, 2.0, 8.0, 0.0, 5.0));
        assert!(a.overlaps(&b, 0.0, 0.0));
        assert!(b.overlaps(&a, 0.0, 0.0));

        let far = boxy(Cube::from_bounds(40.0, 50.0, 40.0, 50.0, 0.0, 5.0));
        assert!(!a.overlaps(&far, 0.0, 0.0));
    }
}
