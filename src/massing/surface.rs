//! Roof surfaces and rooftop detail objects.

use bevy::prelude::*;
use smallvec::SmallVec;

use super::geom::{bounds_of_points, Cube};

/// What a planar roof polygon represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceRole {
    RoofFace,
    /// Vertical segment such as a gable end.
    Wall,
    /// Flat top of a sloped roof.
    Cap,
    /// Edge cap over a chimney or wall.
    Trim,
    Helipad,
    SolarPanel,
    AccessHatch,
}

/// A planar 3- or 4-vertex polygon, counter-clockwise when seen from its front side.
#[derive(Clone, Debug, PartialEq)]
pub struct RoofSurface {
    pub pts: SmallVec<[Vec3; 4]>,
    pub role: SurfaceRole,
}

impl RoofSurface {
    pub fn triangle(a: Vec3, b: Vec3, c: Vec3, role: SurfaceRole) -> Self {
        Self {
            pts: SmallVec::from_slice(&[a, b, c]),
            role,
        }
    }

    pub fn quad(a: Vec3, b: Vec3, c: Vec3, d: Vec3, role: SurfaceRole) -> Self {
        Self {
            pts: SmallVec::from_slice(&[a, b, c, d]),
            role,
        }
    }

    /// Horizontal rectangle covering `cube`'s footprint at height `z`.
    pub fn horizontal(cube: &Cube, z: f32, role: SurfaceRole) -> Self {
        let [a, b, c, d] = cube.xy_corners(z);
        Self::quad(a, b, c, d, role)
    }

    pub fn normal(&self) -> Vec3 {
        let n = (self.pts[1] - self.pts[0]).cross(self.pts[2] - self.pts[0]);
        n.normalize_or_zero()
    }

    pub fn bcube(&self) -> Cube {
        bounds_of_points(self.pts.iter().copied()).unwrap_or_default()
    }

    pub fn center(&self) -> Vec3 {
        self.pts.iter().copied().sum::<Vec3>() / self.pts.len() as f32
    }

    pub fn is_vertical(&self) -> bool {
        self.normal().z.abs() < 0.01
    }

    pub fn area(&self) -> f32 {
        let mut n = Vec3::ZERO;
        for i in 1..self.pts.len() - 1 {
            n += (self.pts[i] - self.pts[0]).cross(self.pts[i + 1] - self.pts[0]);
        }
        0.5 * n.length()
    }

    /// Height of the surface plane above `p`, if `p` projects inside it and the plane isn't vertical.
    pub fn z_at(&self, p: Vec2) -> Option<f32> {
        let n = self.normal();
        if n.z.abs() < 0.01 || !self.contains_xy(p) {
            return None;
        }
        let o = self.pts[0];
        Some(o.z - (n.x * (p.x - o.x) + n.y * (p.y - o.y)) / n.z)
    }

    /// Projected point-in-polygon test with a small tolerance so shared edges count for both sides.
    pub fn contains_xy(&self, p: Vec2) -> bool {
        let n = self.pts.len();
        let mut sign = 0.0f32;
        let tol = 1.0e-4 * self.bcube().max_xy_len().max(1.0);

        for i in 0..n {
            let a = self.pts[i].truncate();
            let b = self.pts[(i + 1) % n].truncate();
            let e = b - a;
            let len = e.length();
            if len <= f32::EPSILON {
                continue;
            }
            let cross = e.perp_dot(p - a) / len;
            if cross.abs() <= tol {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }

    /// Segment/polygon intersection; returns the parametric distance along `p1 -> p2`.
    pub fn line_intersect(&self, p1: Vec3, p2: Vec3) -> Option<f32> {
        let n = self.normal();
        let dir = p2 - p1;
        let denom = n.dot(dir);
        if denom.abs() < 1.0e-8 {
            return None;
        }
        let t = n.dot(self.pts[0] - p1) / denom;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }
        let hit = p1 + dir * t;
        if self.contains_on_plane(hit, n) {
            Some(t)
        } else {
            None
        }
    }

    /// Point-in-polygon for a point already on the plane, projected along the dominant normal axis.
    pub fn contains_on_plane(&self, p: Vec3, n: Vec3) -> bool {
        let a = n.abs();
        let (u, v) = if a.z >= a.x && a.z >= a.y {
            (0, 1)
        } else if a.x >= a.y {
            (1, 2)
        } else {
            (0, 2)
        };
        let proj = |q: Vec3| Vec2::new(q[u], q[v]);
        let q = proj(p);
        let cnt = self.pts.len();
        let tol = 1.0e-4 * self.bcube().size().max_element().max(1.0);
        let mut sign = 0.0f32;

        for i in 0..cnt {
            let a = proj(self.pts[i]);
            let b = proj(self.pts[(i + 1) % cnt]);
            let e = b - a;
            let len = e.length();
            if len <= f32::EPSILON {
                continue;
            }
            let cross = e.perp_dot(q - a) / len;
            if cross.abs() <= tol {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }
}

/// What a rooftop box represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DetailRole {
    AcUnit,
    Block,
    Antenna,
    ParapetWall,
    RooftopSign,
}

/// A small axis-aligned rooftop box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetailObject {
    pub cube: Cube,
    pub role: DetailRole,
}

impl DetailObject {
    pub fn new(cube: Cube, role: DetailRole) -> Self {
        Self { cube, role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn slope() -> RoofSurface {
        // Rises from z=3 at x=0 to z=4 at x=5, spanning y in [0, 10].
        RoofSurface::quad(
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::new(5.0, 0.0, 4.0),
            Vec3::new(5.0, 10.0, 4.0),
            Vec3::new(0.0, 10.0, 3.0),
            SurfaceRole::RoofFace,
        )
    }

    #[test]
    fn plane_height_interpolates() {
        let s = slope();
        assert_relative_eq!(s.z_at(Vec2::new(2.5, 5.0)).unwrap(), 3.5, epsilon = 1e-5);
        assert_relative_eq!(s.z_at(Vec2::new(5.0, 5.0)).unwrap(), 4.0, epsilon = 1e-5);
        assert!(s.z_at(Vec2::new(6.0, 5.0)).is_none());
    }

    #[test]
    fn vertical_ray_hits_ridge_edge() {
        let s = slope();
        let t = s
            .line_intersect(Vec3::new(5.0, 5.0, 10.0), Vec3::new(5.0, 5.0, -10.0))
            .expect("ridge edge counts as inside");
        assert_relative_eq!(t, 0.3, epsilon = 1e-5);
    }

    #[test]
    fn gable_triangle_is_vertical() {
        let gable = RoofSurface::triangle(
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::new(10.0, 0.0, 3.0),
            Vec3::new(5.0, 0.0, 4.0),
            SurfaceRole::Wall,
        );
        assert!(gable.is_vertical());
        assert_relative_eq!(gable.area(), 5.0, epsilon = 1e-5);
    }
}
