//! Optional single yaw applied once a massing is fully generated.
//!
//! Parts, roof surfaces, and details stay in the local unrotated frame. Queries move
//! their inputs into that frame with [`Rotation::to_local`] and move results back
//! with [`Rotation::to_world`].

use bevy::prelude::*;

use super::building::Massing;
use super::error::{MassingError, Result};
use super::geom::{bounds_of_points, Cube};

/// Yaw about a vertical axis through `pivot`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    pub sin: f32,
    pub cos: f32,
    pub pivot: Vec2,
}

impl Rotation {
    pub fn from_angle(angle: f32, pivot: Vec2) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { sin, cos, pivot }
    }

    #[inline]
    fn rotate(p: Vec3, pivot: Vec2, sin: f32, cos: f32) -> Vec3 {
        let d = p.truncate() - pivot;
        Vec3::new(
            pivot.x + d.x * cos - d.y * sin,
            pivot.y + d.x * sin + d.y * cos,
            p.z,
        )
    }

    pub fn to_world(&self, p: Vec3) -> Vec3 {
        Self::rotate(p, self.pivot, self.sin, self.cos)
    }

    pub fn to_local(&self, p: Vec3) -> Vec3 {
        Self::rotate(p, self.pivot, -self.sin, self.cos)
    }

    pub fn dir_to_world(&self, v: Vec3) -> Vec3 {
        Self::rotate(v, Vec2::ZERO, self.sin, self.cos)
    }
}

impl Massing {
    pub fn to_local(&self, p: Vec3) -> Vec3 {
        self.rotation.map_or(p, |r| r.to_local(p))
    }

    pub fn to_world(&self, p: Vec3) -> Vec3 {
        self.rotation.map_or(p, |r| r.to_world(p))
    }

    pub fn dir_to_world(&self, v: Vec3) -> Vec3 {
        self.rotation.map_or(v, |r| r.dir_to_world(v))
    }

    /// Rotate the finished massing by `angle` radians about its bcube center.
    ///
    /// The new bcube is the XY bound of every rotated corner and roof vertex,
    /// accessories included; its Z range is unchanged. Must be called at most once,
    /// after all parts, roof surfaces, and details exist.
    pub fn apply_rotation(&mut self, angle: f32) -> Result<()> {
        let rot = Rotation::from_angle(angle, self.bcube.xy_center());
        let (z1, z2) = (self.bcube.min.z, self.bcube.max.z);

        let part_corners = self
            .parts
            .iter()
            .flat_map(|p| p.cube.xy_corners(z1));
        let roof_pts = self.roof_surfaces.iter().flat_map(|s| s.pts.iter().copied());
        let detail_corners = self
            .details
            .iter()
            .map(|d| &d.cube)
            .chain(self.fences.iter())
            .chain(self.driveway.iter())
            .flat_map(|c| c.xy_corners(z1));
        let rotated = part_corners
            .chain(roof_pts)
            .chain(detail_corners)
            .map(|p| rot.to_world(p));

        let mut bc: Cube = bounds_of_points(rotated)
            .ok_or_else(|| MassingError::EmptyFootprint("nothing to rotate".to_string()))?;
        bc.min.z = z1;
        bc.max.z = z2;

        if bc.dx() <= 0.0 || bc.dy() <= 0.0 {
            return Err(MassingError::DegenerateRotation(bc));
        }
        self.bcube = bc;
        self.rotation = Some(rot);
        Ok(())
    }
}
