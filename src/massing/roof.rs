//! Roof geometry: peaked, hipped, sloped, dome, and onion roofs.
//!
//! Peaked and hipped roofs are built on one part at a time and emit planar
//! [`RoofSurface`]s. Domes and onions only reserve height in the bcube; their
//! curved surface is left to the renderer.

use bevy::prelude::*;

use super::building::{Massing, PartRole, RoofType};
use super::error::{MassingError, Result};
use super::footprint::CrossSection;
use super::geom::{Cube, GEOM_EPS};
use super::params::BuildingParams;
use super::rng::BuildingRng;
use super::surface::{RoofSurface, SurfaceRole};

/// Extend one end of a peaked roof's ridge past its part, ending the roof inside a
/// neighbor's roof instead of with a gable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RidgeExtension {
    /// 0 extends the low end of the ridge, 1 the high end.
    pub dir: usize,
    /// Coordinate along the ridge axis to extend to.
    pub to: f32,
}

/// Options for [`add_peaked_roof`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakedRoofSpec {
    /// Ridge axis (0 = x, 1 = y); `None` runs the ridge along the part's longer side.
    pub ridge_dim: Option<usize>,
    /// Upper bound on the ridge height above the part top.
    pub max_dz: f32,
    pub extend: Option<RidgeExtension>,
}

impl Default for PeakedRoofSpec {
    fn default() -> Self {
        Self {
            ridge_dim: None,
            max_dz: f32::MAX,
            extend: None,
        }
    }
}

/// Summary of a pitched roof that was added, used to place chimneys and match slopes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoofInfo {
    pub part_ix: usize,
    pub ridge_dim: usize,
    pub height: f32,
    pub ridge_z: f32,
}

impl RoofInfo {
    /// Rise over half the span perpendicular to the ridge.
    pub fn slope(&self, part: &Cube) -> f32 {
        self.height / (0.5 * part.size()[1 - self.ridge_dim])
    }
}

/// Height of a pitched roof on `part` with the given ridge axis.
pub fn pitched_roof_height(part: &Cube, ridge_dim: usize, frac: f32, max_dz: f32) -> Result<f32> {
    let short = part.size()[1 - ridge_dim];
    let height = max_dz.min(frac * short).min(part.dz());
    if height > 0.0 {
        Ok(height)
    } else {
        Err(MassingError::NonPositiveRoofHeight(height))
    }
}

/// Map (along-ridge, across-ridge, z) coordinates to a point.
#[inline]
fn ridge_pt(ridge_dim: usize, along: f32, across: f32, z: f32) -> Vec3 {
    if ridge_dim == 0 {
        Vec3::new(along, across, z)
    } else {
        Vec3::new(across, along, z)
    }
}

/// Reverse the winding of `s` if its front side doesn't face `outward`.
fn facing(mut s: RoofSurface, outward: Vec3) -> RoofSurface {
    if s.normal().dot(outward) < 0.0 {
        s.pts.reverse();
    }
    s
}

/// True if another part covers the gable end of `c` at `face` along `ridge_dim`
/// from the eave up to `ridge_z`.
fn gable_is_enclosed(m: &Massing, part_ix: usize, ridge_dim: usize, face: f32, ridge_z: f32) -> bool {
    let c = m.parts[part_ix].cube;
    let across = 1 - ridge_dim;

    m.parts.iter().enumerate().any(|(i, p)| {
        let o = &p.cube;
        i != part_ix
            && p.role != PartRole::Chimney
            && o.max.z >= ridge_z - GEOM_EPS
            && o.min.z <= c.max.z + GEOM_EPS
            && o.min[ridge_dim] - GEOM_EPS <= face
            && o.max[ridge_dim] + GEOM_EPS >= face
            && o.min[across] <= c.min[across] + GEOM_EPS
            && o.max[across] >= c.max[across] - GEOM_EPS
    })
}

/// Two sloped faces meeting at a ridge, closed by triangular gables where needed.
pub fn add_peaked_roof(
    m: &mut Massing,
    part_ix: usize,
    params: &BuildingParams,
    spec: PeakedRoofSpec,
) -> Result<RoofInfo> {
    let c = m.parts[part_ix].cube;
    let ridge_dim = spec
        .ridge_dim
        .unwrap_or(if c.dx() >= c.dy() { 0 } else { 1 });
    let across = 1 - ridge_dim;
    let height = pitched_roof_height(&c, ridge_dim, params.peak_height_frac, spec.max_dz)?;

    let z0 = c.max.z;
    let zt = z0 + height;
    let mid = c.center()[across];
    let mut ends = [c.min[ridge_dim], c.max[ridge_dim]];
    if let Some(ext) = spec.extend {
        ends[ext.dir] = ext.to;
    }

    for side in 0..2 {
        let eave = c.d(across, side);
        let face = RoofSurface::quad(
            ridge_pt(ridge_dim, ends[0], eave, z0),
            ridge_pt(ridge_dim, ends[1], eave, z0),
            ridge_pt(ridge_dim, ends[1], mid, zt),
            ridge_pt(ridge_dim, ends[0], mid, zt),
            SurfaceRole::RoofFace,
        );
        m.add_roof_surface(facing(face, Vec3::Z));
    }

    for dir in 0..2 {
        if spec.extend.is_some_and(|e| e.dir == dir) {
            continue;
        }
        let face = ends[dir];
        if gable_is_enclosed(m, part_ix, ridge_dim, face, zt) {
            continue;
        }
        let gable = RoofSurface::triangle(
            ridge_pt(ridge_dim, face, c.min[across], z0),
            ridge_pt(ridge_dim, face, c.max[across], z0),
            ridge_pt(ridge_dim, face, mid, zt),
            SurfaceRole::Wall,
        );
        let mut outward = Vec3::ZERO;
        outward[ridge_dim] = if dir == 0 { -1.0 } else { 1.0 };
        m.add_roof_surface(facing(gable, outward));
    }

    Ok(RoofInfo {
        part_ix,
        ridge_dim,
        height,
        ridge_z: zt,
    })
}

/// Four sloped faces around a ridge spanning half the length/width difference on
/// either side of the center, so all faces share one pitch.
pub fn add_hipped_roof(
    m: &mut Massing,
    part_ix: usize,
    params: &BuildingParams,
    max_dz: f32,
) -> Result<RoofInfo> {
    let c = m.parts[part_ix].cube;
    let ridge_dim = if c.dx() >= c.dy() { 0 } else { 1 };
    let across = 1 - ridge_dim;
    let height = pitched_roof_height(&c, ridge_dim, params.peak_height_frac, max_dz)?;

    let z0 = c.max.z;
    let zt = z0 + height;
    let mid = c.center()[across];
    let half_ridge = 0.5 * (c.size()[ridge_dim] - c.size()[across]).max(0.0);
    let ridge_mid = c.center()[ridge_dim];
    let (r0, r1) = (ridge_mid - half_ridge, ridge_mid + half_ridge);
    let pyramid = r1 - r0 <= GEOM_EPS;
    let up = Vec3::Z;

    for side in 0..2 {
        let eave = c.d(across, side);
        let a = ridge_pt(ridge_dim, c.min[ridge_dim], eave, z0);
        let b = ridge_pt(ridge_dim, c.max[ridge_dim], eave, z0);
        let face = if pyramid {
            RoofSurface::triangle(a, b, ridge_pt(ridge_dim, r0, mid, zt), SurfaceRole::RoofFace)
        } else {
            RoofSurface::quad(
                a,
                b,
                ridge_pt(ridge_dim, r1, mid, zt),
                ridge_pt(ridge_dim, r0, mid, zt),
                SurfaceRole::RoofFace,
            )
        };
        m.add_roof_surface(facing(face, up));
    }
    for (dir, top) in [(0, r0), (1, r1)] {
        let end = c.d(ridge_dim, dir);
        let face = RoofSurface::triangle(
            ridge_pt(ridge_dim, end, c.min[across], z0),
            ridge_pt(ridge_dim, end, c.max[across], z0),
            ridge_pt(ridge_dim, top, mid, zt),
            SurfaceRole::RoofFace,
        );
        m.add_roof_surface(facing(face, up));
    }

    Ok(RoofInfo {
        part_ix,
        ridge_dim,
        height,
        ridge_z: zt,
    })
}

/// Pyramid, or four trapezoids around a flat cap. Returns false (roof stays flat)
/// when the cap variant would cover too little of the part.
pub fn add_sloped_roof(m: &mut Massing, part_ix: usize, rng: &mut BuildingRng, params: &BuildingParams) -> Result<bool> {
    let c = m.parts[part_ix].cube;
    let height = params.peak_height_frac.min(0.25) * c.min_xy_len();
    let height = height.min(c.dz());
    if height <= 0.0 {
        return Err(MassingError::NonPositiveRoofHeight(height));
    }
    let z0 = c.max.z;
    let zt = z0 + height;
    let ctr = c.xy_center();
    let outer = c.xy_corners(z0);

    if rng.chance(0.2) {
        let apex = ctr.extend(zt);
        for i in 0..4 {
            let face = RoofSurface::triangle(outer[i], outer[(i + 1) % 4], apex, SurfaceRole::RoofFace);
            m.add_roof_surface(facing(face, Vec3::Z));
        }
        m.roof_type = RoofType::Sloped;
        return Ok(true);
    }

    let f = rng.uniform(0.3, 0.8);
    if f * f < 0.25 {
        return Ok(false);
    }
    let half = 0.5 * f * c.size().truncate();
    let cap = Cube::new((ctr - half).extend(zt), (ctr + half).extend(zt));
    let inner = cap.xy_corners(zt);

    for i in 0..4 {
        let j = (i + 1) % 4;
        let face = RoofSurface::quad(outer[i], outer[j], inner[j], inner[i], SurfaceRole::RoofFace);
        m.add_roof_surface(facing(face, Vec3::Z));
    }
    m.add_roof_surface(RoofSurface::horizontal(&cap, zt, SurfaceRole::Cap));
    m.roof_type = RoofType::Sloped;
    Ok(true)
}

/// Reserve bcube height for a dome or onion roof if the massing qualifies.
pub fn try_add_dome_roof(m: &mut Massing, rng: &mut BuildingRng, params: &BuildingParams) -> bool {
    if !params.dome_roof && !params.onion_roof {
        return false;
    }
    let Some(top) = m.top_part().map(|p| p.cube) else {
        return false;
    };
    let near_square = (top.dx() - top.dy()).abs() < 0.1 * top.max_xy_len();
    let round_ok = match m.section() {
        CrossSection::Cylinder => true,
        CrossSection::Rectangle => near_square,
        CrossSection::Polygon { .. } => false,
    };
    if !round_ok || m.bcube.dz() < 1.5 * m.bcube.max_xy_len() {
        return false;
    }
    let onion = if params.dome_roof && params.onion_roof {
        rng.rand_bool()
    } else {
        params.onion_roof
    };
    let (roof_type, scale) = if onion {
        (RoofType::Onion, 1.0)
    } else {
        (RoofType::Dome, 0.5)
    };
    m.roof_type = roof_type;
    m.raise_bcube_top(top.max.z + scale * top.max_xy_len());
    true
}

/// Pick and build the roof of an office-style massing.
///
/// Split and complex footprints (`allow_pitched == false`) keep flat roofs.
pub fn add_office_roof(
    m: &mut Massing,
    rng: &mut BuildingRng,
    params: &BuildingParams,
    allow_pitched: bool,
) -> Result<()> {
    m.roof_type = RoofType::Flat;
    if m.real_num_parts == 0 || try_add_dome_roof(m, rng, params) {
        return Ok(());
    }
    if !allow_pitched || m.section() != CrossSection::Rectangle || !rng.chance(params.non_flat_roof_prob) {
        return Ok(());
    }
    let top_ix = m.real_num_parts - 1;
    // Keep pitched roofs proportionate on tall narrow towers.
    let max_dz = 2.0 * params.floor_spacing;

    match rng.index(10) {
        0..=4 => {
            add_sloped_roof(m, top_ix, rng, params)?;
        }
        5..=7 => {
            add_peaked_roof(
                m,
                top_ix,
                params,
                PeakedRoofSpec {
                    max_dz,
                    ..Default::default()
                },
            )?;
            m.roof_type = RoofType::Peaked;
        }
        _ => {
            add_hipped_roof(m, top_ix, params, max_dz)?;
            m.roof_type = RoofType::Hipped;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::massing::building::BuildingKind;
    use approx::assert_relative_eq;

    fn one_part(c: Cube) -> Massing {
        let mut m = Massing::new(BuildingKind::House, c);
        m.add_main_part(c).unwrap();
        m
    }

    #[test]
    fn peaked_roof_has_two_slopes_and_two_gables() {
        let c = Cube::from_bounds(0.0, 10.0, 0.0, 10.0, 0.0, 3.0);
        let mut m = one_part(c);
        let params = BuildingParams::default();
        let info = add_peaked_roof(
            &mut m,
            0,
            &params,
            PeakedRoofSpec {
                ridge_dim: Some(1),
                max_dz: 1.0,
                extend: None,
            },
        )
        .unwrap();

        assert_relative_eq!(info.ridge_z, 4.0);
        let faces: Vec<_> = m
            .roof_surfaces
            .iter()
            .filter(|s| s.role == SurfaceRole::RoofFace)
            .collect();
        assert_eq!(faces.len(), 2);
        assert!(faces.iter().all(|s| s.normal().z > 0.0));
        assert_eq!(m.roof_surfaces.len(), 4);
        assert_relative_eq!(m.bcube.max.z, 4.0);

        let z = faces
            .iter()
            .find_map(|s| s.z_at(Vec2::new(2.5, 5.0)))
            .unwrap();
        assert_relative_eq!(z, 3.5, epsilon = 1e-4);
    }

    #[test]
    fn covered_gable_is_dropped() {
        let low = Cube::from_bounds(0.0, 10.0, 0.0, 6.0, 0.0, 3.0);
        let tall = Cube::from_bounds(10.0, 16.0, -2.0, 8.0, 0.0, 9.0);
        let mut m = one_part(low);
        m.add_main_part(tall).unwrap();
        m.recompute_bcube().unwrap();

        let spec = PeakedRoofSpec {
            ridge_dim: Some(0),
            ..Default::default()
        };
        add_peaked_roof(&mut m, 0, &BuildingParams::default(), spec).unwrap();
        let gables: Vec<_> = m
            .roof_surfaces
            .iter()
            .filter(|s| s.role == SurfaceRole::Wall)
            .collect();
        assert_eq!(gables.len(), 1);
        assert!(gables[0].pts.iter().all(|p| p.x == 0.0));
    }

    #[test]
    fn hipped_roof_on_square_is_a_pyramid() {
        let c = Cube::from_bounds(0.0, 8.0, 0.0, 8.0, 0.0, 3.0);
        let mut m = one_part(c);
        let info = add_hipped_roof(&mut m, 0, &BuildingParams::default(), f32::MAX).unwrap();
        assert_eq!(m.roof_surfaces.len(), 4);
        assert!(m.roof_surfaces.iter().all(|s| s.pts.len() == 3));
        assert!(m.roof_surfaces.iter().all(|s| s.normal().z > 0.0));
        assert_relative_eq!(info.height, 2.8, epsilon = 1e-5);
    }

    #[test]
    fn zero_height_roof_is_an_error() {
        let c = Cube::from_bounds(0.0, 8.0, 0.0, 8.0, 0.0, 3.0);
        let mut m = one_part(c);
        let spec = PeakedRoofSpec {
            max_dz: 0.0,
            ..Default::default()
        };
        assert_eq!(
            add_peaked_roof(&mut m, 0, &BuildingParams::default(), spec),
            Err(MassingError::NonPositiveRoofHeight(0.0))
        );
    }

    #[test]
    fn tall_round_tower_gets_a_dome() {
        let c = Cube::from_bounds(0.0, 10.0, 0.0, 10.0, 0.0, 40.0);
        let mut m = one_part(c);
        m.num_sides = crate::massing::params::N_CYL_SIDES;
        let params = BuildingParams {
            onion_roof: false,
            ..Default::default()
        };
        let mut rng = BuildingRng::from_seeds(1, 1);
        assert!(try_add_dome_roof(&mut m, &mut rng, &params));
        assert_eq!(m.roof_type, RoofType::Dome);
        assert_relative_eq!(m.bcube.max.z, 45.0);
    }
}
