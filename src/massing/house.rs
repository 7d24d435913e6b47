//! House branch: one or two pitched-roof parts plus garage, shed, porch, fences,
//! basement, chimney, and solar panels.

use smallvec::SmallVec;

use super::building::{Massing, PartRole, RoofType};
use super::details::{add_chimney, add_solar_panels};
use super::error::Result;
use super::geom::{Cube, GEOM_EPS};
use super::params::BuildingParams;
use super::rng::BuildingRng;
use super::roof::{
    add_hipped_roof, add_peaked_roof, pitched_roof_height, PeakedRoofSpec, RidgeExtension, RoofInfo,
};

const FENCE_THICKNESS: f32 = 0.1;
const DRIVEWAY_THICKNESS: f32 = 0.05;

/// How the second part of a two-part house attaches to the first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wing {
    /// Axis the footprint was cut along.
    pub dim: usize,
    /// Side of the cut the main part is on.
    pub dir: usize,
    /// Wing centered on the main part (T) rather than flush with a side (L).
    pub t_junction: bool,
}

/// Layout decisions carried from part generation to roof generation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HouseLayout {
    pub wing: Option<Wing>,
}

/// Box inside `region` flush with the given faces. Each anchor is `(dim, dir, len)`.
fn anchored(region: &Cube, anchors: [(usize, usize, f32); 2], z1: f32, z2: f32) -> Cube {
    let mut c = *region;
    for (d, dir, len) in anchors {
        let face = region.d(d, dir);
        if dir == 0 {
            c.min[d] = face;
            c.max[d] = face + len;
        } else {
            c.max[d] = face;
            c.min[d] = face - len;
        }
    }
    c.min.z = z1;
    c.max.z = z2;
    c
}

/// Generate the parts of a house inside `m.bcube`, which holds the footprint.
pub fn gen_house_parts(m: &mut Massing, rng: &mut BuildingRng, params: &BuildingParams) -> Result<HouseLayout> {
    let hp = &params.house;
    let fs = params.floor_spacing;
    let fp = m.bcube;
    let z1 = fp.min.z;
    m.num_sides = 4;

    let floors0 = if fp.dz() >= 2.0 * fs && rng.chance(hp.two_story_prob) {
        2.0
    } else {
        1.0
    };
    let mut p0 = fp;
    p0.max.z = z1 + floors0 * fs;

    if fp.min_xy_len() < 2.5 * fs || !rng.chance(hp.two_part_prob) {
        m.add_main_part(p0)?;
        add_basement(m, 0, rng, params)?;
        m.recompute_bcube()?;
        return Ok(HouseLayout::default());
    }

    let dim = rng.index(2);
    let odim = 1 - dim;
    let dir = rng.index(2);
    let cut = fp.min[dim] + fp.size()[dim] * rng.uniform(0.4, 0.6);
    let mut p1 = fp;
    p0.set_d(dim, 1 - dir, cut);
    p1.set_d(dim, dir, cut);

    let olen = fp.size()[odim];
    let width = olen * rng.uniform(0.4, 0.7);
    let t_junction = rng.chance(0.3);
    let mut notch = None;

    if t_junction {
        let oc = fp.center()[odim];
        p1.min[odim] = oc - 0.5 * width;
        p1.max[odim] = oc + 0.5 * width;
    } else {
        let side = rng.index(2);
        let mut n = p1;
        if side == 0 {
            p1.max[odim] = fp.min[odim] + width;
            n.min[odim] = p1.max[odim];
        } else {
            p1.min[odim] = fp.max[odim] - width;
            n.max[odim] = p1.min[odim];
        }
        notch = Some((n, side));
    }
    let floors1 = if floors0 > 1.0 && rng.rand_bool() {
        2.0
    } else {
        1.0
    };
    p1.max.z = z1 + floors1 * fs;

    m.add_main_part(p0)?;
    m.add_main_part(p1)?;

    if let Some((n, side)) = notch {
        fill_notch(m, &n, dim, dir, side, rng, params)?;
    }
    add_basement(m, 0, rng, params)?;
    m.recompute_bcube()?;
    if let Some(dw) = m.driveway {
        m.bcube.union_with_cube(&dw);
    }
    for f in &m.fences {
        m.bcube.union_with_cube(f);
    }

    Ok(HouseLayout {
        wing: Some(Wing { dim, dir, t_junction }),
    })
}

/// Garage, shed, porch, or fences in the empty corner of an L-shaped house.
///
/// The notch touches the main part at its `dir` face along `dim` and the wing at its
/// `side` face along the other axis.
fn fill_notch(
    m: &mut Massing,
    notch: &Cube,
    dim: usize,
    dir: usize,
    side: usize,
    rng: &mut BuildingRng,
    params: &BuildingParams,
) -> Result<()> {
    let hp = &params.house;
    let fs = params.floor_spacing;
    let odim = 1 - dim;
    let z1 = notch.min.z;
    let size = notch.size();
    let r = rng.rand_float();

    if r < hp.garage_prob && notch.min_xy_len() >= 3.0 {
        let depth = size[dim].min(7.0);
        let width = size[odim].min(4.0);
        let top = z1 + (params.door_height + 0.5).max(0.8 * fs).min(fs);
        let garage = anchored(notch, [(dim, dir, depth), (odim, side, width)], z1, top);
        m.add_accessory_part(garage, PartRole::Garage)?;

        let door = garage.d(dim, 1 - dir);
        let street = notch.d(dim, 1 - dir) + if dir == 0 { 3.0 } else { -3.0 };
        let mut dw = garage;
        dw.set_d(dim, dir, door);
        dw.set_d(dim, 1 - dir, street);
        dw.max.z = z1 + DRIVEWAY_THICKNESS;
        if dw.is_strictly_normalized() {
            m.driveway = Some(dw);
        }
        return Ok(());
    }
    if r < hp.garage_prob + hp.shed_prob && notch.min_xy_len() >= 2.0 {
        let d = (0.5 * size[dim]).min(3.0);
        let w = (0.5 * size[odim]).min(3.0);
        let shed = anchored(notch, [(dim, 1 - dir, d), (odim, 1 - side, w)], z1, z1 + 0.75 * fs);
        m.add_accessory_part(shed, PartRole::Shed)?;
        return Ok(());
    }
    if r < hp.garage_prob + hp.shed_prob + hp.porch_prob && params.door_height < fs {
        let depth = size[dim].min(2.5);
        let z = z1 + params.door_height;
        let roof_top = (z + 2.0 * params.floor_thickness).min(z1 + fs);
        let porch = anchored(notch, [(dim, dir, depth), (odim, side, size[odim])], z, roof_top);
        m.add_accessory_part(porch, PartRole::Porch)?;
        return Ok(());
    }
    if rng.chance(hp.fence_prob) {
        let height = 0.375 * fs;
        let far_dim = anchored(
            notch,
            [(dim, 1 - dir, FENCE_THICKNESS), (odim, side, size[odim])],
            z1,
            z1 + height,
        );
        let far_odim = anchored(
            notch,
            [(dim, dir, size[dim] - FENCE_THICKNESS), (odim, 1 - side, FENCE_THICKNESS)],
            z1,
            z1 + height,
        );
        m.fences.extend([far_dim, far_odim].into_iter().filter(Cube::is_strictly_normalized));
    }
    Ok(())
}

fn add_basement(m: &mut Massing, part_ix: usize, rng: &mut BuildingRng, params: &BuildingParams) -> Result<()> {
    if !rng.chance(params.house.basement_prob) {
        return Ok(());
    }
    let mut b = m.parts[part_ix].cube;
    b.max.z = b.min.z;
    b.min.z -= params.floor_spacing;
    m.add_accessory_part(b, PartRole::Basement)
}

/// Roofs, chimney, and solar panels for the parts made by [`gen_house_parts`].
pub fn gen_house_roofs(
    m: &mut Massing,
    layout: &HouseLayout,
    rng: &mut BuildingRng,
    params: &BuildingParams,
) -> Result<SmallVec<[RoofInfo; 2]>> {
    let hp = &params.house;
    let frac = params.peak_height_frac;
    let c0 = m.parts[0].cube;
    let mut roofs: SmallVec<[RoofInfo; 2]> = SmallVec::new();

    match layout.wing {
        None => {
            let hipped = rng.chance(hp.hipped_roof_prob);
            roofs.push(if hipped {
                add_hipped_roof(m, 0, params, f32::MAX)?
            } else {
                add_peaked_roof(m, 0, params, PeakedRoofSpec::default())?
            });
            m.roof_type = if hipped { RoofType::Hipped } else { RoofType::Peaked };
        }
        Some(w) => {
            let c1 = m.parts[1].cube;
            let ridge0 = if c0.dx() >= c0.dy() { 0 } else { 1 };
            let z0t = c0.max.z + pitched_roof_height(&c0, ridge0, frac, f32::MAX)?;
            let z1t = c1.max.z + pitched_roof_height(&c1, w.dim, frac, f32::MAX)?;

            // A hipped main roof must not end up below the wing's ridge.
            let hipped = z0t >= z1t && rng.chance(hp.hipped_roof_prob);
            let info0 = if hipped {
                add_hipped_roof(m, 0, params, f32::MAX)?
            } else {
                let spec = PeakedRoofSpec {
                    ridge_dim: Some(ridge0),
                    ..Default::default()
                };
                add_peaked_roof(m, 0, params, spec)?
            };

            // Roofs meeting at the main ridge share its pitch.
            let mut max_dz = f32::MAX;
            if z1t >= info0.ridge_z - GEOM_EPS {
                let matched = info0.slope(&c0) * 0.5 * c1.size()[1 - w.dim];
                max_dz = matched.min(info0.ridge_z - c1.max.z);
            }
            let extend = (w.t_junction && info0.ridge_dim != w.dim && c1.max.z <= c0.max.z).then(|| {
                RidgeExtension {
                    dir: w.dir,
                    to: c0.center()[w.dim],
                }
            });
            let spec = PeakedRoofSpec {
                ridge_dim: Some(w.dim),
                max_dz,
                extend,
            };
            let info1 = add_peaked_roof(m, 1, params, spec)?;
            roofs.push(info0);
            roofs.push(info1);
            m.roof_type = if hipped { RoofType::Hipped } else { RoofType::Peaked };
        }
    }

    let sheds: SmallVec<[usize; 2]> = (m.real_num_parts..m.parts.len())
        .filter(|&i| matches!(m.parts[i].role, PartRole::Garage | PartRole::Shed))
        .collect();
    for ix in sheds {
        let spec = PeakedRoofSpec {
            max_dz: 0.35 * params.floor_spacing,
            ..Default::default()
        };
        add_peaked_roof(m, ix, params, spec)?;
    }

    if rng.chance(hp.chimney_prob) {
        add_chimney(m, &roofs, rng)?;
    }
    if rng.chance(hp.solar_prob) {
        add_solar_panels(m);
    }
    Ok(roofs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::massing::building::BuildingKind;
    use crate::massing::surface::SurfaceRole;

    fn lot() -> Cube {
        Cube::from_bounds(0.0, 16.0, 0.0, 12.0, 0.0, 8.0)
    }

    fn build(seed: u32, params: &BuildingParams) -> (Massing, HouseLayout) {
        let mut m = Massing::new(BuildingKind::House, lot());
        let mut rng = BuildingRng::from_seeds(seed, 5);
        let layout = gen_house_parts(&mut m, &mut rng, params).unwrap();
        gen_house_roofs(&mut m, &layout, &mut rng, params).unwrap();
        (m, layout)
    }

    #[test]
    fn house_parts_never_overlap() {
        let params = BuildingParams::default();
        for s in 0..500 {
            let (m, _) = build(s, &params);
            assert!((1..=2).contains(&m.real_num_parts));
            for (i, a) in m.parts.iter().enumerate() {
                assert!(a.cube.is_strictly_normalized());
                assert!(m.bcube.contains_cube(&a.cube));
                for b in &m.parts[i + 1..] {
                    assert!(!a.cube.intersects_no_adj(&b.cube), "seed {s}: {a:?} vs {b:?}");
                }
            }
            for f in m.fences.iter().chain(m.driveway.iter()) {
                assert!(m.bcube.contains_cube(f));
            }
        }
    }

    #[test]
    fn every_house_gets_a_pitched_roof() {
        let params = BuildingParams::default();
        for s in 0..200 {
            let (m, _) = build(s, &params);
            assert!(matches!(m.roof_type, RoofType::Peaked | RoofType::Hipped));
            assert!(m.roof_surfaces.iter().any(|r| r.role == SurfaceRole::RoofFace));
            for r in &m.roof_surfaces {
                assert!(m.bcube.contains_cube(&r.bcube()));
            }
        }
    }

    #[test]
    fn garage_comes_with_a_driveway() {
        let params = BuildingParams {
            house: crate::massing::params::HouseParams {
                two_part_prob: 1.0,
                garage_prob: 1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut garages = 0;
        for s in 0..100 {
            let (m, layout) = build(s, &params);
            let has_garage = m.parts.iter().any(|p| p.role == PartRole::Garage);
            if has_garage {
                garages += 1;
                assert!(m.driveway.is_some());
                assert!(!layout.wing.unwrap().t_junction);
            }
        }
        assert!(garages > 0);
    }

    #[test]
    fn matched_wing_roof_never_passes_the_main_ridge() {
        let params = BuildingParams {
            house: crate::massing::params::HouseParams {
                two_part_prob: 1.0,
                hipped_roof_prob: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        for s in 0..200 {
            let mut m = Massing::new(BuildingKind::House, lot());
            let mut rng = BuildingRng::from_seeds(s, 9);
            let layout = gen_house_parts(&mut m, &mut rng, &params).unwrap();
            let roofs = gen_house_roofs(&mut m, &layout, &mut rng, &params).unwrap();
            assert!(roofs[1].ridge_z <= roofs[0].ridge_z + 1e-4, "seed {s}");
        }
    }
}
