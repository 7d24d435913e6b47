//! Top-level massing generation for one building.
//!
//! Pipeline: cross-section and levels, then parts (single box, split footprint,
//! tapering stack, or complex floorplan), interior hook, roof, rooftop details,
//! exterior doors hook, and finally an optional rotation.

use bevy::prelude::*;
use smallvec::SmallVec;

use super::building::{BuildingKind, Massing};
use super::csg;
use super::details::add_office_details;
use super::error::{check_part, Result};
use super::footprint::CrossSection;
use super::geom::Cube;
use super::house::{gen_house_parts, gen_house_roofs};
use super::interior::InteriorGenerator;
use super::params::{BuildingParams, MAX_CSG_ATTEMPTS, N_CYL_SIDES};
use super::rng::BuildingRng;
use super::roof::add_office_roof;
use super::split::split_in_xy;

/// Smallest fraction of the base width a tapering level may shrink to.
const MIN_TAPER_FRAC: f32 = 0.2;
/// Largest fraction of a side trimmed from one edge of a complex-floorplan candidate.
const MAX_COMPLEX_SHRINK: f32 = 0.35;

/// Generate the massing of one building on `footprint`.
///
/// `footprint` gives the XY extent and the height bound; generated parts stay
/// within its XY extent.
pub fn generate_massing<I>(
    kind: BuildingKind,
    footprint: Cube,
    params: &BuildingParams,
    rng: &mut BuildingRng,
    interior: &mut I,
) -> Result<Massing>
where
    I: InteriorGenerator + ?Sized,
{
    check_part(&footprint)?;
    let mut m = Massing::new(kind, footprint);

    match kind {
        BuildingKind::House => {
            let layout = gen_house_parts(&mut m, rng, params)?;
            m.validate()?;
            interior.generate_interior(&m, rng, false);
            gen_house_roofs(&mut m, &layout, rng, params)?;
        }
        BuildingKind::Office => {
            choose_cross_section(&mut m, rng, params);
            let allow_pitched = gen_office_parts(&mut m, rng, params)?;
            m.validate()?;
            interior.generate_interior(&m, rng, m.has_complex_floorplan);
            add_office_roof(&mut m, rng, params, allow_pitched)?;
            let counts = add_office_details(&mut m, rng, params)?;
            debug!("Rooftop details: {:?}", counts);
        }
    }
    interior.generate_exterior_doors(&m, rng);

    if params.max_rot_angle > 0.0 && rng.chance(params.rotate_prob) {
        let max = params.max_rot_angle.to_radians();
        let angle = rng.uniform(-max, max);
        if angle.abs() > 1.0e-3 {
            m.apply_rotation(angle)?;
        }
    }

    debug!(
        "Generated {:?} massing: {} parts ({} main), {:?} roof, {} surfaces, {} details",
        m.kind,
        m.parts.len(),
        m.real_num_parts,
        m.roof_type,
        m.roof_surfaces.len(),
        m.details.len()
    );
    Ok(m)
}

/// Pick round, rectangular, or N-gon, plus the N-gon's flat side and chamfer.
pub fn choose_cross_section(m: &mut Massing, rng: &mut BuildingRng, params: &BuildingParams) {
    let r = rng.rand_float();
    if r < params.prob_round {
        m.num_sides = N_CYL_SIDES;
        return;
    }
    if r < params.prob_round + params.prob_cube {
        m.num_sides = 4;
        return;
    }
    let mut n = rng
        .rand_range(params.min_sides.max(3), params.max_sides)
        .clamp(3, N_CYL_SIDES / 2 - 1);
    m.shape.half_offset = rng.rand_bool();
    m.shape.start_angle = rng.uniform(0.0, std::f32::consts::PI / n as f32);

    if n >= 6 && params.max_flat_side_amt > 0.0 && rng.rand_bool() {
        m.shape.flat_side_amt = rng.uniform(0.0, params.max_flat_side_amt);
    }
    if matches!(n, 3 | 4 | 6) && params.max_alt_step_factor > 0.0 && rng.rand_bool() {
        m.shape.alt_step_factor = rng.uniform(0.1, params.max_alt_step_factor.max(0.1));
        if n == 4 {
            m.shape.half_offset = true;
            m.shape.start_angle = 0.0;
        }
        n *= 2;
    }
    m.num_sides = n;
}

fn snap_to_floors(h: f32, floor_spacing: f32) -> f32 {
    (h / floor_spacing).round().max(1.0) * floor_spacing
}

/// Build the main parts of an office-style massing. Returns whether the roof may be pitched.
fn gen_office_parts(m: &mut Massing, rng: &mut BuildingRng, params: &BuildingParams) -> Result<bool> {
    let base = m.bcube;
    let fs = params.floor_spacing;
    let rect = m.section() == CrossSection::Rectangle;
    let can_split = |c: &Cube| rect && c.min_xy_len() >= params.min_split_size_floors * fs;

    let mut levels = rng.rand_range(params.min_levels.max(1), params.max_levels);
    if !rect && rng.rand_bool() {
        levels = 1;
    }
    let max_levels = ((base.dz() / params.min_level_height.max(0.1)) as u32).max(1);
    levels = levels.clamp(1, max_levels);

    if levels == 1 {
        if can_split(&base) && rng.chance(params.split_prob) {
            let res = split_in_xy(&base, rng);
            debug!("Split footprint into {:?} shape ({} parts)", res.shape, res.parts.len());
            for c in res.parts {
                m.add_main_part(c)?;
            }
            m.recompute_bcube()?;
            return Ok(false);
        }
        m.add_main_part(base)?;
        m.recompute_bcube()?;
        return Ok(true);
    }

    if rect && base.min_xy_len() >= 4.0 * fs && rng.chance(params.complex_floorplan_prob) {
        let parts = gen_complex_floorplan(&base, levels, rng, params);
        if parts.len() > 1 {
            for c in parts {
                m.add_main_part(c)?;
            }
            m.has_complex_floorplan = true;
            m.recompute_bcube()?;
            return Ok(false);
        }
    }

    let mut stack = gen_tapering_stack(&base, levels, rng, params);
    let mut allow_pitched = true;

    if let Some(top) = stack.last().copied() {
        if can_split(&top) && rng.chance(params.split_prob) {
            stack.pop();
            let res = split_in_xy(&top, rng);
            debug!("Split top level into {:?} shape", res.shape);
            stack.extend(res.parts);
            allow_pitched = false;
        }
    }
    for c in stack {
        m.add_main_part(c)?;
    }
    m.recompute_bcube()?;
    Ok(allow_pitched)
}

/// Stacked levels, each shrunk inward from the one below it.
fn gen_tapering_stack(base: &Cube, levels: u32, rng: &mut BuildingRng, params: &BuildingParams) -> SmallVec<[Cube; 8]> {
    let fs = params.floor_spacing;
    let dz = base.dz() / levels as f32;
    let mut out: SmallVec<[Cube; 8]> = SmallVec::new();
    let mut prev = *base;

    for i in 0..levels {
        let mut c = prev;
        if i > 0 {
            for dim in 0..2 {
                let len = prev.size()[dim];
                for dir in 0..2 {
                    let old = c.d(dim, dir);
                    let amt = len * rng.uniform(0.0, 0.3);
                    c.set_d(dim, dir, if dir == 0 { old + amt } else { old - amt });
                    if c.size()[dim] < MIN_TAPER_FRAC * base.size()[dim] {
                        c.set_d(dim, dir, old);
                    }
                }
            }
            c.min.z = prev.max.z;
        }
        c.max.z = c.min.z + dz * rng.uniform(0.9, 1.1);
        out.push(c);
        prev = c;
    }

    let mut z = base.min.z;
    for c in out.iter_mut() {
        let h = snap_to_floors(c.dz(), fs);
        c.min.z = z;
        c.max.z = z + h;
        z = c.max.z;
    }
    out
}

/// Overlapping boxes of decreasing height, clipped into a non-overlapping partition.
///
/// The result is ordered shortest first so the tallest box is the massing's top part.
fn gen_complex_floorplan(base: &Cube, levels: u32, rng: &mut BuildingRng, params: &BuildingParams) -> Vec<Cube> {
    let fs = params.floor_spacing;
    let mut accepted: Vec<Cube> = Vec::with_capacity(levels as usize * 2);

    for i in 0..levels {
        let h = base.dz() * (levels - i) as f32 / levels as f32;
        let z2 = base.min.z + snap_to_floors(h, fs);
        let mut found = None;

        for _ in 0..MAX_CSG_ATTEMPTS {
            let mut c = *base;
            c.max.z = z2;
            for dim in 0..2 {
                let len = base.size()[dim];
                c.min[dim] += len * rng.uniform(0.0, MAX_COMPLEX_SHRINK);
                c.max[dim] -= len * rng.uniform(0.0, MAX_COMPLEX_SHRINK);
            }
            if !accepted.iter().any(|a| a.contains_cube(&c)) {
                found = Some(c);
                break;
            }
        }
        let Some(c) = found else {
            debug!("Complex floorplan stopped after {} of {} levels", i, levels);
            break;
        };
        csg::clip(c, &mut accepted);
    }
    accepted.reverse();
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::massing::interior::NoInterior;

    fn lot() -> Cube {
        Cube::from_bounds(0.0, 30.0, 0.0, 24.0, 0.0, 36.0)
    }

    fn gen(kind: BuildingKind, seed: u32, params: &BuildingParams) -> Massing {
        let mut rng = BuildingRng::from_seeds(seed, 77);
        generate_massing(kind, lot(), params, &mut rng, &mut NoInterior).unwrap()
    }

    fn assert_partition(m: &Massing) {
        for (i, a) in m.parts.iter().enumerate() {
            assert!(a.cube.is_strictly_normalized(), "{a:?}");
            for b in &m.parts[i + 1..] {
                assert!(!a.cube.intersects_no_adj(&b.cube), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn same_seed_same_massing() {
        let params = BuildingParams::default();
        for s in 0..50 {
            for kind in [BuildingKind::Office, BuildingKind::House] {
                let a = gen(kind, s, &params);
                let b = gen(kind, s, &params);
                assert_eq!(a.parts, b.parts);
                assert_eq!(a.roof_surfaces, b.roof_surfaces);
                assert_eq!(a.details, b.details);
                assert_eq!(a.bcube, b.bcube);
            }
        }
    }

    #[test]
    fn parts_partition_space_for_every_branch() {
        let params = BuildingParams {
            rotate_prob: 0.0,
            ..Default::default()
        };
        for s in 0..2000 {
            let m = gen(BuildingKind::Office, s, &params);
            assert!(m.real_num_parts >= 1);
            assert_partition(&m);
            for p in m.main_parts() {
                assert!(lot().contains_cube_xy(&p.cube));
            }
        }
    }

    #[test]
    fn complex_floorplan_puts_the_tallest_part_last() {
        let params = BuildingParams {
            complex_floorplan_prob: 1.0,
            min_levels: 4,
            max_levels: 6,
            prob_round: 0.0,
            prob_cube: 1.0,
            rotate_prob: 0.0,
            ..Default::default()
        };
        let mut seen = 0;
        for s in 0..200 {
            let m = gen(BuildingKind::Office, s, &params);
            if !m.has_complex_floorplan {
                continue;
            }
            seen += 1;
            assert_partition(&m);
            let top = m.top_part().unwrap().cube.max.z;
            assert!(m.main_parts().iter().all(|p| p.cube.max.z <= top));
        }
        assert!(seen > 100);
    }

    #[test]
    fn tapering_levels_sit_on_each_other() {
        let params = BuildingParams::default();
        let mut rng = BuildingRng::from_seeds(3, 3);
        for _ in 0..200 {
            let stack = gen_tapering_stack(&lot(), 5, &mut rng, &params);
            assert_eq!(stack.len(), 5);
            for w in stack.windows(2) {
                assert_eq!(w[1].min.z, w[0].max.z);
                assert!(w[0].contains_cube_xy(&w[1]));
                assert!(w[1].dx() >= MIN_TAPER_FRAC * lot().dx() - 1e-4);
            }
            for c in &stack {
                let floors = c.dz() / params.floor_spacing;
                assert!((floors - floors.round()).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn cross_section_respects_probabilities() {
        let params = BuildingParams {
            prob_round: 0.0,
            prob_cube: 0.0,
            min_sides: 5,
            max_sides: 5,
            ..Default::default()
        };
        let mut m = Massing::new(BuildingKind::Office, lot());
        let mut rng = BuildingRng::from_seeds(0, 0);
        choose_cross_section(&mut m, &mut rng, &params);
        assert_eq!(m.section(), CrossSection::Polygon { sides: 5 });
        assert_eq!(m.shape.alt_step_factor, 0.0);
    }

    #[test]
    fn bcube_holds_all_geometry_across_seeds() {
        let params = BuildingParams {
            rotate_prob: 0.5,
            ..Default::default()
        };
        let grown = |m: &Massing| m.bcube.expanded_by(Vec3::splat(1e-3));
        for s in 0..10_000 {
            let kind = if s % 3 == 0 { BuildingKind::House } else { BuildingKind::Office };
            let m = gen(kind, s, &params);
            let bc = grown(&m);
            let corners = m
                .parts
                .iter()
                .map(|p| &p.cube)
                .chain(m.details.iter().map(|d| &d.cube))
                .flat_map(|c| [c.xy_corners(c.min.z), c.xy_corners(c.max.z)])
                .flatten();
            let roof_pts = m.roof_surfaces.iter().flat_map(|r| r.pts.iter().copied());
            for p in corners.chain(roof_pts) {
                let w = m.to_world(p);
                assert!(bc.contains_pt(w), "seed {s}: {w:?} outside {:?}", m.bcube);
            }
        }
    }
}
