//! Rooftop accessories: parapets, AC units, antennas, helipads, signs, hatches,
//! plus house chimneys and solar panels.
//!
//! Placement is rejection sampling: each accessory gets a bounded number of random
//! positions and is silently skipped if none fits.

use bevy::prelude::*;
use smallvec::SmallVec;

use super::building::{Massing, PartRole, RoofType};
use super::csg::{merge_adjacent, subtract_cube_xy};
use super::error::Result;
use super::footprint::{point_in_polygon, CrossSection, PolyPoints};
use super::geom::{Cube, GEOM_EPS};
use super::params::{BuildingParams, MAX_DETAIL_ATTEMPTS};
use super::rng::BuildingRng;
use super::roof::RoofInfo;
use super::surface::{DetailObject, DetailRole, RoofSurface, SurfaceRole};

/// Clear space kept between neighboring accessories.
const DETAIL_SPACING: f32 = 0.2;
const CHIMNEY_TRIM_OVERHANG: f32 = 0.05;

/// Count of what [`add_office_details`] placed, for logging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DetailCounts {
    pub parapets: usize,
    pub ac_units: usize,
    pub blocks: usize,
    pub antennas: usize,
    pub helipads: usize,
    pub hatches: usize,
    pub signs: usize,
}

/// Add rooftop accessories to a finished office-style massing.
///
/// Only flat roofs carry accessories.
pub fn add_office_details(m: &mut Massing, rng: &mut BuildingRng, params: &BuildingParams) -> Result<DetailCounts> {
    let mut counts = DetailCounts::default();
    if m.roof_type != RoofType::Flat || m.real_num_parts == 0 {
        return Ok(counts);
    }
    let dp = &params.details;

    if try_add_helipad(m, rng, params) {
        counts.helipads += 1;
    } else if rng.chance(dp.antenna_prob) && try_add_antenna(m, rng) {
        counts.antennas += 1;
    }
    if m.section() == CrossSection::Rectangle && rng.chance(dp.parapet_prob) {
        counts.parapets = add_parapets(m, rng, params);
    }
    if rng.chance(dp.hatch_prob) && try_add_hatch(m, rng, params) {
        counts.hatches += 1;
    }

    let roofs = exposed_roof_parts(m);
    let num_blocks = rng.rand_range(0, dp.max_roof_blocks);
    for _ in 0..num_blocks {
        let ix = roofs[rng.index(roofs.len())];
        let c = m.parts[ix].cube;
        let s = c.min_xy_len();
        let size = Vec3::new(
            s * rng.uniform(0.1, 0.25),
            s * rng.uniform(0.1, 0.25),
            params.floor_spacing * rng.uniform(0.5, 1.0),
        );
        if let Some(cube) = place_box(m, ix, size, params.wall_thickness + DETAIL_SPACING, rng) {
            m.add_detail(DetailObject::new(cube, DetailRole::Block));
            counts.blocks += 1;
        }
    }

    let num_ac = rng.rand_range(0, dp.max_ac_units);
    for _ in 0..num_ac {
        let ix = roofs[rng.index(roofs.len())];
        let s = (0.05 * m.parts[ix].cube.min_xy_len()).clamp(0.8, 2.5);
        let size = Vec3::new(
            s * rng.uniform(0.8, 1.2),
            s * rng.uniform(0.6, 1.0),
            params.floor_spacing * rng.uniform(0.3, 0.5),
        );
        if let Some(cube) = place_box(m, ix, size, params.wall_thickness + DETAIL_SPACING, rng) {
            m.add_detail(DetailObject::new(cube, DetailRole::AcUnit));
            counts.ac_units += 1;
        }
    }

    if m.section() == CrossSection::Rectangle && rng.chance(dp.sign_prob) && try_add_sign(m, rng, params) {
        counts.signs += 1;
    }
    Ok(counts)
}

/// Main parts whose tops are not completely covered by a part standing on them.
fn exposed_roof_parts(m: &Massing) -> SmallVec<[usize; 8]> {
    let main = m.main_parts();
    let mut out: SmallVec<[usize; 8]> = (0..main.len())
        .filter(|&i| {
            let c = &main[i].cube;
            !main.iter().enumerate().any(|(j, p)| {
                j != i && (p.cube.min.z - c.max.z).abs() < GEOM_EPS && p.cube.contains_cube_xy(c)
            })
        })
        .collect();
    if out.is_empty() {
        out.push(main.len() - 1);
    }
    out
}

/// True if `cand` would cut into a part, collide with an existing detail, or cover a
/// flat roof feature.
fn is_blocked(m: &Massing, cand: &Cube) -> bool {
    // Upper levels of a tapering stack stand on the roofs details are placed on.
    if m.parts.iter().any(|p| p.cube.intersects_no_adj(cand)) {
        return true;
    }
    let padded = cand.expanded_by_xy(DETAIL_SPACING);
    if m.details.iter().any(|d| d.cube.intersects_no_adj(&padded)) {
        return true;
    }
    m.roof_surfaces.iter().any(|s| {
        matches!(s.role, SurfaceRole::Helipad | SurfaceRole::AccessHatch) && {
            let bc = s.bcube();
            bc.intersects_xy_no_adj(&padded) && bc.max.z >= cand.min.z - 1.0 && bc.min.z <= cand.max.z
        }
    })
}

/// For non-rectangular parts, every corner of `cand` must be inside the outline.
fn fits_outline(m: &Massing, part_ix: usize, cand: &Cube, scratch: &mut PolyPoints) -> bool {
    let part = &m.parts[part_ix];
    if m.part_section(part) == CrossSection::Rectangle {
        return true;
    }
    m.part_polygon(part, scratch);
    cand.xy_corners(0.0)
        .iter()
        .all(|p| point_in_polygon(p.truncate(), &scratch[..]))
}

/// Random free position for a box of `size` on top of part `part_ix`.
fn place_box(m: &Massing, part_ix: usize, size: Vec3, margin: f32, rng: &mut BuildingRng) -> Option<Cube> {
    let c = m.parts[part_ix].cube;
    let half = 0.5 * size.truncate();
    let lo = c.min.truncate() + Vec2::splat(margin) + half;
    let hi = c.max.truncate() - Vec2::splat(margin) - half;
    if lo.x >= hi.x || lo.y >= hi.y {
        return None;
    }
    let mut scratch = PolyPoints::new();

    for _ in 0..MAX_DETAIL_ATTEMPTS {
        let ctr = Vec2::new(rng.uniform(lo.x, hi.x), rng.uniform(lo.y, hi.y));
        let cand = Cube::new((ctr - half).extend(c.max.z), (ctr + half).extend(c.max.z + size.z));
        if !is_blocked(m, &cand) && fits_outline(m, part_ix, &cand, &mut scratch) {
            return Some(cand);
        }
    }
    None
}

fn try_add_helipad(m: &mut Massing, rng: &mut BuildingRng, params: &BuildingParams) -> bool {
    let dp = &params.details;
    let Some(top) = m.top_part().map(|p| p.cube) else {
        return false;
    };
    let levels = (m.bcube.dz() / params.floor_spacing) as u32;
    if m.section() == CrossSection::Cylinder
        || levels < dp.helipad_min_levels
        || top.min_xy_len() < 4.0 * params.floor_spacing
        || dp.helipad_one_in == 0
        || rng.index(dp.helipad_one_in as usize) != 0
    {
        return false;
    }
    let top_ix = m.real_num_parts - 1;
    let ctr = top.xy_center();
    let mut scratch = PolyPoints::new();

    for frac in [0.8, 0.6] {
        let half = Vec2::splat(0.5 * frac * top.min_xy_len());
        let pad = Cube::new((ctr - half).extend(top.max.z), (ctr + half).extend(top.max.z));
        if fits_outline(m, top_ix, &pad, &mut scratch) {
            let z = top.max.z + 0.5 * params.floor_thickness;
            m.add_roof_surface(RoofSurface::horizontal(&pad, z, SurfaceRole::Helipad));
            return true;
        }
    }
    false
}

fn try_add_antenna(m: &mut Massing, rng: &mut BuildingRng) -> bool {
    let Some(top) = m.top_part().map(|p| p.cube) else {
        return false;
    };
    let half = 0.5 * (0.01 * top.min_xy_len()).clamp(0.1, 0.5);
    let height = rng.uniform(0.1, 0.25) * m.bcube.dz();
    let ctr = top.xy_center();
    let cube = Cube::new(
        (ctr - Vec2::splat(half)).extend(top.max.z),
        (ctr + Vec2::splat(half)).extend(top.max.z + height),
    );
    if is_blocked(m, &cube) {
        return false;
    }
    m.add_detail(DetailObject::new(cube, DetailRole::Antenna));
    true
}

fn try_add_hatch(m: &mut Massing, rng: &mut BuildingRng, params: &BuildingParams) -> bool {
    let top_ix = m.real_num_parts - 1;
    let side = 0.35 * params.floor_spacing;
    let size = Vec3::new(side, side, params.floor_thickness);
    let Some(spot) = place_box(m, top_ix, size, params.wall_thickness + DETAIL_SPACING, rng) else {
        return false;
    };
    let z = spot.min.z + params.floor_thickness;
    m.add_roof_surface(RoofSurface::horizontal(&spot, z, SurfaceRole::AccessHatch));
    true
}

fn try_add_sign(m: &mut Massing, rng: &mut BuildingRng, params: &BuildingParams) -> bool {
    let Some(top) = m.top_part().map(|p| p.cube) else {
        return false;
    };
    let dim = if top.dx() >= top.dy() { 0 } else { 1 };
    let odim = 1 - dim;
    let len = top.size()[dim] * rng.uniform(0.4, 0.7);
    let thickness = 0.2;
    let inset = params.wall_thickness + DETAIL_SPACING + 0.05;
    let dir = rng.index(2);

    let mut cube = top;
    cube.min[dim] = top.center()[dim] - 0.5 * len;
    cube.max[dim] = top.center()[dim] + 0.5 * len;
    if dir == 0 {
        cube.min[odim] = top.min[odim] + inset;
        cube.max[odim] = cube.min[odim] + thickness;
    } else {
        cube.max[odim] = top.max[odim] - inset;
        cube.min[odim] = cube.max[odim] - thickness;
    }
    cube.min.z = top.max.z;
    cube.max.z = top.max.z + params.floor_spacing * rng.uniform(0.6, 1.2);

    if cube.size()[odim] <= 0.0 || is_blocked(m, &cube) {
        return false;
    }
    m.add_detail(DetailObject::new(cube, DetailRole::RooftopSign));
    true
}

/// A border wall with the axis it is thin along.
#[derive(Clone, Copy, Debug)]
struct Wall {
    cube: Cube,
    thin_dim: usize,
}

fn border_walls(c: &Cube, t: f32, z2: f32) -> [Wall; 4] {
    let mut base = *c;
    base.min.z = c.max.z;
    base.max.z = z2;

    let mut walls = [Wall { cube: base, thin_dim: 1 }; 4];
    walls[0].cube.max.y = c.min.y + t;
    walls[1].cube.min.y = c.max.y - t;
    for (w, x_lo) in walls[2..].iter_mut().zip([true, false]) {
        w.thin_dim = 0;
        w.cube.min.y = c.min.y + t;
        w.cube.max.y = c.max.y - t;
        if x_lo {
            w.cube.max.x = c.min.x + t;
        } else {
            w.cube.min.x = c.max.x - t;
        }
    }
    walls
}

/// Parapet walls around every exposed flat roof of a rectangular massing.
///
/// Wall segments inside or directly against a neighboring part that rises at least
/// to the wall's base are cut away, and the remaining colinear pieces are merged.
pub fn add_parapets(m: &mut Massing, rng: &mut BuildingRng, params: &BuildingParams) -> usize {
    let t = params.wall_thickness;
    let height = params.floor_spacing * rng.uniform(0.25, 0.4);
    let main: SmallVec<[Cube; 8]> = m.main_parts().iter().map(|p| p.cube).collect();
    let mut out: Vec<Cube> = Vec::new();

    for (ia, a) in main.iter().enumerate() {
        if a.min_xy_len() <= 4.0 * t {
            continue;
        }
        for wall in border_walls(a, t, a.max.z + height) {
            let mut pieces: SmallVec<[Cube; 4]> = SmallVec::new();
            pieces.push(wall.cube);

            for (ip, p) in main.iter().enumerate() {
                if ip == ia || p.min.z > a.max.z + GEOM_EPS || p.max.z < a.max.z - GEOM_EPS {
                    continue;
                }
                let mut hole = *p;
                let dim = wall.thin_dim;
                for dir in 0..2 {
                    if (p.d(dim, 1 - dir) - a.d(dim, dir)).abs() < GEOM_EPS {
                        let reach = if dir == 1 { -t } else { t };
                        hole.set_d(dim, 1 - dir, a.d(dim, dir) + reach);
                    }
                }
                pieces = pieces.iter().flat_map(|w| subtract_cube_xy(w, &hole)).collect();
            }
            out.extend(pieces);
        }
    }
    merge_adjacent(&mut out);
    let count = out.len();
    for cube in out {
        m.add_detail(DetailObject::new(cube, DetailRole::ParapetWall));
    }
    count
}

/// Chimney flush with a ridge end of the larger (by volume) pitched-roof part, topped
/// with a trim cap. Returns false if both ends are blocked by other parts.
pub fn add_chimney(m: &mut Massing, roofs: &[RoofInfo], rng: &mut BuildingRng) -> Result<bool> {
    let Some(info) = roofs
        .iter()
        .max_by(|a, b| {
            let (ca, cb) = (&m.parts[a.part_ix].cube, &m.parts[b.part_ix].cube);
            ca.volume().total_cmp(&cb.volume())
        })
        .copied()
    else {
        return Ok(false);
    };
    let c = m.parts[info.part_ix].cube;
    let rd = info.ridge_dim;
    let across = 1 - rd;
    let sz = (0.08 * c.min_xy_len()).clamp(0.5, 1.2);
    let offset = rng.uniform(-0.25, 0.25) * c.size()[across];
    let first = rng.index(2);

    for k in 0..2 {
        let dir = first ^ k;
        let face = c.d(rd, dir);
        let mut cube = c;
        if dir == 0 {
            cube.max[rd] = face + sz;
        } else {
            cube.min[rd] = face - sz;
        }
        cube.min[across] = c.center()[across] + offset - 0.5 * sz;
        cube.max[across] = cube.min[across] + sz;
        // Stands on the wall top and clears the ridge.
        cube.min.z = c.max.z;
        cube.max.z = info.ridge_z + (0.2 * info.height).max(0.5);

        let blocked = m
            .parts
            .iter()
            .enumerate()
            .any(|(i, p)| i != info.part_ix && p.cube.intersects_no_adj(&cube));
        if !blocked {
            m.add_accessory_part(cube, PartRole::Chimney)?;
            let cap = cube.expanded_by_xy(CHIMNEY_TRIM_OVERHANG);
            m.add_roof_surface(RoofSurface::horizontal(&cap, cube.max.z, SurfaceRole::Trim));
            return Ok(true);
        }
    }
    Ok(false)
}

/// Solar panel on the largest (then highest) sloped roof quad not already used.
pub fn add_solar_panels(m: &mut Massing) -> bool {
    let mut cands: Vec<usize> = m
        .roof_surfaces
        .iter()
        .enumerate()
        .filter(|(_, s)| s.role == SurfaceRole::RoofFace && s.pts.len() == 4 && !s.is_vertical())
        .map(|(i, _)| i)
        .collect();
    cands.sort_by(|&a, &b| {
        let (sa, sb) = (&m.roof_surfaces[a], &m.roof_surfaces[b]);
        sb.area()
            .total_cmp(&sa.area())
            .then(sb.center().z.total_cmp(&sa.center().z))
    });

    for i in cands {
        let s = &m.roof_surfaces[i];
        let bc = s.bcube();
        let occupied = m
            .roof_surfaces
            .iter()
            .any(|o| o.role == SurfaceRole::SolarPanel && o.bcube().intersects_xy_no_adj(&bc))
            || m
                .parts
                .iter()
                .any(|p| p.role == PartRole::Chimney && p.cube.intersects_xy_no_adj(&bc));
        if occupied {
            continue;
        }
        if let Some(panel) = panel_on(s) {
            m.add_roof_surface(panel);
            return true;
        }
    }
    false
}

/// Largest inset rectangle of a roof quad, lifted slightly off its plane.
fn panel_on(s: &RoofSurface) -> Option<RoofSurface> {
    let n = s.normal();
    let o = s.pts[0];
    let u = (s.pts[1] - o).normalize_or_zero();
    if u == Vec3::ZERO || n == Vec3::ZERO {
        return None;
    }
    let v = n.cross(u);
    let local: SmallVec<[Vec2; 4]> = s
        .pts
        .iter()
        .map(|p| Vec2::new((*p - o).dot(u), (*p - o).dot(v)))
        .collect();

    let (mut lo, mut hi) = (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN));
    for p in &local {
        lo = lo.min(*p);
        hi = hi.max(*p);
    }
    let span = hi - lo;
    let full_area = span.x * span.y;
    lo += 0.1 * span;
    hi -= 0.1 * span;
    // Narrow along the eave until the rectangle fits under a hip or slope.
    let step = Vec2::new(0.05 * span.x, 0.0);

    let corners = |lo: Vec2, hi: Vec2| [lo, Vec2::new(hi.x, lo.y), hi, Vec2::new(lo.x, hi.y)];
    let mut fits = false;
    for _ in 0..8 {
        if lo.x >= hi.x || lo.y >= hi.y {
            return None;
        }
        if corners(lo, hi).iter().all(|c| point_in_polygon(*c, &local)) {
            fits = true;
            break;
        }
        lo += step;
        hi -= step;
    }
    let size = hi - lo;
    if !fits || size.x * size.y < 0.25 * full_area {
        return None;
    }

    let lift = n * 0.05;
    let [a, b, c, d] = corners(lo, hi).map(|q| o + u * q.x + v * q.y + lift);
    Some(RoofSurface::quad(a, b, c, d, SurfaceRole::SolarPanel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::massing::building::BuildingKind;
    use crate::massing::generator::generate_massing;
    use crate::massing::interior::NoInterior;
    use crate::massing::roof::{add_hipped_roof, add_peaked_roof, PeakedRoofSpec};

    fn office(parts: &[Cube]) -> Massing {
        let mut m = Massing::new(BuildingKind::Office, parts[0]);
        for c in parts {
            m.add_main_part(*c).unwrap();
        }
        m.recompute_bcube().unwrap();
        m
    }

    #[test]
    fn parapet_ring_on_a_single_box() {
        let mut m = office(&[Cube::from_bounds(0.0, 20.0, 0.0, 20.0, 0.0, 10.0)]);
        let mut rng = BuildingRng::from_seeds(4, 4);
        let n = add_parapets(&mut m, &mut rng, &BuildingParams::default());
        assert_eq!(n, 4);
        assert!(m.details.iter().all(|d| d.cube.min.z == 10.0));
    }

    #[test]
    fn shared_parapet_walls_are_removed() {
        let a = Cube::from_bounds(0.0, 10.0, 0.0, 10.0, 0.0, 10.0);
        let b = Cube::from_bounds(10.0, 20.0, 0.0, 10.0, 0.0, 10.0);
        let mut m = office(&[a, b]);
        let mut rng = BuildingRng::from_seeds(4, 4);
        add_parapets(&mut m, &mut rng, &BuildingParams::default());

        // Nothing stands on the shared face at x = 10.
        for d in &m.details {
            assert!(!(d.cube.min.x < 10.0 && d.cube.max.x > 10.0 && d.cube.dx() < 1.0));
            assert!(!(d.cube.dx() < 1.0 && (d.cube.min.x - 9.7).abs() < 1e-4));
        }
        // The long front and back walls merge across both parts.
        assert!(m.details.iter().any(|d| d.cube.min.x == 0.0 && d.cube.max.x == 20.0));
    }

    #[test]
    fn accessories_stay_on_the_roof_and_apart() {
        let params = BuildingParams::default();
        for s in 0..200 {
            let mut m = office(&[Cube::from_bounds(0.0, 30.0, 0.0, 25.0, 0.0, 40.0)]);
            let mut rng = BuildingRng::from_seeds(s, 17);
            add_office_details(&mut m, &mut rng, &params).unwrap();

            let top = m.parts[0].cube;
            for (i, d) in m.details.iter().enumerate() {
                assert!(d.cube.is_strictly_normalized());
                assert!(top.contains_cube_xy(&d.cube));
                assert!(d.cube.min.z >= top.max.z);
                for e in &m.details[i + 1..] {
                    assert!(!d.cube.intersects_no_adj(&e.cube), "{d:?} / {e:?}");
                }
            }
            assert!(m.bcube.contains_cube(&top));
        }
    }

    #[test]
    fn details_stay_out_of_upper_levels() {
        let lot = Cube::from_bounds(0.0, 30.0, 0.0, 24.0, 0.0, 36.0);
        let params = BuildingParams {
            rotate_prob: 0.0,
            min_levels: 2,
            ..Default::default()
        };
        let mut stacked = 0;
        for s in 0..2000 {
            let mut rng = BuildingRng::from_seeds(s, 77);
            let m = generate_massing(BuildingKind::Office, lot, &params, &mut rng, &mut NoInterior).unwrap();
            if m.real_num_parts > 1 && !m.details.is_empty() {
                stacked += 1;
            }
            for d in &m.details {
                for p in &m.parts {
                    assert!(!d.cube.intersects_no_adj(&p.cube), "seed {s}: {d:?} inside {p:?}");
                }
            }
        }
        assert!(stacked > 100);
    }

    #[test]
    fn chimney_clears_the_other_part() {
        let params = BuildingParams::default();
        let main = Cube::from_bounds(0.0, 12.0, 0.0, 8.0, 0.0, 6.0);
        let wing = Cube::from_bounds(12.0, 18.0, 0.0, 5.0, 0.0, 3.0);
        for s in 0..50 {
            let mut m = office(&[main, wing]);
            let spec = PeakedRoofSpec::default();
            let roofs = [add_peaked_roof(&mut m, 0, &params, spec).unwrap()];
            let mut rng = BuildingRng::from_seeds(s, 1);
            assert!(add_chimney(&mut m, &roofs, &mut rng).unwrap());

            let ch = m.parts.last().unwrap();
            assert_eq!(ch.role, PartRole::Chimney);
            assert!(ch.cube.max.z > roofs[0].ridge_z);
            assert!(!ch.cube.intersects_no_adj(&wing));
            assert!(!ch.cube.intersects_no_adj(&main));
            let trim = m.roof_surfaces.last().unwrap();
            assert_eq!(trim.role, SurfaceRole::Trim);
            assert!(trim.pts.iter().all(|p| p.z == ch.cube.max.z));
        }
    }

    #[test]
    fn solar_panel_sits_on_a_roof_face() {
        let params = BuildingParams::default();
        let mut m = office(&[Cube::from_bounds(0.0, 14.0, 0.0, 8.0, 0.0, 3.0)]);
        add_hipped_roof(&mut m, 0, &params, f32::MAX).unwrap();
        assert!(add_solar_panels(&mut m));

        let panel = m.roof_surfaces.last().unwrap();
        assert_eq!(panel.role, SurfaceRole::SolarPanel);
        assert!(panel.normal().z > 0.0);
        let c = panel.center();
        let z = m
            .roof_surfaces
            .iter()
            .filter(|s| s.role == SurfaceRole::RoofFace)
            .find_map(|s| s.z_at(c.truncate()))
            .unwrap();
        assert!(c.z > z && c.z < z + 0.1);

        // The only remaining quad is on the far side, so a second panel still fits.
        assert!(add_solar_panels(&mut m));
        assert!(!add_solar_panels(&mut m));
    }
}
