//! L/T/U/H/+/O footprint splitting.
//!
//! Each shape is a small table of face moves: part `n` starts as a copy of the seed
//! box and has its low or high face along the primary or secondary axis moved to one
//! of up to four cut positions. Tables are written for `dir == 0`; `dir == 1` mirrors
//! the result along the primary axis.

use smallvec::SmallVec;

use super::geom::Cube;
use super::rng::BuildingRng;

/// Maximum aspect ratio of a seed box that may become a courtyard.
const MAX_COURTYARD_ASPECT: f32 = 1.6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SplitShape {
    L,
    T,
    U,
    H,
    Plus,
    O,
}

#[derive(Clone, Copy)]
enum Axis {
    Primary,
    Secondary,
}

#[derive(Clone, Copy)]
enum Cut {
    P1,
    P2,
    S1,
    S2,
}

#[derive(Clone, Copy)]
struct FaceMove {
    part: usize,
    axis: Axis,
    face: usize,
    cut: Cut,
}

const fn mv(part: usize, axis: Axis, face: usize, cut: Cut) -> FaceMove {
    FaceMove {
        part,
        axis,
        face,
        cut,
    }
}

use Axis::{Primary as P, Secondary as S};

// A full slab below the primary cut plus a wing above it.
const L_LOW: &[FaceMove] = &[
    mv(0, P, 1, Cut::P1),
    mv(1, P, 0, Cut::P1),
    mv(1, S, 1, Cut::S2),
];
const L_HIGH: &[FaceMove] = &[
    mv(0, P, 1, Cut::P1),
    mv(1, P, 0, Cut::P1),
    mv(1, S, 0, Cut::S1),
];
const T_SHAPE: &[FaceMove] = &[
    mv(0, P, 1, Cut::P1),
    mv(1, P, 0, Cut::P1),
    mv(1, S, 0, Cut::S1),
    mv(1, S, 1, Cut::S2),
];
const U_SHAPE: &[FaceMove] = &[
    mv(0, P, 1, Cut::P1),
    mv(1, P, 0, Cut::P1),
    mv(1, S, 1, Cut::S1),
    mv(2, P, 0, Cut::P1),
    mv(2, S, 0, Cut::S2),
];
const H_SHAPE: &[FaceMove] = &[
    mv(0, S, 1, Cut::S1),
    mv(1, S, 0, Cut::S2),
    mv(2, S, 0, Cut::S1),
    mv(2, S, 1, Cut::S2),
    mv(2, P, 0, Cut::P1),
    mv(2, P, 1, Cut::P2),
];
const PLUS_SHAPE: &[FaceMove] = &[
    mv(0, S, 0, Cut::S1),
    mv(0, S, 1, Cut::S2),
    mv(1, S, 1, Cut::S1),
    mv(1, P, 0, Cut::P1),
    mv(1, P, 1, Cut::P2),
    mv(2, S, 0, Cut::S2),
    mv(2, P, 0, Cut::P1),
    mv(2, P, 1, Cut::P2),
];
const O_SHAPE: &[FaceMove] = &[
    mv(0, S, 1, Cut::S1),
    mv(1, S, 0, Cut::S2),
    mv(2, S, 0, Cut::S1),
    mv(2, S, 1, Cut::S2),
    mv(2, P, 1, Cut::P1),
    mv(3, S, 0, Cut::S1),
    mv(3, S, 1, Cut::S2),
    mv(3, P, 0, Cut::P2),
];

struct Variant {
    shape: SplitShape,
    num_parts: usize,
    moves: &'static [FaceMove],
    /// Fixed mirror direction, or `None` to draw it at random.
    dir: Option<usize>,
}

const VARIANTS: [Variant; 10] = [
    Variant { shape: SplitShape::L, num_parts: 2, moves: L_LOW, dir: Some(0) },
    Variant { shape: SplitShape::L, num_parts: 2, moves: L_LOW, dir: Some(1) },
    Variant { shape: SplitShape::L, num_parts: 2, moves: L_HIGH, dir: Some(0) },
    Variant { shape: SplitShape::L, num_parts: 2, moves: L_HIGH, dir: Some(1) },
    Variant { shape: SplitShape::T, num_parts: 2, moves: T_SHAPE, dir: Some(0) },
    Variant { shape: SplitShape::T, num_parts: 2, moves: T_SHAPE, dir: Some(1) },
    Variant { shape: SplitShape::U, num_parts: 3, moves: U_SHAPE, dir: None },
    Variant { shape: SplitShape::H, num_parts: 3, moves: H_SHAPE, dir: None },
    Variant { shape: SplitShape::Plus, num_parts: 3, moves: PLUS_SHAPE, dir: None },
    // Courtyard must stay last: it is excluded by truncating the variant range.
    Variant { shape: SplitShape::O, num_parts: 4, moves: O_SHAPE, dir: None },
];

/// Result of splitting one seed box.
#[derive(Clone, Debug)]
pub struct SplitResult {
    pub shape: SplitShape,
    pub parts: SmallVec<[Cube; 4]>,
}

/// Split `seed` into 2–4 boxes forming an L/T/U/H/+/O footprint.
///
/// Size checks are the caller's job; this routine always succeeds on a normalized seed.
pub fn split_in_xy(seed: &Cube, rng: &mut BuildingRng) -> SplitResult {
    let aspect = seed.max_xy_len() / seed.min_xy_len().max(f32::EPSILON);
    let num_variants = if aspect <= MAX_COURTYARD_ASPECT {
        VARIANTS.len()
    } else {
        VARIANTS.len() - 1
    };
    let variant = &VARIANTS[rng.index(num_variants)];
    let dim = rng.index(2);
    let odim = 1 - dim;
    let dir = variant.dir.unwrap_or_else(|| rng.index(2));

    let (lo, len) = (seed.min[dim], seed.max[dim] - seed.min[dim]);
    let (olo, olen) = (seed.min[odim], seed.max[odim] - seed.min[odim]);

    let (p1, p2, s1, s2) = match variant.shape {
        SplitShape::L | SplitShape::T | SplitShape::U => (
            rng.uniform(0.3, 0.7),
            1.0,
            rng.uniform(0.2, 0.45),
            rng.uniform(0.55, 0.8),
        ),
        SplitShape::H | SplitShape::Plus => (
            rng.uniform(0.2, 0.4),
            rng.uniform(0.6, 0.8),
            rng.uniform(0.2, 0.45),
            rng.uniform(0.55, 0.8),
        ),
        // Smaller courtyard: tighter ranges on both axes.
        SplitShape::O => (
            rng.uniform(0.25, 0.35),
            rng.uniform(0.65, 0.75),
            rng.uniform(0.25, 0.35),
            rng.uniform(0.65, 0.75),
        ),
    };

    let mut parts: SmallVec<[Cube; 4]> = SmallVec::from_elem(*seed, variant.num_parts);
    for m in variant.moves {
        let (d, value) = match m.cut {
            Cut::P1 => (dim, lo + p1 * len),
            Cut::P2 => (dim, lo + p2 * len),
            Cut::S1 => (odim, olo + s1 * olen),
            Cut::S2 => (odim, olo + s2 * olen),
        };
        debug_assert!(matches!(
            (m.axis, d == dim),
            (Axis::Primary, true) | (Axis::Secondary, false)
        ));
        parts[m.part].set_d(d, m.face, value);
    }

    if dir == 1 {
        let hi = seed.max[dim];
        for p in parts.iter_mut() {
            let (a, b) = (p.min[dim], p.max[dim]);
            p.min[dim] = lo + hi - b;
            p.max[dim] = lo + hi - a;
        }
    }

    SplitResult {
        shape: variant.shape,
        parts,
    }
}
