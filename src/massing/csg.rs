//! Box clipping used to keep a building's parts a non-overlapping partition of space.

use smallvec::SmallVec;

use super::geom::{Cube, GEOM_EPS};

/// Remove from `candidate` everything already covered by `accepted`, then append the
/// surviving fragments to `accepted`.
///
/// Two vertical stacks are kept instead of cut apart:
/// - an accepted box standing on the candidate's base, taller than it and inside it
///   in XY, is raised to sit on the candidate's top (a tower on a podium);
/// - a candidate inside an accepted box's XY span that only overlaps it vertically
///   is raised onto that box, or trimmed to hang below it.
pub fn clip(candidate: Cube, accepted: &mut Vec<Cube>) {
    let fragments = clip_fragments(candidate, accepted);
    accepted.extend(fragments);
}

/// Fragments of `candidate` outside every box of `accepted`. Only the tower-on-podium
/// stack modifies `accepted`, by raising a box's bottom.
pub fn clip_fragments(candidate: Cube, accepted: &mut [Cube]) -> Vec<Cube> {
    let mut out = Vec::new();
    split_recur(candidate, accepted, 0, &mut out);
    out
}

fn split_recur(mut c: Cube, boxes: &mut [Cube], start: usize, out: &mut Vec<Cube>) {
    let mut i = start;

    while i < boxes.len() {
        let b = boxes[i];

        if !b.intersects_no_adj(&c) {
            i += 1;
            continue;
        }
        if b.contains_cube(&c) {
            return;
        }
        if (b.min.z - c.min.z).abs() < GEOM_EPS && b.max.z > c.max.z && c.contains_cube_xy(&b) {
            boxes[i].min.z = c.max.z;
            i += 1;
            continue;
        }
        if b.contains_cube_xy(&c) {
            // Overlap is purely vertical now: stack on top of b, or trim to hang below it.
            if b.min.z <= c.min.z {
                c.min.z = b.max.z;
            } else {
                c.max.z = b.min.z;
            }
            i += 1;
            continue;
        }

        // Cut c along each of b's vertical faces that crosses it. The low side stays
        // in c; the high side is clipped separately starting from this same box.
        'cut: for dim in 0..2 {
            for dir in 0..2 {
                if !b.intersects_no_adj(&c) {
                    break 'cut;
                }
                let val = b.d(dim, dir);
                if c.min[dim] < val && c.max[dim] > val {
                    let mut hi = c;
                    c.max[dim] = val;
                    hi.min[dim] = val;
                    split_recur(hi, boxes, i, out);
                }
            }
        }
        // c now lies either outside b or within b's XY span; re-test against b.
    }
    out.push(c);
}

/// The up-to-4 XY fragments of `src` outside `hole`. Z ranges are left untouched.
pub fn subtract_cube_xy(src: &Cube, hole: &Cube) -> SmallVec<[Cube; 4]> {
    let mut out = SmallVec::new();

    if !src.intersects_xy_no_adj(hole) {
        out.push(*src);
        return out;
    }
    let mut rem = *src;

    for dim in 0..2 {
        if hole.min[dim] > rem.min[dim] {
            let mut piece = rem;
            piece.max[dim] = hole.min[dim];
            out.push(piece);
            rem.min[dim] = hole.min[dim];
        }
        if hole.max[dim] < rem.max[dim] {
            let mut piece = rem;
            piece.min[dim] = hole.max[dim];
            out.push(piece);
            rem.max[dim] = hole.max[dim];
        }
    }
    out
}

/// Merge boxes that share a face, have identical Z ranges, and line up along that face.
pub fn merge_adjacent(boxes: &mut Vec<Cube>) {
    let mut merged = true;

    while merged {
        merged = false;
        'outer: for i in 0..boxes.len() {
            for j in (i + 1)..boxes.len() {
                if let Some(u) = try_merge(&boxes[i], &boxes[j]) {
                    boxes[i] = u;
                    boxes.swap_remove(j);
                    merged = true;
                    break 'outer;
                }
            }
        }
    }
}

fn try_merge(a: &Cube, b: &Cube) -> Option<Cube> {
    if a.min.z != b.min.z || a.max.z != b.max.z {
        return None;
    }
    for dim in 0..2 {
        let o = 1 - dim;
        let same_span = a.min[o] == b.min[o] && a.max[o] == b.max[o];
        let touching = a.max[dim] == b.min[dim] || b.max[dim] == a.min[dim];
        if same_span && touching {
            let mut u = *a;
            u.union_with_cube(b);
            return Some(u);
        }
    }
    None
}
