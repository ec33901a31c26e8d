//! Pixel-edge contour extraction on the dual grid.
//!
//! Contours are traced on the pixel-corner grid (between pixels) rather
//! than through pixel centers. The bitmap is scanned top row first; each
//! boundary found is walked to completion and its interior is inverted in
//! a working copy, which erases the region (and turns its holes into
//! black regions of their own) so the scan never meets it again.

use crate::bitmap::{Bitmap, WORD_BITS};
use crate::config::TurnPolicy;
use crate::path::Sign;
use crate::progress::Progress;

/// A closed path on the pixel-corner grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelPath {
    /// Points in pixel-corner coordinates (y-up).
    /// (0,0) = bottom-left corner of the bitmap.
    pub points: Vec<(i32, i32)>,
    /// Positive for the outline of a black region, negative for a hole.
    pub sign: Sign,
    /// Enclosed area in pixels.
    pub area: i64,
}

impl PixelPath {
    /// Bounding box of the points as `(x0, x1, y0, y1)`, inclusive.
    pub fn bbox(&self) -> (i32, i32, i32, i32) {
        let (mut x0, mut y0) = (i32::MAX, i32::MAX);
        let (mut x1, mut y1) = (i32::MIN, i32::MIN);
        for &(x, y) in &self.points {
            x0 = x0.min(x);
            x1 = x1.max(x);
            y0 = y0.min(y);
            y1 = y1.max(y);
        }
        (x0, x1, y0, y1)
    }
}

// ── Turn policy support ──────────────────────────────────

/// Constant term of the multiplicative inverse in GF(2^8) modulo
/// x^8+x^4+x^3+x+1; a fixed non-linear bit sequence.
#[rustfmt::skip]
static DETRAND_TABLE: [u8; 256] = [
    0, 1, 1, 0, 1, 0, 1, 1, 0, 1, 1, 0, 0, 1, 1, 1, 0, 0, 0, 1, 1, 1, 0, 1,
    0, 1, 1, 0, 1, 0, 0, 0, 0, 0, 0, 1, 1, 1, 0, 1, 1, 0, 0, 1, 0, 0, 0, 0,
    0, 1, 0, 0, 1, 1, 0, 0, 0, 1, 0, 1, 1, 1, 1, 1, 1, 0, 1, 1, 1, 1, 1, 1,
    1, 0, 1, 1, 0, 1, 1, 1, 1, 0, 1, 0, 0, 0, 1, 1, 0, 0, 0, 0, 1, 0, 1, 1,
    0, 0, 1, 1, 1, 0, 0, 1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 1, 0, 0,
    0, 0, 0, 0, 1, 0, 1, 0, 1, 0, 1, 0, 0, 1, 0, 0, 1, 0, 1, 1, 1, 0, 1, 0,
    0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 1, 0, 1, 0, 1, 0, 1, 0, 0, 1, 1, 0, 1, 0,
    0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 1, 1, 1, 0, 1, 1, 0, 0, 1, 1, 0, 0, 1,
    1, 0, 1, 1, 0, 0, 0, 1, 1, 1, 1, 0, 1, 0, 0, 0, 0, 1, 0, 1, 1, 1, 0, 0,
    0, 1, 0, 1, 1, 0, 0, 1, 1, 1, 0, 1, 0, 0, 1, 1, 0, 0, 1, 1, 1, 0, 0, 1,
    1, 1, 0, 0, 0, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0,
];

/// Deterministic pseudo-random bit for a lattice point.
fn detrand(x: i32, y: i32) -> bool {
    // The multipliers hit every byte position, so all four table
    // lookups depend on both coordinates.
    let z = (0x04b3_e375u32.wrapping_mul(x as u32) ^ y as u32).wrapping_mul(0x05a8_ef93);
    let bit = z
        .to_be_bytes()
        .iter()
        .fold(0u8, |acc, &b| acc ^ DETRAND_TABLE[b as usize]);
    bit != 0
}

/// Whether black dominates the neighbourhood of corner `(x, y)`.
///
/// Counts black minus white pixels on square rings of growing radius
/// (2, 3, 4) around the corner; the first ring with a non-zero balance
/// decides. A neighbourhood balanced on every ring counts as white.
fn majority(bm: &Bitmap, x: i32, y: i32) -> bool {
    let vote = |x, y| if bm.get(x, y) { 1 } else { -1 };
    for i in 2..5 {
        let mut ct = 0;
        for a in (-i + 1)..=(i - 1) {
            ct += vote(x + a, y + i - 1);
            ct += vote(x + i - 1, y + a - 1);
            ct += vote(x + a - 1, y - i);
            ct += vote(x - i, y + a);
        }
        if ct > 0 {
            return true;
        } else if ct < 0 {
            return false;
        }
    }
    false
}

/// Decide the turn at an ambiguous corner: `true` = right.
fn turns_right(bm: &Bitmap, x: i32, y: i32, sign: Sign, policy: TurnPolicy) -> bool {
    match policy {
        TurnPolicy::Right => true,
        TurnPolicy::Left => false,
        TurnPolicy::Black => sign == Sign::Positive,
        TurnPolicy::White => sign == Sign::Negative,
        TurnPolicy::Random => detrand(x, y),
        TurnPolicy::Majority => majority(bm, x, y),
        TurnPolicy::Minority => !majority(bm, x, y),
    }
}

// ── Path tracing ─────────────────────────────────────────

/// Trace one closed boundary starting at corner `(x0, y0)`, heading down.
///
/// The walker keeps black on its left. At each corner it looks at the
/// two pixels ahead of it:
///
/// ```text
///   dir (dx,dy)  │ ahead-right c          ahead-left d
///   ─────────────┼───────────────────────────────────────
///   Down  (0,-1) │ (x-1, y-1)             (x,   y-1)
///   Up    (0, 1) │ (x,   y)               (x-1, y)
///   Right (1, 0) │ (x,   y-1)             (x,   y)
///   Left  (-1,0) │ (x-1, y)               (x-1, y-1)
/// ```
///
/// `c` black and `d` white is the ambiguous diagonal case and is settled
/// by the turn policy. Otherwise: both black turns right, both white
/// turns left, and `d` black with `c` white goes straight.
pub fn find_path(bm: &Bitmap, x0: i32, y0: i32, sign: Sign, policy: TurnPolicy) -> PixelPath {
    let (mut x, mut y) = (x0, y0);
    let (mut dx, mut dy) = (0i32, -1i32);
    let mut points = Vec::new();
    let mut area: i64 = 0;

    loop {
        points.push((x, y));
        x += dx;
        y += dy;
        area += x as i64 * dy as i64;

        if x == x0 && y == y0 {
            break;
        }

        let c = bm.get(x + (dx + dy - 1) / 2, y + (dy - dx - 1) / 2);
        let d = bm.get(x + (dx - dy - 1) / 2, y + (dy + dx - 1) / 2);

        let right = if c && !d {
            Some(turns_right(bm, x, y, sign, policy))
        } else if c {
            Some(true)
        } else if !d {
            Some(false)
        } else {
            None
        };
        match right {
            Some(true) => (dx, dy) = (dy, -dx),
            Some(false) => (dx, dy) = (-dy, dx),
            None => {}
        }
    }

    PixelPath { points, sign, area }
}

/// Invert the interior of a path in `bm`.
///
/// Every vertical edge inverts its row between the edge and a common
/// word-aligned reference column; pairs of edges cancel outside the path
/// and leave exactly the interior flipped.
pub fn xor_path(bm: &mut Bitmap, path: &PixelPath) {
    let (Some(&(first_x, _)), Some(&(_, last_y))) = (path.points.first(), path.points.last()) else {
        return;
    };
    let xa = first_x & -WORD_BITS;
    let mut y1 = last_y;
    for &(x, y) in &path.points {
        if y != y1 {
            bm.xor_to_ref(x, y.min(y1), xa);
            y1 = y;
        }
    }
}

/// Extract every boundary of `bm` whose area exceeds `turd_size`.
///
/// Returns the paths in scan order together with the working bitmap,
/// which is all white afterwards and can be reused as scratch space.
/// Progress is reported as the fraction of rows scanned.
pub fn decompose(
    bm: &Bitmap,
    turd_size: u32,
    policy: TurnPolicy,
    progress: &mut Progress<'_>,
) -> (Vec<PixelPath>, Bitmap) {
    let mut work = bm.duplicate();
    work.clear_excess_padding();

    let height = work.height_i32();
    let mut paths = Vec::new();
    let mut turds = 0usize;

    let (mut x, mut y) = (0, height - 1);
    while let Some((nx, ny)) = work.find_next(x, y) {
        (x, y) = (nx, ny);

        // Sign comes from the untouched input: the working copy has
        // holes inverted by now.
        let sign = if bm.get(x, y) { Sign::Positive } else { Sign::Negative };
        let path = find_path(&work, x, y + 1, sign, policy);
        xor_path(&mut work, &path);

        if path.area > i64::from(turd_size) {
            paths.push(path);
        } else {
            turds += 1;
        }

        progress.update(1.0 - f64::from(y) / f64::from(height));
    }

    log::debug!(
        "decompose: {} paths kept, {} turds dropped (turd_size {}, policy {})",
        paths.len(),
        turds,
        turd_size,
        policy
    );

    (paths, work)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(bm: &Bitmap, turd_size: u32, policy: TurnPolicy) -> Vec<PixelPath> {
        decompose(bm, turd_size, policy, &mut Progress::silent()).0
    }

    /// Bitmap from text rows, top row first, `#` for black.
    fn from_rows(rows: &[&str]) -> Bitmap {
        let h = rows.len();
        Bitmap::from_fn(rows[0].len(), h, |x, y| rows[h - 1 - y].as_bytes()[x] == b'#').unwrap()
    }

    fn checkerboard(n: usize) -> Bitmap {
        Bitmap::from_fn(n, n, |x, y| (x + y) % 2 == 0).unwrap()
    }

    #[test]
    fn single_pixel_walks_its_four_corners() {
        let bm = Bitmap::from_fn(1, 1, |_, _| true).unwrap();
        let paths = run(&bm, 0, TurnPolicy::Minority);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].points, vec![(0, 1), (0, 0), (1, 0), (1, 1)]);
        assert_eq!(paths[0].area, 1);
        assert_eq!(paths[0].sign, Sign::Positive);
        assert_eq!(paths[0].bbox(), (0, 1, 0, 1));
    }

    #[test]
    fn turds_are_dropped_and_work_bitmap_ends_white() {
        let bm = Bitmap::from_fn(3, 3, |x, y| x == 1 && y == 1).unwrap();
        let (kept, work) = decompose(&bm, 1, TurnPolicy::Minority, &mut Progress::silent());
        assert!(kept.is_empty());
        assert_eq!(work.count_black(), 0);
        assert_eq!(run(&bm, 0, TurnPolicy::Minority).len(), 1);
    }

    #[test]
    fn hole_is_traced_as_negative_path() {
        // 4x4 ring with a 2x2 hole in the middle.
        let bm = Bitmap::from_fn(4, 4, |x, y| !(1..3).contains(&x) || !(1..3).contains(&y)).unwrap();
        let paths = run(&bm, 0, TurnPolicy::Minority);
        assert_eq!(paths.len(), 2);
        assert_eq!((paths[0].sign, paths[0].area), (Sign::Positive, 16));
        assert_eq!((paths[1].sign, paths[1].area), (Sign::Negative, 4));
        assert_eq!(paths[1].bbox(), (1, 3, 1, 3));
    }

    #[test]
    fn diagonal_pair_joins_or_splits_by_policy() {
        // Pixels (0,1) and (1,0) touch only at corner (1,1).
        let bm = Bitmap::from_fn(2, 2, |x, y| x != y).unwrap();
        for policy in TurnPolicy::ALL {
            let paths = run(&bm, 0, policy);
            let joined = matches!(policy, TurnPolicy::Black | TurnPolicy::Right | TurnPolicy::Minority);
            if joined {
                assert_eq!(paths.len(), 1, "{}", policy);
                assert_eq!(paths[0].area, 2);
                assert_eq!(paths[0].points.len(), 8);
            } else {
                assert_eq!(paths.len(), 2, "{}", policy);
                assert!(paths.iter().all(|p| p.area == 1));
            }
        }
    }

    #[test]
    fn checkerboard_splits_policies_by_area() {
        use Sign::{Negative as N, Positive as P};
        let bm = checkerboard(5);
        let expected: [(TurnPolicy, Vec<i64>, Vec<Sign>); 7] = [
            (TurnPolicy::Black, vec![17, 1, 1, 1, 1], vec![P, N, N, N, N]),
            (TurnPolicy::White, vec![1; 13], vec![P; 13]),
            (TurnPolicy::Left, vec![1; 13], vec![P; 13]),
            (TurnPolicy::Right, vec![17, 5, 1], vec![P, N, P]),
            (TurnPolicy::Minority, vec![17, 5, 1], vec![P, N, P]),
            (TurnPolicy::Majority, vec![1; 13], vec![P; 13]),
            (TurnPolicy::Random, vec![1, 8, 1, 1, 1, 1], vec![P; 6]),
        ];
        for (policy, areas, signs) in expected {
            let paths = run(&bm, 0, policy);
            let got_areas: Vec<i64> = paths.iter().map(|p| p.area).collect();
            let got_signs: Vec<Sign> = paths.iter().map(|p| p.sign).collect();
            assert_eq!(got_areas, areas, "{}", policy);
            assert_eq!(got_signs, signs, "{}", policy);
        }
    }

    #[test]
    fn every_policy_traces_its_own_paths() {
        use Sign::{Negative as N, Positive as P};

        // Ambiguous corners on both outer boundaries and holes, with
        // uneven surroundings, so no two policies agree.
        let bm = from_rows(&[
            "####..#.",
            "######..",
            "###.#.##",
            "#..##.##",
            "#######.",
            "...#.###",
        ]);
        let expected: [(TurnPolicy, Vec<(Sign, i64, usize, (i32, i32))>); 7] = [
            (TurnPolicy::Black, vec![(P, 38, 36, (0, 6)), (N, 1, 4, (3, 4)), (N, 2, 6, (5, 4)), (N, 2, 6, (1, 3))]),
            (TurnPolicy::White, vec![(P, 35, 38, (0, 6)), (P, 1, 4, (6, 6)), (N, 3, 10, (3, 4))]),
            (TurnPolicy::Left, vec![(P, 35, 38, (0, 6)), (P, 1, 4, (6, 6)), (N, 1, 4, (3, 4)), (N, 2, 6, (1, 3))]),
            (TurnPolicy::Right, vec![(P, 38, 36, (0, 6)), (N, 3, 10, (3, 4)), (N, 2, 6, (5, 4))]),
            (TurnPolicy::Minority, vec![(P, 36, 42, (0, 6)), (N, 3, 10, (3, 4))]),
            (
                TurnPolicy::Majority,
                vec![(P, 37, 32, (0, 6)), (P, 1, 4, (6, 6)), (N, 1, 4, (3, 4)), (N, 2, 6, (5, 4)), (N, 2, 6, (1, 3))],
            ),
            (TurnPolicy::Random, vec![(P, 36, 42, (0, 6)), (N, 1, 4, (3, 4)), (N, 2, 6, (1, 3))]),
        ];

        for (policy, shape) in expected {
            let paths = run(&bm, 0, policy);
            let got: Vec<_> = paths.iter().map(|p| (p.sign, p.area, p.points.len(), p.points[0])).collect();
            assert_eq!(got, shape, "{}", policy);
        }

        // Joining the two holes pinches the walk through (3,3) twice.
        let joined = [(3, 4), (3, 3), (2, 3), (1, 3), (1, 2), (2, 2), (3, 2), (3, 3), (4, 3), (4, 4)];
        for policy in [TurnPolicy::White, TurnPolicy::Right, TurnPolicy::Minority] {
            let paths = run(&bm, 0, policy);
            let hole = paths.iter().find(|p| p.area == 3).map(|p| p.points.clone());
            assert_eq!(hole.as_deref(), Some(&joined[..]), "{}", policy);
        }
        let split = [(1, 3), (1, 2), (2, 2), (3, 2), (3, 3), (2, 3)];
        for policy in [TurnPolicy::Black, TurnPolicy::Left, TurnPolicy::Majority, TurnPolicy::Random] {
            let paths = run(&bm, 0, policy);
            let hole = paths.iter().find(|p| p.points[0] == (1, 3)).map(|p| p.points.clone());
            assert_eq!(hole.as_deref(), Some(&split[..]), "{}", policy);
        }
    }

    #[test]
    fn paths_cross_word_boundaries() {
        let bm = Bitmap::from_fn(130, 3, |x, _| (60..70).contains(&x) || x >= 127).unwrap();
        let paths = run(&bm, 0, TurnPolicy::Minority);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].area, 30);
        assert_eq!(paths[0].bbox(), (60, 70, 0, 3));
        assert_eq!(paths[1].area, 9);
    }

    #[test]
    fn detrand_is_a_fixed_hash() {
        let bits: Vec<bool> = [(0, 0), (1, 1), (2, 3), (10, 7), (3, 2), (100, 200), (5, 9)]
            .iter()
            .map(|&(x, y)| detrand(x, y))
            .collect();
        assert_eq!(bits, vec![false, false, true, false, true, true, false]);
    }

    #[test]
    fn majority_follows_surrounding_color() {
        let black = Bitmap::from_fn(8, 8, |_, _| true).unwrap();
        let white = Bitmap::new(8, 8).unwrap();
        assert!(majority(&black, 4, 4));
        assert!(!majority(&white, 4, 4));
    }
}
