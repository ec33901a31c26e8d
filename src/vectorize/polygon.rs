//! Optimal polygon approximation via dynamic programming.
//!
//! Given a closed pixel-edge path, finds the polygon with the fewest
//! vertices whose edges each stay within half a pixel of the part of the
//! path they replace. Among all such polygons the one with the smallest
//! total line-fit penalty wins.
//!
//! ## Algorithm
//!
//! 1. **Prefix sums** (`calc_sums`): O(1) line-fit statistics for any
//!    cyclic sub-range of the path.
//! 2. **Longest straight subpath** (`calc_lon`): for each vertex, the
//!    farthest vertex reachable by a straight line that stays within
//!    ±0.5 of every point in between (constraint propagation).
//! 3. **DP optimal polygon** (`best_polygon`): globally minimize the
//!    penalty over all valid polygons with the minimum number of edges.
//!
//! Sub-pixel refinement of the chosen vertices lives in `adjust`.

/// Prefix sum accumulator for O(1) line-fit statistics.
///
/// Coordinates are taken relative to the first path point, which keeps
/// the squared terms small on large bitmaps.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sums {
    pub x: f64,
    pub y: f64,
    pub x2: f64,
    pub xy: f64,
    pub y2: f64,
}

impl Sums {
    fn plus(self, o: Sums, factor: f64) -> Sums {
        Sums {
            x: self.x + factor * o.x,
            y: self.y + factor * o.y,
            x2: self.x2 + factor * o.x2,
            xy: self.xy + factor * o.xy,
            y2: self.y2 + factor * o.y2,
        }
    }
}

// ── Prefix sums ──────────────────────────────────────────

/// `sums[i]` holds the totals over `pt[0..i]`, so `sums` has `n + 1`
/// entries.
pub fn calc_sums(pt: &[(i32, i32)]) -> Vec<Sums> {
    let Some(&(x0, y0)) = pt.first() else {
        return vec![Sums::default()];
    };

    let mut sums = Vec::with_capacity(pt.len() + 1);
    let mut acc = Sums::default();
    sums.push(acc);
    for &(px, py) in pt {
        let x = f64::from(px - x0);
        let y = f64::from(py - y0);
        acc = Sums {
            x: acc.x + x,
            y: acc.y + y,
            x2: acc.x2 + x * x,
            xy: acc.xy + x * y,
            y2: acc.y2 + y * y,
        };
        sums.push(acc);
    }
    sums
}

/// Totals over the cyclic range `pt[i..=j]` and the number of points in it.
///
/// `i < n` and `i <= j < i + n`; a `j` past the end wraps around once.
pub(crate) fn range_sums(sums: &[Sums], i: usize, j: usize) -> (Sums, f64) {
    let n = sums.len() - 1;
    let (j, r) = if j >= n { (j - n, 1.0) } else { (j, 0.0) };
    let total = sums[j + 1].plus(sums[i], -1.0).plus(sums[n], r);
    let k = (j + 1) as f64 - i as f64 + r * n as f64;
    (total, k)
}

// ── Longest straight subpath ─────────────────────────────

/// For each vertex `i`, the farthest vertex reachable by a straight line
/// that stays within 0.5 units of all intermediate points.
///
/// `pt` must be a closed path of unit axis-aligned steps, as produced by
/// the contour tracer.
///
/// ## Algorithm: constraint propagation
///
/// Starting from vertex `i`, walk forward corner by corner while keeping
/// two constraint vectors that bound the angular corridor of admissible
/// line directions. The walk stops when:
///
/// 1. **Four-direction test**: the path has moved in all four cardinal
///    directions, so no straight line can follow it.
/// 2. **Constraint violation**: the current corner falls outside the
///    corridor. The exact exit point between the last two corners is then
///    found by floor division along the step direction.
///
/// Each corner more than one pixel away from `i` narrows the corridor by
/// shifting a constraint half a pixel toward it.
///
/// ### Direction index formula
///
/// ```text
///   (dx, dy) → (3 + 3*dx + dy) / 2     (truncating)
///   (-1,  0) → 0   West
///   ( 0, -1) → 1   South
///   ( 0,  1) → 2   North
///   ( 1,  0) → 3   East
/// ```
///
/// Diagonal corner-to-corner steps fold onto the same four slots.
pub fn calc_lon(pt: &[(i32, i32)]) -> Vec<usize> {
    let n = pt.len();
    if n == 0 {
        return Vec::new();
    }

    // nc[i]: next point after i that differs from pt[i] in both coordinates.
    let mut nc = vec![0usize; n];
    let mut k = 0usize;
    for i in (0..n).rev() {
        if pt[i].0 != pt[k].0 && pt[i].1 != pt[k].1 {
            k = i + 1;
        }
        nc[i] = k;
    }

    let mut pivk = vec![0usize; n];
    for i in (0..n).rev() {
        let mut ct = [0u32; 4];
        let i1 = (i + 1) % n;
        ct[direction(pt[i1].0 - pt[i].0, pt[i1].1 - pt[i].1)] += 1;

        let mut constraint = [(0i32, 0i32); 2];
        let mut k = nc[i];
        let mut k1 = i;

        pivk[i] = loop {
            let step = (sign(pt[k].0 - pt[k1].0), sign(pt[k].1 - pt[k1].1));
            ct[direction(step.0, step.1)] += 1;

            // All four directions seen: the path must turn.
            if ct.iter().all(|&c| c > 0) {
                break k1;
            }

            let cur = (pt[k].0 - pt[i].0, pt[k].1 - pt[i].1);
            if xprod(constraint[0], cur) < 0 || xprod(constraint[1], cur) > 0 {
                break pivot_at_violation(pt, &constraint, k, k1, i);
            }

            if cur.0.abs() > 1 || cur.1.abs() > 1 {
                let off = (
                    cur.0 + if cur.1 >= 0 && (cur.1 > 0 || cur.0 < 0) { 1 } else { -1 },
                    cur.1 + if cur.0 <= 0 && (cur.0 < 0 || cur.1 < 0) { 1 } else { -1 },
                );
                if xprod(constraint[0], off) >= 0 {
                    constraint[0] = off;
                }
                let off = (
                    cur.0 + if cur.1 <= 0 && (cur.1 < 0 || cur.0 < 0) { 1 } else { -1 },
                    cur.1 + if cur.0 >= 0 && (cur.0 > 0 || cur.1 < 0) { 1 } else { -1 },
                );
                if xprod(constraint[1], off) <= 0 {
                    constraint[1] = off;
                }
            }

            k1 = k;
            k = nc[k1];
            if !cyclic(k, i, k1) {
                break pivot_at_violation(pt, &constraint, k, k1, i);
            }
        };
    }

    // Make lon cyclically monotone: lon[i] is the tightest pivot at or
    // after i.
    let mut lon = vec![0usize; n];
    let mut j = pivk[n - 1];
    lon[n - 1] = j;
    for i in (0..n - 1).rev() {
        if cyclic(i + 1, pivk[i], j) {
            j = pivk[i];
        }
        lon[i] = j;
    }

    let mut i = n - 1;
    while cyclic((i + 1) % n, j, lon[i]) {
        lon[i] = j;
        if i == 0 {
            break;
        }
        i -= 1;
    }

    lon
}

/// Last point on the run from `k1` toward `k` that still satisfies both
/// constraints.
///
/// `a`, `c` are the constraint cross products at `k1` and `b`, `d` their
/// change per unit step; floor division gives the number of whole steps
/// before either goes out of range.
fn pivot_at_violation(pt: &[(i32, i32)], constraint: &[(i32, i32); 2], k: usize, k1: usize, i: usize) -> usize {
    const INFTY: i64 = 10_000_000;

    let n = pt.len() as i64;
    let dk = (sign(pt[k].0 - pt[k1].0), sign(pt[k].1 - pt[k1].1));
    let cur = (pt[k1].0 - pt[i].0, pt[k1].1 - pt[i].1);
    let a = xprod(constraint[0], cur);
    let b = xprod(constraint[0], dk);
    let c = xprod(constraint[1], cur);
    let d = xprod(constraint[1], dk);

    let mut j = INFTY;
    if b < 0 {
        j = a.div_euclid(-b);
    }
    if d > 0 {
        j = j.min((-c).div_euclid(d));
    }
    (k1 as i64 + j).rem_euclid(n) as usize
}

// ── Dynamic programming optimal polygon ──────────────────

/// Find the optimal polygon. Returns vertex indices into `pt`, ascending
/// and starting at 0.
///
/// The search runs over positions `0..=n`, where `n` stands for vertex 0
/// again after one full turn. `clip0[i]` is the farthest position an edge
/// from `i` may reach and `clip1[j]` the earliest position an edge into
/// `j` may start from. A greedy walk forward (`seg0`) and backward
/// (`seg1`) brackets the positions the `j`-th vertex may occupy in any
/// polygon with the minimum edge count `m`.
pub fn best_polygon(pt: &[(i32, i32)], lon: &[usize], sums: &[Sums]) -> Vec<usize> {
    let n = pt.len();
    if n == 0 {
        return Vec::new();
    }

    let mut clip0 = vec![0usize; n];
    for i in 0..n {
        let mut c = (lon[(i + n - 1) % n] + n - 1) % n;
        if c == i {
            c = (i + 1) % n;
        }
        clip0[i] = if c < i { n } else { c };
    }

    let mut clip1 = vec![0usize; n + 1];
    let mut j = 1;
    for (i, &c) in clip0.iter().enumerate() {
        while j <= c {
            clip1[j] = i;
            j += 1;
        }
    }

    // Greedy forward walk: the minimum edge count m.
    let mut seg0 = vec![0usize; n + 1];
    let mut i = 0;
    let mut m = 0;
    while i < n {
        seg0[m] = i;
        i = clip0[i];
        m += 1;
    }
    seg0[m] = n;

    let mut seg1 = vec![0usize; m + 1];
    let mut i = n;
    for j in (1..=m).rev() {
        seg1[j] = i;
        i = clip1[i];
    }

    let mut pen = vec![0.0f64; n + 1];
    let mut prev = vec![0usize; n + 1];
    for j in 1..=m {
        for i in seg1[j]..=seg0[j] {
            let mut best = -1.0;
            for k in (clip1[i]..=seg0[j - 1]).rev() {
                let this = penalty3(pt, sums, k, i) + pen[k];
                if best < 0.0 || this < best {
                    prev[i] = k;
                    best = this;
                }
            }
            pen[i] = best;
        }
    }

    let mut po = vec![0usize; m];
    let mut i = n;
    for slot in po.iter_mut().rev() {
        i = prev[i];
        *slot = i;
    }
    po
}

/// Penalty for replacing the path from `i` to `j` by a straight edge.
///
/// `j` may be `n`, meaning point 0 after a full turn. The penalty is the
/// RMS distance of the covered points from the line through the midpoint
/// of `pt[i]` and `pt[j]`, scaled by the edge length:
///
/// ```text
///   px, py  = midpoint of (pt[i], pt[j])
///   ex, ey  = normal of the edge: (-(j.y - i.y), j.x - i.x)
///   a       = E[x²] - 2·E[x]·px + px²
///   b       = E[xy] - E[x]·py - E[y]·px + px·py
///   c       = E[y²] - 2·E[y]·py + py²
///   penalty = sqrt(ex²·a + 2·ex·ey·b + ey²·c)
/// ```
fn penalty3(pt: &[(i32, i32)], sums: &[Sums], i: usize, j: usize) -> f64 {
    let n = pt.len();
    let (s, k) = range_sums(sums, i, j);
    let j = if j >= n { j - n } else { j };

    let (x0, y0) = pt[0];
    let px = f64::from(pt[i].0 + pt[j].0) / 2.0 - f64::from(x0);
    let py = f64::from(pt[i].1 + pt[j].1) / 2.0 - f64::from(y0);
    let ey = f64::from(pt[j].0 - pt[i].0);
    let ex = -f64::from(pt[j].1 - pt[i].1);

    let a = (s.x2 - 2.0 * s.x * px) / k + px * px;
    let b = (s.xy - s.x * py - s.y * px) / k + px * py;
    let c = (s.y2 - 2.0 * s.y * py) / k + py * py;

    (ex * ex * a + 2.0 * ex * ey * b + ey * ey * c).sqrt()
}

// ── Helpers ──────────────────────────────────────────────

#[inline]
fn direction(dx: i32, dy: i32) -> usize {
    ((3 + 3 * dx + dy) / 2) as usize
}

/// Integer cross product.
#[inline]
fn xprod(a: (i32, i32), b: (i32, i32)) -> i64 {
    i64::from(a.0) * i64::from(b.1) - i64::from(a.1) * i64::from(b.0)
}

/// Sign function: -1, 0, or 1.
#[inline]
fn sign(x: i32) -> i32 {
    x.signum()
}

/// Whether `b` lies in the cyclic half-open interval `[a, c)`.
#[inline]
fn cyclic(a: usize, b: usize, c: usize) -> bool {
    if a <= c {
        a <= b && b < c
    } else {
        a <= b || b < c
    }
}
