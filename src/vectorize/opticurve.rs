//! Curve optimization: merge runs of cubic segments into single cubics.
//!
//! A run of segments can be replaced when the polygon turns the same way
//! at every vertex of the run, the total turn stays below 179°, and one
//! cubic reproduces both the enclosed area and the run's shape within
//! `opt_tolerance`. A dynamic program then picks the merges that give the
//! fewest segments, breaking ties by the smallest summed penalty.

use kurbo::Point;

use super::curve::CurveNode;
use crate::geom::{bezier, cprod, dpara, interval, iprod, iprod1, sign, tangent};
use crate::path::{Curve, Segment, SegmentTag};

/// cos(179°).
const COS179: f64 = -0.999847695156;

/// A candidate cubic replacing the segments `i+1 ..= j`.
#[derive(Debug, Clone, Copy)]
struct Merge {
    pen: f64,
    c: [Point; 2],
}

/// Build the curve for `nodes`, replacing runs by fewer cubics where the
/// fit allows it.
pub fn opticurve(nodes: &[CurveNode], opt_tolerance: f64) -> Curve {
    let m = nodes.len();
    if m == 0 {
        return Curve::default();
    }

    // Turning direction at each curved vertex; 0 at corners.
    let convc: Vec<f64> = (0..m)
        .map(|i| match nodes[i].tag {
            SegmentTag::CurveTo => sign(dpara(
                nodes[(i + m - 1) % m].vertex,
                nodes[i].vertex,
                nodes[(i + 1) % m].vertex,
            )),
            SegmentTag::Corner => 0.0,
        })
        .collect();

    // areac[i]: area enclosed by the first i segments and the fan from
    // vertex 0, with cubic bulges counted.
    let mut areac = vec![0.0f64; m + 1];
    let mut area = 0.0;
    let p0 = nodes[0].vertex;
    for i in 0..m {
        let i1 = (i + 1) % m;
        if nodes[i1].tag == SegmentTag::CurveTo {
            let alpha = nodes[i1].alpha;
            area += 0.3 * alpha * (4.0 - alpha) * dpara(nodes[i].c[2], nodes[i1].vertex, nodes[i1].c[2]) / 2.0;
            area += dpara(p0, nodes[i].c[2], nodes[i1].c[2]) / 2.0;
        }
        areac[i + 1] = area;
    }

    // ── Dynamic programming ──────────────────────────────
    let mut prev = vec![0usize; m + 1];
    let mut pen = vec![0.0f64; m + 1];
    let mut len = vec![0usize; m + 1];
    let mut opt: Vec<Option<Merge>> = vec![None; m + 1];

    for j in 1..=m {
        prev[j] = j - 1;
        pen[j] = pen[j - 1];
        len[j] = len[j - 1] + 1;

        for i in (0..j - 1).rev() {
            let Some(o) = opti_penalty(nodes, i, j % m, opt_tolerance, &convc, &areac) else {
                break;
            };
            if len[j] > len[i] + 1 || (len[j] == len[i] + 1 && pen[j] > pen[i] + o.pen) {
                prev[j] = i;
                pen[j] = pen[i] + o.pen;
                len[j] = len[i] + 1;
                opt[j] = Some(o);
            }
        }
    }

    // ── Rebuild ──────────────────────────────────────────
    let mut segments = Vec::with_capacity(len[m]);
    let mut j = m;
    while j > 0 {
        let jm = j % m;
        segments.push(match opt[j] {
            Some(o) => Segment::curve_to(o.c[0], o.c[1], nodes[jm].c[2]),
            None => Segment { tag: nodes[jm].tag, c: nodes[jm].c },
        });
        j = prev[j];
    }
    segments.reverse();
    Curve { segments }
}

/// Try to replace the segments after `i` up to and including `j` by one
/// cubic from `c[i][2]` to `c[j][2]`. Returns `None` when that is not
/// possible within `opt_tolerance`.
fn opti_penalty(
    nodes: &[CurveNode],
    i: usize,
    j: usize,
    opt_tolerance: f64,
    convc: &[f64],
    areac: &[f64],
) -> Option<Merge> {
    let m = nodes.len();
    let v = |k: usize| nodes[k].vertex;
    let end = |k: usize| nodes[k].c[2];

    // The start point is fixed.
    if i == j {
        return None;
    }

    // ── Convexity and total turn ─────────────────────────
    let i1 = (i + 1) % m;
    let conv = convc[i1];
    if conv == 0.0 {
        return None;
    }
    let d = v(i).distance(v(i1));
    let mut k = i1;
    while k != j {
        let k1 = (k + 1) % m;
        let k2 = (k + 2) % m;
        if convc[k1] != conv {
            return None;
        }
        if sign(cprod(v(i), v(i1), v(k1), v(k2))) != conv {
            return None;
        }
        if iprod1(v(i), v(i1), v(k1), v(k2)) < d * v(k1).distance(v(k2)) * COS179 {
            return None;
        }
        k = k1;
    }

    // ── Candidate cubic ──────────────────────────────────
    let p0 = end(i);
    let p1 = v(i1);
    let p2 = v(j);
    let p3 = end(j);

    let mut area = areac[j] - areac[i];
    area -= dpara(v(0), end(i), end(j)) / 2.0;
    if i >= j {
        area += areac[m];
    }

    let a1 = dpara(p0, p1, p2);
    let a2 = dpara(p0, p1, p3);
    let a3 = dpara(p0, p2, p3);
    let a4 = a1 + a3 - a2;

    if a2 == a1 {
        return None;
    }

    let t = a3 / (a3 - a4);
    let s = a2 / (a2 - a1);
    let a = a2 * t / 2.0;
    if a == 0.0 {
        return None;
    }

    let r = area / a;
    let alpha = 2.0 - (4.0 - r / 0.3).sqrt();

    let c0 = interval(t * alpha, p0, p1);
    let c1 = interval(s * alpha, p3, p2);
    let mut pen = 0.0;

    // ── Fit against the polygon edges ────────────────────
    let mut k = i1;
    while k != j {
        let k1 = (k + 1) % m;
        let tt = tangent(p0, c0, c1, p3, v(k), v(k1))?;
        let pt = bezier(tt, p0, c0, c1, p3);
        let d = v(k).distance(v(k1));
        if d == 0.0 {
            return None;
        }
        let d1 = dpara(v(k), v(k1), pt) / d;
        if d1.abs() > opt_tolerance {
            return None;
        }
        if iprod(v(k), v(k1), pt) < 0.0 || iprod(v(k1), v(k), pt) < 0.0 {
            return None;
        }
        pen += d1 * d1;
        k = k1;
    }

    // ── Fit against the original curve ───────────────────
    let mut k = i;
    while k != j {
        let k1 = (k + 1) % m;
        let tt = tangent(p0, c0, c1, p3, end(k), end(k1))?;
        let pt = bezier(tt, p0, c0, c1, p3);
        let d = end(k).distance(end(k1));
        if d == 0.0 {
            return None;
        }
        let mut d1 = dpara(end(k), end(k1), pt) / d;
        let mut d2 = dpara(end(k), end(k1), v(k1)) / d;
        d2 *= 0.75 * nodes[k1].alpha;
        if d2 < 0.0 {
            d1 = -d1;
            d2 = -d2;
        }
        if d1 < d2 - opt_tolerance {
            return None;
        }
        if d1 < d2 {
            pen += (d1 - d2) * (d1 - d2);
        }
        k = k1;
    }

    Some(Merge { pen, c: [c0, c1] })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorize::curve::smooth;

    fn octagon() -> Vec<Point> {
        let a = 29.0 / 7.0;
        let b = 55.0 / 7.0;
        [(a, 11.0), (1.0, b), (1.0, a), (a, 1.0), (b, 1.0), (11.0, a), (11.0, b), (b, 11.0)]
            .iter()
            .map(|&(x, y)| Point::new(x, y))
            .collect()
    }

    #[test]
    fn square_is_rotated_but_not_merged() {
        let vertices = [Point::new(0.0, 4.0), Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(4.0, 4.0)];
        let nodes = smooth(&vertices, 1.0);
        let opt = opticurve(&nodes, 0.2);
        assert_eq!(opt.len(), 4);
        // Segment j of the result is input segment j + 1.
        for (k, seg) in opt.segments.iter().enumerate() {
            assert_eq!(seg.tag, nodes[(k + 1) % 4].tag);
            assert_eq!(seg.c, nodes[(k + 1) % 4].c);
        }
    }

    #[test]
    fn corners_are_never_merged() {
        let vertices = [Point::new(1.0, 9.0), Point::new(1.0, 1.0), Point::new(9.0, 1.0), Point::new(9.0, 9.0)];
        let nodes = smooth(&vertices, 1.0);
        assert!(nodes.iter().all(|n| n.tag == SegmentTag::Corner));
        assert_eq!(opticurve(&nodes, 0.2).len(), 4);
    }

    #[test]
    fn octagon_merges_into_five_cubics() {
        let nodes = smooth(&octagon(), 1.0);
        assert_eq!(nodes.len(), 8);
        assert!(nodes.iter().all(|n| n.tag == SegmentTag::CurveTo));

        let opt = opticurve(&nodes, 0.2);
        assert_eq!(opt.len(), 5);
        let ends: Vec<Point> = nodes.iter().map(|n| n.c[2]).collect();
        for seg in &opt.segments {
            assert_eq!(seg.tag, SegmentTag::CurveTo);
            assert!(ends.contains(&seg.c[2]), "{:?}", seg.c);
        }
    }

    #[test]
    fn zero_tolerance_merges_nothing() {
        let nodes = smooth(&octagon(), 1.0);
        assert_eq!(opticurve(&nodes, 0.0).len(), 8);
        assert!(opticurve(&[], 0.2).is_empty());
    }
}
