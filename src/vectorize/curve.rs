//! Corner detection and Bezier generation from an adjusted polygon.
//!
//! Every polygon vertex becomes one segment, running from the midpoint of
//! the edge before the vertex to the midpoint of the edge after it. The
//! vertex's alpha, a measure of how sharply the polygon turns there,
//! decides between a corner (two straight lines through the vertex) and a
//! cubic whose control points sit on the two edges.

use kurbo::Point;

use crate::geom::{ddenom, dpara, interval};
use crate::path::{Curve, Segment, SegmentTag};

/// Smallest alpha used for a cubic; flatter vertices are rounded up.
const ALPHA_MIN: f64 = 0.55;

/// One segment of a curve under construction, keeping the polygon vertex
/// it was made from and its fitting parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveNode {
    pub tag: SegmentTag,
    /// Control points. `c[0]` is unused for corners.
    pub c: [Point; 3],
    /// Polygon vertex this segment turns around.
    pub vertex: Point,
    /// Alpha after clamping; unclamped for corners.
    pub alpha: f64,
}

/// Turn polygon `vertices` into segments, splitting at vertices whose
/// alpha reaches `alpha_max`.
///
/// For vertex `j` with neighbours `i` and `k`, alpha is the distance of
/// `j` from the line `i → k`, measured against the snapped normal of that
/// line and mapped so that a right-angle turn on a long enough edge gives
/// exactly 1.
pub fn smooth(vertices: &[Point], alpha_max: f64) -> Vec<CurveNode> {
    let m = vertices.len();
    let mut nodes = Vec::with_capacity(m);

    for j in 0..m {
        let i = (j + m - 1) % m;
        let k = (j + 1) % m;
        let (vi, vj, vk) = (vertices[i], vertices[j], vertices[k]);

        let mid = interval(0.5, vk, vj);

        let denom = ddenom(vi, vk);
        let alpha0 = if denom != 0.0 {
            let dd = (dpara(vi, vj, vk) / denom).abs();
            let a = if dd > 1.0 { 1.0 - 1.0 / dd } else { 0.0 };
            a / 0.75
        } else {
            4.0 / 3.0
        };

        let node = if alpha0 >= alpha_max {
            CurveNode {
                tag: SegmentTag::Corner,
                c: [Point::ZERO, vj, mid],
                vertex: vj,
                alpha: alpha0,
            }
        } else {
            let alpha = alpha0.clamp(ALPHA_MIN, 1.0);
            CurveNode {
                tag: SegmentTag::CurveTo,
                c: [
                    interval(0.5 + 0.5 * alpha, vi, vj),
                    interval(0.5 + 0.5 * alpha, vk, vj),
                    mid,
                ],
                vertex: vj,
                alpha,
            }
        };
        nodes.push(node);
    }

    nodes
}

/// Strip the fitting data, keeping the segments.
pub fn to_curve(nodes: &[CurveNode]) -> Curve {
    Curve {
        segments: nodes.iter().map(|n| Segment { tag: n.tag, c: n.c }).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, side),
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
        ]
    }

    fn close(a: Point, x: f64, y: f64) -> bool {
        (a.x - x).abs() < 1e-9 && (a.y - y).abs() < 1e-9
    }

    #[test]
    fn small_square_is_rounded() {
        let nodes = smooth(&square(4.0), 1.0);
        assert_eq!(nodes.len(), 4);
        assert!(nodes.iter().all(|n| n.tag == SegmentTag::CurveTo));
        let n = &nodes[1];
        assert!((n.alpha - 2.0 / 3.0).abs() < 1e-12);
        assert!(close(n.c[0], 0.0, 2.0 / 3.0), "{:?}", n.c);
        assert!(close(n.c[1], 2.0 / 3.0, 0.0), "{:?}", n.c);
        assert!(close(n.c[2], 2.0, 0.0), "{:?}", n.c);
        assert_eq!(n.vertex, Point::ZERO);
    }

    #[test]
    fn large_square_keeps_corners() {
        let nodes = smooth(&square(8.0), 1.0);
        assert!(nodes.iter().all(|n| n.tag == SegmentTag::Corner));
        assert_eq!(nodes[1].c, [Point::ZERO, Point::ZERO, Point::new(4.0, 0.0)]);
        assert_eq!(nodes[1].alpha, 1.0);

        // A higher threshold lets the same turn through as a curve.
        let nodes = smooth(&square(8.0), 1.2);
        assert!(nodes.iter().all(|n| n.tag == SegmentTag::CurveTo));
    }

    #[test]
    fn zero_alpha_max_gives_a_polygon() {
        let nodes = smooth(&square(4.0), 0.0);
        assert!(nodes.iter().all(|n| n.tag == SegmentTag::Corner));
        let curve = to_curve(&nodes);
        assert_eq!(curve.len(), 4);
        assert_eq!(curve.segments[2].c[1], Point::new(4.0, 0.0));
    }

    #[test]
    fn flat_vertex_is_clamped_to_minimum_alpha() {
        // The middle vertex of a straight run.
        let vertices = [Point::new(0.0, 0.0), Point::new(3.0, 0.0), Point::new(6.0, 0.0), Point::new(3.0, 5.0)];
        let nodes = smooth(&vertices, 1.0);
        assert_eq!(nodes[1].alpha, ALPHA_MIN);
        assert_eq!(nodes[1].c[0], interval(0.5 + 0.5 * ALPHA_MIN, vertices[0], vertices[1]));
        assert_eq!(nodes[1].tag, SegmentTag::CurveTo);
    }

    #[test]
    fn coincident_neighbours_force_a_corner() {
        let vertices = [Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
        let nodes = smooth(&vertices, 1.0);
        assert!(nodes.iter().all(|n| n.tag == SegmentTag::Corner));
        assert_eq!(nodes[0].alpha, 4.0 / 3.0);
    }
}
