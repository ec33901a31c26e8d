//! Sub-pixel refinement of polygon vertices.
//!
//! Each polygon edge gets a best-fit line through the path points it
//! covers. A vertex is then moved to the point minimizing the summed
//! squared distance to the lines of its two edges, constrained to the
//! unit square centred on its original pixel corner.
//!
//! Distances are encoded as 3×3 quadratic forms so that
//!
//! ```text
//!   dist²(x, y) = [x, y, 1] · Q · [x, y, 1]ᵀ
//! ```
//!
//! and the forms of both edges simply add.

use kurbo::{Point, Vec2};

use super::polygon::{range_sums, Sums};

type Quad = [[f64; 3]; 3];

/// Move each polygon vertex `pt[po[i]]` to its refined position.
pub fn adjust_vertices(pt: &[(i32, i32)], po: &[usize], sums: &[Sums]) -> Vec<Point> {
    let n = pt.len();
    let m = po.len();
    if m == 0 {
        return Vec::new();
    }
    let (x0, y0) = pt[0];
    let origin = Vec2::new(f64::from(x0), f64::from(y0));

    // Quadratic form of each edge's fitted line.
    let q: Vec<Quad> = (0..m)
        .map(|i| {
            let j = (po[(i + 1) % m] + n - po[i]) % n + po[i];
            let (ctr, dir) = point_slope(sums, po[i], j);
            line_quad(ctr, dir)
        })
        .collect();

    (0..m)
        .map(|i| {
            let s = Point::new(f64::from(pt[po[i]].0 - x0), f64::from(pt[po[i]].1 - y0));
            let prev = &q[(i + m - 1) % m];
            let mut combined = [[0.0; 3]; 3];
            for (l, row) in combined.iter_mut().enumerate() {
                for (k, cell) in row.iter_mut().enumerate() {
                    *cell = prev[l][k] + q[i][l][k];
                }
            }
            solve_vertex(combined, s) + origin
        })
        .collect()
}

/// Best-fit line through the path points `i..=j` (cyclic), relative to
/// the first path point.
///
/// Returns the centroid and the unit direction of largest variance, or a
/// zero direction when the points have no spread at all.
fn point_slope(sums: &[Sums], i: usize, j: usize) -> (Point, Vec2) {
    let (s, k) = range_sums(sums, i, j);

    let ctr = Point::new(s.x / k, s.y / k);

    let mut a = (s.x2 - s.x * s.x / k) / k;
    let b = (s.xy - s.x * s.y / k) / k;
    let mut c = (s.y2 - s.y * s.y / k) / k;

    // Larger eigenvalue of the covariance matrix [[a, b], [b, c]].
    let lambda = (a + c + ((a - c) * (a - c) + 4.0 * b * b).sqrt()) / 2.0;
    a -= lambda;
    c -= lambda;

    let dir = if a.abs() >= c.abs() {
        let l = (a * a + b * b).sqrt();
        if l != 0.0 {
            Vec2::new(-b / l, a / l)
        } else {
            Vec2::ZERO
        }
    } else {
        let l = (c * c + b * b).sqrt();
        if l != 0.0 {
            Vec2::new(-c / l, b / l)
        } else {
            Vec2::ZERO
        }
    };
    (ctr, dir)
}

/// Squared distance from the line through `ctr` with direction `dir`.
fn line_quad(ctr: Point, dir: Vec2) -> Quad {
    let d = dir.hypot2();
    if d == 0.0 {
        return [[0.0; 3]; 3];
    }
    let v = [dir.y, -dir.x, dir.x * ctr.y - dir.y * ctr.x];
    outer(v, d)
}

fn outer(v: [f64; 3], d: f64) -> Quad {
    let mut q = [[0.0; 3]; 3];
    for (l, row) in q.iter_mut().enumerate() {
        for (k, cell) in row.iter_mut().enumerate() {
            *cell = v[l] * v[k] / d;
        }
    }
    q
}

fn eval_quad(q: &Quad, w: Point) -> f64 {
    let v = [w.x, w.y, 1.0];
    let mut sum = 0.0;
    for l in 0..3 {
        for k in 0..3 {
            sum += v[l] * q[l][k] * v[k];
        }
    }
    sum
}

/// Minimize `q` over the unit square centred on `s`.
fn solve_vertex(mut q: Quad, s: Point) -> Point {
    // Singular: the two lines are parallel or degenerate. Add a line
    // through `s` orthogonal to them until the system is solvable.
    let w = loop {
        let det = q[0][0] * q[1][1] - q[0][1] * q[1][0];
        if det != 0.0 {
            break Point::new(
                (-q[0][2] * q[1][1] + q[1][2] * q[0][1]) / det,
                (q[0][2] * q[1][0] - q[1][2] * q[0][0]) / det,
            );
        }
        let (vx, vy) = if q[0][0] > q[1][1] {
            (-q[0][1], q[0][0])
        } else if q[1][1] != 0.0 {
            (-q[1][1], q[1][0])
        } else {
            (1.0, 0.0)
        };
        let d = vx * vx + vy * vy;
        let extra = outer([vx, vy, -vy * s.y - vx * s.x], d);
        for l in 0..3 {
            for k in 0..3 {
                q[l][k] += extra[l][k];
            }
        }
    };

    if (w.x - s.x).abs() <= 0.5 && (w.y - s.y).abs() <= 0.5 {
        return w;
    }

    // Otherwise the minimum lies on the square's boundary.
    let mut best = s;
    let mut min = eval_quad(&q, s);
    let consider = |cand: Point, min: &mut f64, best: &mut Point| {
        let v = eval_quad(&q, cand);
        if v < *min {
            *min = v;
            *best = cand;
        }
    };

    if q[0][0] != 0.0 {
        for z in [-0.5, 0.5] {
            let wy = s.y + z;
            let wx = -(q[0][1] * wy + q[0][2]) / q[0][0];
            if (wx - s.x).abs() <= 0.5 {
                consider(Point::new(wx, wy), &mut min, &mut best);
            }
        }
    }
    if q[1][1] != 0.0 {
        for z in [-0.5, 0.5] {
            let wx = s.x + z;
            let wy = -(q[1][0] * wx + q[1][2]) / q[1][1];
            if (wy - s.y).abs() <= 0.5 {
                consider(Point::new(wx, wy), &mut min, &mut best);
            }
        }
    }
    for dx in [-0.5, 0.5] {
        for dy in [-0.5, 0.5] {
            consider(Point::new(s.x + dx, s.y + dy), &mut min, &mut best);
        }
    }
    best
}
