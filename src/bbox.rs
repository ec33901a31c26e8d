//! Extent of traced curves along arbitrary directions.
//!
//! The extent of a curve along a direction `dir` is the interval of
//! `<p, dir>` over all points `p` of the curve. Corner segments are
//! polylines, so their vertices bound them; cubic segments also need
//! their interior extrema, found from the roots of the derivative.

use kurbo::{Point, Rect, Vec2};

use crate::path::{Curve, PathList, SegmentTag};

/// A closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub fn new(min: f64, max: f64) -> Self {
        Interval { min, max }
    }

    pub fn singleton(x: f64) -> Self {
        Interval { min: x, max: x }
    }

    /// Grow the interval to contain `x`.
    pub fn extend(&mut self, x: f64) {
        if x < self.min {
            self.min = x;
        } else if x > self.max {
            self.max = x;
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        self.min <= x && x <= self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

#[inline]
fn project(p: Point, dir: Vec2) -> f64 {
    p.to_vec2().dot(dir)
}

fn cubic_1d(t: f64, x0: f64, x1: f64, x2: f64, x3: f64) -> f64 {
    let s = 1.0 - t;
    s * s * s * x0 + 3.0 * (s * s * t) * x1 + 3.0 * (t * t * s) * x2 + t * t * t * x3
}

/// Extend `i` by the 1-D cubic `x0..x3`, excluding its start point.
fn bezier_limits(x0: f64, x1: f64, x2: f64, x3: f64, i: &mut Interval) {
    i.extend(x3);

    // Convex hull already inside.
    if i.contains(x1) && i.contains(x2) {
        return;
    }

    // Extrema solve a t² + b t + c = 0.
    let a = -3.0 * x0 + 9.0 * x1 - 9.0 * x2 + 3.0 * x3;
    let b = 6.0 * x0 - 12.0 * x1 + 6.0 * x2;
    let c = -3.0 * x0 + 3.0 * x1;

    let mut roots = [f64::NAN; 2];
    if a == 0.0 {
        if b != 0.0 {
            roots[0] = -c / b;
        }
    } else {
        let d = b * b - 4.0 * a * c;
        if d > 0.0 {
            let r = d.sqrt();
            roots = [(-b - r) / (2.0 * a), (-b + r) / (2.0 * a)];
        }
    }
    for t in roots {
        if t > 0.0 && t < 1.0 {
            i.extend(cubic_1d(t, x0, x1, x2, x3));
        }
    }
}

impl Curve {
    /// Extend `i` to cover this curve projected onto `dir`.
    fn extend_limits(&self, dir: Vec2, i: &mut Interval) {
        let Some(mut prev) = self.start_point() else {
            return;
        };
        for seg in &self.segments {
            match seg.tag {
                SegmentTag::Corner => {
                    i.extend(project(seg.c[1], dir));
                    i.extend(project(seg.c[2], dir));
                }
                SegmentTag::CurveTo => bezier_limits(
                    project(prev, dir),
                    project(seg.c[0], dir),
                    project(seg.c[1], dir),
                    project(seg.c[2], dir),
                    i,
                ),
            }
            prev = seg.end();
        }
    }

    /// Smallest interval containing `<p, dir>` for every point `p` of the
    /// curve, or `None` for an empty curve.
    pub fn limits(&self, dir: Vec2) -> Option<Interval> {
        let start = self.start_point()?;
        let mut i = Interval::singleton(project(start, dir));
        self.extend_limits(dir, &mut i);
        Some(i)
    }
}

impl PathList {
    /// Extent of all paths along `dir`; `[0, 0]` when there are none.
    pub fn limits(&self, dir: Vec2) -> Interval {
        let Some(start) = self.paths.iter().find_map(|p| p.curve.start_point()) else {
            return Interval::new(0.0, 0.0);
        };
        let mut i = Interval::singleton(project(start, dir));
        for p in &self.paths {
            p.curve.extend_limits(dir, &mut i);
        }
        i
    }

    /// Axis-aligned bounding box of every curve, `None` when empty.
    pub fn bounding_box(&self) -> Option<Rect> {
        if self.paths.iter().all(|p| p.curve.is_empty()) {
            return None;
        }
        let x = self.limits(Vec2::new(1.0, 0.0));
        let y = self.limits(Vec2::new(0.0, 1.0));
        Some(Rect::new(x.min, y.min, x.max, y.max))
    }
}
