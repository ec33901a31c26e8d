//! Shared geometry utilities.

use kurbo::{CubicBez, ParamCurve, Point, Vec2};

/// Sign function: -1, 0, or 1.
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Point at parameter `lambda` on the line through `a` and `b`.
#[inline]
pub fn interval(lambda: f64, a: Point, b: Point) -> Point {
    a + (b - a) * lambda
}

/// Direction 90° counter-clockwise from `p0 → p2`, snapped to the
/// nearest of the eight compass directions.
pub fn dorth_infty(p0: Point, p2: Point) -> Vec2 {
    Vec2::new(-sign(p2.y - p0.y), sign(p2.x - p0.x))
}

/// Twice the signed area of the triangle `p0, p1, p2`.
#[inline]
pub fn dpara(p0: Point, p1: Point, p2: Point) -> f64 {
    (p1 - p0).cross(p2 - p0)
}

/// Distance of `p2` from `p0` measured along `dorth_infty(p0, p2)`.
/// Zero only when `p0 == p2`.
pub fn ddenom(p0: Point, p2: Point) -> f64 {
    let r = dorth_infty(p0, p2);
    r.y * (p2.x - p0.x) - r.x * (p2.y - p0.y)
}

/// Cross product of `p0 → p1` and `p2 → p3`.
#[inline]
pub fn cprod(p0: Point, p1: Point, p2: Point, p3: Point) -> f64 {
    (p1 - p0).cross(p3 - p2)
}

/// Inner product of `p0 → p1` and `p0 → p2`.
#[inline]
pub fn iprod(p0: Point, p1: Point, p2: Point) -> f64 {
    (p1 - p0).dot(p2 - p0)
}

/// Inner product of `p0 → p1` and `p2 → p3`.
#[inline]
pub fn iprod1(p0: Point, p1: Point, p2: Point, p3: Point) -> f64 {
    (p1 - p0).dot(p3 - p2)
}

/// Point at `t` on the cubic `p0 p1 p2 p3`.
pub fn bezier(t: f64, p0: Point, p1: Point, p2: Point, p3: Point) -> Point {
    CubicBez::new(p0, p1, p2, p3).eval(t)
}

/// Parameter `t ∈ [0, 1]` where the cubic's tangent is parallel to
/// `q0 → q1`, or `None` if there is no such point.
///
/// The tangent direction is a quadratic in `t`, so this solves
/// `a t² + b t + c = 0` and returns the first root inside the interval.
pub fn tangent(p0: Point, p1: Point, p2: Point, p3: Point, q0: Point, q1: Point) -> Option<f64> {
    let big_a = cprod(p0, p1, q0, q1);
    let big_b = cprod(p1, p2, q0, q1);
    let big_c = cprod(p2, p3, q0, q1);

    let a = big_a - 2.0 * big_b + big_c;
    let b = -2.0 * big_a + 2.0 * big_b;
    let c = big_a;
    let d = b * b - 4.0 * a * c;

    if a == 0.0 || d < 0.0 {
        return None;
    }

    let s = d.sqrt();
    let r1 = (-b + s) / (2.0 * a);
    let r2 = (-b - s) / (2.0 * a);
    [r1, r2].into_iter().find(|r| (0.0..=1.0).contains(r))
}
