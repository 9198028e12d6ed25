//! Small 2D helpers shared by the quad search and decoding.

use nalgebra::Point2;
use std::f32::consts::{PI, TAU};

/// Below this |sin| between two line directions the lines count as parallel.
const PARALLEL_EPS: f64 = 1e-6;

/// Normalize an angle into `(-π, π]`.
#[inline]
pub fn mod2pi(angle: f32) -> f32 {
    let r = angle.rem_euclid(TAU);
    if r > PI {
        r - TAU
    } else {
        r
    }
}

#[inline]
pub fn distance(a: Point2<f32>, b: Point2<f32>) -> f32 {
    nalgebra::distance(&a, &b)
}

/// Orientation of the directed segment `a -> b`, in `(-π, π]`.
#[inline]
pub fn direction_angle(a: Point2<f32>, b: Point2<f32>) -> f32 {
    (b.y - a.y).atan2(b.x - a.x)
}

/// Intersect the infinite line through `a0, a1` with the one through `b0, b1`.
///
/// Returns `None` when either line is degenerate (coincident endpoints) or
/// the two lines are (nearly) parallel.
pub fn intersect_lines(
    a0: Point2<f32>,
    a1: Point2<f32>,
    b0: Point2<f32>,
    b1: Point2<f32>,
) -> Option<Point2<f32>> {
    let (ax, ay) = (a0.x as f64, a0.y as f64);
    let (bx, by) = (b0.x as f64, b0.y as f64);
    let (mut dax, mut day) = (a1.x as f64 - ax, a1.y as f64 - ay);
    let (mut dbx, mut dby) = (b1.x as f64 - bx, b1.y as f64 - by);

    let na = dax.hypot(day);
    let nb = dbx.hypot(dby);
    if na <= f64::EPSILON || nb <= f64::EPSILON {
        return None;
    }
    dax /= na;
    day /= na;
    dbx /= nb;
    dby /= nb;

    // Solve a0 + s * da = b0 + t * db for s.
    let det = dax * dby - day * dbx;
    if det.abs() < PARALLEL_EPS {
        return None;
    }
    let s = ((bx - ax) * dby - (by - ay) * dbx) / det;
    Some(Point2::new((ax + s * dax) as f32, (ay + s * day) as f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn mod2pi_range() {
        assert_relative_eq!(mod2pi(0.0), 0.0);
        assert_relative_eq!(mod2pi(PI), PI);
        assert_relative_eq!(mod2pi(-PI), PI);
        assert_relative_eq!(mod2pi(3.0 * FRAC_PI_2), -FRAC_PI_2, epsilon = 1e-6);
        assert_relative_eq!(mod2pi(-3.0 * FRAC_PI_2), FRAC_PI_2, epsilon = 1e-6);
        assert_relative_eq!(mod2pi(5.0 * TAU + 0.25), 0.25, epsilon = 1e-5);
    }

    #[test]
    fn perpendicular_lines_meet() {
        let p = intersect_lines(
            Point2::new(0.0, 5.0),
            Point2::new(1.0, 5.0),
            Point2::new(3.0, -2.0),
            Point2::new(3.0, 7.0),
        )
        .expect("intersection");
        assert_relative_eq!(p.x, 3.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn intersection_outside_segment_extent() {
        // Lines are infinite: the hit point need not lie on either segment.
        let p = intersect_lines(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(10.0, 0.0),
            Point2::new(9.0, 1.0),
        )
        .expect("intersection");
        assert_relative_eq!(p.x, 5.0, epsilon = 1e-4);
        assert_relative_eq!(p.y, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn parallel_and_degenerate_lines() {
        let a0 = Point2::new(0.0, 0.0);
        let a1 = Point2::new(10.0, 0.0);
        assert!(intersect_lines(a0, a1, Point2::new(20.0, 0.0), Point2::new(30.0, 0.0)).is_none());
        assert!(intersect_lines(a0, a1, Point2::new(0.0, 4.0), Point2::new(-5.0, 4.0)).is_none());
        assert!(intersect_lines(a0, a0, Point2::new(0.0, 4.0), Point2::new(0.0, 8.0)).is_none());
    }

    #[test]
    fn direction_and_distance() {
        let a = Point2::new(1.0, 1.0);
        let b = Point2::new(4.0, 5.0);
        assert_relative_eq!(distance(a, b), 5.0);
        assert_relative_eq!(direction_angle(a, a + nalgebra::Vector2::new(0.0, -1.0)), -FRAC_PI_2);
    }
}
