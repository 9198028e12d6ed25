//! Quadrilateral candidates and their bilinear tag-to-image mapping.

use nalgebra::{Point2, Vector2};
use tagquad_core::{distance, SegmentId};

/// A tag candidate: four image-space corners plus the segments that bound it.
///
/// Corners are immutable once constructed. The bilinear basis
/// (`p0`, `p3`, `p01`, `p32`) is cached for [`Quad::interpolate`].
#[derive(Clone, Debug, PartialEq)]
pub struct Quad {
    corners: [Point2<f32>; 4],
    segments: Option<[SegmentId; 4]>,
    observed_perimeter: f32,
    p0: Point2<f32>,
    p3: Point2<f32>,
    p01: Vector2<f32>,
    p32: Vector2<f32>,
}

impl Quad {
    /// Build a quad from known corners, with no bounding segments.
    pub fn new(corners: [Point2<f32>; 4]) -> Self {
        Self {
            corners,
            segments: None,
            observed_perimeter: 0.0,
            p0: corners[0],
            p3: corners[3],
            p01: corners[1] - corners[0],
            p32: corners[2] - corners[3],
        }
    }

    pub(crate) fn with_segments(
        corners: [Point2<f32>; 4],
        segments: [SegmentId; 4],
        observed_perimeter: f32,
    ) -> Self {
        Self {
            segments: Some(segments),
            observed_perimeter,
            ..Self::new(corners)
        }
    }

    #[inline]
    pub fn corners(&self) -> &[Point2<f32>; 4] {
        &self.corners
    }

    /// Bounding segments, in search order; `None` for quads built from corners.
    #[inline]
    pub fn segments(&self) -> Option<&[SegmentId; 4]> {
        self.segments.as_ref()
    }

    /// Sum of bounding segment lengths (`None` without segments).
    #[inline]
    pub fn observed_perimeter(&self) -> Option<f32> {
        self.segments.map(|_| self.observed_perimeter)
    }

    /// Lengths of the edges `p[i] -> p[i+1]`.
    pub fn edge_lengths(&self) -> [f32; 4] {
        let p = &self.corners;
        [
            distance(p[0], p[1]),
            distance(p[1], p[2]),
            distance(p[2], p[3]),
            distance(p[3], p[0]),
        ]
    }

    /// Map `(u, v)` in `[-1, 1]²` to image pixels.
    #[inline]
    pub fn interpolate(&self, u: f32, v: f32) -> Point2<f32> {
        let kx = (u + 1.0) / 2.0;
        let ky = (v + 1.0) / 2.0;
        let r1 = self.p0 + self.p01 * kx;
        let r2 = self.p3 + self.p32 * kx;
        r1 + (r2 - r1) * ky
    }

    /// Map `(u, v)` in `[0, 1]²` to image pixels.
    #[inline]
    pub fn interpolate01(&self, u: f32, v: f32) -> Point2<f32> {
        self.interpolate(2.0 * u - 1.0, 2.0 * v - 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Quad {
        Quad::new([
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ])
    }

    fn skewed() -> Quad {
        Quad::new([
            Point2::new(12.0, 8.0),
            Point2::new(57.5, 14.0),
            Point2::new(49.0, 61.0),
            Point2::new(5.0, 44.5),
        ])
    }

    #[test]
    fn interpolate01_hits_corners() {
        let q = unit_square();
        let c = q.corners();
        assert_relative_eq!(q.interpolate01(0.0, 0.0), c[0]);
        assert_relative_eq!(q.interpolate01(1.0, 0.0), c[1]);
        assert_relative_eq!(q.interpolate01(1.0, 1.0), c[2]);
        assert_relative_eq!(q.interpolate01(0.0, 1.0), c[3]);

        let q = skewed();
        let c = *q.corners();
        assert_relative_eq!(q.interpolate(-1.0, -1.0), c[0], epsilon = 1e-4);
        assert_relative_eq!(q.interpolate(1.0, -1.0), c[1], epsilon = 1e-4);
        assert_relative_eq!(q.interpolate(1.0, 1.0), c[2], epsilon = 1e-4);
        assert_relative_eq!(q.interpolate(-1.0, 1.0), c[3], epsilon = 1e-4);
    }

    #[test]
    fn interpolate_and_interpolate01_agree() {
        let q = skewed();
        for i in 0..=8 {
            for j in 0..=8 {
                let u = i as f32 / 8.0;
                let v = j as f32 / 8.0;
                let a = q.interpolate01(u, v);
                let b = q.interpolate(2.0 * u - 1.0, 2.0 * v - 1.0);
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn center_maps_to_bilinear_midpoint() {
        let q = skewed();
        let c = q.corners();
        let mid = Point2::from((c[0].coords + c[1].coords + c[2].coords + c[3].coords) / 4.0);
        assert_relative_eq!(q.interpolate(0.0, 0.0), mid, epsilon = 1e-4);
    }

    #[test]
    fn corner_quads_have_no_provenance() {
        let q = unit_square();
        assert!(q.segments().is_none());
        assert!(q.observed_perimeter().is_none());
        assert_eq!(q.edge_lengths(), [1.0; 4]);

        let ids = [SegmentId(3), SegmentId(1), SegmentId(0), SegmentId(2)];
        let q = Quad::with_segments(*unit_square().corners(), ids, 4.2);
        assert_eq!(q.segments(), Some(&ids));
        assert_eq!(q.observed_perimeter(), Some(4.2));
    }
}
