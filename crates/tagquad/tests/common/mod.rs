#![allow(dead_code)]

use nalgebra::{Matrix2, Point2, Vector2};
use tagquad::{GrayImage, Quad, SegmentGraph, SegmentId, TagLayout};

pub const WHITE: u8 = 255;
pub const BLACK: u8 = 0;

/// Four chained segments bounding a square of side `side` centred at
/// `center`, rotated by `angle` radians. Returned in chain order
/// (bottom, right, top, left) for an unrotated square in y-down coordinates.
pub fn square_segments(
    center: Point2<f32>,
    side: f32,
    angle: f32,
) -> [(Point2<f32>, Point2<f32>); 4] {
    let h = side / 2.0;
    let (s, c) = angle.sin_cos();
    let rot = |dx: f32, dy: f32| {
        Point2::new(center.x + c * dx - s * dy, center.y + s * dx + c * dy)
    };
    let tl = rot(-h, -h);
    let tr = rot(h, -h);
    let br = rot(h, h);
    let bl = rot(-h, h);
    [(bl, br), (br, tr), (tr, tl), (tl, bl)]
}

pub fn push_square(
    graph: &mut SegmentGraph,
    center: Point2<f32>,
    side: f32,
    angle: f32,
) -> [SegmentId; 4] {
    square_segments(center, side, angle).map(|(p0, p1)| graph.push(p0, p1))
}

/// Value of payload bit `(px, py)` in `code` under the decoder's scan order:
/// rows from `py = dim - 1` down to `0`, columns left to right, first bit
/// most significant.
pub fn payload_bit(code: u64, layout: TagLayout, px: u32, py: u32) -> bool {
    let dim = layout.dimension_bits;
    let total = layout.payload_bits().expect("payload fits u32");
    let k = (dim - 1 - py) * dim + px;
    (code >> (total - 1 - k)) & 1 == 1
}

/// Render a tag with payload `code` into the parallelogram spanned by `quad`.
///
/// Pixels are classified by solving `pixel = p0 + u·(p1 - p0) + v·(p3 - p0)`
/// for the normalized tag coordinate `(u, v)`. Everything outside the tag is
/// white; the border ring is black; payload cells are white for a 1 bit.
pub fn render_tag(
    width: u32,
    height: u32,
    quad: &Quad,
    layout: TagLayout,
    code: u64,
) -> GrayImage {
    let c = quad.corners();
    let a: Vector2<f32> = c[1] - c[0];
    let b: Vector2<f32> = c[3] - c[0];
    let inv = Matrix2::from_columns(&[a, b])
        .try_inverse()
        .expect("non-degenerate quad");

    let lb = layout.length_bits().expect("length fits u32") as i32;
    let bb = layout.black_border as i32;
    let mut img = GrayImage::filled(width as usize, height as usize, WHITE);
    for y in 0..height as usize {
        for x in 0..width as usize {
            let uv = inv * (Point2::new(x as f32, y as f32) - c[0]);
            let xb = (uv.x * lb as f32).floor() as i32;
            let yb = (uv.y * lb as f32).floor() as i32;
            if !(0..lb).contains(&xb) || !(0..lb).contains(&yb) {
                continue;
            }
            let on_border = xb < bb || yb < bb || xb >= lb - bb || yb >= lb - bb;
            let white =
                !on_border && payload_bit(code, layout, (xb - bb) as u32, (yb - bb) as u32);
            img.set(x, y, if white { WHITE } else { BLACK });
        }
    }
    img
}
