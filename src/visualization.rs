//! Keypoint and match rendering onto `image` buffers.

use image::{GrayImage, Rgb, RgbImage};

use crate::features::KeyPoint;
use crate::matching::FeatureMatch;

const KEYPOINT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const KEYPOINT_RADIUS: i32 = 3;

/// Overlays keypoint circles on a copy of the color frame.
pub fn draw_keypoints(frame: &RgbImage, keypoints: &[KeyPoint]) -> RgbImage {
    let mut out = frame.clone();
    for kp in keypoints {
        let center = (kp.pos.x.round() as i32, kp.pos.y.round() as i32);
        draw_circle(&mut out, center, KEYPOINT_RADIUS, KEYPOINT_COLOR);
    }
    out
}

/// Colors a match line by its rank among the drawn matches, warm to cool.
fn rank_color(rank: usize, total: usize) -> Rgb<u8> {
    let t = if total <= 1 {
        0.0
    } else {
        rank as f64 / (total - 1) as f64
    };
    let c = colorous::TURBO.eval_continuous(t);
    Rgb([c.r, c.g, c.b])
}

/// Renders the template and frame side by side with connecting lines for
/// at most `limit` matches. `matches` is expected sorted ascending by
/// distance; only the head of the list is drawn.
pub fn draw_matches(
    template: &GrayImage,
    template_kps: &[KeyPoint],
    frame: &RgbImage,
    frame_kps: &[KeyPoint],
    matches: &[FeatureMatch],
    limit: usize,
) -> RgbImage {
    let (w1, h1) = template.dimensions();
    let (w2, h2) = frame.dimensions();
    let mut out = RgbImage::new(w1 + w2, h1.max(h2));

    for y in 0..h1 {
        for x in 0..w1 {
            let p = template.get_pixel(x, y)[0];
            out.put_pixel(x, y, Rgb([p, p, p]));
        }
    }
    for y in 0..h2 {
        for x in 0..w2 {
            out.put_pixel(x + w1, y, *frame.get_pixel(x, y));
        }
    }

    let drawn = matches.len().min(limit);
    for (rank, m) in matches.iter().take(limit).enumerate() {
        let (Some(kp1), Some(kp2)) = (template_kps.get(m.query_idx), frame_kps.get(m.train_idx))
        else {
            continue;
        };
        let color = rank_color(rank, drawn);
        let p1 = (kp1.pos.x.round() as i32, kp1.pos.y.round() as i32);
        let p2 = (
            kp2.pos.x.round() as i32 + w1 as i32,
            kp2.pos.y.round() as i32,
        );
        draw_line(&mut out, p1, p2, color);
        draw_circle(&mut out, p1, 2, color);
        draw_circle(&mut out, p2, 2, color);
    }
    out
}

/// Bresenham line, clipped to the image.
fn draw_line(img: &mut RgbImage, p1: (i32, i32), p2: (i32, i32), color: Rgb<u8>) {
    let (mut x0, mut y0) = p1;
    let (x1, y1) = p2;

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if x0 >= 0 && x0 < img.width() as i32 && y0 >= 0 && y0 < img.height() as i32 {
            img.put_pixel(x0 as u32, y0 as u32, color);
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_circle(img: &mut RgbImage, center: (i32, i32), radius: i32, color: Rgb<u8>) {
    let (cx, cy) = center;
    let r2 = radius * radius;
    for y in (cy - radius)..=(cy + radius) {
        for x in (cx - radius)..=(cx + radius) {
            let on_ring = {
                let d2 = (x - cx).pow(2) + (y - cy).pow(2);
                d2 <= r2 && d2 >= (radius - 1).pow(2)
            };
            if on_ring && x >= 0 && x < img.width() as i32 && y >= 0 && y < img.height() as i32 {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn composite_dimensions() {
        let template = GrayImage::from_pixel(100, 80, Luma([10]));
        let frame = RgbImage::from_pixel(200, 150, Rgb([5, 5, 5]));
        let out = draw_matches(&template, &[], &frame, &[], &[], 20);
        assert_eq!(out.dimensions(), (300, 150));
    }

    #[test]
    fn keypoint_overlay_keeps_dimensions() {
        let frame = RgbImage::from_pixel(64, 48, Rgb([0, 0, 0]));
        let kps = vec![KeyPoint::new(10.0, 10.0), KeyPoint::new(63.0, 47.0)];
        let out = draw_keypoints(&frame, &kps);
        assert_eq!(out.dimensions(), frame.dimensions());
        // The ring around (10, 10) must have been painted.
        assert_eq!(*out.get_pixel(13, 10), KEYPOINT_COLOR);
    }
}
