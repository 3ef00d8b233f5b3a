//! FAST-9 corner detection.
//!
//! A pixel is a corner when 9 contiguous pixels on the 16-pixel Bresenham
//! circle around it are all brighter or all darker than the center by the
//! threshold.

use image::GrayImage;

use super::KeyPoint;

/// Bresenham circle of radius 3, clockwise from 12 o'clock.
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

const ARC_LEN: u32 = 9;

/// Detects FAST-9 corners with 3x3 non-maximum suppression.
///
/// Responses are the summed absolute differences of the circle pixels that
/// pass the threshold test. Orientation is left at zero for the caller.
pub fn detect(image: &GrayImage, threshold: u8) -> Vec<KeyPoint> {
    let w = image.width() as i32;
    let h = image.height() as i32;
    if w < 7 || h < 7 {
        return Vec::new();
    }

    let mut scores = vec![0f32; (w * h) as usize];
    for y in 3..h - 3 {
        for x in 3..w - 3 {
            if let Some(score) = corner_score(image, x, y, threshold) {
                scores[(y * w + x) as usize] = score;
            }
        }
    }

    let mut keypoints = Vec::new();
    for y in 3..h - 3 {
        for x in 3..w - 3 {
            let s = scores[(y * w + x) as usize];
            if s <= 0.0 {
                continue;
            }
            let mut is_max = true;
            'nms: for dy in -1..=1 {
                for dx in -1..=1 {
                    if (dx, dy) == (0, 0) {
                        continue;
                    }
                    if scores[((y + dy) * w + x + dx) as usize] > s {
                        is_max = false;
                        break 'nms;
                    }
                }
            }
            if is_max {
                let mut kp = KeyPoint::new(x as f32, y as f32);
                kp.response = s;
                keypoints.push(kp);
            }
        }
    }
    keypoints
}

/// Returns the corner response, or `None` when the segment test fails.
fn corner_score(image: &GrayImage, x: i32, y: i32, threshold: u8) -> Option<f32> {
    let center = image.get_pixel(x as u32, y as u32)[0];
    let hi = center.saturating_add(threshold);
    let lo = center.saturating_sub(threshold);

    // -1 darker, 0 similar, 1 brighter, per circle pixel.
    let mut states = [0i8; 16];
    for (i, &(dx, dy)) in CIRCLE.iter().enumerate() {
        let v = image.get_pixel((x + dx) as u32, (y + dy) as u32)[0];
        states[i] = if v > hi {
            1
        } else if v < lo {
            -1
        } else {
            0
        };
    }

    if !(has_contiguous_arc(&states, 1) || has_contiguous_arc(&states, -1)) {
        return None;
    }

    let score: u32 = CIRCLE
        .iter()
        .map(|&(dx, dy)| {
            let v = image.get_pixel((x + dx) as u32, (y + dy) as u32)[0];
            let diff = v.abs_diff(center);
            if diff > threshold { diff as u32 } else { 0 }
        })
        .sum();
    Some(score as f32)
}

/// Checks for `ARC_LEN` contiguous circle pixels in the given state,
/// wrapping around the circle.
fn has_contiguous_arc(states: &[i8; 16], wanted: i8) -> bool {
    let mut run = 0u32;
    // Doubling the circle handles arcs crossing the start index.
    for i in 0..32 {
        if states[i % 16] == wanted {
            run += 1;
            if run >= ARC_LEN {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn blank_image_has_no_corners() {
        let img = GrayImage::from_pixel(64, 64, Luma([127]));
        assert!(detect(&img, 20).is_empty());
    }

    #[test]
    fn bright_dot_is_a_corner() {
        let mut img = GrayImage::from_pixel(32, 32, Luma([0]));
        for y in 14..18 {
            for x in 14..18 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let kps = detect(&img, 20);
        assert!(!kps.is_empty());
        for kp in &kps {
            assert!(kp.pos.x >= 12.0 && kp.pos.x <= 20.0);
            assert!(kp.pos.y >= 12.0 && kp.pos.y <= 20.0);
        }
    }
}
