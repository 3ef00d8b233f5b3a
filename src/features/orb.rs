//! ORB detector and descriptor extractor.
//!
//! FAST keypoints over an image pyramid, intensity-centroid orientation,
//! and a steered 256-bit BRIEF descriptor. Defaults follow the common
//! ORB parameterization (500 features, 8 levels, 1.2 scale step).

use image::{GrayImage, imageops};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::{DESCRIPTOR_BYTES, Descriptor, KeyPoint, fast};

/// Seed for the BRIEF sampling pattern. Fixed so descriptors are
/// reproducible across runs and across the two images of a matching pass.
const PATTERN_SEED: u64 = 0x0b5e55ed;

const PATTERN_PAIRS: usize = DESCRIPTOR_BYTES * 8;

pub struct Orb {
    n_features: usize,
    scale_factor: f32,
    n_levels: usize,
    fast_threshold: u8,
    patch_size: i32,
    pattern: Vec<(f32, f32, f32, f32)>,
}

impl Default for Orb {
    fn default() -> Self {
        Self::new()
    }
}

impl Orb {
    pub fn new() -> Orb {
        Orb {
            n_features: 500,
            scale_factor: 1.2,
            n_levels: 8,
            fast_threshold: 20,
            patch_size: 31,
            pattern: brief_pattern(31),
        }
    }

    pub fn with_n_features(mut self, n: usize) -> Orb {
        self.n_features = n;
        self
    }

    pub fn with_n_levels(mut self, n: usize) -> Orb {
        self.n_levels = n.max(1);
        self
    }

    pub fn with_fast_threshold(mut self, threshold: u8) -> Orb {
        self.fast_threshold = threshold;
        self
    }

    /// Detects keypoints and extracts their descriptors in one pass.
    ///
    /// The two vectors are parallel: keypoints whose descriptor patch falls
    /// outside the image are dropped. Both are empty for featureless input.
    pub fn detect_and_compute(&self, image: &GrayImage) -> (Vec<KeyPoint>, Vec<Descriptor>) {
        let mut detected: Vec<(KeyPoint, Descriptor)> = Vec::new();
        let mut scale = 1.0f32;

        for level in 0..self.n_levels {
            let level_image;
            let img = if level == 0 {
                image
            } else {
                let new_w = (image.width() as f32 / scale) as u32;
                let new_h = (image.height() as f32 / scale) as u32;
                if new_w < 16 || new_h < 16 {
                    break;
                }
                level_image =
                    imageops::resize(image, new_w, new_h, imageops::FilterType::Triangle);
                &level_image
            };

            for mut kp in fast::detect(img, self.fast_threshold) {
                kp.angle = intensity_centroid_angle(img, &kp, self.patch_size);
                if let Some(desc) = self.describe(img, &kp) {
                    kp.octave = level as u32;
                    // Map back to level-0 coordinates.
                    kp.pos *= scale;
                    detected.push((kp, desc));
                }
            }
            scale *= self.scale_factor;
        }

        detected.sort_by(|a, b| {
            b.0.response
                .partial_cmp(&a.0.response)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        detected.truncate(self.n_features);
        detected.into_iter().unzip()
    }

    /// Steered BRIEF: the sampling pattern is rotated by the keypoint angle
    /// before each pairwise intensity test.
    fn describe(&self, image: &GrayImage, kp: &KeyPoint) -> Option<Descriptor> {
        let w = image.width() as i32;
        let h = image.height() as i32;
        let cx = kp.pos.x.round() as i32;
        let cy = kp.pos.y.round() as i32;

        // The rotated pattern must stay inside the image for every angle.
        let margin = (self.patch_size / 2) + 2;
        if cx < margin || cx >= w - margin || cy < margin || cy >= h - margin {
            return None;
        }

        let (sin_a, cos_a) = kp.angle.sin_cos();
        let mut bytes = [0u8; DESCRIPTOR_BYTES];

        for (i, &(x1, y1, x2, y2)) in self.pattern.iter().enumerate() {
            let p1 = sample(image, cx, cy, x1, y1, sin_a, cos_a);
            let p2 = sample(image, cx, cy, x2, y2, sin_a, cos_a);
            if p1 < p2 {
                bytes[i / 8] |= 1u8 << (i % 8);
            }
        }
        Some(Descriptor(bytes))
    }
}

#[inline]
fn sample(image: &GrayImage, cx: i32, cy: i32, x: f32, y: f32, sin_a: f32, cos_a: f32) -> u8 {
    let rx = (cos_a * x - sin_a * y).round() as i32;
    let ry = (sin_a * x + cos_a * y).round() as i32;
    let px = (cx + rx).clamp(0, image.width() as i32 - 1);
    let py = (cy + ry).clamp(0, image.height() as i32 - 1);
    image.get_pixel(px as u32, py as u32)[0]
}

/// Orientation from the patch intensity centroid: atan2(m01, m10) over a
/// circular patch centered on the keypoint.
fn intensity_centroid_angle(image: &GrayImage, kp: &KeyPoint, patch_size: i32) -> f32 {
    let radius = patch_size / 2;
    let w = image.width() as i32;
    let h = image.height() as i32;
    let cx = kp.pos.x.round() as i32;
    let cy = kp.pos.y.round() as i32;

    let mut m01 = 0f32;
    let mut m10 = 0f32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let px = cx + dx;
            let py = cy + dy;
            if px < 0 || px >= w || py < 0 || py >= h {
                continue;
            }
            let v = image.get_pixel(px as u32, py as u32)[0] as f32;
            m10 += dx as f32 * v;
            m01 += dy as f32 * v;
        }
    }
    m01.atan2(m10)
}

/// 256 point pairs drawn uniformly from the patch with a fixed-seed ChaCha8
/// stream, so every `Orb` instance tests the same pattern.
fn brief_pattern(patch_size: i32) -> Vec<(f32, f32, f32, f32)> {
    let mut rng = ChaCha8Rng::seed_from_u64(PATTERN_SEED);
    let half = patch_size as f32 / 2.0;
    (0..PATTERN_PAIRS)
        .map(|_| {
            (
                rng.random_range(-half..half),
                rng.random_range(-half..half),
                rng.random_range(-half..half),
                rng.random_range(-half..half),
            )
        })
        .collect()
}
