pub mod fast;
pub mod orb;

pub use orb::Orb;

use glam::Vec2;

/// A detected interest point in level-0 image coordinates.
#[derive(Debug, Clone, Copy)]
pub struct KeyPoint {
    pub pos: Vec2,
    /// Corner strength, used to rank keypoints across pyramid levels.
    pub response: f32,
    /// Orientation in radians from the intensity centroid.
    pub angle: f32,
    /// Pyramid level the point was detected on.
    pub octave: u32,
}

impl KeyPoint {
    pub fn new(x: f32, y: f32) -> KeyPoint {
        KeyPoint {
            pos: Vec2::new(x, y),
            response: 0.0,
            angle: 0.0,
            octave: 0,
        }
    }
}

pub const DESCRIPTOR_BYTES: usize = 32;

/// 256-bit binary descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor(pub [u8; DESCRIPTOR_BYTES]);

impl Descriptor {
    /// Hamming distance: XOR and popcount over all 32 bytes.
    pub fn distance(&self, other: &Descriptor) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}
