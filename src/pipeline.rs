//! Per-tick capture processing: detect, match, pick the render branch.
//!
//! Everything here is synchronous and stateless across ticks; each frame is
//! processed from scratch with whatever template and display options are
//! current at that moment.

use image::{RgbImage, imageops};

use crate::features::Orb;
use crate::matching;
use crate::template::Template;
use crate::visualization;

/// At most this many match lines are drawn in the composite view.
pub const MATCH_DRAW_LIMIT: usize = 20;

/// Checkbox state, read fresh every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub display_markers: bool,
    pub connect_markers: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions {
            display_markers: true,
            connect_markers: false,
        }
    }
}

/// Which render branch a tick took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameView {
    /// The unmodified color frame.
    Raw,
    /// Frame with keypoint markers overlaid.
    Keypoints,
    /// Side-by-side template/frame composite with match lines.
    Matches,
}

pub struct ProcessedFrame {
    pub image: RgbImage,
    pub view: FrameView,
}

/// Runs one tick of the matching pass.
///
/// Branch priority: with a template loaded and descriptors on both sides,
/// `connect_markers` wins over `display_markers`; `display_markers` shows
/// frame keypoints; otherwise the raw frame goes through untouched. Without
/// a template no detection runs at all.
pub fn process_frame(
    orb: &Orb,
    template: Option<&Template>,
    frame: &RgbImage,
    opts: DisplayOptions,
) -> ProcessedFrame {
    let Some(template) = template else {
        return ProcessedFrame {
            image: frame.clone(),
            view: FrameView::Raw,
        };
    };

    let gray = imageops::grayscale(frame);
    let (template_kps, template_descs) = orb.detect_and_compute(template.image());
    let (frame_kps, frame_descs) = orb.detect_and_compute(&gray);

    if opts.connect_markers && !template_descs.is_empty() && !frame_descs.is_empty() {
        let matches = matching::match_descriptors(&template_descs, &frame_descs);
        log::debug!(
            "{} cross-checked matches ({} template / {} frame keypoints)",
            matches.len(),
            template_kps.len(),
            frame_kps.len()
        );
        let composite = visualization::draw_matches(
            template.image(),
            &template_kps,
            frame,
            &frame_kps,
            &matches,
            MATCH_DRAW_LIMIT,
        );
        return ProcessedFrame {
            image: composite,
            view: FrameView::Matches,
        };
    }

    if opts.display_markers {
        return ProcessedFrame {
            image: visualization::draw_keypoints(frame, &frame_kps),
            view: FrameView::Keypoints,
        };
    }

    ProcessedFrame {
        image: frame.clone(),
        view: FrameView::Raw,
    }
}
