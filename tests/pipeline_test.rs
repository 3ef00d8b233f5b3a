use image::{GrayImage, Luma, Rgb, RgbImage};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use orb_image_matcher::features::Orb;
use orb_image_matcher::pipeline::{DisplayOptions, FrameView, MATCH_DRAW_LIMIT, process_frame};
use orb_image_matcher::template::Template;

/// Bright squares on a dark background at seeded positions; their corners
/// are stable FAST targets, so both sides of a matching pass get
/// descriptors.
fn dot_field(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut img = GrayImage::from_pixel(width, height, Luma([25]));
    for _ in 0..80 {
        let side = rng.random_range(3..8u32);
        let x0 = rng.random_range(0..width - side);
        let y0 = rng.random_range(0..height - side);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                img.put_pixel(x, y, Luma([230]));
            }
        }
    }
    img
}

fn to_rgb(gray: &GrayImage) -> RgbImage {
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        Rgb([p, p, p])
    })
}

fn textured_template() -> Template {
    Template::from_gray(dot_field(200, 160, 3))
}

fn textured_frame() -> RgbImage {
    // Same seed as the template, so plenty of mutual nearest neighbors.
    to_rgb(&dot_field(320, 240, 3))
}

#[test]
fn no_template_means_raw_passthrough() {
    let orb = Orb::new();
    let frame = textured_frame();
    let out = process_frame(&orb, None, &frame, DisplayOptions::default());
    assert_eq!(out.view, FrameView::Raw);
    assert_eq!(out.image.dimensions(), frame.dimensions());
    assert_eq!(out.image, frame);
}

#[test]
fn display_markers_only_overlays_frame_keypoints() {
    let orb = Orb::new();
    let template = textured_template();
    let frame = textured_frame();
    let opts = DisplayOptions {
        display_markers: true,
        connect_markers: false,
    };
    let out = process_frame(&orb, Some(&template), &frame, opts);
    assert_eq!(out.view, FrameView::Keypoints);
    // No template-side content: same canvas as the frame.
    assert_eq!(out.image.dimensions(), frame.dimensions());
}

#[test]
fn both_flags_off_shows_raw_frame() {
    let orb = Orb::new();
    let template = textured_template();
    let frame = textured_frame();
    let opts = DisplayOptions {
        display_markers: false,
        connect_markers: false,
    };
    let out = process_frame(&orb, Some(&template), &frame, opts);
    assert_eq!(out.view, FrameView::Raw);
    assert_eq!(out.image, frame);
}

#[test]
fn connect_markers_takes_priority_over_display_markers() {
    let orb = Orb::new();
    let template = textured_template();
    let frame = textured_frame();
    for display_markers in [false, true] {
        let opts = DisplayOptions {
            display_markers,
            connect_markers: true,
        };
        let out = process_frame(&orb, Some(&template), &frame, opts);
        assert_eq!(out.view, FrameView::Matches);
    }
}

#[test]
fn match_composite_is_side_by_side() {
    let orb = Orb::new();
    let template = textured_template();
    let frame = textured_frame();
    let opts = DisplayOptions {
        display_markers: false,
        connect_markers: true,
    };
    let out = process_frame(&orb, Some(&template), &frame, opts);
    assert_eq!(out.view, FrameView::Matches);

    let (tw, th) = template.dimensions();
    let (fw, fh) = frame.dimensions();
    assert_eq!(out.image.dimensions(), (tw + fw, th.max(fh)));
    assert_eq!(MATCH_DRAW_LIMIT, 20);
}

#[test]
fn display_markers_toggle_changes_the_next_tick() {
    let orb = Orb::new();
    let template = textured_template();
    let frame = textured_frame();
    let mut opts = DisplayOptions {
        display_markers: true,
        connect_markers: false,
    };

    let out = process_frame(&orb, Some(&template), &frame, opts);
    assert_eq!(out.view, FrameView::Keypoints);

    opts.display_markers = false;
    let out = process_frame(&orb, Some(&template), &frame, opts);
    assert_eq!(out.view, FrameView::Raw);
}

#[test]
fn defaults_match_the_ui_startup_state() {
    let opts = DisplayOptions::default();
    assert!(opts.display_markers);
    assert!(!opts.connect_markers);
}
