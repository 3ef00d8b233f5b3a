use image::{GrayImage, Luma};
use orb_image_matcher::template::{MAX_TEMPLATE_EDGE, Template, TemplateError};

fn solid(w: u32, h: u32) -> GrayImage {
    GrayImage::from_pixel(w, h, Luma([128]))
}

#[test]
fn oversized_landscape_is_capped_to_450() {
    let t = Template::from_gray(solid(900, 600));
    assert_eq!(t.dimensions(), (450, 300));
}

#[test]
fn oversized_portrait_is_capped_to_450() {
    let t = Template::from_gray(solid(300, 900));
    assert_eq!(t.dimensions(), (150, 450));
}

#[test]
fn long_edge_lands_exactly_on_the_limit() {
    for (w, h) in [(451, 300), (1234, 999), (999, 1234), (4000, 17)] {
        let t = Template::from_gray(solid(w, h));
        let (tw, th) = t.dimensions();
        assert_eq!(tw.max(th), MAX_TEMPLATE_EDGE, "input {}x{}", w, h);

        // Aspect ratio preserved within rounding of the short edge.
        let input_aspect = w as f64 / h as f64;
        let output_aspect = tw as f64 / th as f64;
        let tolerance = input_aspect / tw.min(th) as f64;
        assert!(
            (input_aspect - output_aspect).abs() <= tolerance,
            "aspect drifted for {}x{}: {} vs {}",
            w,
            h,
            input_aspect,
            output_aspect
        );
    }
}

#[test]
fn images_at_or_under_the_limit_are_unchanged() {
    let t = Template::from_gray(solid(450, 200));
    assert_eq!(t.dimensions(), (450, 200));

    let t = Template::from_gray(solid(100, 80));
    assert_eq!(t.dimensions(), (100, 80));

    let t = Template::from_gray(solid(450, 450));
    assert_eq!(t.dimensions(), (450, 450));
}

#[test]
fn loading_replaces_the_previous_template() {
    let dir = std::env::temp_dir();
    let first = dir.join("orbim_template_first.png");
    let second = dir.join("orbim_template_second.png");
    solid(120, 90).save(&first).unwrap();
    solid(60, 40).save(&second).unwrap();

    let mut slot = Some(Template::load(&first).unwrap());
    assert_eq!(slot.as_ref().unwrap().dimensions(), (120, 90));

    slot = Some(Template::load(&second).unwrap());
    assert_eq!(slot.as_ref().unwrap().dimensions(), (60, 40));

    std::fs::remove_file(first).ok();
    std::fs::remove_file(second).ok();
}

#[test]
fn missing_file_is_an_io_error() {
    let err = Template::load("/nonexistent/template.png").unwrap_err();
    assert!(matches!(err, TemplateError::Io(_)));
}

#[test]
fn garbage_content_is_a_decode_error() {
    let path = std::env::temp_dir().join("orbim_template_garbage.png");
    std::fs::write(&path, b"not an image at all").unwrap();
    let err = Template::load(&path).unwrap_err();
    assert!(matches!(err, TemplateError::Decode(_)));
    std::fs::remove_file(path).ok();
}
