//! The windowed application: controls, tick loop, video display.

use std::time::{Duration, Instant};

use eframe::egui;

use crate::capture::CaptureController;
use crate::features::Orb;
use crate::pipeline::{self, DisplayOptions};
use crate::template::{TEMPLATE_EXTENSIONS, Template};

pub const WINDOW_TITLE: &str = "ORB Image Matcher";

const VIDEO_AREA: egui::Vec2 = egui::Vec2::new(960.0, 720.0);
const TICK_INTERVAL: Duration = Duration::from_millis(30);
const CAMERA_INDEX: usize = 0;

pub struct MatcherApp {
    capture: CaptureController,
    template: Option<Template>,
    options: DisplayOptions,
    orb: Orb,
    texture: Option<egui::TextureHandle>,
    last_tick: Instant,
}

impl MatcherApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> MatcherApp {
        MatcherApp {
            capture: CaptureController::new(),
            template: None,
            options: DisplayOptions::default(),
            orb: Orb::new(),
            texture: None,
            last_tick: Instant::now(),
        }
    }

    fn load_template_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &TEMPLATE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        // A failed load keeps whatever template was active before.
        match Template::load(&path) {
            Ok(template) => self.template = Some(template),
            Err(e) => log::error!("failed to load template: {}", e),
        }
    }

    fn start_camera(&mut self) {
        if let Err(e) = self.capture.start(CAMERA_INDEX) {
            log::error!("cannot access the camera: {}", e);
        }
    }

    fn stop_camera(&mut self) {
        self.capture.stop();
        self.texture = None;
    }

    /// Capture, process and upload one frame if the tick interval elapsed.
    fn tick(&mut self, ctx: &egui::Context) {
        if !self.capture.is_active() || self.last_tick.elapsed() < TICK_INTERVAL {
            return;
        }
        self.last_tick = Instant::now();

        let frame = match self.capture.read_frame() {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                log::warn!("failed to read frame, skipping tick: {}", e);
                return;
            }
            None => return,
        };

        let processed =
            pipeline::process_frame(&self.orb, self.template.as_ref(), &frame, self.options);
        let size = [
            processed.image.width() as usize,
            processed.image.height() as usize,
        ];
        let color_image = egui::ColorImage::from_rgb(size, processed.image.as_raw());
        match &mut self.texture {
            Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("video-frame", color_image, egui::TextureOptions::LINEAR))
            }
        }
    }

    fn video_area(&self, ui: &mut egui::Ui) {
        egui::Frame::canvas(ui.style()).show(ui, |ui| {
            let (rect, _response) = ui.allocate_exact_size(VIDEO_AREA, egui::Sense::hover());
            match &self.texture {
                Some(texture) => {
                    // Letterbox the frame into the fixed display area.
                    let size = texture.size_vec2();
                    let scale = (rect.width() / size.x).min(rect.height() / size.y);
                    let draw_rect = egui::Rect::from_center_size(rect.center(), size * scale);
                    egui::Image::new(texture).paint_at(ui, draw_rect);
                }
                None => {
                    ui.painter().text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "Camera feed",
                        egui::FontId::proportional(18.0),
                        egui::Color32::GRAY,
                    );
                }
            }
        });
    }
}

impl eframe::App for MatcherApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.tick(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Load Template Image").clicked() {
                    self.load_template_dialog();
                }
                if ui.button("Start Camera").clicked() {
                    self.start_camera();
                }
                if ui.button("Stop Camera").clicked() {
                    self.stop_camera();
                }
            });

            ui.horizontal(|ui| {
                ui.checkbox(&mut self.options.display_markers, "Display Markers");
                ui.checkbox(&mut self.options.connect_markers, "Connect Markers");
            });

            self.video_area(ui);
        });

        if self.capture.is_active() {
            ctx.request_repaint_after(TICK_INTERVAL);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // The device handle must not outlive the window.
        self.capture.stop();
    }
}

pub fn run() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size([984.0, 812.0]),
        ..Default::default()
    };
    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(|cc| Ok(Box::new(MatcherApp::new(cc)))),
    )
}
