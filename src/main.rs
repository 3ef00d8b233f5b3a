use orb_image_matcher::app;

fn main() -> Result<(), eframe::Error> {
    env_logger::init();
    app::run()
}
