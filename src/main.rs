mod app;
mod editor;
mod error;
mod font;
mod model;
mod render;
mod svg;

use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vectorpad=info")),
        )
        .init();

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("VectorPad")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "VectorPad",
        native_options,
        Box::new(|cc| Ok(Box::new(app::VectorPadApp::new(cc)?))),
    )
}
