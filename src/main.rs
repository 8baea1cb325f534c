mod app;
mod io;

use app::DetectApp;
use debris_detect_common::{BackendConfig, HttpBackend};

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt::init();

    let config = BackendConfig::load().unwrap_or_else(|err| {
        tracing::warn!(%err, "config load failed, using defaults");
        BackendConfig::default()
    });
    let backend = match HttpBackend::new(&config) {
        Ok(backend) => backend,
        Err(err) => {
            tracing::error!(%err, "could not build HTTP client");
            std::process::exit(1);
        }
    };
    tracing::info!(base_url = backend.base_url(), "starting");

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Underwater Waste Detection",
        options,
        Box::new(move |_cc| Box::new(DetectApp::new(backend))),
    )
}
