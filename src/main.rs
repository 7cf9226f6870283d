//! NovaAtom - a code editor with the CodeSmith assistant built in
//!
//! Usage: `novaatom [FILE]`

use std::path::PathBuf;

use eframe::egui;
use novaatom::app::{NovaAtomApp, APP_NAME};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    let file = std::env::args_os().nth(1).map(PathBuf::from);

    tracing::info!("Starting {}...", APP_NAME);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 750.0])
            .with_min_inner_size([600.0, 400.0])
            .with_title(APP_NAME),
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        native_options,
        Box::new(|cc| Ok(Box::new(NovaAtomApp::new(cc, file)?))),
    )
}
