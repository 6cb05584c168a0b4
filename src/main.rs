#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod color;
mod config;
mod input;
mod notes;
mod sample_player;
mod ui;
mod voice_engine;

use crate::app::ClavierApp;

fn main() -> anyhow::Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 640.0]),
        ..Default::default()
    };

    let run_result = eframe::run_native(
        config::APP_TITLE,
        native_options,
        Box::new(|cc| {
            let app = ClavierApp::new(cc)
                .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { e.into() })?;
            Ok(Box::new(app) as Box<dyn eframe::App>)
        }),
    );

    if let Err(e) = run_result {
        return Err(anyhow::anyhow!("Eframe run error: {}", e));
    }

    Ok(())
}
