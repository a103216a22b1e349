mod backend_bridge;
mod controller;
mod ui;

use client_core::{load_settings, ClientSettings};
use crossbeam_channel::bounded;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::ui::TryOnApp;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);

    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!("falling back to default settings: {err}");
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::BackendStartup,
                format!("settings could not be loaded, using defaults: {err}"),
            )));
            ClientSettings::default()
        }
    };
    let progress_interval = settings.progress_interval;
    backend_bridge::runtime::launch(cmd_rx, ui_tx, settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Virtual Try-On")
            .with_inner_size([1024.0, 760.0])
            .with_min_inner_size([720.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Virtual Try-On",
        options,
        Box::new(move |_cc| Ok(Box::new(TryOnApp::new(cmd_tx, ui_rx, progress_interval)))),
    )
}
