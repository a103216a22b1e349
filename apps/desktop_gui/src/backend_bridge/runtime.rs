//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{ClientSettings, ImageLoadOutcome, ImageLoader, TryOnClient};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::ui::media::{
    decode_preview_image, PreviewImage, RESULT_PREVIEW_MAX, SLOT_PREVIEW_MAX,
};

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: ClientSettings) {
    thread::spawn(move || run_worker(cmd_rx, ui_tx, settings));
}

fn run_worker(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: ClientSettings) {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!("failed to build backend runtime: {err}");
            emit(
                &ui_tx,
                UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )),
            );
            return;
        }
    };

    let backend_url = settings.backend_url().to_string();
    let client = match TryOnClient::new(settings) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            tracing::error!("failed to build http client: {err:#}");
            emit(
                &ui_tx,
                UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: {err:#}"),
                )),
            );
            return;
        }
    };
    tracing::info!(backend = %backend_url, "backend worker ready");
    emit(&ui_tx, UiEvent::Info(format!("Connected to {backend_url}")));

    let mut loader = ImageLoader::new(runtime.handle().clone());

    while let Ok(cmd) = cmd_rx.recv() {
        tracing::debug!(command = cmd.name(), "backend worker received command");
        match cmd {
            BackendCommand::LoadImage {
                slot,
                generation,
                path,
            } => {
                let ui_tx = ui_tx.clone();
                loader.load(slot, generation, path, move |outcome| {
                    deliver_loaded_image(ui_tx, outcome);
                });
            }
            BackendCommand::CancelImageLoads => loader.cancel_all(),
            BackendCommand::Submit { ticket, request } => {
                let client = client.clone();
                let ui_tx = ui_tx.clone();
                runtime.spawn(async move {
                    let outcome = client.submit(&request).await;
                    emit(&ui_tx, UiEvent::SubmissionFinished { ticket, outcome });
                });
            }
            BackendCommand::FetchResultImage { source } => {
                let client = client.clone();
                let ui_tx = ui_tx.clone();
                runtime.spawn(async move {
                    let event = match load_result_image(&client, &source).await {
                        Ok((image, original_bytes)) => UiEvent::ResultImageLoaded {
                            source,
                            image,
                            original_bytes,
                        },
                        Err(reason) => {
                            tracing::warn!("result image unavailable: {reason}");
                            UiEvent::ResultImageFailed { source, reason }
                        }
                    };
                    emit(&ui_tx, event);
                });
            }
            BackendCommand::CheckHealth => {
                let client = client.clone();
                let ui_tx = ui_tx.clone();
                runtime.spawn(async move {
                    let outcome = client.health().await.map_err(|err| format!("{err:#}"));
                    emit(&ui_tx, UiEvent::HealthChecked(outcome));
                });
            }
        }
    }

    tracing::info!("ui command queue closed; backend worker stopping");
    loader.cancel_all();
}

/// Must be called from within the runtime; decoding happens on a blocking
/// thread.
fn deliver_loaded_image(ui_tx: Sender<UiEvent>, outcome: ImageLoadOutcome) {
    tokio::task::spawn_blocking(move || {
        let preview = slot_preview(&outcome);
        emit(&ui_tx, UiEvent::ImageLoaded { outcome, preview });
    });
}

fn slot_preview(outcome: &ImageLoadOutcome) -> Option<PreviewImage> {
    let data_url = outcome.result.as_ref().ok()?;
    if !data_url.is_image() {
        return None;
    }
    let bytes = data_url.decode().ok()?;
    match decode_preview_image(&bytes, SLOT_PREVIEW_MAX) {
        Ok(preview) => Some(preview),
        Err(err) => {
            tracing::debug!(slot = %outcome.slot, "no preview for selected file: {err}");
            None
        }
    }
}

async fn load_result_image(
    client: &TryOnClient,
    source: &str,
) -> Result<(PreviewImage, Vec<u8>), String> {
    let bytes = client
        .result_image_bytes(source)
        .await
        .map_err(|err| format!("{err:#}"))?;
    let preview = tokio::task::spawn_blocking(move || {
        decode_preview_image(&bytes, RESULT_PREVIEW_MAX).map(|preview| (preview, bytes))
    })
    .await
    .map_err(|err| err.to_string())??;
    Ok(preview)
}

/// Blocks while the UI queue is full; completion events must not be dropped.
fn emit(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    if ui_tx.send(event).is_err() {
        tracing::debug!("ui event queue closed; dropping backend event");
    }
}
