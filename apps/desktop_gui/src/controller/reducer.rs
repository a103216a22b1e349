//! Reducer-like state transitions for the desktop app.
//!
//! [`AppModel`] owns everything the frames render. User intents and worker
//! events both go through it, and any follow-up work for the worker comes
//! back as a [`BackendCommand`] for the caller to queue. Nothing in here
//! touches egui or the channels.

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use client_core::{ImageApplied, Wizard};
use shared::domain::ImageSlot;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::ui::landing::{Carousel, CAROUSEL_INTERVAL, SLIDES};
use crate::ui::media::PreviewImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    Landing,
    Wizard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendHealth {
    Unknown,
    Checking,
    Online(String),
    Offline(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultImageState {
    Idle,
    Loading {
        source: String,
    },
    Ready {
        source: String,
        image: PreviewImage,
        original_bytes: Vec<u8>,
    },
    Failed {
        source: String,
        reason: String,
    },
}

/// Thumbnail of the image currently held by a slot. `revision` changes
/// whenever the picture does, so the UI knows to rebuild its texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPreview {
    pub revision: u64,
    pub image: PreviewImage,
}

pub struct AppModel {
    pub view: AppView,
    pub wizard: Wizard,
    pub carousel: Carousel,
    pub banner: Option<UiError>,
    pub status: String,
    pub health: BackendHealth,
    pub result_image: ResultImageState,
    previews: [Option<SlotPreview>; 2],
    preview_revision: u64,
    progress_interval: Duration,
    last_progress: Option<Instant>,
}

impl AppModel {
    pub fn new(progress_interval: Duration, now: Instant) -> Self {
        Self {
            view: AppView::Landing,
            wizard: Wizard::new(),
            carousel: Carousel::new(SLIDES.len(), CAROUSEL_INTERVAL, now),
            banner: None,
            status: "Ready".to_string(),
            health: BackendHealth::Unknown,
            result_image: ResultImageState::Idle,
            previews: [None, None],
            preview_revision: 0,
            progress_interval,
            last_progress: None,
        }
    }

    pub fn preview(&self, slot: ImageSlot) -> Option<&SlotPreview> {
        self.previews[slot_index(slot)].as_ref()
    }

    /// Text for the dismissible banner. A wizard error wins over app-level
    /// problems such as a failed file read.
    pub fn banner_text(&self) -> Option<String> {
        if let Some(err) = self.wizard.error() {
            return Some(UiError::from_try_on(UiErrorContext::Submission, err).banner_text());
        }
        self.banner.as_ref().map(UiError::banner_text)
    }

    pub fn dismiss_banner(&mut self) {
        self.wizard.dismiss_error();
        self.banner = None;
    }

    /// Time-driven updates: carousel slides on the landing page, progress
    /// messages while a submission is pending.
    pub fn tick(&mut self, now: Instant) {
        if self.view == AppView::Landing {
            self.carousel.tick(now);
        }
        if !self.wizard.is_loading() {
            self.last_progress = None;
            return;
        }
        let last = *self.last_progress.get_or_insert(now);
        if now.saturating_duration_since(last) >= self.progress_interval {
            self.wizard.advance_progress();
            self.last_progress = Some(now);
        }
    }

    pub fn select_slide(&mut self, index: usize, now: Instant) {
        self.carousel.select(index, now);
    }

    pub fn check_health(&mut self) -> BackendCommand {
        self.health = BackendHealth::Checking;
        BackendCommand::CheckHealth
    }

    /// "Try it now": the wizard always starts from an empty step 1.
    pub fn enter_wizard(&mut self) -> BackendCommand {
        self.reset_wizard();
        self.view = AppView::Wizard;
        self.status = "Step 1: upload your photos".to_string();
        BackendCommand::CancelImageLoads
    }

    /// Step 3 "Try another". Also usable from any step.
    pub fn restart_wizard(&mut self) -> BackendCommand {
        self.reset_wizard();
        self.status = "Starting over".to_string();
        BackendCommand::CancelImageLoads
    }

    pub fn exit_to_landing(&mut self, now: Instant) -> BackendCommand {
        self.reset_wizard();
        self.view = AppView::Landing;
        self.carousel.reset(now);
        self.status = "Ready".to_string();
        BackendCommand::CancelImageLoads
    }

    /// Starts reading `path` into `slot`. Only the most recent pick for a
    /// slot is ever applied.
    pub fn select_image(&mut self, slot: ImageSlot, path: PathBuf) -> Option<BackendCommand> {
        if self.wizard.data_mut().is_none() {
            return None;
        }
        let generation = self.wizard.begin_image_load(slot);
        self.status = format!("Loading {}...", slot.label());
        Some(BackendCommand::LoadImage {
            slot,
            generation,
            path,
        })
    }

    pub fn next_step(&mut self) {
        if let Err(err) = self.wizard.next() {
            tracing::debug!("wizard: next rejected: {err}");
        }
    }

    pub fn back_step(&mut self) {
        if let Err(err) = self.wizard.back() {
            tracing::debug!("wizard: back rejected: {err}");
        }
    }

    /// Validates and, when the form is complete, hands the request to the
    /// worker. A second call while one is pending does nothing.
    pub fn submit(&mut self, now: Instant) -> Option<BackendCommand> {
        match self.wizard.begin_submit() {
            Ok(pending) => {
                self.banner = None;
                self.last_progress = Some(now);
                self.status = "Generating try-on...".to_string();
                Some(BackendCommand::Submit {
                    ticket: pending.ticket,
                    request: pending.request,
                })
            }
            Err(err) => {
                tracing::debug!("wizard: submit rejected: {err}");
                None
            }
        }
    }

    pub fn apply(&mut self, event: UiEvent) -> Option<BackendCommand> {
        match event {
            UiEvent::Info(message) => {
                self.status = message;
                None
            }
            UiEvent::Error(err) => {
                tracing::warn!(
                    context = ?err.context(),
                    category = ?err.category(),
                    "ui error: {}",
                    err.message()
                );
                self.status = err.banner_text();
                self.banner = Some(err);
                None
            }
            UiEvent::ImageLoaded { outcome, preview } => {
                let slot = outcome.slot;
                match self.wizard.finish_image_load(outcome) {
                    ImageApplied::Applied => {
                        self.preview_revision += 1;
                        self.previews[slot_index(slot)] = preview.map(|image| SlotPreview {
                            revision: self.preview_revision,
                            image,
                        });
                        self.status = format!("Loaded {}", slot.label());
                    }
                    ImageApplied::Stale => {}
                    ImageApplied::Failed(err) => {
                        let err = UiError::from_message(UiErrorContext::ImageLoad, err.to_string());
                        self.status = err.banner_text();
                        self.banner = Some(err);
                    }
                }
                None
            }
            UiEvent::SubmissionFinished { ticket, outcome } => {
                if self.wizard.finish_submit(ticket, outcome).is_err() {
                    return None;
                }
                self.last_progress = None;
                match self.wizard.result() {
                    Some(result) => {
                        self.status = "Your try-on is ready".to_string();
                        let source = result.result_image.clone()?;
                        self.result_image = ResultImageState::Loading {
                            source: source.clone(),
                        };
                        Some(BackendCommand::FetchResultImage { source })
                    }
                    None => {
                        self.status = "Generation failed".to_string();
                        None
                    }
                }
            }
            UiEvent::ResultImageLoaded {
                source,
                image,
                original_bytes,
            } => {
                if self.is_current_result(&source) {
                    self.result_image = ResultImageState::Ready {
                        source,
                        image,
                        original_bytes,
                    };
                }
                None
            }
            UiEvent::ResultImageFailed { source, reason } => {
                if self.is_current_result(&source) {
                    self.banner = Some(UiError::from_message(
                        UiErrorContext::ResultImage,
                        format!("could not display the result image: {reason}"),
                    ));
                    self.result_image = ResultImageState::Failed { source, reason };
                }
                None
            }
            UiEvent::HealthChecked(outcome) => {
                self.health = match outcome {
                    Ok(message) => BackendHealth::Online(message),
                    Err(reason) => BackendHealth::Offline(reason),
                };
                None
            }
        }
    }

    fn is_current_result(&self, source: &str) -> bool {
        self.wizard
            .result()
            .and_then(|result| result.result_image.as_deref())
            == Some(source)
    }

    fn reset_wizard(&mut self) {
        self.wizard.restart();
        self.previews = [None, None];
        self.result_image = ResultImageState::Idle;
        self.banner = None;
        self.last_progress = None;
    }
}

fn slot_index(slot: ImageSlot) -> usize {
    match slot {
        ImageSlot::User => 0,
        ImageSlot::Clothing => 1,
    }
}
