use std::{
    fs,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, Sender};
use egui::TextureHandle;
use shared::domain::ImageSlot;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::controller::reducer::{AppModel, AppView, ResultImageState};
use crate::ui::landing::{self, LandingAction};
use crate::ui::media::{decode_image_for_clipboard, suggested_file_name, write_clipboard_image};
use crate::ui::wizard_view::{self, WizardAction, WizardTextures};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "webp", "gif", "bmp"];

pub struct TryOnApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    model: AppModel,
    user_texture: Option<(u64, TextureHandle)>,
    clothing_texture: Option<(u64, TextureHandle)>,
    result_texture: Option<(String, TextureHandle)>,
}

impl TryOnApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        progress_interval: Duration,
    ) -> Self {
        let mut app = Self {
            cmd_tx,
            ui_rx,
            model: AppModel::new(progress_interval, Instant::now()),
            user_texture: None,
            clothing_texture: None,
            result_texture: None,
        };
        let check = app.model.check_health();
        app.queue(check);
        app
    }

    fn queue(&mut self, cmd: BackendCommand) {
        if let Err(err) = dispatch_backend_command(&self.cmd_tx, cmd) {
            self.model.apply(UiEvent::Error(err));
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            if let Some(cmd) = self.model.apply(event) {
                self.queue(cmd);
            }
        }
    }

    fn sync_textures(&mut self, ctx: &egui::Context) {
        for slot in ImageSlot::ALL {
            let preview = self.model.preview(slot);
            let cached = match slot {
                ImageSlot::User => &mut self.user_texture,
                ImageSlot::Clothing => &mut self.clothing_texture,
            };
            match preview {
                None => *cached = None,
                Some(preview) if cached.as_ref().map(|(rev, _)| *rev) != Some(preview.revision) => {
                    let texture = ctx.load_texture(
                        format!("slot_preview_{slot}_{}", preview.revision),
                        preview.image.to_color_image(),
                        egui::TextureOptions::LINEAR,
                    );
                    *cached = Some((preview.revision, texture));
                }
                Some(_) => {}
            }
        }

        match &self.model.result_image {
            ResultImageState::Ready { source, image, .. } => {
                let stale = self
                    .result_texture
                    .as_ref()
                    .map_or(true, |(cached, _)| cached != source);
                if stale {
                    let texture = ctx.load_texture(
                        "tryon_result",
                        image.to_color_image(),
                        egui::TextureOptions::LINEAR,
                    );
                    self.result_texture = Some((source.clone(), texture));
                }
            }
            _ => self.result_texture = None,
        }
    }

    fn handle_landing_action(&mut self, action: LandingAction) {
        match action {
            LandingAction::TryNow => {
                let cmd = self.model.enter_wizard();
                self.queue(cmd);
            }
            LandingAction::SelectSlide(index) => self.model.select_slide(index, Instant::now()),
            LandingAction::RecheckHealth => {
                let cmd = self.model.check_health();
                self.queue(cmd);
            }
        }
    }

    fn handle_wizard_action(&mut self, action: WizardAction) {
        match action {
            WizardAction::PickImage(slot) => {
                let picked = rfd::FileDialog::new()
                    .set_title(format!("Choose {}", slot.label().to_ascii_lowercase()))
                    .add_filter("Images", &IMAGE_EXTENSIONS)
                    .pick_file();
                if let Some(cmd) = picked.and_then(|path| self.model.select_image(slot, path)) {
                    self.queue(cmd);
                }
            }
            WizardAction::Next => self.model.next_step(),
            WizardAction::Back => self.model.back_step(),
            WizardAction::Submit => {
                if let Some(cmd) = self.model.submit(Instant::now()) {
                    self.queue(cmd);
                }
            }
            WizardAction::DismissBanner => self.model.dismiss_banner(),
            WizardAction::Restart => {
                let cmd = self.model.restart_wizard();
                self.queue(cmd);
            }
            WizardAction::Exit => {
                let cmd = self.model.exit_to_landing(Instant::now());
                self.queue(cmd);
            }
            WizardAction::SaveResult => self.save_result(),
            WizardAction::CopyResult => self.copy_result(),
        }
    }

    fn result_bytes(&self) -> Option<&[u8]> {
        match &self.model.result_image {
            ResultImageState::Ready { original_bytes, .. } => Some(original_bytes),
            _ => None,
        }
    }

    fn save_result(&mut self) {
        let Some(bytes) = self.result_bytes() else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(suggested_file_name(bytes))
            .save_file()
        else {
            return;
        };
        match fs::write(&path, bytes) {
            Ok(()) => {
                tracing::info!(path = %path.display(), bytes = bytes.len(), "saved result image");
                self.model.status = format!("Saved image to {}", path.display());
            }
            Err(err) => {
                self.model.apply(UiEvent::Error(UiError::from_message(
                    UiErrorContext::SaveResult,
                    format!("failed to save image: {err}"),
                )));
            }
        }
    }

    fn copy_result(&mut self) {
        let Some(bytes) = self.result_bytes() else {
            return;
        };
        let copied = decode_image_for_clipboard(bytes)
            .and_then(|(rgba, width, height)| write_clipboard_image(&rgba, width, height));
        match copied {
            Ok(()) => self.model.status = "Copied image to clipboard".to_string(),
            Err(err) => {
                self.model.apply(UiEvent::Error(UiError::from_message(
                    UiErrorContext::General,
                    format!("failed to copy image: {err}"),
                )));
            }
        }
    }
}

impl eframe::App for TryOnApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.process_ui_events();
        self.model.tick(now);
        self.sync_textures(ctx);

        match self.model.view {
            AppView::Landing => {
                if let Some(action) = landing::show(ctx, &self.model.carousel, &self.model.health)
                {
                    self.handle_landing_action(action);
                }
            }
            AppView::Wizard => {
                let textures = WizardTextures {
                    user: self.user_texture.as_ref().map(|(_, texture)| texture),
                    clothing: self.clothing_texture.as_ref().map(|(_, texture)| texture),
                    result: self.result_texture.as_ref().map(|(_, texture)| texture),
                };
                if let Some(action) = wizard_view::show(ctx, &mut self.model, &textures) {
                    self.handle_wizard_action(action);
                }
            }
        }

        let idle = Duration::from_millis(100);
        let repaint_after = match self.model.view {
            AppView::Landing => self.model.carousel.time_until_next(now).min(idle),
            AppView::Wizard => idle,
        };
        ctx.request_repaint_after(repaint_after);
    }
}
