//! The three wizard steps. Rendering mutates the form in place and reports
//! everything else back as a [`WizardAction`] for the app to carry out.

use shared::domain::{ImageSlot, MeasurementField, StylePreference, WizardStep};

use crate::controller::reducer::{AppModel, ResultImageState};
use crate::ui::widgets::{
    image_slot_card, labeled_text_field, loading_overlay, status_banner, step_indicator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardAction {
    PickImage(ImageSlot),
    Next,
    Back,
    Submit,
    DismissBanner,
    Restart,
    Exit,
    SaveResult,
    CopyResult,
}

#[derive(Default)]
pub struct WizardTextures<'a> {
    pub user: Option<&'a egui::TextureHandle>,
    pub clothing: Option<&'a egui::TextureHandle>,
    pub result: Option<&'a egui::TextureHandle>,
}

impl WizardTextures<'_> {
    fn slot(&self, slot: ImageSlot) -> Option<&egui::TextureHandle> {
        match slot {
            ImageSlot::User => self.user,
            ImageSlot::Clothing => self.clothing,
        }
    }
}

pub fn show(
    ctx: &egui::Context,
    model: &mut AppModel,
    textures: &WizardTextures<'_>,
) -> Option<WizardAction> {
    let mut action = None;
    let step = model.wizard.step();

    egui::TopBottomPanel::top("wizard_header").show(ctx, |ui| {
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.heading("Virtual Try-On");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Exit").clicked() {
                    action = Some(WizardAction::Exit);
                }
            });
        });
        step_indicator(ui, step);
        ui.add_space(6.0);
    });

    egui::TopBottomPanel::bottom("wizard_status").show(ctx, |ui| {
        ui.weak(&model.status);
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::vertical().show(ui, |ui| {
            let width = ui.available_width().clamp(420.0, 760.0);
            ui.vertical_centered(|ui| {
                ui.set_max_width(width);
                if let Some(text) = model.banner_text() {
                    if status_banner(ui, &text) {
                        action = Some(WizardAction::DismissBanner);
                    }
                    ui.add_space(10.0);
                }

                let picked = match step {
                    WizardStep::Details => details_step(ui, model, textures),
                    WizardStep::Measurements => measurements_step(ui, model),
                    WizardStep::Result => result_step(ui, model, textures),
                };
                if picked.is_some() {
                    action = picked;
                }
            });
        });
    });

    if let Some(message) = model.wizard.loading_message() {
        loading_overlay(ctx, message);
    }

    action
}

fn details_step(
    ui: &mut egui::Ui,
    model: &mut AppModel,
    textures: &WizardTextures<'_>,
) -> Option<WizardAction> {
    let mut action = None;
    ui.label(egui::RichText::new("Upload your photos").size(20.0).strong());
    ui.weak("A clear, full-body photo of you and a photo of the garment work best.");
    ui.add_space(10.0);

    let has = |slot| model.wizard.data().and_then(|d| d.image(slot)).is_some();
    let has_user = has(ImageSlot::User);
    let has_clothing = has(ImageSlot::Clothing);

    ui.columns(2, |columns| {
        for (column, (slot, has_image)) in columns
            .iter_mut()
            .zip([(ImageSlot::User, has_user), (ImageSlot::Clothing, has_clothing)])
        {
            if image_slot_card(column, slot, textures.slot(slot), has_image) {
                action = Some(WizardAction::PickImage(slot));
            }
        }
    });

    ui.add_space(12.0);
    if let Some(data) = model.wizard.data_mut() {
        labeled_text_field(ui, "details_name", "Your name", "Jane Doe", &mut data.name);
    }

    ui.add_space(14.0);
    let next = egui::Button::new(egui::RichText::new("Next").strong().size(16.0))
        .min_size(egui::vec2(ui.available_width(), 38.0));
    if ui.add(next).clicked() {
        action = Some(WizardAction::Next);
    }
    action
}

fn measurements_step(ui: &mut egui::Ui, model: &mut AppModel) -> Option<WizardAction> {
    let mut action = None;
    let loading = model.wizard.is_loading();
    ui.label(egui::RichText::new("Your measurements").size(20.0).strong());
    ui.weak("Used to fit the garment to your body shape.");
    ui.add_space(10.0);

    if let Some(data) = model.wizard.data_mut() {
        egui::Grid::new("measurement_grid")
            .num_columns(2)
            .spacing([16.0, 10.0])
            .show(ui, |ui| {
                for (index, field) in MeasurementField::ALL.into_iter().enumerate() {
                    ui.vertical(|ui| {
                        labeled_text_field(
                            ui,
                            field.key(),
                            field.label(),
                            field.hint(),
                            data.measurements.get_mut(field),
                        );
                    });
                    if index % 2 == 1 {
                        ui.end_row();
                    }
                }
                ui.end_row();
            });

        ui.add_space(10.0);
        ui.label(egui::RichText::new("Style preference").strong());
        egui::ComboBox::from_id_salt("style_preference")
            .selected_text(data.style.label())
            .show_ui(ui, |ui| {
                for style in StylePreference::ALL {
                    ui.selectable_value(&mut data.style, style, style.label());
                }
            });
    } else if let Some(data) = model.wizard.data() {
        // Frozen while the request is in flight.
        for field in MeasurementField::ALL {
            ui.label(format!("{}: {}", field.label(), data.measurements.get(field)));
        }
        ui.label(format!("Style: {}", data.style.label()));
    }

    ui.add_space(14.0);
    ui.horizontal(|ui| {
        let half = (ui.available_width() - 8.0) / 2.0;
        if ui
            .add_enabled(!loading, egui::Button::new("Back").min_size(egui::vec2(half, 38.0)))
            .clicked()
        {
            action = Some(WizardAction::Back);
        }
        let generate =
            egui::Button::new(egui::RichText::new("Generate Try-On").strong())
                .min_size(egui::vec2(half, 38.0));
        if ui.add_enabled(!loading, generate).clicked() {
            action = Some(WizardAction::Submit);
        }
    });
    action
}

fn result_step(
    ui: &mut egui::Ui,
    model: &AppModel,
    textures: &WizardTextures<'_>,
) -> Option<WizardAction> {
    let mut action = None;
    let result = model.wizard.result()?;

    ui.label(egui::RichText::new("Your virtual try-on").size(20.0).strong());
    ui.add_space(8.0);

    match (&model.result_image, textures.result) {
        (ResultImageState::Ready { .. }, Some(texture)) => {
            let mut size = texture.size_vec2();
            let max_width = ui.available_width().min(520.0);
            if size.x > max_width {
                size *= max_width / size.x;
            }
            ui.add(egui::Image::new(texture).fit_to_exact_size(size));
        }
        (ResultImageState::Failed { reason, .. }, _) => {
            ui.colored_label(
                ui.visuals().error_fg_color,
                format!("Couldn't display the image: {reason}"),
            );
        }
        (ResultImageState::Idle, _) if result.result_image.is_none() => {
            ui.weak("The backend did not return an image.");
        }
        _ => {
            ui.add(egui::Spinner::new());
        }
    }

    if let Some(feedback) = &result.feedback {
        ui.add_space(10.0);
        egui::Frame::new()
            .fill(ui.visuals().faint_bg_color)
            .corner_radius(10)
            .inner_margin(egui::Margin::symmetric(12, 10))
            .show(ui, |ui| {
                ui.label(egui::RichText::new("Fit feedback").strong());
                ui.label(feedback);
            });
    }

    ui.add_space(14.0);
    let ready = matches!(model.result_image, ResultImageState::Ready { .. });
    ui.horizontal(|ui| {
        if ui.add_enabled(ready, egui::Button::new("Save image…")).clicked() {
            action = Some(WizardAction::SaveResult);
        }
        if ui.add_enabled(ready, egui::Button::new("Copy image")).clicked() {
            action = Some(WizardAction::CopyResult);
        }
        if ui.button("Try another").clicked() {
            action = Some(WizardAction::Restart);
        }
        if ui.button("Back to home").clicked() {
            action = Some(WizardAction::Exit);
        }
    });
    action
}
