//! Small reusable pieces: banner, step indicator, image slot card, text
//! field, loading overlay.

use shared::domain::{ImageSlot, WizardStep};

const BANNER_FILL: egui::Color32 = egui::Color32::from_rgb(111, 53, 53);
const BANNER_STROKE: egui::Color32 = egui::Color32::from_rgb(175, 96, 96);

/// Red error banner with a Dismiss button. Returns true when dismissed.
pub fn status_banner(ui: &mut egui::Ui, message: &str) -> bool {
    let mut dismissed = false;
    egui::Frame::new()
        .fill(BANNER_FILL)
        .stroke(egui::Stroke::new(1.0, BANNER_STROKE))
        .corner_radius(8)
        .inner_margin(egui::Margin::symmetric(10, 8))
        .show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.label(egui::RichText::new(message).color(egui::Color32::WHITE));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Dismiss").clicked() {
                        dismissed = true;
                    }
                });
            });
        });
    dismissed
}

pub fn step_indicator(ui: &mut egui::Ui, current: WizardStep) {
    ui.horizontal(|ui| {
        for step in [WizardStep::Details, WizardStep::Measurements, WizardStep::Result] {
            let reached = step <= current;
            let text = egui::RichText::new(format!("{}  {}", step.number(), step.title()));
            let text = if step == current {
                text.strong().color(ui.visuals().strong_text_color())
            } else if reached {
                text
            } else {
                text.weak()
            };
            ui.label(text);
            if step != WizardStep::Result {
                ui.weak("›");
            }
        }
    });
}

/// Card for one upload slot. Returns true when the user asks to pick a file.
pub fn image_slot_card(
    ui: &mut egui::Ui,
    slot: ImageSlot,
    texture: Option<&egui::TextureHandle>,
    has_image: bool,
) -> bool {
    let mut pick = false;
    egui::Frame::new()
        .fill(ui.visuals().faint_bg_color)
        .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
        .corner_radius(12)
        .inner_margin(egui::Margin::symmetric(14, 12))
        .show(ui, |ui| {
            ui.set_min_height(280.0);
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new(slot.label()).strong());
                ui.add_space(6.0);
                match texture {
                    Some(texture) => {
                        let mut size = texture.size_vec2();
                        let max = egui::vec2(ui.available_width().min(240.0), 200.0);
                        let scale = (max.x / size.x).min(max.y / size.y).min(1.0);
                        size *= scale;
                        ui.add(egui::Image::new(texture).fit_to_exact_size(size));
                    }
                    None if has_image => {
                        ui.add_space(80.0);
                        ui.weak("File loaded (no preview available)");
                        ui.add_space(80.0);
                    }
                    None => {
                        ui.add_space(80.0);
                        ui.weak("No image selected");
                        ui.add_space(80.0);
                    }
                }
                ui.add_space(6.0);
                let label = if has_image { "Change image" } else { "Upload image" };
                if ui.button(label).clicked() {
                    pick = true;
                }
            });
        });
    pick
}

/// Stacked label + single-line input with a stable id.
pub fn labeled_text_field(
    ui: &mut egui::Ui,
    id: &str,
    label: &str,
    hint: &str,
    value: &mut String,
) -> egui::Response {
    ui.label(egui::RichText::new(label).strong());
    let edit = egui::TextEdit::singleline(value)
        .id_salt(id)
        .hint_text(
            egui::RichText::new(hint).color(ui.visuals().weak_text_color().gamma_multiply(0.85)),
        )
        .desired_width(f32::INFINITY);
    ui.add_sized([ui.available_width(), 30.0], edit)
}

/// Modal spinner shown while a submission is pending.
pub fn loading_overlay(ctx: &egui::Context, message: &str) {
    egui::Modal::new(egui::Id::new("tryon_loading_overlay")).show(ctx, |ui| {
        ui.set_min_width(320.0);
        ui.vertical_centered(|ui| {
            ui.add_space(8.0);
            ui.add(egui::Spinner::new().size(32.0));
            ui.add_space(8.0);
            ui.label(egui::RichText::new(message).strong());
            ui.weak("This usually takes less than a minute.");
            ui.add_space(8.0);
        });
    });
}
