//! Landing page: hero text, auto-advancing slide carousel and the entry
//! point into the wizard.

use std::time::{Duration, Instant};

use crate::controller::reducer::BackendHealth;

pub const CAROUSEL_INTERVAL: Duration = Duration::from_secs(4);

pub struct Slide {
    pub title: &'static str,
    pub caption: &'static str,
    pub accent: egui::Color32,
}

pub const SLIDES: [Slide; 4] = [
    Slide {
        title: "Casual weekends",
        caption: "Denim, tees and sneakers fitted to your shape.",
        accent: egui::Color32::from_rgb(76, 110, 245),
    },
    Slide {
        title: "Office ready",
        caption: "Blazers and shirts before you ever visit a fitting room.",
        accent: egui::Color32::from_rgb(52, 58, 64),
    },
    Slide {
        title: "Game day",
        caption: "Sportswear that moves the way you do.",
        accent: egui::Color32::from_rgb(18, 184, 134),
    },
    Slide {
        title: "Latest trends",
        caption: "Try this season's looks on your own photo.",
        accent: egui::Color32::from_rgb(230, 73, 128),
    },
];

/// Which slide is showing and when it last changed. Clicking an indicator
/// restarts the interval.
#[derive(Debug, Clone)]
pub struct Carousel {
    index: usize,
    len: usize,
    interval: Duration,
    last_advance: Instant,
}

impl Carousel {
    pub fn new(len: usize, interval: Duration, now: Instant) -> Self {
        Self {
            index: 0,
            len,
            interval,
            last_advance: now,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Advances by one slide once the interval has elapsed. Returns whether
    /// the slide changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.len == 0 || now.saturating_duration_since(self.last_advance) < self.interval {
            return false;
        }
        self.index = (self.index + 1) % self.len;
        self.last_advance = now;
        true
    }

    pub fn select(&mut self, index: usize, now: Instant) {
        if index < self.len {
            self.index = index;
            self.last_advance = now;
        }
    }

    pub fn reset(&mut self, now: Instant) {
        self.index = 0;
        self.last_advance = now;
    }

    pub fn time_until_next(&self, now: Instant) -> Duration {
        self.interval
            .saturating_sub(now.saturating_duration_since(self.last_advance))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandingAction {
    TryNow,
    SelectSlide(usize),
    RecheckHealth,
}

pub fn show(
    ctx: &egui::Context,
    carousel: &Carousel,
    health: &BackendHealth,
) -> Option<LandingAction> {
    let mut action = None;
    egui::CentralPanel::default().show(ctx, |ui| {
        let avail = ui.available_size();
        ui.add_space((avail.y * 0.08).clamp(12.0, 60.0));

        ui.vertical_centered(|ui| {
            ui.set_width(avail.x.clamp(480.0, 720.0));
            ui.heading(egui::RichText::new("Virtual Try-On").size(34.0).strong());
            ui.weak("See how clothes look on you before you buy.");
            ui.add_space(18.0);

            if let Some(slide) = SLIDES.get(carousel.index()) {
                egui::Frame::new()
                    .fill(slide.accent)
                    .corner_radius(14)
                    .inner_margin(egui::Margin::symmetric(24, 40))
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.vertical_centered(|ui| {
                            ui.label(
                                egui::RichText::new(slide.title)
                                    .size(26.0)
                                    .strong()
                                    .color(egui::Color32::WHITE),
                            );
                            ui.label(
                                egui::RichText::new(slide.caption).color(egui::Color32::WHITE),
                            );
                        });
                    });
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                let dot_width = 22.0 * SLIDES.len() as f32;
                ui.add_space(((ui.available_width() - dot_width) / 2.0).max(0.0));
                for (index, slide) in SLIDES.iter().enumerate() {
                    let glyph = if index == carousel.index() { "●" } else { "○" };
                    if ui
                        .add(egui::Button::new(glyph).frame(false))
                        .on_hover_text(slide.title)
                        .clicked()
                    {
                        action = Some(LandingAction::SelectSlide(index));
                    }
                }
            });

            ui.add_space(18.0);
            for (step, text) in [
                ("1", "Upload your photo and a clothing image"),
                ("2", "Enter your measurements and pick a style"),
                ("3", "Get an AI-rendered try-on with fit feedback"),
            ] {
                ui.label(format!("{step}. {text}"));
            }

            ui.add_space(18.0);
            let button = egui::Button::new(egui::RichText::new("Try it now").strong().size(18.0))
                .min_size(egui::vec2(220.0, 44.0));
            if ui.add(button).clicked() {
                action = Some(LandingAction::TryNow);
            }

            ui.add_space(12.0);
            ui.horizontal(|ui| {
                let weak = ui.visuals().weak_text_color();
                let (color, text) = match health {
                    BackendHealth::Unknown => (weak, "Backend: not checked".to_string()),
                    BackendHealth::Checking => (weak, "Backend: checking...".to_string()),
                    BackendHealth::Online(message) => (
                        egui::Color32::from_rgb(64, 192, 87),
                        format!("Backend online: {message}"),
                    ),
                    BackendHealth::Offline(reason) => (
                        ui.visuals().error_fg_color,
                        format!("Backend unreachable: {reason}"),
                    ),
                };
                ui.colored_label(color, text);
                if ui.small_button("Check again").clicked() {
                    action = Some(LandingAction::RecheckHealth);
                }
            });
        });
    });
    action
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carousel(now: Instant) -> Carousel {
        Carousel::new(SLIDES.len(), CAROUSEL_INTERVAL, now)
    }

    #[test]
    fn advances_once_per_interval_and_wraps() {
        let start = Instant::now();
        let mut carousel = carousel(start);

        assert!(!carousel.tick(start + Duration::from_millis(3999)));
        assert_eq!(carousel.index(), 0);

        let mut now = start;
        for expected in [1, 2, 3, 0] {
            now += CAROUSEL_INTERVAL;
            assert!(carousel.tick(now));
            assert_eq!(carousel.index(), expected);
        }
    }

    #[test]
    fn selecting_an_indicator_restarts_the_interval() {
        let start = Instant::now();
        let mut carousel = carousel(start);

        carousel.select(2, start + Duration::from_secs(3));
        assert_eq!(carousel.index(), 2);
        assert!(!carousel.tick(start + Duration::from_secs(5)), "timer was reset");
        assert_eq!(
            carousel.time_until_next(start + Duration::from_secs(5)),
            Duration::from_secs(2)
        );
        assert!(carousel.tick(start + Duration::from_secs(7)));
        assert_eq!(carousel.index(), 3);
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let start = Instant::now();
        let mut carousel = carousel(start);
        carousel.select(SLIDES.len(), start);
        assert_eq!(carousel.index(), 0);
    }

    #[test]
    fn empty_carousel_never_advances() {
        let start = Instant::now();
        let mut carousel = Carousel::new(0, CAROUSEL_INTERVAL, start);
        assert!(!carousel.tick(start + Duration::from_secs(60)));
    }
}
