//! UI layer for desktop GUI: app shell, landing page, wizard steps, widgets and image helpers.

pub mod app;
pub mod landing;
pub mod media;
pub mod widgets;
pub mod wizard_view;

pub use app::TryOnApp;
