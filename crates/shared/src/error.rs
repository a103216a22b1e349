use thiserror::Error;

use crate::domain::{ImageSlot, MeasurementField};

pub const GENERIC_APPLICATION_ERROR: &str = "Failed to generate try-on";

/// First missing piece that blocks a step transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please upload both your photo and a clothing image")]
    MissingImage(ImageSlot),
    #[error("Please enter your name")]
    MissingName,
    #[error("Please fill in all measurements ({} is missing)", .0.key())]
    MissingMeasurement(MeasurementField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Http,
    Application,
    Network,
    Decode,
}

/// Every way a try-on submission can fail. All variants render to a single
/// user-facing sentence via `Display`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TryOnError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("{0}")]
    Application(String),
    #[error("{0}")]
    Network(String),
    #[error("unreadable response from backend: {0}")]
    Decode(String),
}

impl TryOnError {
    /// Non-2xx status. Uses the server's `detail` when present.
    pub fn http(status: u16, detail: Option<String>) -> Self {
        let message = detail
            .filter(|detail| !detail.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP error! status: {status}"));
        Self::Http { status, message }
    }

    /// 2xx with `success: false`.
    pub fn application(error: Option<String>) -> Self {
        Self::Application(
            error
                .filter(|error| !error.trim().is_empty())
                .unwrap_or_else(|| GENERIC_APPLICATION_ERROR.to_string()),
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Http { .. } => ErrorKind::Http,
            Self::Application(_) => ErrorKind::Application,
            Self::Network(_) => ErrorKind::Network,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
