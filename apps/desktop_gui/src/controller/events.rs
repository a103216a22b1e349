//! UI/backend events and error modeling for desktop GUI controller.

use client_core::{ImageLoadOutcome, SubmissionTicket};
use shared::{
    domain::SubmissionResult,
    error::{ErrorKind, TryOnError},
};

use crate::ui::media::PreviewImage;

pub enum UiEvent {
    Info(String),
    Error(UiError),
    ImageLoaded {
        outcome: ImageLoadOutcome,
        preview: Option<PreviewImage>,
    },
    SubmissionFinished {
        ticket: SubmissionTicket,
        outcome: Result<SubmissionResult, TryOnError>,
    },
    ResultImageLoaded {
        source: String,
        image: PreviewImage,
        original_bytes: Vec<u8>,
    },
    ResultImageFailed {
        source: String,
        reason: String,
    },
    HealthChecked(Result<String, String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Validation,
    Transport,
    Server,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    ImageLoad,
    Submission,
    ResultImage,
    SaveResult,
    General,
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Transport => "Connection",
        UiErrorCategory::Server => "Server",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_try_on(context: UiErrorContext, err: &TryOnError) -> Self {
        let category = match err.kind() {
            ErrorKind::Validation => UiErrorCategory::Validation,
            ErrorKind::Http | ErrorKind::Application => UiErrorCategory::Server,
            ErrorKind::Network | ErrorKind::Decode => UiErrorCategory::Transport,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    /// Classifies free-form messages from the worker (file reads, downloads,
    /// clipboard) by what they mention.
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("please")
            || message_lower.contains("missing")
            || message_lower.contains("empty")
            || message_lower.contains("unsupported")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("dns")
            || message_lower.contains("disconnected")
        {
            UiErrorCategory::Transport
        } else if message_lower.contains("http error")
            || message_lower.contains("status")
            || message_lower.contains("server")
        {
            UiErrorCategory::Server
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Single line shown in the dismissible banner.
    pub fn banner_text(&self) -> String {
        match self.category {
            UiErrorCategory::Validation => self.message.clone(),
            category => format!("{} error: {}", err_label(category), self.message),
        }
    }
}
