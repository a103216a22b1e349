//! Backend commands queued from UI to backend worker.

use std::path::PathBuf;

use client_core::SubmissionTicket;
use shared::{domain::ImageSlot, protocol::TryOnRequest};

pub enum BackendCommand {
    LoadImage {
        slot: ImageSlot,
        generation: u64,
        path: PathBuf,
    },
    CancelImageLoads,
    Submit {
        ticket: SubmissionTicket,
        request: TryOnRequest,
    },
    /// Resolves the result reference (data URL or hosted link) into pixels.
    FetchResultImage {
        source: String,
    },
    CheckHealth,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::LoadImage { .. } => "load_image",
            BackendCommand::CancelImageLoads => "cancel_image_loads",
            BackendCommand::Submit { .. } => "submit",
            BackendCommand::FetchResultImage { .. } => "fetch_result_image",
            BackendCommand::CheckHealth => "check_health",
        }
    }
}
