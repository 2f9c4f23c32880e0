//! Backend commands queued from UI to backend worker.

use client_core::SelectionTicket;
use shared::{domain::CommandTask, protocol::SubmissionPayload};

pub enum BackendCommand {
    Connect { server_url: String },
    LoadCatalog,
    FetchMetadata { ticket: SelectionTicket },
    FetchPreview { tile: usize, name: String },
    Submit { payload: SubmissionPayload },
    PressButton { task: CommandTask },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::LoadCatalog => "load_catalog",
            Self::FetchMetadata { .. } => "fetch_metadata",
            Self::FetchPreview { .. } => "fetch_preview",
            Self::Submit { .. } => "submit",
            Self::PressButton { .. } => "press_button",
        }
    }
}
