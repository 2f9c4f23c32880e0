//! Backend-to-UI events and error modeling for the console controller.

use client_core::{ClientError, MetadataResponse};
use shared::domain::{CommandTask, Item};

use crate::media::PreviewImage;

pub enum UiEvent {
    Info(String),
    Error(UiError),
    CatalogLoaded(Vec<Item>),
    MetadataLoaded(MetadataResponse),
    PreviewLoaded {
        tile: usize,
        name: String,
        image: PreviewImage,
    },
    PreviewFailed {
        tile: usize,
        name: String,
        reason: String,
    },
    Submitted,
    ButtonPressed(CommandTask),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Decode,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Catalog,
    Metadata,
    Submit,
    Command,
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Decode => "Malformed response",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_client_error(context: UiErrorContext, err: &ClientError) -> Self {
        let category = match err {
            ClientError::Http(_) | ClientError::BadStatus { .. } | ClientError::NotConnected => {
                UiErrorCategory::Transport
            }
            ClientError::Decode { .. } => UiErrorCategory::Decode,
            ClientError::InvalidUrl(_)
            | ClientError::EmptyItemName
            | ClientError::NoSelection
            | ClientError::SelectionPending { .. }
            | ClientError::Settings(_) => UiErrorCategory::Validation,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn new(
        category: UiErrorCategory,
        context: UiErrorContext,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            context,
            message: message.into(),
        }
    }

    /// Errors that leave a whole panel unusable get a banner, not just the status line.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self.context,
            UiErrorContext::BackendStartup
                | UiErrorContext::Catalog
                | UiErrorContext::Submit
                | UiErrorContext::Command
        )
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
}
