//! Console state transitions. UI actions and backend events go in, backend
//! commands come out; nothing here touches egui or the network.

use client_core::{OperatorSession, SelectionOutcome};
use shared::domain::CommandTask;
use tracing::{debug, warn};

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::events::{err_label, UiError, UiErrorContext, UiEvent},
    media::PreviewImage,
};

#[derive(Clone)]
pub enum TilePreview {
    Loading,
    Ready(PreviewImage),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBannerSeverity {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusBanner {
    pub severity: StatusBannerSeverity,
    pub message: String,
}

pub struct ConsoleState {
    pub session: OperatorSession,
    pub previews: Vec<TilePreview>,
    /// Bumped on every catalog load so cached textures can be dropped.
    pub catalog_epoch: u64,
    pub catalog_loading: bool,
    pub metadata_error: Option<String>,
    pub status: String,
    pub banner: Option<StatusBanner>,
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self {
            session: OperatorSession::new(),
            previews: Vec::new(),
            catalog_epoch: 0,
            catalog_loading: true,
            metadata_error: None,
            status: "Loading catalog...".to_string(),
            banner: None,
        }
    }
}

impl ConsoleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reconnect(&mut self, server_url: &str) -> BackendCommand {
        self.catalog_loading = true;
        self.banner = None;
        self.status = format!("Connecting to {server_url}...");
        BackendCommand::Connect {
            server_url: server_url.to_string(),
        }
    }

    pub fn click_tile(&mut self, tile: usize) -> Option<BackendCommand> {
        match self.session.select_tile(tile)? {
            Ok(ticket) => {
                self.status = format!("Loading parameters for {}...", ticket.item().name);
                Some(BackendCommand::FetchMetadata { ticket })
            }
            Err(err) => {
                self.show_error(UiError::from_client_error(UiErrorContext::Metadata, &err));
                None
            }
        }
    }

    /// `None` when nothing is selected; the error is surfaced instead.
    pub fn send_data(&mut self) -> Option<BackendCommand> {
        match self.session.send_data() {
            Ok(payload) => {
                self.status = format!("Sending {} parameters...", payload.values().len());
                Some(BackendCommand::Submit { payload })
            }
            Err(err) => {
                self.show_error(UiError::from_client_error(UiErrorContext::Submit, &err));
                None
            }
        }
    }

    pub fn press_button(&mut self, task: CommandTask) -> BackendCommand {
        self.status = format!("Sending {task}...");
        BackendCommand::PressButton { task }
    }

    pub fn apply_event(&mut self, event: UiEvent) -> Vec<BackendCommand> {
        match event {
            UiEvent::Info(message) => self.status = message,
            UiEvent::Error(err) => {
                match err.context() {
                    UiErrorContext::Catalog => {
                        self.session.load_catalog(Vec::new());
                        self.previews.clear();
                        self.catalog_epoch += 1;
                        self.catalog_loading = false;
                    }
                    // A rejected connect never produces a catalog event.
                    UiErrorContext::BackendStartup => self.catalog_loading = false,
                    _ => {}
                }
                self.show_error(err);
            }
            UiEvent::CatalogLoaded(items) => {
                self.session.load_catalog(items);
                self.catalog_epoch += 1;
                self.catalog_loading = false;
                self.metadata_error = None;
                self.banner = None;
                let gallery = self.session.gallery();
                self.previews = vec![TilePreview::Loading; gallery.len()];
                self.status = format!("Loaded {} items", gallery.len());
                return gallery
                    .items()
                    .iter()
                    .enumerate()
                    .map(|(tile, item)| BackendCommand::FetchPreview {
                        tile,
                        name: item.name.clone(),
                    })
                    .collect();
            }
            UiEvent::MetadataLoaded(response) => match response.result {
                Ok(metadata) => {
                    let engine = metadata.engine.clone();
                    if self.session.apply_metadata(&response.ticket, metadata)
                        == SelectionOutcome::Applied
                    {
                        self.metadata_error = None;
                        self.status =
                            format!("Selected {} ({engine})", response.ticket.item().name);
                    }
                }
                Err(err) => {
                    if self.session.reject_metadata(&response.ticket) == SelectionOutcome::Applied {
                        let err = UiError::from_client_error(UiErrorContext::Metadata, &err);
                        self.metadata_error = Some(err.message().to_string());
                        self.show_error(err);
                    } else {
                        debug!(
                            item = %response.ticket.item().name,
                            "ignoring failure of superseded metadata request: {err}"
                        );
                    }
                }
            },
            UiEvent::PreviewLoaded { tile, name, image } => {
                if let Some(slot) = self.preview_slot(tile, &name) {
                    *slot = TilePreview::Ready(image);
                }
            }
            UiEvent::PreviewFailed { tile, name, reason } => {
                warn!(tile, item = %name, "preview unavailable: {reason}");
                if let Some(slot) = self.preview_slot(tile, &name) {
                    *slot = TilePreview::Failed(reason);
                }
            }
            UiEvent::Submitted => self.notify("Data sent!".to_string()),
            UiEvent::ButtonPressed(task) => self.notify(format!("Button pressed! ({task})")),
        }
        Vec::new()
    }

    // Preview events for a catalog that has since been replaced are dropped.
    fn preview_slot(&mut self, tile: usize, name: &str) -> Option<&mut TilePreview> {
        let matches = self
            .session
            .gallery()
            .get(tile)
            .is_some_and(|item| item.name == name);
        if matches {
            self.previews.get_mut(tile)
        } else {
            None
        }
    }

    fn notify(&mut self, message: String) {
        self.status = message.clone();
        self.banner = Some(StatusBanner {
            severity: StatusBannerSeverity::Info,
            message,
        });
    }

    fn show_error(&mut self, err: UiError) {
        self.status = format!("{} error: {}", err_label(err.category()), err.message());
        if err.is_blocking() || err.context() == UiErrorContext::Metadata {
            self.banner = Some(StatusBanner {
                severity: StatusBannerSeverity::Error,
                message: self.status.clone(),
            });
        }
    }
}
