//! Backend worker: owns the tokio runtime and the HTTP client.
//!
//! Each network command runs as its own task, so metadata responses may
//! reach the UI out of request order; the controller discards stale ones.

use std::{sync::Arc, thread};

use client_core::{
    resolve_selection, ClientError, ClientHandle, ClientSettings, MetadataResponse,
    SandTableClient,
};
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::events::{UiError, UiErrorCategory, UiErrorContext, UiEvent},
    media::decode_preview_image,
};

pub fn launch(settings: ClientSettings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::new(
                    UiErrorCategory::Unknown,
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run(settings, cmd_rx, ui_tx));
    });
}

fn connect(settings: &ClientSettings, ui_tx: &Sender<UiEvent>) -> Option<Arc<SandTableClient>> {
    match SandTableClient::from_settings(settings) {
        Ok(client) => {
            info!(server_url = %client.endpoints().base(), "backend client ready");
            Some(Arc::new(client))
        }
        Err(err) => {
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client_error(
                UiErrorContext::BackendStartup,
                &err,
            )));
            None
        }
    }
}

async fn run(settings: ClientSettings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    // The UI always opens with `Connect`, which carries the effective server url.
    let mut client: Option<Arc<SandTableClient>> = None;

    // `recv` blocks this worker thread only; spawned tasks run on the pool.
    while let Ok(cmd) = cmd_rx.recv() {
        debug!(command = cmd.name(), "backend command received");

        if let BackendCommand::Connect { server_url } = cmd {
            let candidate = settings.clone().with_server_url(Some(&server_url));
            // A rejected url keeps whichever client was already working.
            if let Some(connected) = connect(&candidate, &ui_tx) {
                let _ = ui_tx.try_send(UiEvent::Info(format!(
                    "Connected to {}; loading catalog...",
                    candidate.server_url
                )));
                spawn_catalog_load(Some(connected.clone()), ui_tx.clone());
                client = Some(connected);
            }
            continue;
        }

        let Some(active) = client.clone() else {
            if let Some(event) = unavailable_event(cmd) {
                let _ = ui_tx.try_send(event);
            }
            continue;
        };
        let ui_tx = ui_tx.clone();

        match cmd {
            BackendCommand::Connect { .. } => {}
            BackendCommand::LoadCatalog => spawn_catalog_load(Some(active), ui_tx),
            BackendCommand::FetchMetadata { ticket } => {
                tokio::spawn(async move {
                    let response = resolve_selection(active.as_ref(), ticket).await;
                    let _ = ui_tx.try_send(UiEvent::MetadataLoaded(response));
                });
            }
            BackendCommand::FetchPreview { tile, name } => {
                tokio::spawn(async move {
                    let event = match active.fetch_preview(&name).await {
                        Ok(bytes) => match decode_preview_image(&bytes) {
                            Ok(image) => UiEvent::PreviewLoaded { tile, name, image },
                            Err(reason) => UiEvent::PreviewFailed { tile, name, reason },
                        },
                        Err(err) => UiEvent::PreviewFailed {
                            tile,
                            name,
                            reason: err.to_string(),
                        },
                    };
                    let _ = ui_tx.try_send(event);
                });
            }
            BackendCommand::Submit { payload } => {
                tokio::spawn(async move {
                    let event = match active.submit(&payload).await {
                        Ok(()) => UiEvent::Submitted,
                        Err(err) => UiEvent::Error(UiError::from_client_error(
                            UiErrorContext::Submit,
                            &err,
                        )),
                    };
                    let _ = ui_tx.try_send(event);
                });
            }
            BackendCommand::PressButton { task } => {
                tokio::spawn(async move {
                    let event = match active.press_button(task).await {
                        Ok(()) => UiEvent::ButtonPressed(task),
                        Err(err) => {
                            warn!(task = %task, "command failed: {err}");
                            UiEvent::Error(UiError::from_client_error(
                                UiErrorContext::Command,
                                &err,
                            ))
                        }
                    };
                    let _ = ui_tx.try_send(event);
                });
            }
        }
    }

    info!("ui command channel closed; backend worker exiting");
}

fn spawn_catalog_load(client: Option<Arc<SandTableClient>>, ui_tx: Sender<UiEvent>) {
    let Some(client) = client else {
        return;
    };
    tokio::spawn(async move {
        let event = match client.fetch_catalog().await {
            Ok(items) => UiEvent::CatalogLoaded(items),
            Err(err) => UiEvent::Error(UiError::from_client_error(UiErrorContext::Catalog, &err)),
        };
        let _ = ui_tx.try_send(event);
    });
}

/// The reply for a command that arrives before any client could be built.
/// Every request is answered so the UI never waits on it.
fn unavailable_event(cmd: BackendCommand) -> Option<UiEvent> {
    let failure = |context| {
        UiEvent::Error(UiError::from_client_error(
            context,
            &ClientError::NotConnected,
        ))
    };
    match cmd {
        BackendCommand::Connect { .. } => None,
        BackendCommand::LoadCatalog => Some(failure(UiErrorContext::Catalog)),
        BackendCommand::FetchMetadata { ticket } => {
            Some(UiEvent::MetadataLoaded(MetadataResponse {
                ticket,
                result: Err(ClientError::NotConnected),
            }))
        }
        BackendCommand::FetchPreview { tile, name } => Some(UiEvent::PreviewFailed {
            tile,
            name,
            reason: ClientError::NotConnected.to_string(),
        }),
        BackendCommand::Submit { .. } => Some(failure(UiErrorContext::Submit)),
        BackendCommand::PressButton { .. } => Some(failure(UiErrorContext::Command)),
    }
}
