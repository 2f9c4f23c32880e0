mod backend_bridge;
mod controller;
mod media;
mod ui;

use anyhow::Context;
use clap::Parser;
use client_core::{load_settings, ClientSettings};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::{commands::BackendCommand, runtime};
use crate::controller::events::UiEvent;
use crate::ui::{DesktopGuiApp, PersistedConsoleSettings, StartupConfig, SETTINGS_STORAGE_KEY};

#[derive(Debug, Parser)]
#[command(name = "sandtable-console", about = "Operator console for the sand table")]
struct Args {
    /// Table server base url; overrides the saved and configured values.
    #[arg(long)]
    server_url: Option<String>,
}

/// Command line beats the url remembered from the last session, which beats
/// `sandtable.toml` and the environment.
fn startup_server_url(
    cli: Option<&str>,
    persisted: Option<&PersistedConsoleSettings>,
    settings: &ClientSettings,
) -> String {
    let non_blank = |value: &str| {
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    };
    cli.and_then(non_blank)
        .or_else(|| {
            persisted
                .and_then(|saved| saved.server_url.as_deref())
                .and_then(non_blank)
        })
        .unwrap_or_else(|| settings.server_url.clone())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let settings = load_settings().context("failed to load console settings")?;

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    runtime::launch(settings.clone(), cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Sand Table Console")
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([760.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Sand Table Console",
        options,
        Box::new(move |cc| {
            let persisted = cc.storage.and_then(|storage| {
                storage
                    .get_string(SETTINGS_STORAGE_KEY)
                    .and_then(|text| PersistedConsoleSettings::from_json(&text))
            });
            let server_url =
                startup_server_url(args.server_url.as_deref(), persisted.as_ref(), &settings);
            tracing::info!(%server_url, "starting console");
            Ok(Box::new(DesktopGuiApp::new(
                cmd_tx,
                ui_rx,
                StartupConfig { server_url },
            )))
        }),
    )
    .map_err(|err| anyhow::anyhow!("console window failed: {err}"))
}
