use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, resolve_selection, ClientHandle, OperatorSession, SandTableClient,
    SelectionOutcome,
};
use shared::domain::CommandTask;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Operator CLI for the sand table backend")]
struct Cli {
    /// Backend base url; overrides sandtable.toml and the environment
    #[arg(long)]
    server_url: Option<String>,
    /// Print JSON instead of plain text
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the item catalog
    Items,
    /// Show the engine and parameters of one item
    Meta { name: String },
    /// Select an item, fill its parameters and submit
    Submit {
        /// Item name (or id) from the catalog
        item: String,
        /// Parameter value as NAME=VALUE; may be repeated
        #[arg(long = "set", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
    },
    /// Send an operator command: home, start, stop or clear
    Button {
        #[arg(value_parser = parse_task)]
        task: CommandTask,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_task(raw: &str) -> Result<CommandTask, String> {
    CommandTask::parse(raw).ok_or_else(|| {
        format!("unknown task '{raw}' (expected one of: home, start, stop, clear)")
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let cli = Cli::parse();

    let settings = load_settings()
        .context("failed to load client settings")?
        .with_server_url(cli.server_url.as_deref());
    let client = SandTableClient::from_settings(&settings)
        .with_context(|| format!("cannot use server url '{}'", settings.server_url))?;
    debug!(server_url = %client.endpoints().base(), "using table server");

    match cli.command {
        Command::Items => {
            let items = client.fetch_catalog().await.context("catalog request failed")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                for item in &items {
                    println!("{}\t{}", item.id, item.name);
                }
            }
        }
        Command::Meta { name } => {
            let metadata = client
                .fetch_metadata(&name)
                .await
                .with_context(|| format!("metadata request for '{name}' failed"))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&metadata)?);
            } else {
                println!("engine: {}", metadata.engine);
                for parameter in &metadata.parameters {
                    println!("  {}", parameter.name);
                }
            }
        }
        Command::Submit { item, values } => {
            let mut session = OperatorSession::new();
            session.load_catalog(client.fetch_catalog().await.context("catalog request failed")?);
            let tile = session
                .gallery()
                .position_by_name(&item)
                .or_else(|| {
                    session
                        .gallery()
                        .items()
                        .iter()
                        .position(|candidate| candidate.id.to_string() == item)
                })
                .ok_or_else(|| anyhow!("no catalog item named '{item}'"))?;

            let ticket = session
                .select_tile(tile)
                .ok_or_else(|| anyhow!("catalog tile {tile} disappeared"))??;
            let response = resolve_selection(&client, ticket).await;
            let metadata = response
                .result
                .with_context(|| format!("metadata request for '{item}' failed"))?;
            if session.apply_metadata(&response.ticket, metadata) == SelectionOutcome::Stale {
                bail!("selection of '{item}' was superseded");
            }

            for (name, value) in values {
                if !session.form_mut().set_value(&name, value) {
                    let known: Vec<_> = session
                        .form()
                        .fields()
                        .iter()
                        .map(|field| field.name.as_str())
                        .collect();
                    bail!(
                        "'{item}' has no parameter '{name}' (parameters: {})",
                        known.join(", ")
                    );
                }
            }

            let payload = session.send_data()?;
            info!(item = %item, engine = %payload.engine, "submitting parameters");
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
            client.submit(&payload).await.context("submission failed")?;
            println!("Data sent!");
        }
        Command::Button { task } => {
            info!(task = %task, "sending operator command");
            client
                .press_button(task)
                .await
                .with_context(|| format!("'{task}' command failed"))?;
            println!("Button pressed!");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_parameter_assignments() {
        assert_eq!(
            parse_assignment(" rotations = 12 "),
            Ok(("rotations".to_string(), "12".to_string()))
        );
        assert_eq!(
            parse_assignment("r0="),
            Ok(("r0".to_string(), String::new()))
        );
        assert!(parse_assignment("rotations").is_err());
        assert!(parse_assignment("=4").is_err());
    }

    #[test]
    fn parses_submit_and_button_invocations() {
        let cli = Cli::try_parse_from([
            "sandtable",
            "--server-url",
            "http://table:8000",
            "submit",
            "spiral",
            "--set",
            "r0=1",
            "--set",
            "r1=9",
        ])
        .expect("submit args");
        match cli.command {
            Command::Submit { item, values } => {
                assert_eq!(item, "spiral");
                assert_eq!(values.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["sandtable", "button", "Stop"]).expect("button args");
        assert!(matches!(
            cli.command,
            Command::Button {
                task: CommandTask::Stop
            }
        ));
        assert!(Cli::try_parse_from(["sandtable", "button", "reboot"]).is_err());
    }
}
