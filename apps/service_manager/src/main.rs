use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::FolderSessionController;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;

use commands::{parse_command, Command, HELP};
use config::{load_settings, Backend, BusyPolicySetting, IdStrategy, Settings};

#[derive(Parser, Debug)]
#[command(about = "Manage one folder of services from the terminal")]
struct Args {
    /// Settings file; defaults to ./service_manager.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum)]
    backend: Option<Backend>,
    #[arg(long)]
    server_url: Option<String>,
    /// Latency of the simulated backend.
    #[arg(long)]
    latency_ms: Option<u64>,
    #[arg(long)]
    simulate_failures: bool,
    #[arg(long, value_enum)]
    busy_policy: Option<BusyPolicySetting>,
    #[arg(long, value_enum)]
    id_strategy: Option<IdStrategy>,
    #[arg(long)]
    log_filter: Option<String>,
    /// Fetch this folder before reading commands.
    #[arg(long)]
    folder_id: Option<String>,
}

impl Args {
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(v) = self.backend {
            settings.backend = v;
        }
        if let Some(v) = &self.server_url {
            settings.server_url = Some(v.clone());
        }
        if let Some(v) = self.latency_ms {
            settings.latency_ms = v;
        }
        if self.simulate_failures {
            settings.simulate_failures = true;
        }
        if let Some(v) = self.busy_policy {
            settings.busy_policy = v;
        }
        if let Some(v) = self.id_strategy {
            settings.id_strategy = v;
        }
        if let Some(v) = &self.log_filter {
            settings.log_filter = v.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    args.apply_to(&mut settings);

    let filter = EnvFilter::try_new(&settings.log_filter)
        .with_context(|| format!("invalid log filter '{}'", settings.log_filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let controller = settings.build_controller()?;
    debug!(?settings, "session controller ready");
    spawn_busy_indicator(&controller);

    if let Some(folder_id) = &args.folder_id {
        if let Err(err) = controller.fetch_folder(folder_id.as_str()).await {
            debug!(error = %err, "startup fetch did not apply");
        }
    }
    print!("{}", render::render(&controller.snapshot()));
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(usage) => {
                println!("{usage}");
                continue;
            }
        };
        if !run_command(&controller, command).await {
            break;
        }
    }

    Ok(())
}

/// Prints a line whenever an async operation starts.
fn spawn_busy_indicator(controller: &Arc<FolderSessionController>) {
    let mut snapshots = controller.subscribe_snapshots();
    tokio::spawn(async move {
        let mut was_busy = false;
        loop {
            match snapshots.recv().await {
                Ok(snapshot) => {
                    if snapshot.busy && !was_busy {
                        println!("working...");
                    }
                    was_busy = snapshot.busy;
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "busy indicator lagged behind session snapshots");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Runs one command to completion and renders the result. Returns `false`
/// when the session should end.
///
/// Commands are awaited one at a time, so async operations never overlap.
async fn run_command(controller: &FolderSessionController, command: Command) -> bool {
    let applied = match command {
        Command::Fetch { folder_id } => controller.fetch_folder(folder_id).await.map(drop),
        Command::Create { name: Some(name) } => controller.create_folder(&name).await.map(drop),
        Command::Create { name: None } => controller.create_folder_from_draft().await.map(drop),
        Command::Name(name) => {
            controller.set_folder_name_draft(name);
            Ok(())
        }
        Command::Title(title) => {
            controller.set_service_title_draft(title);
            Ok(())
        }
        Command::Description(description) => {
            controller.set_service_description_draft(description);
            Ok(())
        }
        Command::Add => controller.add_service_from_draft().map(drop),
        Command::Delete { service_id } => {
            controller.delete_service(&service_id);
            Ok(())
        }
        Command::Save => controller.save_services().await.map(drop),
        Command::Reset => {
            controller.reset_session();
            Ok(())
        }
        Command::Show => Ok(()),
        Command::Help => {
            println!("{HELP}");
            return true;
        }
        Command::Quit => return false,
    };
    if let Err(err) = applied {
        debug!(error = %err, "command did not apply");
    }
    print!("{}", render::render(&controller.snapshot()));
    true
}
