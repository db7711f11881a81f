#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;
mod commands;

use args::{Args, Command};
use clap::Parser;
use tapedeck_config::Config;
use tapedeck_recorder::ResponseStorage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        config
    };
    if let Some(dir) = args.storage_dir {
        config.recording.storage_dir = dir;
    }
    if args.test_id.is_some() {
        config.recording.test_id = args.test_id;
    }

    let _telemetry_guard = tapedeck_telemetry::init(Some(&config.logging), "warn")?;

    tracing::debug!(
        config_path = %args.config.display(),
        storage_dir = %config.recording.storage_dir.display(),
        "starting tapedeck"
    );

    let storage = ResponseStorage::new(config.recording.storage_dir.clone(), config.recording.test_id.as_deref());
    let mut stdout = std::io::stdout().lock();

    match args.command {
        Command::Fingerprint {
            method,
            url,
            body,
            headers,
        } => commands::fingerprint(&config, &method, &url, body.as_deref(), &headers, &mut stdout).await,
        Command::Show { hash } => commands::show(&storage, &hash, &mut stdout).await,
        Command::ReplayError { hash } => commands::replay_error(&storage, &hash, &mut stdout).await,
        Command::List => commands::list(&storage, &mut stdout).await,
    }
}
