//! Eventdesk CLI - admin client for the events API

mod commands;
mod config;
mod cookies;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use commands::{App, Commands};
use eventdesk_core::FileSessionStore;
use eventdesk_http::SessionClient;
use reqwest::Url;
use reqwest::cookie::Jar;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{Level, error, info};

#[derive(Parser)]
#[command(name = "eventdesk")]
#[command(about = "Manage events from the command line")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Data directory for the session, cookies, settings and logs
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Settings file (defaults to eventdesk.toml in the data directory)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = config::resolve_data_dir(cli.data_dir.clone());
    logging::init_logging(cli.log_level.into(), &data_dir, cli.no_file_log)?;
    let settings = config::Settings::load(cli.config.as_deref(), &data_dir)?;

    info!(data_dir = %data_dir.display(), api = %settings.api.base_url, "Starting Eventdesk CLI");

    let expired = Arc::new(AtomicBool::new(false));
    let jar = Arc::new(Jar::default());
    let client = build_client(&settings, &data_dir, Arc::clone(&jar), Arc::clone(&expired))?;

    let cookie_path = data_dir.join(cookies::FILE_NAME);
    let refresh_url = Url::parse(client.refresh_url())
        .with_context(|| format!("Invalid refresh URL {}", client.refresh_url()))?;
    cookies::restore(&jar, &cookie_path, &refresh_url)?;

    // Logout deletes the saved cookies itself
    let keep_cookies = !matches!(cli.command, Commands::Logout);
    let app = App {
        client,
        settings,
        data_dir,
    };
    let result = cli.command.execute(&app).await;

    if expired.load(Ordering::SeqCst) {
        commands::end_expired_session(&app).await?;
        std::process::exit(1);
    }

    if keep_cookies {
        cookies::save(&jar, &cookie_path, &refresh_url)?;
    }

    match result {
        Ok(()) => {
            info!("Command completed successfully");
        }
        Err(e) => {
            error!("Command failed: {e:#}");
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn build_client(
    settings: &config::Settings,
    data_dir: &std::path::Path,
    jar: Arc<Jar>,
    expired: Arc<AtomicBool>,
) -> Result<SessionClient> {
    let mut builder = SessionClient::builder()
        .base_url(&settings.api.base_url)
        .refresh_path(&settings.api.refresh_path)
        .session_store(Arc::new(FileSessionStore::in_dir(data_dir)))
        .cookie_jar(jar)
        .on_session_expired(move || expired.store(true, Ordering::SeqCst));

    if settings.api.timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(settings.api.timeout_secs));
    }

    Ok(builder.build()?)
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
