//! `dispatchpi` - one mailed photo per day on a pair of e-ink frames.
//!
//! Pulls photo attachments from a shared Gmail inbox, queues them per frame and
//! writes the image due today to a file the frame picks up.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use dispatchpi_core::{Error as CoreError, GmailClient, RawRenderer, Renderer, Scheduler, Target};
use dispatchpi_oauth::AuthorizedUser;

use config::Config;

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "dispatchpi", about = "Daily photo delivery for e-ink frames", version)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Pull new photos, pick today's photo and write it to a file.
    Display {
        /// Frame to serve (`satellite_frame` or `earth_frame`).
        target: Target,
        /// Where to write the image.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Pull new photos into the frame's queue without displaying.
    Pull {
        /// Frame to fill.
        target: Target,
    },
    /// Show the persisted queue of a frame.
    Queue {
        /// Frame to inspect.
        target: Target,
    },
    /// Write a default configuration file if none exists.
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config_path = cli.config.unwrap_or_else(Config::default_path);
    info!(config = %config_path.display(), "Starting dispatchpi");

    match cli.command {
        Command::Init => init_config(&config_path).await,
        Command::Queue { target } => {
            let config = Config::load(&config_path).await?;
            show_queue(&config, target)
        }
        Command::Pull { target } => {
            let config = Config::load(&config_path).await?;
            let source = connect(&config, &config_path).await?;
            let mut scheduler = Scheduler::open(config.scheduler_config()?);
            let scheduled = scheduler.pull_attachments(target, &source).await?;
            scheduler.save(target)?;
            info!(%target, scheduled, queued = scheduler.queue(target).len(), "Pull complete");
            Ok(())
        }
        Command::Display { target, output } => {
            let config = Config::load(&config_path).await?;
            display(&config, &config_path, target, &output).await
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dispatchpi=info,dispatchpi_core=info,dispatchpi_oauth=info".into());
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Loads credentials, refreshing and saving them if expired, and builds the Gmail client.
async fn connect(config: &Config, config_path: &Path) -> Result<GmailClient> {
    let credentials_path = config.credentials_path(config_path);
    let mut user = AuthorizedUser::load(&credentials_path).await.with_context(|| {
        format!(
            "cannot load credentials from {}; save the authorized-user token.json that \
             Google's OAuth client libraries write after consenting to the \
             gmail.readonly scope there, or point credentials_file at it",
            credentials_path.display()
        )
    })?;

    if user.ensure_fresh().await? {
        user.save(&credentials_path).await?;
        info!("Credentials refreshed and saved");
    }

    Ok(GmailClient::new(user.token).with_api_base(&config.gmail_api_base))
}

/// Runs one display cycle for `target` and writes the result to `output`.
async fn display(config: &Config, config_path: &Path, target: Target, output: &Path) -> Result<()> {
    let source = connect(config, config_path).await?;
    let mut scheduler = Scheduler::open(config.scheduler_config()?);

    let (image, caption) = match scheduler.display_cycle(target, &source).await {
        Ok((due, bytes)) => {
            let caption = due.caption().to_string();
            (RawRenderer.render(&bytes, &caption)?, caption)
        }
        Err(CoreError::NoDueItem(_)) => {
            let Some(default_image) = &config.default_image else {
                anyhow::bail!("no image is due for {target} and no default_image is configured");
            };
            warn!(%target, "Nothing due, showing default image");
            let bytes = tokio::fs::read(default_image)
                .await
                .with_context(|| format!("cannot read {}", default_image.display()))?;
            (bytes, String::new())
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, &image)
        .await
        .with_context(|| format!("cannot write {}", output.display()))?;
    info!(%target, output = %output.display(), bytes = image.len(), "Image written");

    println!("{caption}");
    Ok(())
}

/// Prints the queue for `target` as stored on disk.
fn show_queue(config: &Config, target: Target) -> Result<()> {
    let mut scheduler = Scheduler::new(config.scheduler_config()?);
    if !scheduler.load(target) {
        anyhow::bail!(
            "queue file {} is unreadable",
            scheduler.queue_path(target).display()
        );
    }

    let queue = scheduler.queue(target);
    let due_index = scheduler.next_due(target).ok().map(|d| d.index);
    println!(
        "{target}: {}/{} images ({})",
        queue.len(),
        scheduler.capacity(),
        scheduler.queue_path(target).display()
    );
    for (i, image) in queue.iter().enumerate() {
        let marker = if Some(i) == due_index { '*' } else { ' ' };
        let date = image
            .display_date
            .map_or_else(|| "unscheduled".to_string(), |d| d.to_string());
        println!(
            "{marker} {:>2}. {date}  {}  {}",
            i + 1,
            image.unique_attachment_id,
            image.text
        );
    }
    Ok(())
}

/// Writes a default configuration unless one is already present.
async fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }
    Config::default().save(path).await?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
