//! `viewstatusctl`: inspect and drive view records from the command line.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use viewstatus_core::{
    UpdateOutcome, ViewStatus,
    config::{ConfigLoad, ConfigLoader, ViewStatusConfig},
    time::VirtualTimeProvider,
};
use viewstatus_model::{MediaKind, ResourceKey};

#[derive(Parser, Debug)]
#[command(name = "viewstatusctl")]
#[command(about = "Inspect and update per-directory watch progress records")]
struct Cli {
    /// Path to a viewstatus.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the view record of a directory
    Show {
        directory: PathBuf,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the watch state of one media file
    Get {
        media: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Record a watch percentage; lower values than the stored one are ignored
    Record {
        media: PathBuf,
        #[arg(allow_hyphen_values = true)]
        percent: i64,
    },
    /// Set or clear the directory-wide all-viewed flag
    AllViewed {
        directory: PathBuf,
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
    /// Burn the stored caption onto a thumbnail
    Overlay {
        media: PathBuf,
        thumbnail: PathBuf,
        out: PathBuf,
    },
    /// Replay a start/stop pair against a virtual clock
    Simulate {
        media: PathBuf,
        /// Seconds between start and stop
        #[arg(long)]
        watched: f64,
        /// Media duration in seconds
        #[arg(long)]
        duration: f64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(cli.config.as_deref())?;
    let status = ViewStatus::new(config);

    match cli.command {
        Command::Show { directory, json } => show(&status, &directory, json),
        Command::Get { media, json } => get(&status, &media, json),
        Command::Record { media, percent } => record(&status, &media, percent),
        Command::AllViewed { directory, value } => {
            status
                .set_all_viewed(&directory, value)
                .with_context(|| format!("updating {}", directory.display()))?;
            println!("allviewed={value}");
            Ok(())
        }
        Command::Overlay {
            media,
            thumbnail,
            out,
        } => overlay(&status, &media, &thumbnail, &out),
        Command::Simulate {
            media,
            watched,
            duration,
        } => simulate(status, &media, watched, duration),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ViewStatusConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = path {
        loader = loader.with_config_path(path);
    }
    let ConfigLoad {
        config, warnings, ..
    } = loader.load().context("failed to load configuration")?;
    for warning in warnings.iter() {
        warn!(message = %warning, "configuration warning");
    }
    Ok(config)
}

fn show(status: &ViewStatus, directory: &Path, json: bool) -> anyhow::Result<()> {
    let record = status
        .store()
        .load(directory)
        .with_context(|| format!("reading record in {}", directory.display()))?;

    if json {
        let entries: serde_json::Map<String, serde_json::Value> = record
            .entries()
            .map(|(name, percent)| (name.to_string(), percent.value().into()))
            .collect();
        let doc = serde_json::json!({
            "directory": directory,
            "allviewed": record.all_viewed_flag(),
            "entries": entries,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    if let Some(flag) = record.all_viewed_flag() {
        println!("allviewed={flag}");
    }
    for (name, percent) in record.entries() {
        println!("{name}={}", percent.value());
    }
    Ok(())
}

fn get(status: &ViewStatus, media: &Path, json: bool) -> anyhow::Result<()> {
    let key = ResourceKey::from_media_path(media)?;
    let state = status.store().load(key.directory())?.state(key.file_name());
    if json {
        println!("{}", serde_json::to_string(&state)?);
    } else {
        match state.caption() {
            Some(caption) => println!("{}: {caption}", key.file_name()),
            None => println!("{}: not viewed", key.file_name()),
        }
    }
    Ok(())
}

fn record(status: &ViewStatus, media: &Path, percent: i64) -> anyhow::Result<()> {
    let key = ResourceKey::from_media_path(media)?;
    let outcome = status
        .store()
        .update(key.directory(), key.file_name(), percent)
        .with_context(|| format!("recording progress for {key}"))?;
    match outcome {
        UpdateOutcome::Raised { previous, current } => {
            println!("{}: {previous} -> {current}", key.file_name());
        }
        UpdateOutcome::Unchanged { stored, requested } => {
            println!(
                "{}: kept {stored} (requested {requested})",
                key.file_name()
            );
        }
    }
    Ok(())
}

fn overlay(
    status: &ViewStatus,
    media: &Path,
    thumbnail: &Path,
    out: &Path,
) -> anyhow::Result<()> {
    let raw = fs::read(thumbnail)
        .with_context(|| format!("reading {}", thumbnail.display()))?;
    if image::guess_format(&raw).is_err() {
        warn!(path = %thumbnail.display(), "thumbnail format not recognised");
    }
    let Some(bytes) = status.on_thumbnail_requested(media, Some(&raw)) else {
        bail!("no thumbnail produced for {}", media.display());
    };
    fs::write(out, &bytes).with_context(|| format!("writing {}", out.display()))?;
    println!("{}", out.display());
    Ok(())
}

fn simulate(
    status: ViewStatus,
    media: &Path,
    watched: f64,
    duration: f64,
) -> anyhow::Result<()> {
    let Ok(watched) = Duration::try_from_secs_f64(watched) else {
        bail!("--watched must be a non-negative number of seconds, got {watched}");
    };
    let clock = VirtualTimeProvider::new();
    let status = status.with_clock(Arc::new(clock.clone()));
    let kind = MediaKind::from_path(media);

    status.on_playback_start(media, kind);
    clock.advance(watched);
    let outcome = status.on_playback_stop(media, kind, duration);
    println!("{outcome:?}");
    Ok(())
}
