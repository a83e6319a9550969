use std::path::PathBuf;

use clap::Parser;
use escaperoom_interaction::{
    backend::audio::SoundLog,
    config::InteractionConfig,
    replay::{self, ReplayScript, ReplaySummary},
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Replays a hand-interaction session against the escape room core
#[derive(Default, Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Replay script to run instead of the built-in walkthrough
    #[arg(short, long, value_name = "FILE_PATH")]
    script: Option<PathBuf>,

    /// Ignore config files and use built-in defaults
    #[arg(long)]
    defaults: bool,

    /// Path to write logs to
    #[arg(short, long, value_name = "FILE_PATH")]
    log_to: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = Args::parse();
    logging_init(&mut args);

    log::info!(
        "Welcome to {} version {}!",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    );

    let config = if args.defaults {
        InteractionConfig::default()
    } else {
        InteractionConfig::load_from_disk()?
    };

    let script = match &args.script {
        Some(path) => {
            log::info!("Loading script: {}", path.to_string_lossy());
            ReplayScript::from_yaml(&std::fs::read_to_string(path)?)?
        }
        None => ReplayScript::demo()?,
    };

    let summary = run_with_sound(config, &script)?;
    report(&summary);
    Ok(())
}

#[cfg(feature = "audio")]
fn run_with_sound(config: InteractionConfig, script: &ReplayScript) -> anyhow::Result<ReplaySummary> {
    use escaperoom_interaction::backend::audio::AudioOutput;

    if config.sounds_enabled {
        replay::run(config, script, AudioOutput::new())
    } else {
        replay::run(config, script, muted())
    }
}

#[cfg(not(feature = "audio"))]
fn run_with_sound(config: InteractionConfig, script: &ReplayScript) -> anyhow::Result<ReplaySummary> {
    let sounds = if config.sounds_enabled {
        SoundLog::new()
    } else {
        muted()
    };
    replay::run(config, script, sounds)
}

fn muted() -> SoundLog {
    SoundLog {
        muted: true,
        ..Default::default()
    }
}

fn report(summary: &ReplaySummary) {
    log::info!(
        "Replay finished: {} events, handle {} ({}), switches {}{}",
        summary.events.len(),
        if summary.attached { "attached" } else { "loose" },
        summary.mode.as_ref(),
        summary.switches,
        if summary.solved { ", solved" } else { "" },
    );
    if let Some(pos) = summary.handle_position.filter(|_| !summary.attached) {
        log::info!("Loose handle rests at {}", pos);
    }
}

fn logging_init(args: &mut Args) {
    let log_file_path = args
        .log_to
        .take()
        .or_else(|| std::env::var("ESCAPEROOM_LOGFILE").ok());

    let file_writer = log_file_path.and_then(|log_file_path| {
        match std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&log_file_path)
        {
            Ok(file) => {
                println!("Logging to {}", &log_file_path);
                Some(file)
            }
            Err(e) => {
                println!("Failed to open log file (path: {e:?}): {log_file_path}");
                None
            }
        }
    });

    let registry = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr),
        )
        .with(
            /* read RUST_LOG env var */
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        );

    if let Some(writer) = file_writer {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(writer)
                    .with_ansi(false),
            )
            .init();
    } else {
        registry.init();
    }

    log_panics::init();
}
