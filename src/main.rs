mod config;
mod error;
mod gesture;
mod history;
mod phrases;
mod pipeline;
mod speech;
mod stabilizer;
#[cfg(test)]
mod testutil;
mod types;

use std::{
    io,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;

use config::{Config, SpeechBackend};
use phrases::PhraseTable;
use pipeline::{GestureSession, render::TerminalRenderer, run_frame_loop, source::open_replay};
use speech::{SpeechEvent, Speaker, build_engine};

#[derive(Parser)]
#[command(name = "signlink", about = "Speaks recognized hand gestures aloud")]
struct Cli {
    /// JSON-lines landmark stream, `-` for stdin
    #[arg(default_value = "-")]
    input: String,
    /// Config file (defaults to ./signlink.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Label to phrase JSON file
    #[arg(long)]
    labels: Option<PathBuf>,
    #[arg(long, value_enum)]
    speech: Option<SpeechBackend>,
    /// Replay pacing, 0 for as fast as possible
    #[arg(long)]
    fps: Option<u32>,
    /// Mirror x coordinates of incoming landmarks
    #[arg(long)]
    mirror: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(engine) = cli.speech {
        config.speech.engine = engine;
    }
    if let Some(fps) = cli.fps {
        config.source.fps = fps;
    }
    config.source.mirror |= cli.mirror;

    let phrases = match &cli.labels {
        Some(path) => PhraseTable::load(path)?,
        None => PhraseTable::load_or_default(&config.labels)?,
    };
    log::info!("loaded {} phrases", phrases.len());

    // Fail fast before any output is produced.
    let mut source = open_replay(&cli.input, config.source)?;

    let quit = Arc::new(AtomicBool::new(false));
    let quit_flag = quit.clone();
    ctrlc::set_handler(move || {
        // A second interrupt exits even if the source is blocked on input.
        if quit_flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
    })
    .context("failed to install quit handler")?;

    log::info!("speech engine: {:?}", config.speech.engine);
    let speaker = Speaker::spawn(build_engine(&config.speech));
    let mut session = GestureSession::new(&config, phrases);
    let mut renderer = TerminalRenderer::new(io::stdout());

    let mut summary = run_frame_loop(&mut source, &mut session, &speaker, &mut renderer, &quit)?;

    // End of input lets the last phrase play out; a quit request cuts it off.
    if summary.exhausted && !quit.load(Ordering::SeqCst) {
        let grace = Duration::from_millis(config.speech.finish_timeout_ms);
        let late = speaker.finish(grace);
        summary.speech_failures += late
            .iter()
            .filter(|event| matches!(event, SpeechEvent::Failed { .. }))
            .count() as u64;
    }

    log::info!(
        "processed {} frames, emitted {} phrases ({} speech failures)",
        summary.frames,
        summary.phrases,
        summary.speech_failures
    );

    Ok(())
}
