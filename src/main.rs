use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use ffmpeg_drain::{FfmpegOpener, FileSinkOpener, PipelineController};

mod config;

/// Demultiplexes a media file and writes its best video and audio streams
/// as raw decoded frames.
#[derive(Parser)]
#[command(name = "demux-decode", version)]
struct Cli {
    /// Input media file.
    input: PathBuf,
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("ffmpeg_next", log::LevelFilter::Warn)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    ffmpeg_drain::init().context("ffmpeg init")?;

    let config = config::config();
    let outputs = FileSinkOpener::new(config.video(), config.audio());
    let report = PipelineController::default()
        .run(&cli.input, &FfmpegOpener, &outputs)
        .with_context(|| format!("decoding {}", cli.input.display()))?;

    log::info!(
        "wrote {} video frames to {}, {} audio frames to {}",
        report.stats.video.frames,
        config.video().display(),
        report.stats.audio.frames,
        config.audio().display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
