use std::path::Path;

use crate::{
    drain::{DrainStats, PacketDrain},
    error::{Error, Result},
    frame::FrameWriter,
    input::{Container, ContainerOpener},
    scratch::ScratchImage,
    selector,
    sink::{SinkOpener, SinkSet},
    stream::{AudioFormat, ImageLayout, MediaKind, StreamSet},
};

/// Which kinds of streams to decode, in selection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub kinds: Vec<MediaKind>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            kinds: vec![MediaKind::Video, MediaKind::Audio],
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub stats: DrainStats,
    pub video: Option<ImageLayout>,
    pub audio: Option<AudioFormat>,
    /// ffplay commands for the raw outputs written to files.
    pub play_commands: Vec<String>,
}

/// `ffplay` invocation that plays back a raw video output.
pub fn video_play_command(layout: &ImageLayout, path: &Path) -> String {
    format!(
        "ffplay -f rawvideo -pix_fmt {} -video_size {}x{} {}",
        layout.pixel_name(),
        layout.width,
        layout.height,
        path.display()
    )
}

/// `ffplay` invocation for a raw audio output. `None` for sample types ffplay
/// has no raw demuxer for.
pub fn audio_play_command(format: &AudioFormat, path: &Path) -> Option<String> {
    let name = format.raw_name()?;
    Some(format!(
        "ffplay -f {} -ac {} -ar {} {}",
        name,
        format.written_channels(),
        format.rate,
        path.display()
    ))
}

/// Runs one input through selection, decoding and output.
///
/// Resources are acquired in a fixed order (container, decoders, scratch
/// image, sinks) and held in locals, so they are released in reverse on every
/// exit path, including early returns part way through acquisition.
pub struct PipelineController {
    config: PipelineConfig,
}

impl PipelineController {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn run<O, S>(&self, input: &Path, opener: &O, outputs: &S) -> Result<PipelineReport>
    where
        O: ContainerOpener,
        S: SinkOpener + ?Sized,
    {
        crate::init()?;

        let mut container = opener.open(input)?;
        log::info!("opened input {}", input.display());
        if let Some(info) = container.media_info() {
            log::info!("{}", info);
        }

        let mut streams = self.select_streams(&container)?;

        let mut scratch = streams.video_layout().map(ScratchImage::new).transpose()?;

        let mut sinks = SinkSet::open_all(outputs, &self.config.kinds)?;

        let writer = FrameWriter::new(scratch.as_mut(), &mut sinks);
        let stats = PacketDrain::new(&mut container, &mut streams, writer).run()?;
        sinks.finish_all()?;
        log::info!("decoded {}", stats);

        let report = PipelineReport {
            play_commands: self.play_commands(&streams, outputs),
            stats,
            video: streams.video_layout(),
            audio: streams.audio_format(),
        };
        for command in &report.play_commands {
            log::info!("play the output with: {}", command);
        }
        Ok(report)
    }

    /// Selects one stream per configured kind. Kinds the input lacks are
    /// skipped, but at least one stream has to be found.
    fn select_streams<C: Container + ?Sized>(&self, container: &C) -> Result<StreamSet> {
        let mut streams = StreamSet::new();
        let mut missing = None;
        for &kind in &self.config.kinds {
            if streams.contains(kind) {
                continue;
            }
            match selector::select(container, kind) {
                Ok(stream) => streams.push(stream),
                Err(Error::NoStreamFound(kind)) => {
                    log::warn!("input has no {} stream, skipping", kind);
                    missing = Some(kind);
                }
                Err(err) => return Err(err),
            }
        }
        if streams.is_empty() {
            let kind = missing
                .or_else(|| self.config.kinds.first().copied())
                .unwrap_or(MediaKind::Video);
            return Err(Error::NoStreamFound(kind));
        }
        Ok(streams)
    }

    fn play_commands<S>(&self, streams: &StreamSet, outputs: &S) -> Vec<String>
    where
        S: SinkOpener + ?Sized,
    {
        let mut commands = Vec::new();
        if let (Some(layout), Some(path)) = (
            streams.video_layout(),
            outputs.location(MediaKind::Video),
        ) {
            commands.push(video_play_command(&layout, path));
        }
        if let (Some(format), Some(path)) = (
            streams.audio_format(),
            outputs.location(MediaKind::Audio),
        ) {
            match audio_play_command(&format, path) {
                Some(command) => commands.push(command),
                None => log::info!("no raw playback format for {} audio", format.sample.name()),
            }
        }
        commands
    }
}

impl Default for PipelineController {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
