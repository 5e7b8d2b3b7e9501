//! Scripted containers, decoders and sinks for driving the drain loop
//! without media files.

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    path::{Path, PathBuf},
    rc::Rc,
};

use ffmpeg_next::{
    ChannelLayout,
    format::{Pixel, Sample, sample::Type},
    frame,
};

use crate::{
    decoder::{Decoded, Decoder},
    error::{Error, Result},
    frame::Frame,
    input::{Container, ContainerOpener},
    packet::{PacketTail, RawPacket},
    sink::{FrameSink, MemorySink, SinkOpener},
    stream::{AudioFormat, ImageLayout, MediaKind, StreamFormat},
};

/// 4x2 GRAY8, 8 bytes per packed image.
pub fn gray_layout() -> ImageLayout {
    ImageLayout::new(4, 2, Pixel::GRAY8)
}

/// Names of released resources in the order they were dropped.
#[derive(Debug, Clone, Default)]
pub struct DropLog(Rc<RefCell<Vec<String>>>);

impl DropLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: impl Into<String>) {
        self.0.borrow_mut().push(name.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

/// What a scripted decoder does on one `decode` call.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Reports `bytes` consumed, which may exceed the input.
    Take { bytes: usize, frame: bool },
    /// Consumes the whole input and yields a frame.
    Whole,
    Fail,
    /// Consumes the whole input and yields a frame of a different geometry.
    Odd,
    /// Consumes the whole input and yields a frame, reporting a failure left
    /// over from earlier input.
    Recovered,
}

#[derive(Debug, Default)]
pub struct DecoderTrace {
    pub calls: usize,
    pub inputs: Vec<usize>,
    pub consumed: Vec<usize>,
    pub flushed: usize,
}

enum MockFrame {
    Video {
        frame: frame::Video,
        odd: frame::Video,
    },
    Audio(frame::Audio),
}

pub struct MockDecoder {
    format: StreamFormat,
    frame: MockFrame,
    script: VecDeque<Step>,
    fallback: Step,
    buffered: usize,
    trace: Rc<RefCell<DecoderTrace>>,
    drop_log: Option<(DropLog, String)>,
}

impl MockDecoder {
    pub fn video(layout: ImageLayout) -> Self {
        let mut frame = frame::Video::new(layout.format, layout.width, layout.height);
        for (i, b) in frame.data_mut(0).iter_mut().enumerate() {
            *b = i as u8;
        }
        let odd = frame::Video::new(layout.format, layout.width * 2, layout.height);
        Self::with_frame(
            StreamFormat::Video(layout),
            MockFrame::Video { frame, odd },
        )
    }

    /// Packed stereo s16 at 48 kHz, `samples` samples per frame.
    pub fn audio_s16(samples: usize) -> Self {
        let sample = Sample::I16(Type::Packed);
        let mut frame = frame::Audio::new(sample, samples, ChannelLayout::STEREO);
        frame.set_rate(48000);
        let format = AudioFormat {
            sample,
            channels: 2,
            rate: 48000,
        };
        Self::with_frame(StreamFormat::Audio(format), MockFrame::Audio(frame))
    }

    fn with_frame(format: StreamFormat, frame: MockFrame) -> Self {
        Self {
            format,
            frame,
            script: VecDeque::new(),
            fallback: Step::Whole,
            buffered: 0,
            trace: Rc::default(),
            drop_log: None,
        }
    }

    /// Steps played in order before falling back to [`Step::Whole`].
    pub fn script(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.script.extend(steps);
        self
    }

    pub fn fallback(mut self, step: Step) -> Self {
        self.fallback = step;
        self
    }

    /// Frames still held when the input ends, returned by `flush`.
    pub fn buffered(mut self, frames: usize) -> Self {
        self.buffered = frames;
        self
    }

    pub fn logged(mut self, log: &DropLog, name: &str) -> Self {
        self.drop_log = Some((log.clone(), name.to_string()));
        self
    }

    pub fn trace(&self) -> Rc<RefCell<DecoderTrace>> {
        self.trace.clone()
    }

    fn frame(&self, odd: bool) -> Frame<'_> {
        match &self.frame {
            MockFrame::Video { odd: f, .. } if odd => Frame::Video(f),
            MockFrame::Video { frame, .. } => Frame::Video(frame),
            MockFrame::Audio(frame) => Frame::Audio(frame),
        }
    }
}

impl Decoder for MockDecoder {
    fn stream_format(&self) -> StreamFormat {
        self.format
    }

    fn decode(&mut self, input: PacketTail<'_>) -> Result<Decoded<'_>> {
        let data = input.data();
        let step = self.script.pop_front().unwrap_or(self.fallback);
        let (consumed, frame, odd) = match step {
            Step::Take { bytes, frame } => (bytes, frame, false),
            Step::Whole | Step::Recovered => (data.len(), true, false),
            Step::Odd => (data.len(), true, true),
            Step::Fail => {
                self.trace.borrow_mut().calls += 1;
                return Err(Error::Decode {
                    index: 0,
                    source: ffmpeg_next::Error::InvalidData,
                });
            }
        };
        {
            let mut trace = self.trace.borrow_mut();
            trace.calls += 1;
            trace.inputs.push(data.len());
            trace.consumed.push(consumed);
        }
        let earlier_error = matches!(step, Step::Recovered).then(|| Error::Decode {
            index: 0,
            source: ffmpeg_next::Error::InvalidData,
        });
        let frame = if frame { Some(self.frame(odd)) } else { None };
        Ok(Decoded {
            consumed,
            frame,
            earlier_error,
        })
    }

    fn flush(&mut self) -> Result<Option<Frame<'_>>> {
        if self.buffered == 0 {
            return Ok(None);
        }
        self.buffered -= 1;
        self.trace.borrow_mut().flushed += 1;
        Ok(Some(self.frame(false)))
    }
}

impl Drop for MockDecoder {
    fn drop(&mut self) {
        if let Some((log, name)) = &self.drop_log {
            log.record(name.clone());
        }
    }
}

pub struct MockContainer {
    streams: Vec<(usize, MediaKind)>,
    decoders: RefCell<HashMap<usize, MockDecoder>>,
    open_errors: HashMap<usize, fn() -> Error>,
    packets: VecDeque<Result<RawPacket>>,
    drop_log: Option<DropLog>,
}

impl MockContainer {
    pub fn new() -> Self {
        Self {
            streams: Vec::new(),
            decoders: RefCell::default(),
            open_errors: HashMap::new(),
            packets: VecDeque::new(),
            drop_log: None,
        }
    }

    pub fn with_stream(mut self, index: usize, decoder: MockDecoder) -> Self {
        self.streams.push((index, decoder.format.kind()));
        self.decoders.get_mut().insert(index, decoder);
        self
    }

    pub fn with_open_error(mut self, index: usize, error: fn() -> Error) -> Self {
        self.open_errors.insert(index, error);
        self
    }

    pub fn packet(mut self, index: usize, data: &[u8]) -> Self {
        self.packets.push_back(Ok(RawPacket::new(index, data)));
        self
    }

    /// `count` packets of `size` bytes for stream `index`.
    pub fn packets(mut self, index: usize, count: usize, size: usize) -> Self {
        for n in 0..count {
            let data = vec![n as u8; size];
            self.packets.push_back(Ok(RawPacket::new(index, &data)));
        }
        self
    }

    pub fn read_error(mut self) -> Self {
        self.packets
            .push_back(Err(Error::Read(ffmpeg_next::Error::InvalidData)));
        self
    }

    pub fn logged(mut self, log: &DropLog) -> Self {
        self.drop_log = Some(log.clone());
        self
    }
}

impl Container for MockContainer {
    fn best_stream(&self, kind: MediaKind) -> Option<usize> {
        self.streams
            .iter()
            .find(|(_, k)| *k == kind)
            .map(|(index, _)| *index)
    }

    fn open_decoder(&self, index: usize) -> Result<Box<dyn Decoder>> {
        if let Some(error) = self.open_errors.get(&index) {
            return Err(error());
        }
        self.decoders
            .borrow_mut()
            .remove(&index)
            .map(|decoder| Box::new(decoder) as Box<dyn Decoder>)
            .ok_or_else(|| Error::DecoderInitFailed {
                index,
                reason: "no such stream".to_string(),
            })
    }

    fn read_packet(&mut self) -> Result<Option<RawPacket>> {
        self.packets.pop_front().transpose()
    }
}

impl Drop for MockContainer {
    fn drop(&mut self) {
        if let Some(log) = &self.drop_log {
            log.record("container");
        }
    }
}

/// Hands out one prepared container; fails to open once it is gone.
pub struct MockOpener {
    container: RefCell<Option<MockContainer>>,
}

impl MockOpener {
    pub fn new(container: MockContainer) -> Self {
        Self {
            container: RefCell::new(Some(container)),
        }
    }

    pub fn failing() -> Self {
        Self {
            container: RefCell::new(None),
        }
    }
}

impl ContainerOpener for MockOpener {
    type Container = MockContainer;

    fn open(&self, path: &Path) -> Result<MockContainer> {
        self.container
            .borrow_mut()
            .take()
            .ok_or_else(|| Error::OpenInput {
                path: path.to_path_buf(),
                source: ffmpeg_next::Error::InvalidData,
            })
    }
}

/// Memory-backed sinks, one per kind, with optional open or write failures.
#[derive(Default)]
pub struct MockSinks {
    outputs: HashMap<MediaKind, MemorySink>,
    fail_open: Option<MediaKind>,
    fail_write: Option<MediaKind>,
    drop_log: Option<DropLog>,
}

impl MockSinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_open(mut self, kind: MediaKind) -> Self {
        self.fail_open = Some(kind);
        self
    }

    pub fn fail_write(mut self, kind: MediaKind) -> Self {
        self.fail_write = Some(kind);
        self
    }

    pub fn logged(mut self, log: &DropLog) -> Self {
        self.drop_log = Some(log.clone());
        self
    }

    /// The buffer behind the sink for `kind`, whether or not it was opened.
    pub fn output(&mut self, kind: MediaKind) -> MemorySink {
        self.outputs.entry(kind).or_default().clone()
    }
}

impl SinkOpener for MockSinks {
    fn open(&self, kind: MediaKind) -> Result<Box<dyn FrameSink>> {
        if self.fail_open == Some(kind) {
            return Err(Error::OpenOutput {
                kind,
                path: PathBuf::from(kind.as_str()),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        let inner = if self.fail_write == Some(kind) {
            None
        } else {
            Some(self.outputs.get(&kind).cloned().unwrap_or_default())
        };
        Ok(Box::new(ScriptedSink {
            name: format!("{} sink", kind),
            inner,
            drop_log: self.drop_log.clone(),
        }))
    }
}

/// A memory sink, or one whose writes always fail when `inner` is `None`.
pub struct ScriptedSink {
    name: String,
    inner: Option<MemorySink>,
    drop_log: Option<DropLog>,
}

impl FrameSink for ScriptedSink {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match &mut self.inner {
            Some(sink) => sink.write(bytes),
            None => Err(std::io::Error::other("disk full")),
        }
    }
}

impl Drop for ScriptedSink {
    fn drop(&mut self) {
        if let Some(log) = &self.drop_log {
            log.record(self.name.clone());
        }
    }
}
