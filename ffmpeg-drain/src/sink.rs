use std::{
    cell::RefCell,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    rc::Rc,
};

use bytes::{Bytes, BytesMut};

use crate::{
    error::{Error, Result},
    stream::MediaKind,
};

/// Destination for raw decoded bytes.
pub trait FrameSink {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()>;

    /// Flushes anything still buffered. Called once after a successful drain.
    fn finish(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Opens the sink for each configured media kind.
pub trait SinkOpener {
    fn open(&self, kind: MediaKind) -> Result<Box<dyn FrameSink>>;

    /// File the sink for `kind` writes to, when it is a file.
    fn location(&self, _kind: MediaKind) -> Option<&Path> {
        None
    }
}

/// Buffered raw output file, truncated on open.
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }
}

impl FrameSink for FileSink {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(bytes)
    }

    fn finish(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        log::debug!("closing output {}", self.path.display());
    }
}

/// Opens one [`FileSink`] per kind at the configured paths.
#[derive(Debug, Clone)]
pub struct FileSinkOpener {
    video: PathBuf,
    audio: PathBuf,
}

impl FileSinkOpener {
    pub fn new(video: impl Into<PathBuf>, audio: impl Into<PathBuf>) -> Self {
        Self {
            video: video.into(),
            audio: audio.into(),
        }
    }

    pub fn path(&self, kind: MediaKind) -> &Path {
        match kind {
            MediaKind::Video => &self.video,
            MediaKind::Audio => &self.audio,
        }
    }
}

impl SinkOpener for FileSinkOpener {
    fn open(&self, kind: MediaKind) -> Result<Box<dyn FrameSink>> {
        let path = self.path(kind);
        let sink = FileSink::create(path).map_err(|source| Error::OpenOutput {
            kind,
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("opened {} output {}", kind, path.display());
        Ok(Box::new(sink))
    }

    fn location(&self, kind: MediaKind) -> Option<&Path> {
        Some(self.path(kind))
    }
}

/// In-memory sink. Clones share the same buffer, so a clone kept by the
/// caller can read what the pipeline wrote.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buf: Rc<RefCell<BytesMut>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contents(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buf.borrow())
    }
}

impl FrameSink for MemorySink {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.buf.borrow_mut().extend_from_slice(bytes);
        Ok(())
    }
}

/// Open sinks keyed by media kind. Dropped in reverse opening order.
#[derive(Default)]
pub struct SinkSet {
    entries: Vec<(MediaKind, Box<dyn FrameSink>)>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_all<O: SinkOpener + ?Sized>(opener: &O, kinds: &[MediaKind]) -> Result<Self> {
        let mut sinks = Self::new();
        for &kind in kinds {
            // on failure `sinks` drops here, closing what was already opened
            let sink = opener.open(kind)?;
            sinks.push(kind, sink);
        }
        Ok(sinks)
    }

    pub fn push(&mut self, kind: MediaKind, sink: Box<dyn FrameSink>) {
        self.entries.push((kind, sink));
    }

    pub fn get_mut(&mut self, kind: MediaKind) -> Option<&mut (dyn FrameSink + 'static)> {
        self.entries
            .iter_mut()
            .find(|(k, _)| *k == kind)
            .map(|(_, sink)| sink.as_mut())
    }

    pub fn finish_all(&mut self) -> Result<()> {
        for (kind, sink) in self.entries.iter_mut() {
            sink.finish()
                .map_err(|source| Error::Write { kind: *kind, source })?;
        }
        Ok(())
    }
}

impl Drop for SinkSet {
    fn drop(&mut self) {
        while let Some((kind, sink)) = self.entries.pop() {
            log::debug!("releasing {} sink", kind);
            drop(sink);
        }
    }
}
