use crate::{
    error::{Error, Result},
    input::Container,
    stream::{MediaKind, StreamDescriptor, StreamFormat},
};

/// Picks the container's best stream of `kind` and opens its decoder.
///
/// The returned descriptor owns the decoder; dropping it closes the decoder.
pub fn select<C: Container + ?Sized>(container: &C, kind: MediaKind) -> Result<StreamDescriptor> {
    let index = container
        .best_stream(kind)
        .ok_or(Error::NoStreamFound(kind))?;
    let decoder = container.open_decoder(index)?;

    let found = decoder.stream_format().kind();
    if found != kind {
        return Err(Error::DecoderInitFailed {
            index,
            reason: format!("expected a {} stream, got {}", kind, found),
        });
    }

    let stream = StreamDescriptor::new(index, decoder);
    log::info!("selected {} stream {}: {}", kind, index, describe(&stream));
    Ok(stream)
}

fn describe(stream: &StreamDescriptor) -> String {
    match stream.format() {
        StreamFormat::Video(layout) => layout.to_string(),
        StreamFormat::Audio(format) => format.to_string(),
    }
}
