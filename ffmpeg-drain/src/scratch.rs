use std::os::raw::c_int;

use ffmpeg_next::ffi;

use crate::{
    error::{Error, Result},
    stream::ImageLayout,
};

/// Packed image buffer reused for every video frame of a run.
///
/// Sized once from the stream layout with 1-byte row alignment; the size
/// never changes afterwards.
pub struct ScratchImage {
    layout: ImageLayout,
    buf: Vec<u8>,
}

impl ScratchImage {
    pub fn new(layout: ImageLayout) -> Result<Self> {
        let size = unsafe {
            ffi::av_image_get_buffer_size(
                layout.format.into(),
                layout.width as c_int,
                layout.height as c_int,
                1,
            )
        };
        if size <= 0 {
            return Err(Error::InvalidLayout(layout.to_string()));
        }
        log::debug!("allocated {} byte scratch image for {}", size, layout);
        Ok(Self {
            layout,
            buf: vec![0; size as usize],
        })
    }

    pub fn image_size(&self) -> usize {
        self.buf.len()
    }

    /// Copies the planes of `frame` into the packed buffer, dropping row
    /// padding, and returns exactly one image.
    pub fn pack(&mut self, frame: &ffmpeg_next::frame::Video) -> Result<&[u8]> {
        let found = ImageLayout::of(frame);
        if found != self.layout {
            return Err(Error::LayoutMismatch {
                expected: self.layout.to_string(),
                found: found.to_string(),
            });
        }

        let written = unsafe {
            let ptr = frame.as_ptr();
            ffi::av_image_copy_to_buffer(
                self.buf.as_mut_ptr(),
                self.buf.len() as c_int,
                (*ptr).data.as_ptr() as *const *const u8,
                (*ptr).linesize.as_ptr(),
                self.layout.format.into(),
                self.layout.width as c_int,
                self.layout.height as c_int,
                1,
            )
        };
        if written < 0 {
            return Err(Error::LayoutMismatch {
                expected: self.layout.to_string(),
                found: format!("{} (copy failed: {})", found, written),
            });
        }
        Ok(&self.buf)
    }
}

impl Drop for ScratchImage {
    fn drop(&mut self) {
        log::debug!("releasing scratch image for {}", self.layout);
    }
}
