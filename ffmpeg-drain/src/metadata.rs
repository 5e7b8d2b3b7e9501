//! Container summary logged when a run starts (the `av_dump_format` view).

use std::fmt;

/// Format-level info.
#[derive(Debug, Clone)]
pub struct FormatInfo {
    /// Format name, e.g. "mov,mp4,m4a,3gp,3g2,mj2"
    pub format_name: String,
    /// Duration in seconds; None if unknown (e.g. raw h264).
    pub duration_sec: Option<f64>,
    /// Total bitrate in bps; 0 if unknown.
    pub bit_rate: i64,
}

/// Per-stream info.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub index: usize,
    /// "video" | "audio" | "subtitle" etc.
    pub codec_type: String,
    /// e.g. "h264", "aac"
    pub codec_name: String,
    /// e.g. "1/90000"
    pub time_base: String,
    /// Video only.
    pub size: Option<(u32, u32)>,
    /// Audio only: sample rate and channel count.
    pub audio: Option<(u32, u32)>,
}

#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub source: String,
    pub format: FormatInfo,
    pub streams: Vec<StreamInfo>,
}

impl MediaInfo {
    pub fn from_input(source: &str, input: &ffmpeg_next::format::context::Input) -> Self {
        // duration is in 1/AV_TIME_BASE seconds
        let duration_sec = {
            let d = input.duration();
            if d == ffmpeg_next::ffi::AV_NOPTS_VALUE as i64 || d <= 0 {
                None
            } else {
                Some(d as f64 / 1_000_000.0)
            }
        };

        let streams = input
            .streams()
            .map(|stream| {
                let params = stream.parameters();
                let medium = params.medium();
                let time_base = stream.time_base();
                let (size, audio) = match medium {
                    ffmpeg_next::media::Type::Video => (Some(video_size(&params)), None),
                    ffmpeg_next::media::Type::Audio => (None, Some(audio_params(&params))),
                    _ => (None, None),
                };
                StreamInfo {
                    index: stream.index(),
                    codec_type: format!("{:?}", medium).to_lowercase(),
                    codec_name: format!("{:?}", params.id()).to_lowercase(),
                    time_base: format!("{}/{}", time_base.numerator(), time_base.denominator()),
                    size,
                    audio,
                }
            })
            .collect();

        Self {
            source: source.to_string(),
            format: FormatInfo {
                format_name: input.format().name().to_string(),
                duration_sec,
                bit_rate: input.bit_rate(),
            },
            streams,
        }
    }
}

impl fmt::Display for MediaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "input '{}': {}", self.source, self.format.format_name)?;
        match self.format.duration_sec {
            Some(d) => write!(f, ", duration {:.3}s", d)?,
            None => write!(f, ", duration N/A")?,
        }
        write!(f, ", bitrate {} b/s", self.format.bit_rate)?;
        for s in &self.streams {
            write!(
                f,
                "\n  stream #{}: {} {} (tb {})",
                s.index, s.codec_type, s.codec_name, s.time_base
            )?;
            if let Some((w, h)) = s.size {
                write!(f, ", {}x{}", w, h)?;
            }
            if let Some((rate, channels)) = s.audio {
                write!(f, ", {} Hz, {} ch", rate, channels)?;
            }
        }
        Ok(())
    }
}

/// Reads video width/height from codec parameters (not exposed by ffmpeg-next).
fn video_size(params: &ffmpeg_next::codec::Parameters) -> (u32, u32) {
    unsafe {
        let ptr = params.as_ptr();
        ((*ptr).width.max(0) as u32, (*ptr).height.max(0) as u32)
    }
}

/// Reads audio sample rate and channel count from codec parameters.
fn audio_params(params: &ffmpeg_next::codec::Parameters) -> (u32, u32) {
    unsafe {
        let ptr = params.as_ptr();
        let sr = (*ptr).sample_rate;
        let ch = (*ptr).ch_layout.nb_channels;
        (sr.max(0) as u32, ch.max(0) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_streams() {
        let info = MediaInfo {
            source: "in.mp4".to_string(),
            format: FormatInfo {
                format_name: "mov,mp4".to_string(),
                duration_sec: Some(5.0),
                bit_rate: 1000,
            },
            streams: vec![
                StreamInfo {
                    index: 0,
                    codec_type: "video".to_string(),
                    codec_name: "h264".to_string(),
                    time_base: "1/90000".to_string(),
                    size: Some((320, 240)),
                    audio: None,
                },
                StreamInfo {
                    index: 1,
                    codec_type: "audio".to_string(),
                    codec_name: "aac".to_string(),
                    time_base: "1/48000".to_string(),
                    size: None,
                    audio: Some((48000, 2)),
                },
            ],
        };
        let text = info.to_string();
        assert!(text.starts_with("input 'in.mp4': mov,mp4, duration 5.000s"));
        assert!(text.contains("stream #0: video h264 (tb 1/90000), 320x240"));
        assert!(text.contains("stream #1: audio aac (tb 1/48000), 48000 Hz, 2 ch"));
    }
}
