// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Capability templates and fixed caps parsing.
//!
//! Templates advertise what the bridge accepts (allow-listed formats with
//! open ranges). Fixed caps arrive once negotiation is done and describe a
//! single concrete stream.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::format::{AudioFormat, MediaFormat, VideoFormat};

pub const RAW_VIDEO_MEDIA_TYPE: &str = "video/x-raw";
pub const RAW_AUDIO_MEDIA_TYPE: &str = "audio/x-raw";
pub const H264_MEDIA_TYPE: &str = "video/x-h264";

const INT_RANGE: &str = "[ 1, 2147483647 ]";
const FPS_RANGE: &str = "[ 0/1, 2147483647/1 ]";

fn format_list(names: impl Iterator<Item = &'static str>) -> String {
    format!("{{ {} }}", names.collect::<Vec<_>>().join(", "))
}

/// Raw video accepted by image adapters.
pub fn raw_video_template() -> String {
    format!(
        "{}, format = (string) {}, framerate = (fraction) {}, width = (int) {}, height = (int) {}",
        RAW_VIDEO_MEDIA_TYPE,
        format_list(VideoFormat::ALLOWED.into_iter().map(VideoFormat::pipeline_name)),
        FPS_RANGE,
        INT_RANGE,
        INT_RANGE
    )
}

/// Raw interleaved audio accepted by audio adapters.
pub fn raw_audio_template() -> String {
    format!(
        "{}, format = (string) {}, rate = (int) {}, channels = (int) {}, layout = (string) interleaved",
        RAW_AUDIO_MEDIA_TYPE,
        format_list(AudioFormat::ALLOWED.into_iter().map(AudioFormat::pipeline_name)),
        INT_RANGE,
        INT_RANGE
    )
}

/// Compressed H.264 carried through without re-encoding.
pub fn h264_template() -> String {
    format!(
        "{}, width = (int) {}, height = (int) {}, framerate = (fraction) {}, \
         stream-format = (string) byte-stream, alignment = (string) nal, profile = (string) {}",
        H264_MEDIA_TYPE,
        INT_RANGE,
        INT_RANGE,
        FPS_RANGE,
        format_list(H264Profile::ALL.into_iter().map(H264Profile::name))
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fraction {
    pub numer: i32,
    pub denom: i32,
}

impl Fraction {
    pub fn new(numer: i32, denom: i32) -> Self {
        Self { numer, denom }
    }

    fn parse(value: &str) -> Result<Self> {
        let (numer, denom) = value.split_once('/').unwrap_or((value, "1"));
        let numer = parse_int(numer.trim(), "framerate")?;
        let denom = parse_int(denom.trim(), "framerate")?;
        if numer < 0 || denom <= 0 {
            return Err(BridgeError::Caps(format!("framerate {} out of range", value)));
        }
        Ok(Self { numer, denom })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum H264Profile {
    ConstrainedBaseline,
    Baseline,
    Main,
    High,
}

impl H264Profile {
    pub const ALL: [H264Profile; 4] = [
        H264Profile::ConstrainedBaseline,
        H264Profile::Baseline,
        H264Profile::Main,
        H264Profile::High,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ConstrainedBaseline => "constrained-baseline",
            Self::Baseline => "baseline",
            Self::Main => "main",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub format: VideoFormat,
    pub width: u32,
    pub height: u32,
    pub framerate: Fraction,
}

impl VideoInfo {
    /// Row stride in bytes, rounded up to 4 bytes like the pipeline's
    /// default packed-plane layout. `None` when a row does not fit in `u32`.
    pub fn stride(&self) -> Option<u32> {
        let row = self
            .width
            .checked_mul(self.format.bytes_per_pixel().unwrap_or(1))?;
        row.div_ceil(4).checked_mul(4)
    }

    pub fn frame_size(&self) -> Option<usize> {
        (self.stride()? as usize).checked_mul(self.height as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioInfo {
    pub format: AudioFormat,
    pub rate: u32,
    pub channels: u32,
}

impl AudioInfo {
    /// Size of one interleaved frame (one sample per channel).
    pub fn bytes_per_frame(&self) -> Option<u32> {
        self.format.sample_width().checked_mul(self.channels)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct H264Info {
    pub profile: H264Profile,
    pub width: u32,
    pub height: u32,
    pub framerate: Fraction,
}

/// Fixed, fully negotiated caps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Caps {
    Video(VideoInfo),
    Audio(AudioInfo),
    H264(H264Info),
}

impl Caps {
    /// Parse a fixed caps string such as
    /// `video/x-raw, format=(string)GRAY8, width=(int)640, height=(int)480, framerate=(fraction)30/1`.
    ///
    /// Structural problems are `Caps` errors; well-formed caps describing a
    /// format outside the allow-list are `FormatUnsupported`.
    pub fn parse(caps: &str) -> Result<Self> {
        let mut parts = caps.split(',').map(str::trim);
        let media_type = parts
            .next()
            .filter(|media_type| !media_type.is_empty())
            .ok_or_else(|| BridgeError::Caps("empty caps".to_string()))?;

        let mut fields = Vec::new();
        for part in parts.filter(|part| !part.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| BridgeError::Caps(format!("field without value: {:?}", part)))?;
            fields.push((key.trim(), strip_type_and_quotes(value.trim())));
        }
        let field = |name: &str| fields.iter().find(|(key, _)| *key == name).map(|(_, v)| *v);
        let required = |name: &str| {
            field(name).ok_or_else(|| BridgeError::Caps(format!("{} missing {}", media_type, name)))
        };

        match media_type {
            RAW_VIDEO_MEDIA_TYPE => {
                let format_name = required("format")?;
                let format = VideoFormat::from_pipeline_name(format_name)
                    .filter(|f| f.is_allowed())
                    .ok_or_else(|| BridgeError::FormatUnsupported(format_name.to_string()))?;
                Ok(Caps::Video(VideoInfo {
                    format,
                    width: parse_dimension(required("width")?, "width")?,
                    height: parse_dimension(required("height")?, "height")?,
                    framerate: Fraction::parse(required("framerate")?)?,
                }))
            }
            RAW_AUDIO_MEDIA_TYPE => {
                let format_name = required("format")?;
                let format = AudioFormat::from_pipeline_name(format_name)
                    .filter(|f| f.is_allowed())
                    .ok_or_else(|| BridgeError::FormatUnsupported(format_name.to_string()))?;
                if let Some(layout) = field("layout").filter(|layout| *layout != "interleaved") {
                    return Err(BridgeError::FormatUnsupported(format!("{} audio layout", layout)));
                }
                Ok(Caps::Audio(AudioInfo {
                    format,
                    rate: parse_dimension(required("rate")?, "rate")?,
                    channels: parse_dimension(required("channels")?, "channels")?,
                }))
            }
            H264_MEDIA_TYPE => {
                let profile_name = required("profile")?;
                let profile = H264Profile::ALL
                    .into_iter()
                    .find(|p| p.name() == profile_name)
                    .ok_or_else(|| {
                        BridgeError::FormatUnsupported(format!("h264 profile {}", profile_name))
                    })?;
                if let Some(stream_format) =
                    field("stream-format").filter(|value| *value != "byte-stream")
                {
                    return Err(BridgeError::FormatUnsupported(format!(
                        "h264 stream-format {}",
                        stream_format
                    )));
                }
                if let Some(alignment) = field("alignment").filter(|value| *value != "nal") {
                    return Err(BridgeError::FormatUnsupported(format!(
                        "h264 alignment {}",
                        alignment
                    )));
                }
                Ok(Caps::H264(H264Info {
                    profile,
                    width: parse_dimension(required("width")?, "width")?,
                    height: parse_dimension(required("height")?, "height")?,
                    framerate: Fraction::parse(required("framerate")?)?,
                }))
            }
            other => Err(BridgeError::FormatUnsupported(format!("media type {}", other))),
        }
    }

    pub fn media_format(&self) -> MediaFormat {
        match self {
            Caps::Video(info) => MediaFormat::Video(info.format),
            Caps::Audio(info) => MediaFormat::Audio(info.format),
            Caps::H264(_) => MediaFormat::H264,
        }
    }
}

impl std::fmt::Display for Caps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Caps::Video(info) => write!(
                f,
                "{}, format=(string){}, width=(int){}, height=(int){}, framerate=(fraction){}/{}",
                RAW_VIDEO_MEDIA_TYPE,
                info.format.pipeline_name(),
                info.width,
                info.height,
                info.framerate.numer,
                info.framerate.denom
            ),
            Caps::Audio(info) => write!(
                f,
                "{}, format=(string){}, rate=(int){}, channels=(int){}, layout=(string)interleaved",
                RAW_AUDIO_MEDIA_TYPE,
                info.format.pipeline_name(),
                info.rate,
                info.channels
            ),
            Caps::H264(info) => write!(
                f,
                "{}, width=(int){}, height=(int){}, framerate=(fraction){}/{}, \
                 stream-format=(string)byte-stream, alignment=(string)nal, profile=(string){}",
                H264_MEDIA_TYPE,
                info.width,
                info.height,
                info.framerate.numer,
                info.framerate.denom,
                info.profile.name()
            ),
        }
    }
}

fn strip_type_and_quotes(value: &str) -> &str {
    let value = match value.strip_prefix('(') {
        Some(rest) => rest.split_once(')').map_or(value, |(_, v)| v.trim()),
        None => value,
    };
    value.trim_matches('"')
}

fn parse_int(value: &str, field: &str) -> Result<i32> {
    value
        .parse::<i32>()
        .map_err(|e| BridgeError::Caps(format!("{} {:?}: {}", field, value, e)))
}

fn parse_dimension(value: &str, field: &str) -> Result<u32> {
    let parsed = parse_int(value, field)?;
    u32::try_from(parsed)
        .ok()
        .filter(|v| *v >= 1)
        .ok_or_else(|| BridgeError::Caps(format!("{} {} out of range", field, parsed)))
}
