// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Mapping between pipeline media formats and bus encoding identifiers.
//!
//! Only an explicit allow-list of well-behaved formats is mapped. Everything
//! else is rejected with `FormatUnsupported`; there is no best-guess mapping.
//!
//! Excluded on purpose:
//! - big-endian layouts (need endian conversion on common platforms)
//! - packed sub-byte / 24-bit-in-32 audio layouts (odd packing, unverified)
//! - planar and subsampled video layouts

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoFormat {
    Gray8,
    Gray16Le,
    Gray16Be,
    Rgb,
    Bgr,
    Rgba,
    Bgra,
    Argb,
    Abgr,
    Rgbx,
    Bgrx,
    Rgb16,
    I420,
    Nv12,
    Yuy2,
    Uyvy,
}

impl VideoFormat {
    /// Formats that round-trip through the bus bit-exact.
    pub const ALLOWED: [VideoFormat; 6] = [
        VideoFormat::Gray8,
        VideoFormat::Gray16Le,
        VideoFormat::Rgb,
        VideoFormat::Bgr,
        VideoFormat::Rgba,
        VideoFormat::Bgra,
    ];

    const ALL: [VideoFormat; 16] = [
        VideoFormat::Gray8,
        VideoFormat::Gray16Le,
        VideoFormat::Gray16Be,
        VideoFormat::Rgb,
        VideoFormat::Bgr,
        VideoFormat::Rgba,
        VideoFormat::Bgra,
        VideoFormat::Argb,
        VideoFormat::Abgr,
        VideoFormat::Rgbx,
        VideoFormat::Bgrx,
        VideoFormat::Rgb16,
        VideoFormat::I420,
        VideoFormat::Nv12,
        VideoFormat::Yuy2,
        VideoFormat::Uyvy,
    ];

    /// Name used in pipeline caps strings.
    pub fn pipeline_name(self) -> &'static str {
        match self {
            Self::Gray8 => "GRAY8",
            Self::Gray16Le => "GRAY16_LE",
            Self::Gray16Be => "GRAY16_BE",
            Self::Rgb => "RGB",
            Self::Bgr => "BGR",
            Self::Rgba => "RGBA",
            Self::Bgra => "BGRA",
            Self::Argb => "ARGB",
            Self::Abgr => "ABGR",
            Self::Rgbx => "RGBx",
            Self::Bgrx => "BGRx",
            Self::Rgb16 => "RGB16",
            Self::I420 => "I420",
            Self::Nv12 => "NV12",
            Self::Yuy2 => "YUY2",
            Self::Uyvy => "UYVY",
        }
    }

    pub fn from_pipeline_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.pipeline_name() == name)
    }

    pub fn is_allowed(self) -> bool {
        Self::ALLOWED.contains(&self)
    }

    /// Bytes per pixel for packed layouts; `None` for planar/subsampled ones.
    pub fn bytes_per_pixel(self) -> Option<u32> {
        match self {
            Self::Gray8 => Some(1),
            Self::Gray16Le | Self::Gray16Be | Self::Rgb16 | Self::Yuy2 | Self::Uyvy => Some(2),
            Self::Rgb | Self::Bgr => Some(3),
            Self::Rgba | Self::Bgra | Self::Argb | Self::Abgr | Self::Rgbx | Self::Bgrx => {
                Some(4)
            }
            Self::I420 | Self::Nv12 => None,
        }
    }

    fn bus_encoding(self) -> Option<&'static str> {
        match self {
            Self::Gray8 => Some("mono8"),
            Self::Gray16Le => Some("mono16"),
            Self::Rgb => Some("rgb8"),
            Self::Bgr => Some("bgr8"),
            Self::Rgba => Some("rgba8"),
            Self::Bgra => Some("bgra8"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioFormat {
    S8,
    U8,
    S16Le,
    S16Be,
    U16Le,
    U16Be,
    S18Le,
    S20Le,
    S24Le,
    S24_32Le,
    S32Le,
    S32Be,
    U32Le,
    U32Be,
    F32Le,
    F32Be,
    F64Le,
    F64Be,
}

impl AudioFormat {
    /// Formats that round-trip through the bus bit-exact.
    pub const ALLOWED: [AudioFormat; 8] = [
        AudioFormat::S8,
        AudioFormat::U8,
        AudioFormat::S16Le,
        AudioFormat::U16Le,
        AudioFormat::S32Le,
        AudioFormat::U32Le,
        AudioFormat::F32Le,
        AudioFormat::F64Le,
    ];

    const ALL: [AudioFormat; 18] = [
        AudioFormat::S8,
        AudioFormat::U8,
        AudioFormat::S16Le,
        AudioFormat::S16Be,
        AudioFormat::U16Le,
        AudioFormat::U16Be,
        AudioFormat::S18Le,
        AudioFormat::S20Le,
        AudioFormat::S24Le,
        AudioFormat::S24_32Le,
        AudioFormat::S32Le,
        AudioFormat::S32Be,
        AudioFormat::U32Le,
        AudioFormat::U32Be,
        AudioFormat::F32Le,
        AudioFormat::F32Be,
        AudioFormat::F64Le,
        AudioFormat::F64Be,
    ];

    pub fn pipeline_name(self) -> &'static str {
        match self {
            Self::S8 => "S8",
            Self::U8 => "U8",
            Self::S16Le => "S16LE",
            Self::S16Be => "S16BE",
            Self::U16Le => "U16LE",
            Self::U16Be => "U16BE",
            Self::S18Le => "S18LE",
            Self::S20Le => "S20LE",
            Self::S24Le => "S24LE",
            Self::S24_32Le => "S24_32LE",
            Self::S32Le => "S32LE",
            Self::S32Be => "S32BE",
            Self::U32Le => "U32LE",
            Self::U32Be => "U32BE",
            Self::F32Le => "F32LE",
            Self::F32Be => "F32BE",
            Self::F64Le => "F64LE",
            Self::F64Be => "F64BE",
        }
    }

    pub fn from_pipeline_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.pipeline_name() == name)
    }

    pub fn is_allowed(self) -> bool {
        Self::ALLOWED.contains(&self)
    }

    /// Storage width of one sample in bytes.
    pub fn sample_width(self) -> u32 {
        match self {
            Self::S8 | Self::U8 => 1,
            Self::S16Le | Self::S16Be | Self::U16Le | Self::U16Be => 2,
            Self::S18Le | Self::S20Le | Self::S24Le => 3,
            Self::S24_32Le
            | Self::S32Le
            | Self::S32Be
            | Self::U32Le
            | Self::U32Be
            | Self::F32Le
            | Self::F32Be => 4,
            Self::F64Le | Self::F64Be => 8,
        }
    }

    pub fn is_big_endian(self) -> bool {
        matches!(
            self,
            Self::S16Be | Self::U16Be | Self::S32Be | Self::U32Be | Self::F32Be | Self::F64Be
        )
    }
}

/// Pixel or sample layout of a negotiated stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaFormat {
    Video(VideoFormat),
    Audio(AudioFormat),
    /// Compressed H.264 byte-stream, carried opaquely.
    H264,
}

impl MediaFormat {
    pub fn is_allowed(self) -> bool {
        match self {
            Self::Video(format) => format.is_allowed(),
            Self::Audio(format) => format.is_allowed(),
            Self::H264 => true,
        }
    }

    pub fn pipeline_name(self) -> &'static str {
        match self {
            Self::Video(format) => format.pipeline_name(),
            Self::Audio(format) => format.pipeline_name(),
            Self::H264 => "h264",
        }
    }
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.pipeline_name())
    }
}

/// Bus encoding identifier for an allow-listed format.
pub fn to_bus_encoding(format: MediaFormat) -> Result<&'static str> {
    let encoding = match format {
        MediaFormat::Video(video) => video.bus_encoding(),
        MediaFormat::Audio(audio) if audio.is_allowed() => Some(audio.pipeline_name()),
        MediaFormat::Audio(_) => None,
        MediaFormat::H264 => Some("h264"),
    };
    encoding.ok_or_else(|| BridgeError::FormatUnsupported(format.to_string()))
}

/// Inverse of [`to_bus_encoding`].
pub fn from_bus_encoding(encoding: &str) -> Result<MediaFormat> {
    let video = VideoFormat::ALLOWED
        .into_iter()
        .find(|f| f.bus_encoding() == Some(encoding))
        .map(MediaFormat::Video);
    let audio = AudioFormat::ALLOWED
        .into_iter()
        .find(|f| f.pipeline_name() == encoding)
        .map(MediaFormat::Audio);
    let compressed = (encoding == "h264").then_some(MediaFormat::H264);

    video
        .or(audio)
        .or(compressed)
        .ok_or_else(|| BridgeError::FormatUnsupported(format!("bus encoding {:?}", encoding)))
}

/// Candidates that survive the allow-list, in their original order.
pub fn filter_allowed(candidates: &[MediaFormat]) -> Vec<MediaFormat> {
    candidates.iter().copied().filter(|f| f.is_allowed()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed_formats() -> Vec<MediaFormat> {
        VideoFormat::ALLOWED
            .into_iter()
            .map(MediaFormat::Video)
            .chain(AudioFormat::ALLOWED.into_iter().map(MediaFormat::Audio))
            .chain(std::iter::once(MediaFormat::H264))
            .collect()
    }

    #[test]
    fn test_allowed_formats_round_trip() {
        for format in allowed_formats() {
            let encoding = to_bus_encoding(format).unwrap();
            assert_eq!(from_bus_encoding(encoding).unwrap(), format, "{}", encoding);
        }
    }

    #[test]
    fn test_disallowed_formats_rejected() {
        for video in VideoFormat::ALL.into_iter().filter(|f| !f.is_allowed()) {
            let err = to_bus_encoding(MediaFormat::Video(video)).unwrap_err();
            assert!(matches!(err, BridgeError::FormatUnsupported(_)), "{:?}", video);
        }
        for audio in AudioFormat::ALL.into_iter().filter(|f| !f.is_allowed()) {
            let err = to_bus_encoding(MediaFormat::Audio(audio)).unwrap_err();
            assert!(matches!(err, BridgeError::FormatUnsupported(_)), "{:?}", audio);
        }
    }

    #[test]
    fn test_allow_list_sizes() {
        assert_eq!(VideoFormat::ALL.iter().filter(|f| f.is_allowed()).count(), 6);
        assert_eq!(AudioFormat::ALL.iter().filter(|f| f.is_allowed()).count(), 8);
        assert!(AudioFormat::ALLOWED.iter().all(|f| !f.is_big_endian()));
    }

    #[test]
    fn test_unknown_bus_encoding() {
        assert!(from_bus_encoding("yuv422").is_err());
        assert!(from_bus_encoding("S16BE").is_err());
        assert!(from_bus_encoding("").is_err());
    }

    #[test]
    fn test_pipeline_names() {
        for format in VideoFormat::ALL {
            assert_eq!(VideoFormat::from_pipeline_name(format.pipeline_name()), Some(format));
        }
        for format in AudioFormat::ALL {
            assert_eq!(AudioFormat::from_pipeline_name(format.pipeline_name()), Some(format));
        }
        assert_eq!(VideoFormat::from_pipeline_name("gray8"), None);
    }

    #[test]
    fn test_filter_keeps_order() {
        let candidates = [
            MediaFormat::Video(VideoFormat::Yuy2),
            MediaFormat::Video(VideoFormat::Bgra),
            MediaFormat::Audio(AudioFormat::S24_32Le),
            MediaFormat::Video(VideoFormat::Gray8),
        ];
        assert_eq!(
            filter_allowed(&candidates),
            vec![
                MediaFormat::Video(VideoFormat::Bgra),
                MediaFormat::Video(VideoFormat::Gray8)
            ]
        );
    }
}
