// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::translate::BusTime;

/// Audio sample layout code for interleaved channels.
pub const AUDIO_LAYOUT_INTERLEAVED: u8 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub stamp: BusTime,
    pub frame_id: String,
}

/// Uncompressed image, one message per video buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMessage {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    pub encoding: String,
    pub is_bigendian: bool,
    /// Row length in bytes.
    pub step: u32,
    pub data: Bytes,
}

/// Interleaved PCM audio, one message per audio buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMessage {
    pub header: Header,
    pub frames: u32,
    pub channels: u32,
    pub sample_rate: u32,
    pub encoding: String,
    pub is_bigendian: bool,
    pub layout: u8,
    /// Bytes per interleaved frame.
    pub step: u32,
    pub data: Bytes,
}

/// Opaque compressed payload (e.g. H.264 byte-stream NAL units).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressedImageMessage {
    pub header: Header,
    pub format: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMessage {
    Image(ImageMessage),
    Audio(AudioMessage),
    CompressedImage(CompressedImageMessage),
}

impl BusMessage {
    pub fn header(&self) -> &Header {
        match self {
            BusMessage::Image(msg) => &msg.header,
            BusMessage::Audio(msg) => &msg.header,
            BusMessage::CompressedImage(msg) => &msg.header,
        }
    }

    pub fn payload(&self) -> &Bytes {
        match self {
            BusMessage::Image(msg) => &msg.data,
            BusMessage::Audio(msg) => &msg.data,
            BusMessage::CompressedImage(msg) => &msg.data,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BusMessage::Image(_) => "image",
            BusMessage::Audio(_) => "audio",
            BusMessage::CompressedImage(_) => "compressed_image",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clocks::ClockType;

    #[test]
    fn test_serializes_with_type_tag() {
        let message = BusMessage::CompressedImage(CompressedImageMessage {
            header: Header {
                stamp: BusTime::new(5800, ClockType::RosTime),
                frame_id: "camera".to_string(),
            },
            format: "h264".to_string(),
            data: Bytes::from_static(&[0, 0, 0, 1]),
        });

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "compressed_image");
        assert_eq!(json["header"]["stamp"]["nanos"], 5800);

        let back: BusMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, message);
        assert_eq!(back.kind(), "compressed_image");
        assert_eq!(back.payload().len(), 4);
    }
}
