// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use bytes::Bytes;

use crate::bus::{AudioMessage, BusMessage, Header, Publisher, AUDIO_LAYOUT_INTERLEAVED};
use crate::caps::{self, AudioInfo, Caps};
use crate::element::{AdapterRole, Buffer, EndpointContext, MediaAdapter, Query};
use crate::error::{BridgeError, Result};
use crate::format::{self, MediaFormat};
use crate::translate::BusTime;

/// Publishes interleaved PCM buffers as `AudioMessage`s, one per buffer.
#[derive(Default)]
pub struct AudioSink {
    publisher: Option<Box<dyn Publisher>>,
    frame_id: String,
    info: Option<AudioInfo>,
}

impl AudioSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MediaAdapter for AudioSink {
    fn role(&self) -> AdapterRole {
        AdapterRole::Sink
    }

    fn open(&mut self, endpoint: &EndpointContext<'_>) -> Result<()> {
        let publisher = endpoint.node.create_publisher(endpoint.topic)?;
        tracing::debug!("Audio publisher on {}", publisher.topic());
        self.publisher = Some(publisher);
        self.frame_id = endpoint.frame_id.to_string();
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.publisher = None;
        self.info = None;
        Ok(())
    }

    fn negotiate(&mut self, candidates: &[MediaFormat]) -> Option<MediaFormat> {
        candidates
            .iter()
            .copied()
            .find(|f| matches!(f, MediaFormat::Audio(_)))
    }

    fn on_format_locked(&mut self, caps: &Caps) -> Result<()> {
        match caps {
            Caps::Audio(info) if info.bytes_per_frame().is_none() => Err(
                BridgeError::FormatUnsupported(format!("{} frames are too large", caps)),
            ),
            Caps::Audio(info) => {
                self.info = Some(info.clone());
                Ok(())
            }
            _ => Err(BridgeError::FormatUnsupported(format!(
                "audio sink cannot take {}",
                caps
            ))),
        }
    }

    fn render(&mut self, buffer: &Buffer<'_>, stamp: BusTime) -> Result<()> {
        let info = self
            .info
            .as_ref()
            .ok_or_else(|| BridgeError::RenderDegraded("no audio format locked".to_string()))?;

        let bytes_per_frame = info.bytes_per_frame().unwrap_or(0);
        if bytes_per_frame == 0 || buffer.data.len() % bytes_per_frame as usize != 0 {
            return Err(BridgeError::RenderDegraded(format!(
                "{} bytes is not a whole number of {}-byte frames",
                buffer.data.len(),
                bytes_per_frame
            )));
        }
        let frames = u32::try_from(buffer.data.len() / bytes_per_frame as usize).map_err(|_| {
            BridgeError::RenderDegraded(format!("{} bytes is too large", buffer.data.len()))
        })?;

        let message = BusMessage::Audio(AudioMessage {
            header: Header {
                stamp,
                frame_id: self.frame_id.clone(),
            },
            frames,
            channels: info.channels,
            sample_rate: info.rate,
            encoding: format::to_bus_encoding(MediaFormat::Audio(info.format))?.to_string(),
            is_bigendian: info.format.is_big_endian(),
            layout: AUDIO_LAYOUT_INTERLEAVED,
            step: bytes_per_frame,
            data: Bytes::copy_from_slice(buffer.data),
        });

        let publisher = self
            .publisher
            .as_ref()
            .ok_or_else(|| BridgeError::RenderDegraded("publisher not created".to_string()))?;
        publisher.publish(message)
    }

    fn on_query(&mut self, query: &mut Query) -> bool {
        match query {
            Query::Caps { result, .. } => {
                *result = vec![caps::raw_audio_template()];
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{LocalBus, MessagingSubstrate, Subscription};
    use crate::clocks::ClockType;
    use crate::format::AudioFormat;

    fn stereo_s16(rate: u32) -> Caps {
        Caps::Audio(AudioInfo {
            format: AudioFormat::S16Le,
            rate,
            channels: 2,
        })
    }

    #[test]
    fn test_audio_message_fields() {
        let bus = LocalBus::new();
        let observer = bus.subscribe("/mic");
        let mut context = bus.create_context().unwrap();
        let node = context.create_node("mic_node", "").unwrap();

        let mut sink = AudioSink::new();
        sink.open(&EndpointContext {
            node: node.as_ref(),
            topic: "mic",
            frame_id: "mic_link",
        })
        .unwrap();
        sink.on_format_locked(&stereo_s16(48_000)).unwrap();

        // 3 frames of 2 channels x 2 bytes
        let samples = [0u8; 12];
        sink.render(&Buffer::new(&samples, Some(0)), BusTime::new(9, ClockType::SystemTime))
            .unwrap();

        let Some(BusMessage::Audio(audio)) = observer.try_next() else {
            panic!("expected an audio message");
        };
        assert_eq!(audio.frames, 3);
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.sample_rate, 48_000);
        assert_eq!(audio.encoding, "S16LE");
        assert_eq!(audio.step, 4);
        assert_eq!(audio.layout, AUDIO_LAYOUT_INTERLEAVED);
        assert!(!audio.is_bigendian);
        assert_eq!(audio.header.frame_id, "mic_link");
    }

    #[test]
    fn test_partial_frame_degrades() {
        let mut sink = AudioSink::new();
        sink.on_format_locked(&stereo_s16(44_100)).unwrap();
        let err = sink
            .render(&Buffer::new(&[0; 6], Some(0)), BusTime::new(0, ClockType::SystemTime))
            .unwrap_err();
        assert!(matches!(err, BridgeError::RenderDegraded(_)));
    }

    #[test]
    fn test_rejects_channel_count_that_overflows_frame() {
        let mut sink = AudioSink::new();
        let caps = Caps::Audio(AudioInfo {
            format: AudioFormat::F64Le,
            rate: 48_000,
            channels: 600_000_000,
        });
        assert!(matches!(
            sink.on_format_locked(&caps),
            Err(BridgeError::FormatUnsupported(_))
        ));
        let err = sink
            .render(&Buffer::new(&[0; 16], Some(0)), BusTime::new(0, ClockType::SystemTime))
            .unwrap_err();
        assert!(matches!(err, BridgeError::RenderDegraded(_)));
    }

    #[test]
    fn test_rejects_video_caps() {
        let mut sink = AudioSink::new();
        let caps = Caps::parse(
            "video/x-raw, format=(string)RGB, width=(int)2, height=(int)2, framerate=(fraction)1/1",
        )
        .unwrap();
        assert!(matches!(
            sink.on_format_locked(&caps),
            Err(BridgeError::FormatUnsupported(_))
        ));
    }
}
