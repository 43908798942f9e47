// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use bytes::Bytes;

use crate::bus::{BusMessage, CompressedImageMessage, Header, ImageMessage, Publisher};
use crate::caps::{self, Caps};
use crate::element::{AdapterRole, Buffer, EndpointContext, MediaAdapter, Query};
use crate::error::{BridgeError, Result};
use crate::format::{self, MediaFormat};
use crate::translate::BusTime;

/// Publishes raw video frames as `ImageMessage`s and H.264 byte-stream
/// buffers, untouched, as `CompressedImageMessage`s.
#[derive(Default)]
pub struct ImageSink {
    publisher: Option<Box<dyn Publisher>>,
    frame_id: String,
    caps: Option<Caps>,
}

impl ImageSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn header(&self, stamp: BusTime) -> Header {
        Header {
            stamp,
            frame_id: self.frame_id.clone(),
        }
    }

    fn build_message(&self, buffer: &Buffer<'_>, stamp: BusTime) -> Result<BusMessage> {
        match &self.caps {
            Some(Caps::Video(info)) => {
                let (Some(stride), Some(frame_size)) = (info.stride(), info.frame_size()) else {
                    return Err(BridgeError::RenderDegraded(format!(
                        "{}x{} {} frame size overflows",
                        info.width,
                        info.height,
                        info.format.pipeline_name()
                    )));
                };
                if buffer.data.len() < frame_size {
                    return Err(BridgeError::RenderDegraded(format!(
                        "buffer of {} bytes is shorter than a {}x{} {} frame ({} bytes)",
                        buffer.data.len(),
                        info.width,
                        info.height,
                        info.format.pipeline_name(),
                        frame_size
                    )));
                }
                Ok(BusMessage::Image(ImageMessage {
                    header: self.header(stamp),
                    height: info.height,
                    width: info.width,
                    encoding: format::to_bus_encoding(MediaFormat::Video(info.format))?
                        .to_string(),
                    is_bigendian: false,
                    step: stride,
                    data: Bytes::copy_from_slice(&buffer.data[..frame_size]),
                }))
            }
            Some(Caps::H264(_)) => Ok(BusMessage::CompressedImage(CompressedImageMessage {
                header: self.header(stamp),
                format: format::to_bus_encoding(MediaFormat::H264)?.to_string(),
                data: Bytes::copy_from_slice(buffer.data),
            })),
            Some(Caps::Audio(_)) | None => Err(BridgeError::RenderDegraded(
                "no image format locked".to_string(),
            )),
        }
    }
}

impl MediaAdapter for ImageSink {
    fn role(&self) -> AdapterRole {
        AdapterRole::Sink
    }

    fn open(&mut self, endpoint: &EndpointContext<'_>) -> Result<()> {
        let publisher = endpoint.node.create_publisher(endpoint.topic)?;
        tracing::debug!("Image publisher on {}", publisher.topic());
        self.publisher = Some(publisher);
        self.frame_id = endpoint.frame_id.to_string();
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.publisher = None;
        self.caps = None;
        Ok(())
    }

    fn negotiate(&mut self, candidates: &[MediaFormat]) -> Option<MediaFormat> {
        candidates
            .iter()
            .copied()
            .find(|f| matches!(f, MediaFormat::Video(_) | MediaFormat::H264))
    }

    fn on_format_locked(&mut self, caps: &Caps) -> Result<()> {
        match caps {
            Caps::Video(info) if info.frame_size().is_none() => Err(
                BridgeError::FormatUnsupported(format!("{} frames are too large", caps)),
            ),
            Caps::Video(_) | Caps::H264(_) => {
                self.caps = Some(caps.clone());
                Ok(())
            }
            Caps::Audio(_) => Err(BridgeError::FormatUnsupported(format!(
                "image sink cannot take {}",
                caps
            ))),
        }
    }

    fn render(&mut self, buffer: &Buffer<'_>, stamp: BusTime) -> Result<()> {
        let message = self.build_message(buffer, stamp)?;
        let publisher = self
            .publisher
            .as_ref()
            .ok_or_else(|| BridgeError::RenderDegraded("publisher not created".to_string()))?;
        publisher.publish(message)
    }

    fn on_query(&mut self, query: &mut Query) -> bool {
        match query {
            Query::Caps { result, .. } => {
                *result = vec![caps::raw_video_template(), caps::h264_template()];
                true
            }
            _ => false,
        }
    }
}
