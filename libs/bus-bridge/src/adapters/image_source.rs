// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::time::Duration;

use crate::bus::{BusMessage, Subscription};
use crate::caps::{self, Caps};
use crate::element::{
    AdapterRole, EndpointContext, MediaAdapter, OwnedBuffer, Produced, Query,
};
use crate::error::{BridgeError, Result};
use crate::format::{self, MediaFormat};

const DEFAULT_WAIT: Duration = Duration::from_millis(100);

/// Turns image messages from the bus back into pipeline buffers.
///
/// The payload is handed over as-is; the element rewrites the bus stamp
/// into a pipeline PTS. The first message received fixes the format this
/// source offers during negotiation.
pub struct ImageSource {
    subscription: Option<Box<dyn Subscription>>,
    wait: Duration,
    received: Option<MediaFormat>,
    caps: Option<Caps>,
}

impl ImageSource {
    pub fn new() -> Self {
        Self::with_wait(DEFAULT_WAIT)
    }

    /// Source that blocks at most `wait` per `produce` call.
    pub fn with_wait(wait: Duration) -> Self {
        Self {
            subscription: None,
            wait,
            received: None,
            caps: None,
        }
    }

    /// Format of the first message received, if any.
    pub fn received_format(&self) -> Option<MediaFormat> {
        self.received
    }

    /// Format carried by one message. A message the stream cannot use costs
    /// only that message, so every failure here is a degradation.
    fn message_format(message: &BusMessage) -> Result<MediaFormat> {
        let (encoding, format) = match message {
            BusMessage::Image(image) => (&image.encoding, format::from_bus_encoding(&image.encoding)),
            BusMessage::CompressedImage(compressed) => {
                (&compressed.format, format::from_bus_encoding(&compressed.format))
            }
            BusMessage::Audio(_) => {
                return Err(BridgeError::RenderDegraded(
                    "audio message on an image topic".to_string(),
                ));
            }
        };
        match format {
            Ok(format @ (MediaFormat::Video(_) | MediaFormat::H264)) => Ok(format),
            Ok(_) | Err(_) => Err(BridgeError::RenderDegraded(format!(
                "image message with unusable encoding {:?}",
                encoding
            ))),
        }
    }
}

impl Default for ImageSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaAdapter for ImageSource {
    fn role(&self) -> AdapterRole {
        AdapterRole::Source
    }

    fn open(&mut self, endpoint: &EndpointContext<'_>) -> Result<()> {
        let subscription = endpoint.node.create_subscription(endpoint.topic)?;
        tracing::debug!("Image subscription on {}", subscription.topic());
        self.subscription = Some(subscription);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.subscription = None;
        self.caps = None;
        Ok(())
    }

    fn negotiate(&mut self, candidates: &[MediaFormat]) -> Option<MediaFormat> {
        match self.received {
            Some(received) => candidates.iter().copied().find(|f| *f == received),
            None => candidates
                .iter()
                .copied()
                .find(|f| matches!(f, MediaFormat::Video(_) | MediaFormat::H264)),
        }
    }

    fn on_format_locked(&mut self, caps: &Caps) -> Result<()> {
        match caps {
            Caps::Video(_) | Caps::H264(_) => {
                self.caps = Some(caps.clone());
                Ok(())
            }
            Caps::Audio(_) => Err(BridgeError::FormatUnsupported(format!(
                "image source cannot produce {}",
                caps
            ))),
        }
    }

    fn produce(&mut self) -> Result<Produced> {
        let subscription = self
            .subscription
            .as_ref()
            .ok_or_else(|| BridgeError::RenderDegraded("subscription not created".to_string()))?;
        let Some(message) = subscription.next_timeout(self.wait) else {
            return Ok(Produced::NoData);
        };

        let format = Self::message_format(&message)?;
        match self.received {
            None => {
                tracing::debug!("First image message is {}", format);
                self.received = Some(format);
            }
            Some(received) if received != format => {
                return Err(BridgeError::RenderDegraded(format!(
                    "{} message on a {} stream",
                    format, received
                )));
            }
            Some(_) => {}
        }

        let stamp = message.header().stamp;
        Ok(Produced::Buffer(OwnedBuffer::new(message.payload().clone()), stamp))
    }

    fn on_query(&mut self, query: &mut Query) -> bool {
        match query {
            Query::Caps { result, .. } => {
                *result = match &self.caps {
                    Some(caps) => vec![caps.to_string()],
                    None => vec![caps::raw_video_template(), caps::h264_template()],
                };
                true
            }
            Query::Latency { live, .. } => {
                *live = true;
                true
            }
            Query::Custom { .. } => false,
        }
    }
}
