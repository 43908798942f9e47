// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Per-buffer and negotiation entry points, delegating to the adapter.

use crate::caps::Caps;
use crate::error::{BridgeError, Result};
use crate::format::{self, MediaFormat};
use crate::translate::BusTime;

use super::adapter::{AdapterRole, Buffer, MediaAdapter, OwnedBuffer, Produced, Query};
use super::endpoint::Endpoint;
use super::BridgeElement;

/// Outcome of a successful render call. Either way the pipeline keeps
/// streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowSuccess {
    Rendered,
    /// The buffer was discarded and a warning logged.
    Dropped,
}

/// Outcome of a successful produce call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFlow {
    /// Buffer with its PTS already translated into the pipeline domain.
    Buffer(OwnedBuffer),
    NoData,
    EndOfStream,
}

/// Errors that cost one buffer, not the stream.
fn is_per_buffer(err: &BridgeError) -> bool {
    err.is_degradation() || matches!(err, BridgeError::Bus(_))
}

impl<A: MediaAdapter> BridgeElement<A> {
    /// Offer the allow-listed subset of `candidates` to the adapter.
    ///
    /// Fails with `FormatUnsupported` if nothing survives the allow-list,
    /// the adapter picks nothing, or it picks a format it was not offered.
    pub fn negotiate(&self, candidates: &[MediaFormat]) -> Result<MediaFormat> {
        let _enter = self.span.enter();
        let allowed = format::filter_allowed(candidates);
        if allowed.len() != candidates.len() {
            let rejected: Vec<_> = candidates.iter().filter(|f| !f.is_allowed()).collect();
            tracing::debug!("Filtered formats outside the allow-list: {:?}", rejected);
        }
        if allowed.is_empty() {
            return Err(BridgeError::FormatUnsupported(format!(
                "no allow-listed format among {:?}",
                candidates
            )));
        }

        let chosen = self.streaming.lock().adapter.negotiate(&allowed);
        match chosen {
            Some(format) if allowed.contains(&format) => {
                tracing::debug!("Negotiated {}", format);
                Ok(format)
            }
            Some(format) => Err(BridgeError::FormatUnsupported(format!(
                "{} was chosen but not offered",
                format
            ))),
            None => Err(BridgeError::FormatUnsupported(format!(
                "adapter accepted none of {:?}",
                allowed
            ))),
        }
    }

    /// Lock the stream format. A rejection aborts negotiation.
    pub fn set_caps(&self, caps: &Caps) -> Result<()> {
        let _enter = self.span.enter();
        format::to_bus_encoding(caps.media_format())?;

        let mut streaming = self.streaming.lock();
        match streaming.adapter.on_format_locked(caps) {
            Ok(()) => {
                tracing::debug!("Format locked: {}", caps);
                streaming.format = Some(caps.clone());
                Ok(())
            }
            Err(BridgeError::HookUnset(hook)) => Err(BridgeError::FormatUnsupported(format!(
                "{} rejected, {} hook not set",
                caps, hook
            ))),
            Err(e) => Err(e),
        }
    }

    pub fn set_caps_str(&self, caps: &str) -> Result<()> {
        let caps = Caps::parse(caps)?;
        self.set_caps(&caps)
    }

    /// Sink role: stamp `buffer` into the bus domain and hand it to the
    /// adapter.
    ///
    /// Anything that only costs this buffer (no endpoint, no hook, no
    /// usable timestamp, publish failure) returns `Ok(FlowSuccess::Dropped)`.
    pub fn render(&self, buffer: &Buffer<'_>) -> Result<FlowSuccess> {
        let _enter = self.span.enter();
        let mut streaming = self.streaming.lock();

        if streaming.adapter.role() != AdapterRole::Sink {
            return Err(BridgeError::NotSupported(
                "render called on a source element".to_string(),
            ));
        }

        let stamp = match streaming.endpoint.as_ref() {
            Some(endpoint) => self.stamp(buffer, endpoint),
            None => Err(BridgeError::RenderDegraded("endpoint absent".to_string())),
        };
        let stamp = match stamp {
            Ok(stamp) => stamp,
            Err(e) => return Ok(self.drop_buffer(&e)),
        };

        match streaming.adapter.render(buffer, stamp) {
            Ok(()) => {
                self.stats.record_rendered();
                tracing::trace!("Rendered {} bytes at {}ns", buffer.data.len(), stamp.nanos);
                Ok(FlowSuccess::Rendered)
            }
            Err(e) if is_per_buffer(&e) => Ok(self.drop_buffer(&e)),
            Err(e) => Err(e),
        }
    }

    /// Source role: pull one buffer from the adapter.
    pub fn produce(&self) -> Result<SourceFlow> {
        let _enter = self.span.enter();
        let mut streaming = self.streaming.lock();

        if streaming.adapter.role() != AdapterRole::Source {
            return Err(BridgeError::NotSupported(
                "produce called on a sink element".to_string(),
            ));
        }
        if streaming.endpoint.is_none() {
            tracing::warn!("Endpoint absent, nothing produced");
            return Ok(SourceFlow::NoData);
        }

        match streaming.adapter.produce() {
            Ok(Produced::Buffer(mut buffer, stamp)) => {
                buffer.pts = Some(self.timing.to_pipeline(stamp));
                self.stats.record_produced();
                Ok(SourceFlow::Buffer(buffer))
            }
            Ok(Produced::NoData) => Ok(SourceFlow::NoData),
            Ok(Produced::EndOfStream) => Ok(SourceFlow::EndOfStream),
            Err(e) if is_per_buffer(&e) => {
                tracing::warn!("{}, nothing produced", e);
                Ok(SourceFlow::NoData)
            }
            Err(e) => Err(e),
        }
    }

    /// Returns whether the adapter answered `query`.
    pub fn query(&self, query: &mut Query) -> bool {
        let _enter = self.span.enter();
        self.streaming.lock().adapter.on_query(query)
    }

    fn stamp(&self, buffer: &Buffer<'_>, endpoint: &Endpoint) -> Result<BusTime> {
        let clock = endpoint.clock();
        let clock_type = clock.clock_type();
        match buffer.pts {
            Some(pts) => self.timing.to_bus(pts, clock_type),
            None => clock
                .now_ns()
                .map(|now| BusTime::new(now, clock_type))
                .ok_or_else(|| {
                    BridgeError::RenderDegraded(format!(
                        "buffer has no timestamp and {} is unreadable",
                        clock.description()
                    ))
                }),
        }
    }

    fn drop_buffer(&self, reason: &BridgeError) -> FlowSuccess {
        tracing::warn!("{}, dropping buffer", reason);
        self.stats.record_dropped();
        FlowSuccess::Dropped
    }
}
