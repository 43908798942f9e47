// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! MediaAdapter - extension point for media-type specific behavior
//!
//! The bridge element owns the endpoint lifecycle, clock offset and
//! timestamp translation. A concrete adapter (image, audio, ...) is injected
//! into the element and supplies the hooks below.
//!
//! ## Hooks
//!
//! | Hook | Called | Default when not implemented |
//! |---|---|---|
//! | `open` / `close` | Null -> Ready / Ready -> Null | no-op |
//! | `negotiate` | pipeline proposes formats (allow-listed only) | nothing chosen |
//! | `on_format_locked` | format fixed | rejected (`HookUnset`) |
//! | `render` | sink role, once per buffer | buffer dropped with a warning |
//! | `produce` | source role, once per request | nothing produced, warning |
//! | `on_query` | generic pipeline query | unhandled |
//!
//! Hooks run with the element's streaming lock held, so they are never
//! concurrent with each other or with endpoint creation/teardown.

use bytes::Bytes;

use crate::bus::BusNode;
use crate::caps::Caps;
use crate::error::{BridgeError, Result};
use crate::format::MediaFormat;
use crate::translate::BusTime;

/// Direction data flows through the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterRole {
    /// pipeline -> bus
    Sink,
    /// bus -> pipeline
    Source,
}

/// Borrowed view of one pipeline buffer, valid for a single render call.
#[derive(Debug, Clone, Copy)]
pub struct Buffer<'a> {
    pub data: &'a [u8],
    /// Pipeline-relative presentation timestamp in nanoseconds.
    pub pts: Option<u64>,
    pub duration: Option<u64>,
}

impl<'a> Buffer<'a> {
    pub fn new(data: &'a [u8], pts: Option<u64>) -> Self {
        Self {
            data,
            pts,
            duration: None,
        }
    }
}

/// Buffer handed to the pipeline by a source-role element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedBuffer {
    pub data: Bytes,
    pub pts: Option<u64>,
    pub duration: Option<u64>,
}

impl OwnedBuffer {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            pts: None,
            duration: None,
        }
    }

    pub fn as_buffer(&self) -> Buffer<'_> {
        Buffer {
            data: &self.data,
            pts: self.pts,
            duration: self.duration,
        }
    }
}

/// Result of a `produce` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Produced {
    /// A buffer and its stamp in the bus time domain.
    Buffer(OwnedBuffer, BusTime),
    /// Nothing arrived within the hook's wait budget.
    NoData,
    EndOfStream,
}

/// Generic pipeline query. Handlers fill in the answer fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Latency {
        live: bool,
        min_ns: u64,
        max_ns: Option<u64>,
    },
    Caps {
        filter: Option<String>,
        result: Vec<String>,
    },
    Custom {
        name: String,
        response: Option<String>,
    },
}

/// What an adapter gets to build its publisher/subscriber on.
pub struct EndpointContext<'a> {
    pub node: &'a dyn BusNode,
    pub topic: &'a str,
    pub frame_id: &'a str,
}

/// Media-type specific behavior plugged into a `BridgeElement`.
pub trait MediaAdapter: Send + 'static {
    fn role(&self) -> AdapterRole;

    /// Create publishers/subscribers on the freshly created node. An error
    /// aborts the Null -> Ready transition.
    fn open(&mut self, _endpoint: &EndpointContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Release everything created in `open`. Called before the node is
    /// destroyed. Errors are logged, teardown continues regardless.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Pick one of `candidates`. Only allow-listed formats are offered.
    fn negotiate(&mut self, _candidates: &[MediaFormat]) -> Option<MediaFormat> {
        None
    }

    /// The pipeline fixed the format. An error aborts negotiation.
    fn on_format_locked(&mut self, _caps: &Caps) -> Result<()> {
        Err(BridgeError::HookUnset("on_format_locked"))
    }

    /// Sink role: publish one buffer stamped with `stamp`.
    fn render(&mut self, _buffer: &Buffer<'_>, _stamp: BusTime) -> Result<()> {
        Err(BridgeError::HookUnset("render"))
    }

    /// Source role: fetch the next buffer from the bus.
    fn produce(&mut self) -> Result<Produced> {
        Err(BridgeError::HookUnset("produce"))
    }

    fn on_query(&mut self, _query: &mut Query) -> bool {
        false
    }
}

impl MediaAdapter for Box<dyn MediaAdapter> {
    fn role(&self) -> AdapterRole {
        (**self).role()
    }

    fn open(&mut self, endpoint: &EndpointContext<'_>) -> Result<()> {
        (**self).open(endpoint)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn negotiate(&mut self, candidates: &[MediaFormat]) -> Option<MediaFormat> {
        (**self).negotiate(candidates)
    }

    fn on_format_locked(&mut self, caps: &Caps) -> Result<()> {
        (**self).on_format_locked(caps)
    }

    fn render(&mut self, buffer: &Buffer<'_>, stamp: BusTime) -> Result<()> {
        (**self).render(buffer, stamp)
    }

    fn produce(&mut self) -> Result<Produced> {
        (**self).produce()
    }

    fn on_query(&mut self, query: &mut Query) -> bool {
        (**self).on_query(query)
    }
}
