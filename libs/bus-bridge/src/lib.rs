// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Bridge between a streaming media pipeline and a publish/subscribe bus.
//!
//! A [`BridgeElement`] sits at the edge of a pipeline. It keeps one bus
//! endpoint alive exactly while the element is at Ready or above, samples the
//! offset between the pipeline and bus clocks on every activation, and
//! stamps each buffer as `pts + base_time + offset` before handing it to a
//! [`MediaAdapter`] (image, audio, ...).
//!
//! ```ignore
//! let bus = LocalBus::new();
//! let element = BridgeElement::new("camera", Arc::new(bus), ImageSink::new(), config)?;
//! element.set_clock(Some(Arc::new(MonotonicClock::new())));
//! element.set_state(AdapterState::Playing)?;
//! element.set_caps_str("video/x-raw, format=(string)RGB, width=(int)640, height=(int)480, framerate=(fraction)30/1")?;
//! element.render(&Buffer::new(&frame, Some(pts)))?;
//! ```

#![allow(clippy::type_complexity)] // Arc<dyn Trait> fields are clear in context

pub mod adapters;
pub mod bus;
pub mod caps;
pub mod clocks;
pub mod config;
pub mod element;
pub mod error;
pub mod format;
pub mod logging;
pub mod metadata;
pub mod translate;

pub use adapters::{AudioSink, ImageSink, ImageSource};
pub use bus::{BusMessage, LocalBus, MessagingSubstrate};
pub use caps::Caps;
pub use clocks::{
    BackToBackSampler, BusClock, Clock, ClockOffset, ClockOffsetSampler, ClockType, ManualClock,
    MonotonicClock, SystemClock,
};
pub use config::{BridgeConfig, NodeService};
pub use element::{
    AdapterRole, AdapterState, BridgeElement, BridgeStats, Buffer, FlowSuccess, MediaAdapter,
    OwnedBuffer, Produced, Query, SourceFlow, StateChange,
};
pub use error::{BridgeError, Result};
pub use format::{AudioFormat, MediaFormat, VideoFormat};
pub use translate::{translate, BusTime, TimestampTranslator};
