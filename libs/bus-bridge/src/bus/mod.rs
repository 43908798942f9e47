// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Messaging substrate seam.
//!
//! The bridge only talks to the bus through these traits. `LocalBus` is an
//! in-process implementation for tests and single-process deployments.

mod local;
mod messages;
mod traits;

pub use local::{resolve_topic, LocalBus, LocalSubscription};
pub use messages::{
    AudioMessage, BusMessage, CompressedImageMessage, Header, ImageMessage,
    AUDIO_LAYOUT_INTERLEAVED,
};
pub use traits::{BusContext, BusNode, MessagingSubstrate, Publisher, Subscription};
