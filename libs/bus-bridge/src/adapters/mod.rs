// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Concrete media adapters plugged into a `BridgeElement`.
//!
//! - `ImageSink`: raw video and H.264 pass-through to image messages
//! - `AudioSink`: raw interleaved audio to audio messages
//! - `ImageSource`: image messages back into pipeline buffers

mod audio_sink;
mod image_sink;
mod image_source;

pub use audio_sink::AudioSink;
pub use image_sink::ImageSink;
pub use image_source::ImageSource;
