// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Time sources on both sides of the bridge and the offset between them.

mod clock_trait;
mod manual_clock;
mod monotonic_clock;
mod offset;
mod system_clock;

pub use clock_trait::{BusClock, Clock, ClockType};
pub use manual_clock::ManualClock;
pub use monotonic_clock::MonotonicClock;
pub use offset::{BackToBackSampler, ClockOffset, ClockOffsetSampler};
pub use system_clock::SystemClock;
