// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Clock traits - passive time references for the two clock domains
//!
//! Following GStreamer's GstClock pattern, clocks are **passive**: the bridge
//! reads them, they never call back into the bridge.

use serde::{Deserialize, Serialize};

/// Passive, monotonically non-decreasing time source.
///
/// ## Implementations
///
/// - `MonotonicClock`: pipeline-side clock, arbitrary epoch
/// - `SystemClock`: bus-side wall clock, UNIX epoch
/// - `ManualClock`: explicitly driven clock for simulated time
///
/// The absolute value of a clock is only meaningful inside its own domain.
pub trait Clock: Send + Sync {
    /// Current time in nanoseconds, or `None` if the clock cannot be read
    /// right now (e.g. hardware clock gone, simulated time not started).
    ///
    /// Safe to call from any thread concurrently.
    fn now_ns(&self) -> Option<i64>;

    /// Human-readable clock description, used for logging.
    fn description(&self) -> &str;
}

/// Time representation the bus declares for its stamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClockType {
    /// Wall clock, UNIX epoch.
    #[default]
    SystemTime,
    /// Bus-controlled time (may be simulated).
    RosTime,
    /// Monotonic clock with an arbitrary epoch.
    SteadyTime,
}

impl std::fmt::Display for ClockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SystemTime => write!(f, "system"),
            Self::RosTime => write!(f, "ros"),
            Self::SteadyTime => write!(f, "steady"),
        }
    }
}

/// Clock owned by a bus node. Stamps produced against it carry its type.
pub trait BusClock: Clock {
    fn clock_type(&self) -> ClockType;
}
