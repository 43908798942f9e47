// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use super::{BusClock, Clock, ClockType};
use std::time::{SystemTime, UNIX_EPOCH};

/// Bus-side wall clock, nanoseconds since the UNIX epoch.
pub struct SystemClock {
    clock_type: ClockType,
    description: String,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            clock_type: ClockType::SystemTime,
            description: "System Clock".to_string(),
        }
    }

    /// Wall clock that declares a different stamp type (e.g. `RosTime`
    /// while no simulated time source is active).
    pub fn with_clock_type(clock_type: ClockType) -> Self {
        Self {
            clock_type,
            description: format!("System Clock ({})", clock_type),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ns(&self) -> Option<i64> {
        let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
        i64::try_from(since_epoch.as_nanos()).ok()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl BusClock for SystemClock {
    fn clock_type(&self) -> ClockType {
        self.clock_type
    }
}
