// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use super::Clock;
use std::time::Instant;

/// Pipeline-side clock backed by `Instant`. Epoch is construction time.
pub struct MonotonicClock {
    start_time: Instant,
    description: String,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::with_description("Monotonic Clock".to_string())
    }

    pub fn with_description(description: String) -> Self {
        Self {
            start_time: Instant::now(),
            description,
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ns(&self) -> Option<i64> {
        i64::try_from(self.start_time.elapsed().as_nanos()).ok()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_starts_near_zero_and_advances() {
        let clock = MonotonicClock::new();
        let first = clock.now_ns().unwrap();
        assert!(first < 1_000_000_000, "epoch is construction time");

        std::thread::sleep(Duration::from_millis(5));
        let later = clock.now_ns().unwrap();
        assert!(later - first >= 5_000_000);
    }

    #[test]
    fn test_reads_never_decrease() {
        let clock = MonotonicClock::new();
        let reads: Vec<i64> = (0..64).filter_map(|_| clock.now_ns()).collect();
        assert_eq!(reads.len(), 64);
        assert!(reads.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_named_pipeline_clock() {
        let clock = MonotonicClock::with_description("Pipeline Clock".to_string());
        assert_eq!(clock.description(), "Pipeline Clock");
        assert_eq!(MonotonicClock::default().description(), "Monotonic Clock");
    }
}
