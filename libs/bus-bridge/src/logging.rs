// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Process-level tracing setup for applications embedding the bridge.
//!
//! The bridge itself never installs a subscriber; each element logs into the
//! span it was constructed with.

use crate::error::{BridgeError, Result};

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"info"` or `"bus_bridge=debug"`).
pub fn init_tracing(default_directive: &str) -> Result<()> {
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => tracing_subscriber::EnvFilter::try_new(default_directive).map_err(|e| {
            BridgeError::Configuration(format!(
                "invalid log directive {:?}: {}",
                default_directive, e
            ))
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| BridgeError::Other(anyhow::anyhow!("tracing already initialized: {}", e)))
}
