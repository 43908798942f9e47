// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

use crate::element::AdapterState;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// Invalid node identity, or an identity change after the endpoint exists.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The endpoint (context, node, publisher/subscriber) could not be created.
    #[error("Activation failed: {0}")]
    ActivationFailure(String),

    #[error("Format not supported: {0}")]
    FormatUnsupported(String),

    /// A single buffer could not be rendered or produced. Never fatal.
    #[error("Render degraded: {0}")]
    RenderDegraded(String),

    /// Clock offset sampling failed; the caller falls back to a zero offset.
    #[error("Clock sample degraded: {0}")]
    ClockSampleDegraded(String),

    #[error("{0} hook not set")]
    HookUnset(&'static str),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: AdapterState, to: AdapterState },

    #[error("Bus error: {0}")]
    Bus(String),

    #[error("Malformed caps: {0}")]
    Caps(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BridgeError {
    /// Errors that only cost the current buffer; streaming continues.
    pub fn is_degradation(&self) -> bool {
        matches!(
            self,
            Self::RenderDegraded(_) | Self::ClockSampleDegraded(_) | Self::HookUnset(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degradation_classification() {
        assert!(BridgeError::RenderDegraded("x".into()).is_degradation());
        assert!(BridgeError::HookUnset("render").is_degradation());
        assert!(!BridgeError::ActivationFailure("x".into()).is_degradation());
        assert!(!BridgeError::Configuration("x".into()).is_degradation());
    }

    #[test]
    fn test_messages() {
        assert_eq!(BridgeError::HookUnset("render").to_string(), "render hook not set");
        let err = BridgeError::InvalidTransition {
            from: AdapterState::Null,
            to: AdapterState::Paused,
        };
        assert_eq!(err.to_string(), "Invalid state transition: Null -> Paused");
    }
}
