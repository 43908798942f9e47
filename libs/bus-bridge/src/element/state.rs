// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Element state, mirroring the pipeline element's state machine.
///
/// States are totally ordered; transitions move exactly one step.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum AdapterState {
    /// No endpoint exists.
    #[default]
    Null,
    /// Endpoint (context, node, publisher/subscriber) exists.
    Ready,
    /// Prerolled, clock not running.
    Paused,
    /// Streaming against a sampled clock offset.
    Playing,
}

impl AdapterState {
    /// Single-step transitions leading from `self` to `target`, in order.
    pub fn path_to(self, target: AdapterState) -> Vec<StateChange> {
        let mut path = Vec::new();
        let mut current = self;
        while current != target {
            let step = if current < target {
                StateChange::upward_from(current)
            } else {
                StateChange::downward_from(current)
            };
            // Null has no downward step and Playing no upward one; neither
            // can be reached here because current != target.
            let Some(step) = step else { break };
            current = step.next();
            path.push(step);
        }
        path
    }
}

impl std::fmt::Display for AdapterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Ready => write!(f, "Ready"),
            Self::Paused => write!(f, "Paused"),
            Self::Playing => write!(f, "Playing"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateChange {
    NullToReady,
    ReadyToPaused,
    PausedToPlaying,
    PlayingToPaused,
    PausedToReady,
    ReadyToNull,
}

impl StateChange {
    /// The transition between two adjacent states.
    pub fn between(from: AdapterState, to: AdapterState) -> Result<Self> {
        use AdapterState::*;
        match (from, to) {
            (Null, Ready) => Ok(Self::NullToReady),
            (Ready, Paused) => Ok(Self::ReadyToPaused),
            (Paused, Playing) => Ok(Self::PausedToPlaying),
            (Playing, Paused) => Ok(Self::PlayingToPaused),
            (Paused, Ready) => Ok(Self::PausedToReady),
            (Ready, Null) => Ok(Self::ReadyToNull),
            _ => Err(BridgeError::InvalidTransition { from, to }),
        }
    }

    pub fn current(self) -> AdapterState {
        match self {
            Self::NullToReady => AdapterState::Null,
            Self::ReadyToPaused | Self::ReadyToNull => AdapterState::Ready,
            Self::PausedToPlaying | Self::PausedToReady => AdapterState::Paused,
            Self::PlayingToPaused => AdapterState::Playing,
        }
    }

    pub fn next(self) -> AdapterState {
        match self {
            Self::NullToReady | Self::PausedToReady => AdapterState::Ready,
            Self::ReadyToPaused | Self::PlayingToPaused => AdapterState::Paused,
            Self::PausedToPlaying => AdapterState::Playing,
            Self::ReadyToNull => AdapterState::Null,
        }
    }

    fn upward_from(state: AdapterState) -> Option<Self> {
        match state {
            AdapterState::Null => Some(Self::NullToReady),
            AdapterState::Ready => Some(Self::ReadyToPaused),
            AdapterState::Paused => Some(Self::PausedToPlaying),
            AdapterState::Playing => None,
        }
    }

    fn downward_from(state: AdapterState) -> Option<Self> {
        match state {
            AdapterState::Null => None,
            AdapterState::Ready => Some(Self::ReadyToNull),
            AdapterState::Paused => Some(Self::PausedToReady),
            AdapterState::Playing => Some(Self::PlayingToPaused),
        }
    }
}

impl std::fmt::Display for StateChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.current(), self.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_transitions() {
        for change in [
            StateChange::NullToReady,
            StateChange::ReadyToPaused,
            StateChange::PausedToPlaying,
            StateChange::PlayingToPaused,
            StateChange::PausedToReady,
            StateChange::ReadyToNull,
        ] {
            assert_eq!(StateChange::between(change.current(), change.next()).unwrap(), change);
        }
    }

    #[test]
    fn test_skipping_is_rejected() {
        let err = StateChange::between(AdapterState::Null, AdapterState::Playing).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::InvalidTransition {
                from: AdapterState::Null,
                to: AdapterState::Playing
            }
        ));
        assert!(StateChange::between(AdapterState::Ready, AdapterState::Ready).is_err());
        assert!(StateChange::between(AdapterState::Playing, AdapterState::Ready).is_err());
    }

    #[test]
    fn test_path_walks_every_state() {
        assert_eq!(
            AdapterState::Null.path_to(AdapterState::Playing),
            vec![
                StateChange::NullToReady,
                StateChange::ReadyToPaused,
                StateChange::PausedToPlaying
            ]
        );
        assert_eq!(
            AdapterState::Playing.path_to(AdapterState::Null),
            vec![
                StateChange::PlayingToPaused,
                StateChange::PausedToReady,
                StateChange::ReadyToNull
            ]
        );
        assert!(AdapterState::Paused.path_to(AdapterState::Paused).is_empty());
    }

    #[test]
    fn test_states_are_ordered() {
        assert!(AdapterState::Null < AdapterState::Ready);
        assert!(AdapterState::Paused < AdapterState::Playing);
        assert_eq!(StateChange::PausedToPlaying.to_string(), "Paused -> Playing");
    }
}
