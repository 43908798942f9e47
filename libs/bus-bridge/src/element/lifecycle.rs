// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Endpoint lifecycle driven by pipeline state changes
//!
//! | Transition | Action |
//! |---|---|
//! | Null -> Ready | create context and node, adapter `open`, start service thread |
//! | Paused -> Playing | sample the clock offset (zero on failure) |
//! | Ready -> Null | adapter `close`, stop service thread, drop node, shut context down |
//!
//! Every other step only moves the state.

use std::sync::Arc;
use std::time::Duration;

use crate::clocks::ClockOffset;
use crate::config::{BridgeConfig, NodeService};
use crate::error::{BridgeError, Result};

use super::adapter::{EndpointContext, MediaAdapter};
use super::endpoint::Endpoint;
use super::state::{AdapterState, StateChange};
use super::BridgeElement;

impl<A: MediaAdapter> BridgeElement<A> {
    /// Apply one single-step state change.
    ///
    /// # Errors
    ///
    /// - `ActivationFailure` if Null -> Ready is requested while an endpoint
    ///   exists, or the endpoint cannot be created. The state stays Null.
    /// - `InvalidTransition` if `change` does not start at the current state.
    ///
    /// Ready -> Null from Null is accepted and does nothing.
    pub fn change_state(&self, change: StateChange) -> Result<()> {
        let _enter = self.span.enter();
        let mut lifecycle = self.lifecycle.lock();
        let current = lifecycle.state;

        match change {
            StateChange::NullToReady => {
                if current != AdapterState::Null || self.streaming.lock().endpoint.is_some() {
                    let err = BridgeError::ActivationFailure(format!(
                        "endpoint for node {:?} already exists (state {})",
                        lifecycle.config.node_name, current
                    ));
                    tracing::error!("{}", err);
                    return Err(err);
                }
                self.open(&lifecycle.config)?;
            }
            StateChange::ReadyToNull => match current {
                AdapterState::Null => {
                    // Activation may have failed half way; release anything left.
                    self.close();
                    tracing::debug!("Ready -> Null while already Null, nothing to do");
                    return Ok(());
                }
                AdapterState::Ready => self.close(),
                _ => {
                    return Err(BridgeError::InvalidTransition {
                        from: current,
                        to: AdapterState::Null,
                    });
                }
            },
            _ if current != change.current() => {
                return Err(BridgeError::InvalidTransition {
                    from: current,
                    to: change.next(),
                });
            }
            StateChange::PausedToPlaying => self.sample_offset(),
            StateChange::ReadyToPaused
            | StateChange::PlayingToPaused
            | StateChange::PausedToReady => {}
        }

        lifecycle.state = change.next();
        tracing::debug!("State change {}", change);
        Ok(())
    }

    /// Walk one step at a time from the current state to `target`.
    pub fn set_state(&self, target: AdapterState) -> Result<()> {
        let path = self.state().path_to(target);
        for change in path {
            self.change_state(change)?;
        }
        Ok(())
    }

    /// Step down to Null from wherever the element is.
    pub fn shutdown(&self) -> Result<()> {
        self.set_state(AdapterState::Null)
    }

    fn open(&self, config: &BridgeConfig) -> Result<()> {
        tracing::info!(
            "Opening endpoint: node {:?} in namespace {:?}",
            config.node_name,
            config.node_namespace
        );

        let mut endpoint = Endpoint::open(self.substrate.as_ref(), config).inspect_err(|e| {
            tracing::error!("{}", e);
        })?;

        let mut streaming = self.streaming.lock();
        let context = EndpointContext {
            node: endpoint.node().as_ref(),
            topic: &config.topic,
            frame_id: &config.frame_id,
        };
        if let Err(e) = streaming.adapter.open(&context) {
            drop(streaming);
            endpoint.close("adapter open failed");
            let err = BridgeError::ActivationFailure(format!("adapter open failed: {}", e));
            tracing::error!("{}", err);
            return Err(err);
        }

        if config.node_service == NodeService::Thread {
            let interval = Duration::from_millis(config.service_interval_ms);
            if let Err(e) = endpoint.start_service(interval, self.span.clone()) {
                if let Err(close_err) = streaming.adapter.close() {
                    tracing::warn!("Adapter close failed: {}", close_err);
                }
                drop(streaming);
                endpoint.close("node service failed to start");
                tracing::error!("{}", e);
                return Err(e);
            }
        }

        streaming.endpoint = Some(endpoint);
        tracing::info!("Endpoint open");
        Ok(())
    }

    /// Best-effort teardown. Waits for an in-flight render/produce.
    fn close(&self) {
        let endpoint = {
            let mut streaming = self.streaming.lock();
            let Some(endpoint) = streaming.endpoint.take() else {
                return;
            };
            if let Err(e) = streaming.adapter.close() {
                tracing::warn!("Adapter close failed, continuing teardown: {}", e);
            }
            streaming.format = None;
            endpoint
        };

        endpoint.close("bridge element deactivated");
        self.timing.set_offset(ClockOffset::ZERO);
        tracing::info!("Endpoint closed");
    }

    fn sample_offset(&self) {
        let bus_clock = self
            .streaming
            .lock()
            .endpoint
            .as_ref()
            .map(|endpoint| Arc::clone(endpoint.clock()));
        let pipeline_clock = self.pipeline_clock.read().clone();

        let sampled = match (pipeline_clock, bus_clock) {
            (Some(pipeline), Some(bus)) => self.sampler.sample(pipeline.as_ref(), bus.as_ref()),
            (None, _) => Err(BridgeError::ClockSampleDegraded(
                "no pipeline clock".to_string(),
            )),
            (_, None) => Err(BridgeError::ClockSampleDegraded("no bus clock".to_string())),
        };

        match sampled {
            Ok(offset) => {
                tracing::info!("Sampled clock offset {}", offset);
                self.timing.set_offset(offset);
                self.stats.record_offset_sample();
            }
            Err(e) => {
                tracing::warn!("{}, using zero offset", e);
                self.timing.set_offset(ClockOffset::ZERO);
                self.stats.record_degraded_sample();
            }
        }
    }
}
