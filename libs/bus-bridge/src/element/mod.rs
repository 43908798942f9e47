// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! BridgeElement - the base adapter between a pipeline and a bus
//!
//! Owns the messaging endpoint, the clock offset and per-buffer timestamp
//! translation, and delegates media-specific work to a [`MediaAdapter`].
//!
//! ## Threads
//!
//! The pipeline drives an element from two threads at once:
//!
//! - the state-change thread calls [`BridgeElement::change_state`]
//! - the streaming thread calls [`BridgeElement::render`] / [`BridgeElement::produce`]
//!
//! Endpoint creation and teardown take the same lock as render/produce, so
//! a hook never runs without an endpoint and teardown waits for an in-flight
//! buffer. The lock is held for one hook call at a time.
//!
//! Lock order is lifecycle, then streaming.

mod adapter;
mod dispatch;
mod endpoint;
mod lifecycle;
mod state;
mod stats;

pub use adapter::{
    AdapterRole, Buffer, EndpointContext, MediaAdapter, OwnedBuffer, Produced, Query,
};
pub use dispatch::{FlowSuccess, SourceFlow};
use endpoint::Endpoint;
pub use state::{AdapterState, StateChange};
pub use stats::BridgeStats;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::Span;

use crate::bus::MessagingSubstrate;
use crate::caps::Caps;
use crate::clocks::{BackToBackSampler, Clock, ClockOffset, ClockOffsetSampler};
use crate::config::{self, BridgeConfig, NodeService};
use crate::error::{BridgeError, Result};
use crate::metadata::{
    self, ElementMetadata, BRIDGE_SINK_METADATA, BRIDGE_SOURCE_METADATA, PROP_FRAME_ID,
    PROP_NODE_NAME, PROP_NODE_NAMESPACE, PROP_TOPIC,
};
use crate::translate::TimestampTranslator;
use stats::StatsCounters;

/// Owned by the state-change thread.
struct Lifecycle {
    state: AdapterState,
    config: BridgeConfig,
}

/// Everything a render/produce call touches.
struct Streaming<A> {
    adapter: A,
    endpoint: Option<Endpoint>,
    format: Option<Caps>,
}

pub struct BridgeElement<A: MediaAdapter = Box<dyn MediaAdapter>> {
    name: String,
    span: Span,
    substrate: Arc<dyn MessagingSubstrate>,
    sampler: Arc<dyn ClockOffsetSampler>,
    lifecycle: Mutex<Lifecycle>,
    streaming: Mutex<Streaming<A>>,
    timing: TimestampTranslator,
    pipeline_clock: RwLock<Option<Arc<dyn Clock>>>,
    stats: StatsCounters,
}

impl<A: MediaAdapter> BridgeElement<A> {
    /// Create an element in the Null state. `config` is validated here.
    pub fn new(
        name: impl Into<String>,
        substrate: Arc<dyn MessagingSubstrate>,
        adapter: A,
        config: BridgeConfig,
    ) -> Result<Self> {
        let name = name.into();
        config.validate()?;

        let span = tracing::info_span!("bus_bridge", element = %name);
        Ok(Self {
            name,
            span,
            substrate,
            sampler: Arc::new(BackToBackSampler),
            lifecycle: Mutex::new(Lifecycle {
                state: AdapterState::Null,
                config,
            }),
            streaming: Mutex::new(Streaming {
                adapter,
                endpoint: None,
                format: None,
            }),
            timing: TimestampTranslator::new(),
            pipeline_clock: RwLock::new(None),
            stats: StatsCounters::default(),
        })
    }

    /// Log into `span` instead of the default `bus_bridge` span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_sampler(mut self, sampler: Arc<dyn ClockOffsetSampler>) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn metadata(&self) -> &'static ElementMetadata {
        match self.streaming.lock().adapter.role() {
            AdapterRole::Sink => &BRIDGE_SINK_METADATA,
            AdapterRole::Source => &BRIDGE_SOURCE_METADATA,
        }
    }

    pub fn state(&self) -> AdapterState {
        self.lifecycle.lock().state
    }

    pub fn config(&self) -> BridgeConfig {
        self.lifecycle.lock().config.clone()
    }

    pub fn has_endpoint(&self) -> bool {
        self.streaming.lock().endpoint.is_some()
    }

    /// Caps locked by the last successful `set_caps`.
    pub fn format(&self) -> Option<Caps> {
        self.streaming.lock().format.clone()
    }

    /// Clock the pipeline selected. Read at each Paused -> Playing.
    pub fn set_clock(&self, clock: Option<Arc<dyn Clock>>) {
        *self.pipeline_clock.write() = clock;
    }

    pub fn clock(&self) -> Option<Arc<dyn Clock>> {
        self.pipeline_clock.read().clone()
    }

    pub fn set_base_time(&self, base_time_ns: u64) {
        self.timing.set_base_time(base_time_ns);
    }

    pub fn base_time(&self) -> u64 {
        self.timing.base_time()
    }

    /// Offset sampled at the last activation; zero while inactive.
    pub fn offset(&self) -> ClockOffset {
        self.timing.offset()
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats.snapshot()
    }

    /// Run `f` against the adapter with the streaming lock held.
    pub fn with_adapter<R>(&self, f: impl FnOnce(&mut A) -> R) -> R {
        f(&mut self.streaming.lock().adapter)
    }

    pub fn set_node_name(&self, name: &str) -> Result<()> {
        self.update_config(PROP_NODE_NAME, name, config::validate_node_name, |c, v| {
            c.node_name = v
        })
    }

    pub fn set_node_namespace(&self, namespace: &str) -> Result<()> {
        self.update_config(
            PROP_NODE_NAMESPACE,
            namespace,
            config::validate_namespace,
            |c, v| c.node_namespace = v,
        )
    }

    pub fn set_topic(&self, topic: &str) -> Result<()> {
        self.update_config(PROP_TOPIC, topic, config::validate_topic, |c, v| c.topic = v)
    }

    pub fn set_frame_id(&self, frame_id: &str) -> Result<()> {
        self.update_config(PROP_FRAME_ID, frame_id, |_| Ok(()), |c, v| c.frame_id = v)
    }

    /// Property-style setter, e.g. `set_property("node-name", "camera")`.
    pub fn set_property(&self, name: &str, value: &str) -> Result<()> {
        let spec = metadata::find_property(name)
            .ok_or_else(|| BridgeError::Configuration(format!("unknown property {:?}", name)))?;
        match spec.name {
            PROP_NODE_NAME => self.set_node_name(value),
            PROP_NODE_NAMESPACE => self.set_node_namespace(value),
            PROP_TOPIC => self.set_topic(value),
            PROP_FRAME_ID => self.set_frame_id(value),
            other => Err(BridgeError::Configuration(format!(
                "property {:?} is not settable",
                other
            ))),
        }
    }

    pub fn property(&self, name: &str) -> Result<String> {
        let lifecycle = self.lifecycle.lock();
        let config = &lifecycle.config;
        match name {
            PROP_NODE_NAME => Ok(config.node_name.clone()),
            PROP_NODE_NAMESPACE => Ok(config.node_namespace.clone()),
            PROP_TOPIC => Ok(config.topic.clone()),
            PROP_FRAME_ID => Ok(config.frame_id.clone()),
            _ => Err(BridgeError::Configuration(format!("unknown property {:?}", name))),
        }
    }

    fn update_config(
        &self,
        property: &str,
        value: &str,
        validate: impl FnOnce(&str) -> Result<()>,
        apply: impl FnOnce(&mut BridgeConfig, String),
    ) -> Result<()> {
        let _enter = self.span.enter();
        let mut lifecycle = self.lifecycle.lock();

        if lifecycle.state != AdapterState::Null || self.streaming.lock().endpoint.is_some() {
            tracing::warn!(
                "Ignoring change of {} to {:?}: endpoint exists (state {})",
                property,
                value,
                lifecycle.state
            );
            return Err(BridgeError::Configuration(format!(
                "{} cannot change while the endpoint exists",
                property
            )));
        }

        validate(value)?;
        apply(&mut lifecycle.config, value.to_string());
        tracing::debug!("Set {} to {:?}", property, value);
        Ok(())
    }

    /// Give the node a slice of time when it has no service thread.
    ///
    /// Returns `false` when there is no endpoint to service.
    pub fn service_node(&self) -> Result<bool> {
        let _enter = self.span.enter();
        if self.lifecycle.lock().config.node_service != NodeService::Manual {
            return Err(BridgeError::NotSupported(
                "node is serviced by its own thread".to_string(),
            ));
        }

        let node = match self.streaming.lock().endpoint.as_ref() {
            Some(endpoint) => Arc::clone(endpoint.node()),
            None => return Ok(false),
        };
        node.spin_once(std::time::Duration::ZERO)?;
        Ok(true)
    }
}

impl<A: MediaAdapter> Drop for BridgeElement<A> {
    fn drop(&mut self) {
        let streaming = self.streaming.get_mut();
        if let Some(endpoint) = streaming.endpoint.take() {
            let _enter = self.span.enter();
            tracing::warn!("Element dropped with a live endpoint, closing it");
            if let Err(e) = streaming.adapter.close() {
                tracing::warn!("Adapter close failed: {}", e);
            }
            endpoint.close("bridge element dropped");
        }
    }
}
