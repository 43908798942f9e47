// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use bus_bridge::bus::BusNode;
use bus_bridge::clocks::{BusClock, Clock, ClockOffset, ClockOffsetSampler};
use bus_bridge::element::EndpointContext;
use bus_bridge::{
    AdapterRole, BridgeConfig, BridgeElement, Buffer, BusTime, LocalBus, ManualClock,
    MediaAdapter, MediaFormat, NodeService, Result,
};

#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
}

/// Layer that records every event's level and message.
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.events
            .lock()
            .iter()
            .any(|event| event.level == level && event.message.contains(needle))
    }

    pub fn count(&self, level: Level) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.level == level)
            .count()
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.events.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
        });
    }
}

/// Run `f` with a capturing subscriber installed on this thread.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, LogCapture) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, capture)
}

/// Delegates to a fixed offset and counts invocations.
pub struct CountingSampler {
    offset: ClockOffset,
    calls: AtomicUsize,
}

impl CountingSampler {
    pub fn new(offset_ns: i64) -> Arc<Self> {
        Arc::new(Self {
            offset: ClockOffset::from_nanos(offset_ns),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ClockOffsetSampler for CountingSampler {
    fn sample(&self, _pipeline: &dyn Clock, _bus: &dyn BusClock) -> Result<ClockOffset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.offset)
    }
}

/// Adapter that implements only `role`; every other hook is the default.
pub struct HooklessAdapter(pub AdapterRole);

impl MediaAdapter for HooklessAdapter {
    fn role(&self) -> AdapterRole {
        self.0
    }
}

/// Calls observed by a `RecordingAdapter`.
#[derive(Debug, Default)]
pub struct Recorded {
    pub opened_nodes: Vec<String>,
    pub closes: usize,
    pub offered: Vec<Vec<MediaFormat>>,
    pub stamps: Vec<BusTime>,
    pub payloads: Vec<Vec<u8>>,
}

/// Sink adapter that records every hook call and accepts everything.
#[derive(Clone, Default)]
pub struct RecordingAdapter {
    pub recorded: Arc<Mutex<Recorded>>,
    pub fail_open: bool,
    pub fail_close: bool,
}

impl MediaAdapter for RecordingAdapter {
    fn role(&self) -> AdapterRole {
        AdapterRole::Sink
    }

    fn open(&mut self, endpoint: &EndpointContext<'_>) -> Result<()> {
        if self.fail_open {
            return Err(bus_bridge::BridgeError::Bus("publisher refused".to_string()));
        }
        let node: &dyn BusNode = endpoint.node;
        self.recorded.lock().opened_nodes.push(node.name().to_string());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.recorded.lock().closes += 1;
        if self.fail_close {
            return Err(bus_bridge::BridgeError::Bus("publisher already gone".to_string()));
        }
        Ok(())
    }

    fn negotiate(&mut self, candidates: &[MediaFormat]) -> Option<MediaFormat> {
        self.recorded.lock().offered.push(candidates.to_vec());
        candidates.first().copied()
    }

    fn on_format_locked(&mut self, _caps: &bus_bridge::Caps) -> Result<()> {
        Ok(())
    }

    fn render(&mut self, buffer: &Buffer<'_>, stamp: BusTime) -> Result<()> {
        let mut recorded = self.recorded.lock();
        recorded.stamps.push(stamp);
        recorded.payloads.push(buffer.data.to_vec());
        Ok(())
    }
}

/// Config whose node is serviced manually so tests control spinning.
pub fn manual_config(node_name: &str) -> BridgeConfig {
    BridgeConfig {
        node_name: node_name.to_string(),
        node_service: NodeService::Manual,
        ..BridgeConfig::default()
    }
}

/// Bus whose nodes report a `ManualClock` starting at `bus_now_ns`.
pub fn manual_bus(bus_now_ns: i64) -> (LocalBus, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(bus_now_ns));
    let bus = LocalBus::with_clock(clock.clone());
    (bus, clock)
}

pub fn element<A: MediaAdapter>(bus: &LocalBus, adapter: A, config: BridgeConfig) -> BridgeElement<A> {
    BridgeElement::new("test_element", Arc::new(bus.clone()), adapter, config)
        .expect("valid test config")
}

pub fn pipeline_clock(now_ns: i64) -> (Arc<ManualClock>, Option<Arc<dyn Clock>>) {
    let clock = Arc::new(ManualClock::new(now_ns));
    let as_pipeline: Arc<dyn Clock> = clock.clone();
    (clock, Some(as_pipeline))
}
