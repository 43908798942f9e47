// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! In-process bus: topics fan out to crossbeam channels.
//!
//! - Publish clones the message (payloads are `Bytes`, so no data copy)
//! - A dropped subscription removes its own entry; publish prunes any
//!   subscriber whose receiver is gone
//! - Context and node creation can be forced to fail to exercise
//!   activation error paths

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use super::{BusContext, BusMessage, BusNode, MessagingSubstrate, Publisher, Subscription};
use crate::clocks::{BusClock, SystemClock};
use crate::error::{BridgeError, Result};

/// Resolve a topic against a node namespace. Absolute topics are unchanged.
pub fn resolve_topic(namespace: &str, topic: &str) -> String {
    if topic.starts_with('/') {
        topic.to_string()
    } else {
        format!("{}/{}", namespace.trim_end_matches('/'), topic)
    }
}

struct Subscriber {
    id: u64,
    tx: Sender<BusMessage>,
}

struct LocalBusInner {
    /// Topic name -> live subscriber channels
    topics: Mutex<HashMap<String, Vec<Subscriber>>>,
    next_subscriber: AtomicU64,
    clock: Arc<dyn BusClock>,
    fail_context: AtomicBool,
    fail_node: AtomicBool,
    contexts_created: AtomicU64,
    contexts_shut_down: AtomicU64,
    nodes_created: AtomicU64,
    nodes_alive: AtomicU64,
    spins: AtomicU64,
}

impl LocalBusInner {
    fn publish(&self, topic: &str, message: BusMessage) -> usize {
        let mut topics = self.topics.lock();
        let Some(subscribers) = topics.get_mut(topic) else {
            return 0;
        };

        subscribers.retain(|sub| sub.tx.send(message.clone()).is_ok());
        let delivered = subscribers.len();
        if subscribers.is_empty() {
            topics.remove(topic);
        }
        delivered
    }

    fn subscribe(self: &Arc<Self>, topic: &str) -> LocalSubscription {
        let (tx, rx) = crossbeam_channel::unbounded();
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.topics
            .lock()
            .entry(topic.to_string())
            .or_default()
            .push(Subscriber { id, tx });
        LocalSubscription {
            topic: topic.to_string(),
            id,
            rx,
            bus: Arc::downgrade(self),
        }
    }

    fn unsubscribe(&self, topic: &str, id: u64) {
        let mut topics = self.topics.lock();
        let Some(subscribers) = topics.get_mut(topic) else {
            return;
        };
        subscribers.retain(|sub| sub.id != id);
        if subscribers.is_empty() {
            topics.remove(topic);
        }
    }
}

/// Cloneable handle to one in-process bus.
#[derive(Clone)]
pub struct LocalBus {
    inner: Arc<LocalBusInner>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    /// Bus whose nodes all report `clock`.
    pub fn with_clock(clock: Arc<dyn BusClock>) -> Self {
        Self {
            inner: Arc::new(LocalBusInner {
                topics: Mutex::new(HashMap::new()),
                next_subscriber: AtomicU64::new(0),
                clock,
                fail_context: AtomicBool::new(false),
                fail_node: AtomicBool::new(false),
                contexts_created: AtomicU64::new(0),
                contexts_shut_down: AtomicU64::new(0),
                nodes_created: AtomicU64::new(0),
                nodes_alive: AtomicU64::new(0),
                spins: AtomicU64::new(0),
            }),
        }
    }

    /// Observe a fully resolved topic from outside any element.
    pub fn subscribe(&self, topic: &str) -> LocalSubscription {
        self.inner.subscribe(topic)
    }

    /// Live subscriptions on a fully resolved topic.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.topics.lock().get(topic).map_or(0, Vec::len)
    }

    /// Inject a message from outside any element. Returns the number of
    /// subscribers it reached.
    pub fn publish(&self, topic: &str, message: BusMessage) -> usize {
        self.inner.publish(topic, message)
    }

    pub fn fail_context_creation(&self, fail: bool) {
        self.inner.fail_context.store(fail, Ordering::SeqCst);
    }

    pub fn fail_node_creation(&self, fail: bool) {
        self.inner.fail_node.store(fail, Ordering::SeqCst);
    }

    pub fn contexts_created(&self) -> u64 {
        self.inner.contexts_created.load(Ordering::SeqCst)
    }

    pub fn contexts_shut_down(&self) -> u64 {
        self.inner.contexts_shut_down.load(Ordering::SeqCst)
    }

    pub fn nodes_created(&self) -> u64 {
        self.inner.nodes_created.load(Ordering::SeqCst)
    }

    /// Nodes created and not yet dropped.
    pub fn nodes_alive(&self) -> u64 {
        self.inner.nodes_alive.load(Ordering::SeqCst)
    }

    pub fn spin_count(&self) -> u64 {
        self.inner.spins.load(Ordering::SeqCst)
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessagingSubstrate for LocalBus {
    fn create_context(&self) -> Result<Box<dyn BusContext>> {
        if self.inner.fail_context.load(Ordering::SeqCst) {
            return Err(BridgeError::Bus("local bus refused context creation".to_string()));
        }
        self.inner.contexts_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(LocalContext {
            bus: Arc::clone(&self.inner),
            shut_down: false,
        }))
    }
}

struct LocalContext {
    bus: Arc<LocalBusInner>,
    shut_down: bool,
}

impl BusContext for LocalContext {
    fn create_node(&mut self, name: &str, namespace: &str) -> Result<Arc<dyn BusNode>> {
        if self.shut_down {
            return Err(BridgeError::Bus("context already shut down".to_string()));
        }
        if self.bus.fail_node.load(Ordering::SeqCst) {
            return Err(BridgeError::Bus(format!("local bus refused node {}", name)));
        }

        self.bus.nodes_created.fetch_add(1, Ordering::SeqCst);
        self.bus.nodes_alive.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(LocalNode {
            name: name.to_string(),
            namespace: namespace.to_string(),
            bus: Arc::clone(&self.bus),
        }))
    }

    fn shutdown(&mut self, reason: &str) -> Result<()> {
        if !self.shut_down {
            tracing::debug!("Local bus context shut down: {}", reason);
            self.shut_down = true;
            self.bus.contexts_shut_down.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

struct LocalNode {
    name: String,
    namespace: String,
    bus: Arc<LocalBusInner>,
}

impl Drop for LocalNode {
    fn drop(&mut self) {
        self.bus.nodes_alive.fetch_sub(1, Ordering::SeqCst);
    }
}

impl BusNode for LocalNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn clock(&self) -> Arc<dyn BusClock> {
        Arc::clone(&self.bus.clock)
    }

    fn create_publisher(&self, topic: &str) -> Result<Box<dyn Publisher>> {
        Ok(Box::new(LocalPublisher {
            topic: resolve_topic(&self.namespace, topic),
            bus: Arc::clone(&self.bus),
        }))
    }

    fn create_subscription(&self, topic: &str) -> Result<Box<dyn Subscription>> {
        let topic = resolve_topic(&self.namespace, topic);
        Ok(Box::new(self.bus.subscribe(&topic)))
    }

    fn spin_once(&self, timeout: Duration) -> Result<()> {
        // Nothing runs in the background in-process; just yield the slice.
        self.bus.spins.fetch_add(1, Ordering::SeqCst);
        if !timeout.is_zero() {
            std::thread::sleep(timeout);
        }
        Ok(())
    }
}

struct LocalPublisher {
    topic: String,
    bus: Arc<LocalBusInner>,
}

impl Publisher for LocalPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn publish(&self, message: BusMessage) -> Result<()> {
        let delivered = self.bus.publish(&self.topic, message);
        tracing::trace!("[{}] delivered to {} subscribers", self.topic, delivered);
        Ok(())
    }
}

pub struct LocalSubscription {
    topic: String,
    id: u64,
    rx: Receiver<BusMessage>,
    bus: Weak<LocalBusInner>,
}

impl Drop for LocalSubscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(&self.topic, self.id);
        }
    }
}

impl Subscription for LocalSubscription {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn try_next(&self) -> Option<BusMessage> {
        self.rx.try_recv().ok()
    }

    fn next_timeout(&self, timeout: Duration) -> Option<BusMessage> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{CompressedImageMessage, Header};
    use crate::clocks::ClockType;
    use crate::translate::BusTime;
    use bytes::Bytes;

    fn message(nanos: i64) -> BusMessage {
        BusMessage::CompressedImage(CompressedImageMessage {
            header: Header {
                stamp: BusTime::new(nanos, ClockType::SystemTime),
                frame_id: String::new(),
            },
            format: "h264".to_string(),
            data: Bytes::from_static(b"nal"),
        })
    }

    #[test]
    fn test_topic_resolution() {
        assert_eq!(resolve_topic("", "image"), "/image");
        assert_eq!(resolve_topic("/robot", "image"), "/robot/image");
        assert_eq!(resolve_topic("/robot", "/image"), "/image");
    }

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let bus = LocalBus::new();
        let first = bus.subscribe("/image");
        let second = bus.subscribe("/image");
        let other = bus.subscribe("/audio");

        assert_eq!(bus.publish("/image", message(1)), 2);
        assert_eq!(first.try_next(), Some(message(1)));
        assert_eq!(second.try_next(), Some(message(1)));
        assert_eq!(other.try_next(), None);
    }

    #[test]
    fn test_publish_without_subscribers_is_dropped() {
        let bus = LocalBus::new();
        assert_eq!(bus.publish("/nobody", message(1)), 0);

        let late = bus.subscribe("/nobody");
        assert_eq!(late.try_next(), None);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let bus = LocalBus::new();
        let kept = bus.subscribe("/image");
        drop(bus.subscribe("/image"));

        assert_eq!(bus.publish("/image", message(1)), 1);
        assert!(kept.try_next().is_some());
    }

    #[test]
    fn test_unpublished_topic_does_not_accumulate_subscribers() {
        let bus = LocalBus::new();
        for _ in 0..100 {
            drop(bus.subscribe("/quiet"));
        }
        assert_eq!(bus.subscriber_count("/quiet"), 0);

        let kept = bus.subscribe("/quiet");
        drop(bus.subscribe("/quiet"));
        assert_eq!(bus.subscriber_count("/quiet"), 1);
        drop(kept);
        assert_eq!(bus.subscriber_count("/quiet"), 0);
    }

    #[test]
    fn test_node_publisher_uses_namespace() {
        let bus = LocalBus::new();
        let observer = bus.subscribe("/robot/image");

        let mut context = bus.create_context().unwrap();
        let node = context.create_node("camera", "/robot").unwrap();
        let publisher = node.create_publisher("image").unwrap();
        assert_eq!(publisher.topic(), "/robot/image");

        publisher.publish(message(7)).unwrap();
        assert_eq!(
            observer.next_timeout(Duration::from_millis(100)),
            Some(message(7))
        );
    }

    #[test]
    fn test_node_lifetime_accounting() {
        let bus = LocalBus::new();
        let mut context = bus.create_context().unwrap();
        let node = context.create_node("n", "").unwrap();
        assert_eq!((bus.nodes_created(), bus.nodes_alive()), (1, 1));

        drop(node);
        context.shutdown("test").unwrap();
        context.shutdown("test again").unwrap();
        assert_eq!(bus.nodes_alive(), 0);
        assert_eq!(bus.contexts_shut_down(), 1);
        assert!(context.create_node("n", "").is_err());
    }

    #[test]
    fn test_forced_failures() {
        let bus = LocalBus::new();
        bus.fail_context_creation(true);
        assert!(bus.create_context().is_err());

        bus.fail_context_creation(false);
        bus.fail_node_creation(true);
        let mut context = bus.create_context().unwrap();
        assert!(context.create_node("n", "").is_err());
        assert_eq!(bus.nodes_created(), 0);
    }
}
