// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;
use std::time::Duration;

use super::BusMessage;
use crate::clocks::BusClock;
use crate::error::Result;

/// Entry point into a messaging substrate. Shared by all elements.
pub trait MessagingSubstrate: Send + Sync {
    /// Create an isolated execution context for one endpoint.
    fn create_context(&self) -> Result<Box<dyn BusContext>>;
}

/// Execution context owning the nodes created in it.
pub trait BusContext: Send {
    fn create_node(&mut self, name: &str, namespace: &str) -> Result<Arc<dyn BusNode>>;

    /// Tear the context down. Must tolerate being called more than once.
    fn shutdown(&mut self, reason: &str) -> Result<()>;
}

/// A named participant on the bus.
pub trait BusNode: Send + Sync {
    fn name(&self) -> &str;

    fn namespace(&self) -> &str;

    /// The node's clock; stamps published from this node are in its domain.
    fn clock(&self) -> Arc<dyn BusClock>;

    fn create_publisher(&self, topic: &str) -> Result<Box<dyn Publisher>>;

    fn create_subscription(&self, topic: &str) -> Result<Box<dyn Subscription>>;

    /// Run pending background work (parameter callbacks, discovery, ...),
    /// waiting at most `timeout` for some to arrive.
    fn spin_once(&self, timeout: Duration) -> Result<()>;
}

pub trait Publisher: Send {
    /// Fully resolved topic name.
    fn topic(&self) -> &str;

    fn publish(&self, message: BusMessage) -> Result<()>;
}

pub trait Subscription: Send {
    fn topic(&self) -> &str;

    fn try_next(&self) -> Option<BusMessage>;

    fn next_timeout(&self, timeout: Duration) -> Option<BusMessage>;
}
