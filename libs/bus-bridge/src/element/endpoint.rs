// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Messaging-side endpoint: execution context, node, and the node's
//! service thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::Span;

use crate::bus::{BusContext, BusNode, MessagingSubstrate};
use crate::clocks::BusClock;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};

/// Keeps a node spinning on its own thread until stopped.
struct ServiceThread {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ServiceThread {
    fn spawn(node: Arc<dyn BusNode>, interval: Duration, span: Span) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);

        let handle = std::thread::Builder::new()
            .name(format!("{}-service", node.name()))
            .spawn(move || {
                let _enter = span.enter();
                tracing::debug!("Node service thread started");
                while running_clone.load(Ordering::Acquire) {
                    if let Err(e) = node.spin_once(interval) {
                        tracing::warn!("Node service spin failed: {}", e);
                        std::thread::sleep(interval);
                    }
                }
                tracing::debug!("Node service thread exiting");
            })
            .map_err(|e| {
                BridgeError::ActivationFailure(format!("failed to spawn node service thread: {}", e))
            })?;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Node service thread panicked");
            }
        }
    }
}

impl Drop for ServiceThread {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Node plus the context it lives in. At most one per element.
pub struct Endpoint {
    context: Box<dyn BusContext>,
    node: Arc<dyn BusNode>,
    clock: Arc<dyn BusClock>,
    service: Option<ServiceThread>,
}

impl Endpoint {
    /// Create the execution context and node. Partially created resources
    /// are released before an error is returned.
    pub(crate) fn open(substrate: &dyn MessagingSubstrate, config: &BridgeConfig) -> Result<Self> {
        let mut context = substrate.create_context().map_err(|e| {
            BridgeError::ActivationFailure(format!("failed to create bus context: {}", e))
        })?;

        let node = match context.create_node(&config.node_name, &config.node_namespace) {
            Ok(node) => node,
            Err(e) => {
                if let Err(shutdown_err) = context.shutdown("bridge activation failed") {
                    tracing::warn!("Bus context shutdown failed: {}", shutdown_err);
                }
                return Err(BridgeError::ActivationFailure(format!(
                    "failed to create node {:?} in namespace {:?}: {}",
                    config.node_name, config.node_namespace, e
                )));
            }
        };

        let clock = node.clock();
        Ok(Self {
            context,
            node,
            clock,
            service: None,
        })
    }

    pub(crate) fn start_service(&mut self, interval: Duration, span: Span) -> Result<()> {
        if self.service.is_none() {
            self.service = Some(ServiceThread::spawn(Arc::clone(&self.node), interval, span)?);
        }
        Ok(())
    }

    pub fn node(&self) -> &Arc<dyn BusNode> {
        &self.node
    }

    pub fn clock(&self) -> &Arc<dyn BusClock> {
        &self.clock
    }

    /// Stop servicing, destroy the node, shut the context down. Always
    /// completes; failures are logged.
    pub(crate) fn close(mut self, reason: &str) {
        if let Some(mut service) = self.service.take() {
            service.stop();
        }

        let Self {
            mut context,
            node,
            clock,
            ..
        } = self;
        drop(clock);
        drop(node);

        if let Err(e) = context.shutdown(reason) {
            tracing::warn!("Bus context shutdown failed: {}", e);
        }
    }
}
