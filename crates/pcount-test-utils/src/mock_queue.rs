// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock queue consumer for deterministic testing.
//!
//! `MockQueue` implements `QueueConsumer` with injectable deliveries and a
//! record of every settlement for assertion in tests. Settlement follows
//! broker semantics: a requeued delivery goes back to the head of the queue.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use pcount_core::traits::adapter::PluginAdapter;
use pcount_core::traits::queue::QueueConsumer;
use pcount_core::types::{AdapterType, Delivery, Disposition, HealthStatus};
use pcount_core::PcountError;

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Delivery>,
    in_flight: HashMap<u64, Delivery>,
    settled: Vec<(u64, Disposition)>,
    next_tag: u64,
    closed: bool,
    shut_down: bool,
}

impl QueueState {
    fn take_tag(&mut self) -> u64 {
        let tag = self.next_tag;
        self.next_tag += 1;
        tag
    }
}

/// A mock request queue.
///
/// - **pending**: payloads injected via `push()` are returned by `next()`
///   in order, each with a fresh delivery tag
/// - **settled**: every `settle()` call is captured and retrievable via `settled()`
/// - **requeue**: a `Requeue` settlement puts the payload back at the head
///   of the queue under a new tag with `redelivered` set
///
/// Once `close()` is called, `next()` returns `None` after the pending
/// deliveries are drained.
#[derive(Clone)]
pub struct MockQueue {
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
}

impl MockQueue {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                next_tag: 1,
                ..QueueState::default()
            })),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Enqueue a payload and return the delivery tag it will carry.
    pub async fn push(&self, payload: impl Into<Vec<u8>>) -> u64 {
        let mut state = self.state.lock().await;
        let tag = state.take_tag();
        state.pending.push_back(Delivery {
            tag,
            payload: payload.into(),
            redelivered: false,
        });
        drop(state);
        self.notify.notify_one();
        tag
    }

    /// Enqueue a JSON value.
    pub async fn push_json(&self, value: serde_json::Value) -> u64 {
        self.push(value.to_string()).await
    }

    /// Stop handing out deliveries once the pending ones are drained.
    pub async fn close(&self) {
        self.state.lock().await.closed = true;
        self.notify.notify_one();
    }

    /// Every settlement so far, in call order.
    pub async fn settled(&self) -> Vec<(u64, Disposition)> {
        self.state.lock().await.settled.clone()
    }

    /// Deliveries not yet handed out.
    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Whether `shutdown()` has been called.
    pub async fn is_shut_down(&self) -> bool {
        self.state.lock().await.shut_down
    }
}

impl Default for MockQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockQueue {
    fn name(&self) -> &str {
        "mock-queue"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Consumer
    }

    async fn health_check(&self) -> Result<HealthStatus, PcountError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PcountError> {
        self.state.lock().await.shut_down = true;
        self.close().await;
        Ok(())
    }
}

#[async_trait]
impl QueueConsumer for MockQueue {
    async fn next(&self) -> Result<Option<Delivery>, PcountError> {
        loop {
            {
                let mut state = self.state.lock().await;
                if let Some(delivery) = state.pending.pop_front() {
                    state.in_flight.insert(delivery.tag, delivery.clone());
                    return Ok(Some(delivery));
                }
                if state.closed {
                    return Ok(None);
                }
            }
            self.notify.notified().await;
        }
    }

    async fn settle(&self, tag: u64, disposition: Disposition) -> Result<(), PcountError> {
        let mut state = self.state.lock().await;
        let Some(delivery) = state.in_flight.remove(&tag) else {
            return Err(PcountError::Broker {
                message: format!("delivery {tag} is unknown or already settled"),
                source: None,
            });
        };
        state.settled.push((tag, disposition));

        if disposition == Disposition::Requeue {
            let tag = state.take_tag();
            state.pending.push_front(Delivery {
                tag,
                redelivered: true,
                ..delivery
            });
            drop(state);
            self.notify.notify_one();
        }
        Ok(())
    }
}
