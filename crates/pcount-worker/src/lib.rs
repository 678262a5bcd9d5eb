// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counting pipeline for the pcount worker.
//!
//! The [`Worker`] is the consume loop that:
//! - Pulls one delivery at a time from a [`QueueConsumer`]
//! - Hands the payload to the request listener, which decodes it, runs the
//!   [`CountingEngine`], and publishes the result
//! - Settles the delivery according to the listener's [`Disposition`]
//! - Stops between deliveries when the shutdown token is cancelled

pub mod codec;
pub mod context;
pub mod engine;
pub mod listener;
pub mod shutdown;

use std::sync::Arc;

use pcount_core::error::PcountError;
use pcount_core::types::{Delivery, Disposition};
use pcount_core::QueueConsumer;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use context::WorkerContext;
pub use engine::CountingEngine;
pub use listener::handle_request;

/// Counters describing what a [`Worker::run`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub handled: u64,
    pub acked: u64,
    pub rejected: u64,
    pub requeued: u64,
}

impl WorkerStats {
    fn record(&mut self, disposition: Disposition) {
        self.handled += 1;
        match disposition {
            Disposition::Ack => self.acked += 1,
            Disposition::Reject => self.rejected += 1,
            Disposition::Requeue => self.requeued += 1,
        }
    }
}

/// Sequential consume loop: one message is fully handled before the next is taken.
pub struct Worker {
    consumer: Box<dyn QueueConsumer>,
    context: Arc<WorkerContext>,
}

impl Worker {
    pub fn new(consumer: Box<dyn QueueConsumer>, context: Arc<WorkerContext>) -> Self {
        Self { consumer, context }
    }

    /// Runs until the consumer closes or `cancel` fires, then shuts the
    /// consumer down.
    ///
    /// Consumer and settlement errors end the loop with `Err`: they mean the
    /// broker channel is gone and the process should be restarted.
    pub async fn run(&self, cancel: CancellationToken) -> Result<WorkerStats, PcountError> {
        info!(consumer = self.consumer.name(), "worker running");
        let mut stats = WorkerStats::default();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping worker");
                    break;
                }
                next = self.consumer.next() => next,
            };

            match next {
                Ok(Some(delivery)) => {
                    let disposition = self.process(delivery).await?;
                    stats.record(disposition);
                }
                Ok(None) => {
                    info!("consumer closed, stopping worker");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "failed to receive delivery");
                    return Err(e);
                }
            }
        }

        // Cancel the subscription so the broker stops pushing deliveries.
        if let Err(e) = self.consumer.shutdown().await {
            warn!(error = %e, "failed to stop consumer");
        }

        info!(
            handled = stats.handled,
            acked = stats.acked,
            rejected = stats.rejected,
            requeued = stats.requeued,
            "worker stopped"
        );
        Ok(stats)
    }

    async fn process(&self, delivery: Delivery) -> Result<Disposition, PcountError> {
        debug!(
            tag = delivery.tag,
            redelivered = delivery.redelivered,
            bytes = delivery.payload.len(),
            "received message"
        );

        let disposition = match handle_request(&delivery.payload, &self.context).await {
            Ok(disposition) => disposition,
            Err(e) => {
                let disposition = self.context.failure_disposition();
                error!(
                    error = %e,
                    kind = e.kind(),
                    payload = %String::from_utf8_lossy(&delivery.payload),
                    disposition = %disposition,
                    "error while processing message"
                );
                disposition
            }
        };

        self.consumer.settle(delivery.tag, disposition).await?;
        debug!(tag = delivery.tag, disposition = %disposition, "delivery settled");
        Ok(disposition)
    }
}
