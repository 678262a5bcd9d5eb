// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dependencies shared by every message-handling cycle.

use std::sync::Arc;

use pcount_config::FailurePolicy;
use pcount_core::types::Disposition;
use pcount_core::ResultPublisher;

use crate::engine::CountingEngine;

/// Everything the request listener needs, built once at startup and
/// passed by reference into each handling cycle.
pub struct WorkerContext {
    pub engine: Arc<CountingEngine>,
    pub publisher: Arc<dyn ResultPublisher>,
    pub failure_policy: FailurePolicy,
}

impl WorkerContext {
    pub fn new(engine: Arc<CountingEngine>, publisher: Arc<dyn ResultPublisher>) -> Self {
        Self {
            engine,
            publisher,
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// How a request that could not be counted or published is settled.
    ///
    /// Never `Requeue`: a failing request must not block the queue behind it.
    pub fn failure_disposition(&self) -> Disposition {
        match self.failure_policy {
            FailurePolicy::Acknowledge => Disposition::Ack,
            FailurePolicy::DeadLetter => Disposition::Reject,
        }
    }
}
