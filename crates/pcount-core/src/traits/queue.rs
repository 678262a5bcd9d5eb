// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue consumer trait for the inbound request queue.

use async_trait::async_trait;

use crate::error::PcountError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Delivery, Disposition};

/// Source of inbound deliveries with manual settlement.
///
/// Every delivery returned by [`next`](QueueConsumer::next) must be settled
/// exactly once via [`settle`](QueueConsumer::settle).
#[async_trait]
pub trait QueueConsumer: PluginAdapter {
    /// Waits for the next delivery. `Ok(None)` means the consumer was closed.
    async fn next(&self) -> Result<Option<Delivery>, PcountError>;

    /// Settles a previously received delivery.
    async fn settle(&self, tag: u64, disposition: Disposition) -> Result<(), PcountError>;
}
