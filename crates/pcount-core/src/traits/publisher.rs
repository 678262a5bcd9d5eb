// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result publisher trait.

use async_trait::async_trait;

use crate::error::PcountError;
use crate::traits::adapter::PluginAdapter;
use crate::types::CountingResult;

/// Emits counting results to the downstream result queue.
#[async_trait]
pub trait ResultPublisher: PluginAdapter {
    /// Serializes and delivers `result`.
    ///
    /// Fails with [`PcountError::Publish`] when the broker does not accept it.
    async fn publish(&self, result: &CountingResult) -> Result<(), PcountError>;
}
