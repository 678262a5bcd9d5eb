// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all pipeline adapters must implement.

use async_trait::async_trait;

use crate::error::PcountError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all pcount adapters.
///
/// Provides identity, lifecycle, and health check capabilities used by
/// `pcount doctor` and by graceful shutdown.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the role this adapter plays in the pipeline.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, PcountError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), PcountError>;
}
