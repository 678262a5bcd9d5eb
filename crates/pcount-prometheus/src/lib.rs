// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics exporter for the pcount worker.
//!
//! Recording goes through the metrics-rs facade, so the helpers in
//! [`recording`] are no-ops until [`PrometheusAdapter::install`] has put a
//! recorder in place. The exporter serves the text format over its own
//! HTTP listener.

pub mod recording;

use std::net::SocketAddr;

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusBuilder;

use pcount_core::traits::adapter::PluginAdapter;
use pcount_core::types::{AdapterType, HealthStatus};
use pcount_core::PcountError;

pub use recording::{record_faces, record_request, record_request_duration, register_metrics};

/// Prometheus exporter bound to a scrape address.
pub struct PrometheusAdapter {
    listen_address: SocketAddr,
}

impl PrometheusAdapter {
    /// Install the global recorder and start the scrape listener.
    ///
    /// Must run inside a tokio runtime. Only one recorder can be installed
    /// per process; a second call returns an error.
    pub fn install(listen_address: &str) -> Result<Self, PcountError> {
        let addr = parse_listen_address(listen_address)?;

        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| {
                PcountError::Internal(format!("failed to install Prometheus recorder: {e}"))
            })?;

        register_metrics();

        tracing::info!(listen_address = %addr, "prometheus exporter listening");

        Ok(Self {
            listen_address: addr,
        })
    }

    pub fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }
}

fn parse_listen_address(raw: &str) -> Result<SocketAddr, PcountError> {
    raw.parse()
        .map_err(|e| PcountError::Config(format!("invalid prometheus listen address {raw:?}: {e}")))
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, PcountError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PcountError> {
        Ok(())
    }
}
