// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confirmed publisher for counting results.

use async_trait::async_trait;
use lapin::options::BasicPublishOptions;
use lapin::{BasicProperties, Channel};
use tracing::debug;

use pcount_core::traits::adapter::PluginAdapter;
use pcount_core::traits::publisher::ResultPublisher;
use pcount_core::types::{AdapterType, CountingResult, HealthStatus};
use pcount_core::PcountError;
use pcount_worker::codec::encode_result;

const PERSISTENT: u8 = 2;

/// Publishes results to the default exchange, routed by queue name.
pub struct AmqpResultPublisher {
    channel: Channel,
    routing_key: String,
}

impl AmqpResultPublisher {
    pub(crate) fn new(channel: Channel, result_queue: &str) -> Self {
        Self {
            channel,
            routing_key: result_queue.to_string(),
        }
    }
}

/// Message properties for a published result: persistent JSON.
pub fn result_properties() -> BasicProperties {
    BasicProperties::default()
        .with_delivery_mode(PERSISTENT)
        .with_content_type("application/json".into())
}

fn publish_error(context: &str, e: lapin::Error) -> PcountError {
    PcountError::Publish {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl PluginAdapter for AmqpResultPublisher {
    fn name(&self) -> &str {
        "amqp-publisher"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Publisher
    }

    async fn health_check(&self) -> Result<HealthStatus, PcountError> {
        if self.channel.status().connected() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy(
                "publish channel is not connected".into(),
            ))
        }
    }

    async fn shutdown(&self) -> Result<(), PcountError> {
        Ok(())
    }
}

#[async_trait]
impl ResultPublisher for AmqpResultPublisher {
    async fn publish(&self, result: &CountingResult) -> Result<(), PcountError> {
        let payload = encode_result(result)?;

        let confirmation = self
            .channel
            .basic_publish(
                "",
                &self.routing_key,
                BasicPublishOptions::default(),
                &payload,
                result_properties(),
            )
            .await
            .map_err(|e| publish_error("failed to publish result", e))?
            .await
            .map_err(|e| publish_error("failed to confirm result", e))?;

        if confirmation.is_nack() {
            return Err(PcountError::Publish {
                message: format!("broker refused result for lecture {}", result.lecture_id),
                source: None,
            });
        }

        debug!(
            lecture_id = %result.lecture_id,
            queue = %self.routing_key,
            bytes = payload.len(),
            "result confirmed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_are_persistent_json() {
        let props = result_properties();
        assert_eq!(props.delivery_mode(), &Some(PERSISTENT));
        assert_eq!(
            props.content_type().as_ref().map(|s| s.as_str()),
            Some("application/json")
        );
    }

    #[test]
    fn publish_error_is_publish_kind() {
        let err = publish_error("failed to publish result", lapin::Error::ChannelsLimitReached);
        assert_eq!(err.kind(), "publish");
    }
}
