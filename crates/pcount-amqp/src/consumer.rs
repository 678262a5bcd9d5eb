// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manual-ack consumer over the request queue.

use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions};
use lapin::types::FieldTable;
use lapin::{Channel, Consumer};
use tokio::sync::Mutex;
use tracing::debug;

use pcount_core::traits::adapter::PluginAdapter;
use pcount_core::traits::queue::QueueConsumer;
use pcount_core::types::{AdapterType, Delivery, Disposition, HealthStatus};
use pcount_core::PcountError;

use crate::broker_error;

pub struct AmqpConsumer {
    channel: Channel,
    consumer: Mutex<Consumer>,
    consumer_tag: String,
}

impl AmqpConsumer {
    pub(crate) async fn start(
        channel: Channel,
        queue: &str,
        consumer_tag: &str,
    ) -> Result<Self, PcountError> {
        let consumer = channel
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| broker_error(&format!("failed to consume from {queue}"), e))?;

        debug!(queue, consumer_tag, "consumer started");

        Ok(Self {
            channel,
            consumer: Mutex::new(consumer),
            consumer_tag: consumer_tag.to_string(),
        })
    }
}

/// Negative-acknowledge options for a disposition, or `None` for an ack.
pub fn nack_options(disposition: Disposition) -> Option<BasicNackOptions> {
    match disposition {
        Disposition::Ack => None,
        Disposition::Reject => Some(BasicNackOptions {
            multiple: false,
            requeue: false,
        }),
        Disposition::Requeue => Some(BasicNackOptions {
            multiple: false,
            requeue: true,
        }),
    }
}

#[async_trait]
impl PluginAdapter for AmqpConsumer {
    fn name(&self) -> &str {
        "amqp-consumer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Consumer
    }

    async fn health_check(&self) -> Result<HealthStatus, PcountError> {
        if self.channel.status().connected() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy(
                "consume channel is not connected".into(),
            ))
        }
    }

    async fn shutdown(&self) -> Result<(), PcountError> {
        if !self.channel.status().connected() {
            return Ok(());
        }
        self.channel
            .basic_cancel(&self.consumer_tag, Default::default())
            .await
            .map_err(|e| broker_error("failed to cancel consumer", e))
    }
}

#[async_trait]
impl QueueConsumer for AmqpConsumer {
    async fn next(&self) -> Result<Option<Delivery>, PcountError> {
        let mut consumer = self.consumer.lock().await;
        match consumer.next().await {
            Some(Ok(delivery)) => Ok(Some(Delivery {
                tag: delivery.delivery_tag,
                payload: delivery.data,
                redelivered: delivery.redelivered,
            })),
            Some(Err(e)) => Err(broker_error("delivery stream failed", e)),
            None => Ok(None),
        }
    }

    async fn settle(&self, tag: u64, disposition: Disposition) -> Result<(), PcountError> {
        let result = match nack_options(disposition) {
            None => self.channel.basic_ack(tag, BasicAckOptions::default()).await,
            Some(options) => self.channel.basic_nack(tag, options).await,
        };
        result.map_err(|e| broker_error(&format!("failed to {disposition} delivery {tag}"), e))
    }
}
