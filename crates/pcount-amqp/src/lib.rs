// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AMQP plumbing for the pcount worker.
//!
//! [`AmqpBroker::connect`] opens one connection with two channels: one
//! for consuming counting requests with manual acknowledgement, one in
//! confirm mode for publishing results. Both queues are declared durable.

pub mod consumer;
pub mod publisher;

use lapin::options::{BasicQosOptions, ConfirmSelectOptions, QueueDeclareOptions};
use lapin::types::{AMQPValue, FieldTable};
use lapin::{Channel, Connection, ConnectionProperties};
use tracing::{debug, info};

use pcount_config::model::{BrokerConfig, FailureConfig, FailurePolicy};
use pcount_core::PcountError;

pub use consumer::AmqpConsumer;
pub use publisher::AmqpResultPublisher;

const DEAD_LETTER_EXCHANGE_ARG: &str = "x-dead-letter-exchange";

/// An open broker connection with the request and result queues declared.
pub struct AmqpBroker {
    connection: Connection,
    consume_channel: Channel,
    publish_channel: Channel,
    config: BrokerConfig,
}

impl AmqpBroker {
    pub async fn connect(
        broker: &BrokerConfig,
        failure: &FailureConfig,
    ) -> Result<Self, PcountError> {
        let connection = Connection::connect(&broker.url, ConnectionProperties::default())
            .await
            .map_err(|e| broker_error("failed to connect to broker", e))?;

        let consume_channel = connection
            .create_channel()
            .await
            .map_err(|e| broker_error("failed to open consume channel", e))?;
        consume_channel
            .basic_qos(broker.prefetch_count, BasicQosOptions::default())
            .await
            .map_err(|e| broker_error("failed to set prefetch count", e))?;

        let publish_channel = connection
            .create_channel()
            .await
            .map_err(|e| broker_error("failed to open publish channel", e))?;
        publish_channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| broker_error("failed to enable publisher confirms", e))?;

        declare_durable(
            &consume_channel,
            &broker.request_queue,
            request_queue_arguments(failure),
        )
        .await?;
        declare_durable(&publish_channel, &broker.result_queue, FieldTable::default()).await?;

        info!(
            request_queue = %broker.request_queue,
            result_queue = %broker.result_queue,
            prefetch_count = broker.prefetch_count,
            "connected to broker"
        );

        Ok(Self {
            connection,
            consume_channel,
            publish_channel,
            config: broker.clone(),
        })
    }

    /// Start consuming the request queue.
    pub async fn consumer(&self) -> Result<AmqpConsumer, PcountError> {
        AmqpConsumer::start(
            self.consume_channel.clone(),
            &self.config.request_queue,
            &self.config.consumer_tag,
        )
        .await
    }

    pub fn publisher(&self) -> AmqpResultPublisher {
        AmqpResultPublisher::new(self.publish_channel.clone(), &self.config.result_queue)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.status().connected()
    }

    pub async fn close(&self) -> Result<(), PcountError> {
        if !self.is_connected() {
            return Ok(());
        }
        self.connection
            .close(200, "worker shutting down")
            .await
            .map_err(|e| broker_error("failed to close connection", e))
    }
}

/// What a passive declare found for one queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueState {
    Present { messages: u32, consumers: u32 },
    Missing,
}

/// Connect and inspect both queues without declaring or changing anything.
///
/// Each queue is checked on its own channel, because a passive declare of
/// an absent queue closes the channel it ran on.
pub async fn inspect_queues(
    broker: &BrokerConfig,
) -> Result<Vec<(String, QueueState)>, PcountError> {
    let connection = Connection::connect(&broker.url, ConnectionProperties::default())
        .await
        .map_err(|e| broker_error("failed to connect to broker", e))?;

    let mut report = Vec::with_capacity(2);
    for queue in [&broker.request_queue, &broker.result_queue] {
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| broker_error("failed to open channel", e))?;
        let passive = QueueDeclareOptions {
            passive: true,
            ..QueueDeclareOptions::default()
        };
        let state = match channel.queue_declare(queue, passive, FieldTable::default()).await {
            Ok(found) => QueueState::Present {
                messages: found.message_count(),
                consumers: found.consumer_count(),
            },
            Err(e) => {
                debug!(queue = %queue, error = %e, "passive declare failed");
                QueueState::Missing
            }
        };
        report.push((queue.clone(), state));
    }

    if let Err(e) = connection.close(200, "inspection complete").await {
        debug!(error = %e, "failed to close inspection connection");
    }
    Ok(report)
}

async fn declare_durable(
    channel: &Channel,
    queue: &str,
    arguments: FieldTable,
) -> Result<(), PcountError> {
    channel
        .queue_declare(
            queue,
            QueueDeclareOptions {
                durable: true,
                ..QueueDeclareOptions::default()
            },
            arguments,
        )
        .await
        .map_err(|e| broker_error(&format!("failed to declare queue {queue}"), e))?;
    Ok(())
}

/// Arguments for the request queue declaration.
///
/// The broker rejects a redeclaration with different arguments, so
/// switching policy on an existing queue requires deleting it first.
pub fn request_queue_arguments(failure: &FailureConfig) -> FieldTable {
    let mut args = FieldTable::default();
    if failure.policy == FailurePolicy::DeadLetter
        && let Some(exchange) = &failure.dead_letter_exchange
    {
        args.insert(
            DEAD_LETTER_EXCHANGE_ARG.into(),
            AMQPValue::LongString(exchange.clone().into()),
        );
    }
    args
}

pub(crate) fn broker_error(context: &str, e: lapin::Error) -> PcountError {
    PcountError::Broker {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}
