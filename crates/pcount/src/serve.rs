// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pcount serve` command implementation.
//!
//! Wires the adapters into a [`Worker`] and runs it until a shutdown
//! signal arrives or the broker closes the consumer.

use std::sync::Arc;

use tracing::{error, info, warn};

use pcount_amqp::AmqpBroker;
use pcount_config::PcountConfig;
use pcount_core::{PcountError, PluginAdapter};
use pcount_detector::RustfaceDetector;
use pcount_image::HttpImageSource;
use pcount_prometheus::PrometheusAdapter;
use pcount_worker::shutdown::install_signal_handler;
use pcount_worker::{CountingEngine, Worker, WorkerContext};

pub async fn run_serve(config: PcountConfig) -> Result<(), PcountError> {
    init_tracing(&config.worker.log_level);

    info!(worker = %config.worker.name, "starting pcount serve");

    let prometheus = if config.prometheus.enabled {
        Some(PrometheusAdapter::install(&config.prometheus.listen_address)?)
    } else {
        None
    };

    // Load the model before touching the broker so a bad path fails fast.
    let detector = Arc::new(RustfaceDetector::from_config(&config.detector)?);
    let images = Arc::new(HttpImageSource::new(&config.image)?);

    let broker = AmqpBroker::connect(&config.broker, &config.failure).await?;
    let publisher = Arc::new(broker.publisher());
    let consumer = broker.consumer().await?;

    let engine = CountingEngine::new(images.clone(), detector.clone())
        .with_fetch_concurrency(config.engine.fetch_concurrency);
    let context = WorkerContext::new(Arc::new(engine), publisher.clone())
        .with_failure_policy(config.failure.policy);
    let worker = Worker::new(Box::new(consumer), Arc::new(context));

    let cancel = install_signal_handler();
    let outcome = worker.run(cancel).await;

    if let Err(e) = &outcome {
        error!(error = %e, "worker stopped on broker failure");
    }

    let mut adapters: Vec<&dyn PluginAdapter> =
        vec![images.as_ref(), detector.as_ref(), publisher.as_ref()];
    if let Some(prometheus) = &prometheus {
        adapters.push(prometheus);
    }
    for adapter in adapters {
        if let Err(e) = adapter.shutdown().await {
            warn!(adapter = adapter.name(), error = %e, "adapter shutdown failed");
        }
    }

    if let Err(e) = broker.close().await {
        warn!(error = %e, "failed to close broker connection");
    }

    outcome?;
    info!("pcount serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pcount={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
