// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end worker tests.
//!
//! `TestHarness` wires a [`Worker`] to mock adapters so tests can push raw
//! payloads, drain the queue, and inspect what was published and how each
//! delivery was settled.

use std::sync::Arc;

use pcount_config::FailurePolicy;
use pcount_core::types::{CountingResult, Disposition};
use pcount_core::PcountError;
use pcount_worker::{CountingEngine, Worker, WorkerContext, WorkerStats};
use tokio_util::sync::CancellationToken;

use crate::mock_detector::MockFaceDetector;
use crate::mock_image_source::MockImageSource;
use crate::mock_publisher::MockPublisher;
use crate::mock_queue::MockQueue;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    images: MockImageSource,
    detector: MockFaceDetector,
    publisher: MockPublisher,
    failure_policy: FailurePolicy,
    fetch_concurrency: usize,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            images: MockImageSource::new(),
            detector: MockFaceDetector::new(),
            publisher: MockPublisher::new(),
            failure_policy: FailurePolicy::Acknowledge,
            fetch_concurrency: 1,
        }
    }

    pub fn with_images(mut self, images: MockImageSource) -> Self {
        self.images = images;
        self
    }

    pub fn with_detector(mut self, detector: MockFaceDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_publisher(mut self, publisher: MockPublisher) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_fetch_concurrency(mut self, n: usize) -> Self {
        self.fetch_concurrency = n;
        self
    }

    pub fn build(self) -> TestHarness {
        let images = Arc::new(self.images);
        let detector = Arc::new(self.detector);
        let publisher = Arc::new(self.publisher);
        let queue = MockQueue::new();

        let engine = CountingEngine::new(images.clone(), detector.clone())
            .with_fetch_concurrency(self.fetch_concurrency);
        let context = Arc::new(
            WorkerContext::new(Arc::new(engine), publisher.clone())
                .with_failure_policy(self.failure_policy),
        );
        let worker = Worker::new(Box::new(queue.clone()), context);

        TestHarness {
            images,
            detector,
            publisher,
            queue,
            worker,
        }
    }
}

/// A complete worker wired to mock adapters.
pub struct TestHarness {
    pub images: Arc<MockImageSource>,
    pub detector: Arc<MockFaceDetector>,
    pub publisher: Arc<MockPublisher>,
    pub queue: MockQueue,
    worker: Worker,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Close the queue and run the worker until every pending delivery is handled.
    pub async fn drain(&self) -> Result<WorkerStats, PcountError> {
        self.queue.close().await;
        self.worker.run(CancellationToken::new()).await
    }

    /// Run the worker until `cancel` fires or the queue closes.
    pub async fn run(&self, cancel: CancellationToken) -> Result<WorkerStats, PcountError> {
        self.worker.run(cancel).await
    }

    /// Push one payload, drain, and return its disposition and anything published.
    pub async fn process(
        &self,
        payload: impl Into<Vec<u8>>,
    ) -> Result<(Disposition, Vec<CountingResult>), PcountError> {
        let tag = self.queue.push(payload).await;
        self.drain().await?;
        let disposition = self
            .queue
            .settled()
            .await
            .into_iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, d)| d)
            .ok_or_else(|| PcountError::Internal(format!("delivery {tag} was never settled")))?;
        Ok((disposition, self.publisher.published()))
    }
}
