// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock result publisher that captures everything it is asked to publish.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use pcount_core::traits::adapter::PluginAdapter;
use pcount_core::traits::publisher::ResultPublisher;
use pcount_core::types::{AdapterType, CountingResult, HealthStatus};
use pcount_core::PcountError;

pub struct MockPublisher {
    published: Mutex<Vec<CountingResult>>,
    attempts: AtomicUsize,
    fail: bool,
    failing_lectures: HashSet<String>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            fail: false,
            failing_lectures: HashSet::new(),
        }
    }

    /// A publisher whose every publish fails with a publish error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Fail only results for `lecture_id`; others are accepted.
    pub fn failing_for(mut self, lecture_id: &str) -> Self {
        self.failing_lectures.insert(lecture_id.to_string());
        self
    }

    /// Results accepted so far.
    pub fn published(&self) -> Vec<CountingResult> {
        self.published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Publish calls so far, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockPublisher {
    fn name(&self) -> &str {
        "mock-publisher"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Publisher
    }

    async fn health_check(&self) -> Result<HealthStatus, PcountError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PcountError> {
        Ok(())
    }
}

#[async_trait]
impl ResultPublisher for MockPublisher {
    async fn publish(&self, result: &CountingResult) -> Result<(), PcountError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail || self.failing_lectures.contains(&result.lecture_id) {
            return Err(PcountError::Publish {
                message: "mock publish failure".to_string(),
                source: None,
            });
        }
        self.published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(result.clone());
        Ok(())
    }
}
