// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock face detector adapter.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use pcount_core::traits::adapter::PluginAdapter;
use pcount_core::traits::detector::FaceDetector;
use pcount_core::types::{AdapterType, BoundingBox, HealthStatus, PixelData};
use pcount_core::PcountError;

/// A face detector that returns a configured number of boxes per image.
///
/// Images with no configured count yield zero faces.
pub struct MockFaceDetector {
    faces: Vec<(PixelData, usize)>,
    failures: Vec<PixelData>,
    calls: AtomicUsize,
}

impl MockFaceDetector {
    pub fn new() -> Self {
        Self {
            faces: Vec::new(),
            failures: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Report `count` faces whenever `pixels` is passed in.
    pub fn with_faces(mut self, pixels: PixelData, count: usize) -> Self {
        self.faces.push((pixels, count));
        self
    }

    /// Fail detection whenever `pixels` is passed in.
    pub fn failing_on(mut self, pixels: PixelData) -> Self {
        self.failures.push(pixels);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockFaceDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockFaceDetector {
    fn name(&self) -> &str {
        "mock-face-detector"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::FaceDetector
    }

    async fn health_check(&self) -> Result<HealthStatus, PcountError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PcountError> {
        Ok(())
    }
}

#[async_trait]
impl FaceDetector for MockFaceDetector {
    async fn detect(&self, pixels: &PixelData) -> Result<Vec<BoundingBox>, PcountError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failures.contains(pixels) {
            return Err(PcountError::detection("mock detection failure"));
        }

        let count = self
            .faces
            .iter()
            .find(|(p, _)| p == pixels)
            .map(|(_, count)| *count)
            .unwrap_or(0);

        // Non-overlapping boxes along the diagonal.
        Ok((0..count as i32)
            .map(|i| BoundingBox {
                top: i * 10,
                right: i * 10 + 10,
                bottom: i * 10 + 10,
                left: i * 10,
                confidence: Some(1.0),
            })
            .collect())
    }
}
