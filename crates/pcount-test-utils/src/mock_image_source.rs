// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock image source adapter.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use pcount_core::traits::adapter::PluginAdapter;
use pcount_core::traits::image_source::ImageSource;
use pcount_core::types::{AdapterType, HealthStatus, PixelData};
use pcount_core::PcountError;

/// Builds a tiny image whose width encodes `tag`, so distinct tags give
/// distinct pixel data that a [`MockFaceDetector`](crate::MockFaceDetector)
/// can recognise.
pub fn tagged_pixels(tag: u32) -> PixelData {
    let width = tag + 1;
    PixelData::new(width, 1, vec![0; width as usize * 3])
        .unwrap_or_else(|_| unreachable!("buffer sized from width"))
}

/// An image source that serves pre-registered pixel data by URL.
///
/// Unregistered URLs fail with a fetch error, as do URLs marked with
/// [`failing_on`](Self::failing_on). Every call is recorded in order.
pub struct MockImageSource {
    images: HashMap<String, PixelData>,
    failures: HashSet<String>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockImageSource {
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
            failures: HashSet::new(),
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Serve `pixels` for `url`.
    pub fn with_image(mut self, url: &str, pixels: PixelData) -> Self {
        self.images.insert(url.to_string(), pixels);
        self
    }

    /// Fail every fetch of `url`.
    pub fn failing_on(mut self, url: &str) -> Self {
        self.failures.insert(url.to_string());
        self
    }

    /// Sleep for `delay` before answering a fetch of `url`.
    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    /// URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for MockImageSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockImageSource {
    fn name(&self) -> &str {
        "mock-image-source"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ImageSource
    }

    async fn health_check(&self) -> Result<HealthStatus, PcountError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PcountError> {
        Ok(())
    }
}

#[async_trait]
impl ImageSource for MockImageSource {
    async fn fetch(&self, url: &str) -> Result<PixelData, PcountError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());

        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }

        if self.failures.contains(url) {
            return Err(PcountError::fetch(url, "mock fetch failure"));
        }

        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| PcountError::fetch(url, "no image registered for url"))
    }
}
