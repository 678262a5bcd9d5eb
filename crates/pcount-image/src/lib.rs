// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP image source for the pcount worker.
//!
//! Downloads a photo over HTTP(S) and decodes it into RGB8 pixel data.
//! The format is guessed from the bytes, not from headers or the URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use pcount_config::model::ImageConfig;
use pcount_core::traits::adapter::PluginAdapter;
use pcount_core::traits::image_source::ImageSource;
use pcount_core::types::{AdapterType, HealthStatus, PixelData};
use pcount_core::PcountError;

/// Image source backed by a shared `reqwest` client.
pub struct HttpImageSource {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpImageSource {
    pub fn new(config: &ImageConfig) -> Result<Self, PcountError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PcountError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_bytes: config.max_bytes,
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, PcountError> {
        let parsed = Url::parse(url)
            .map_err(|e| PcountError::fetch(url, format!("invalid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PcountError::fetch(
                url,
                format!("unsupported scheme {:?}", parsed.scheme()),
            ));
        }

        let mut response =
            self.client
                .get(parsed)
                .send()
                .await
                .map_err(|e| PcountError::Fetch {
                    url: url.to_string(),
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

        let status = response.status();
        debug!(url, status = %status, "image response received");
        if !status.is_success() {
            return Err(PcountError::fetch(url, format!("server returned {status}")));
        }

        if let Some(length) = response.content_length()
            && length > self.max_bytes
        {
            return Err(self.too_large(url));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| PcountError::Fetch {
            url: url.to_string(),
            message: format!("failed to read body: {e}"),
            source: Some(Box::new(e)),
        })? {
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(self.too_large(url));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }

    fn too_large(&self, url: &str) -> PcountError {
        PcountError::fetch(
            url,
            format!("image body exceeds limit of {} bytes", self.max_bytes),
        )
    }
}

/// Decode an encoded image of any supported format into RGB8.
pub fn decode_pixels(url: &str, bytes: &[u8]) -> Result<PixelData, PcountError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| PcountError::Fetch {
        url: url.to_string(),
        message: format!("cannot decode image: {e}"),
        source: Some(Box::new(e)),
    })?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();
    PixelData::new(width, height, rgb.into_raw())
}

#[async_trait]
impl PluginAdapter for HttpImageSource {
    fn name(&self) -> &str {
        "http-image-source"
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
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<PixelData, PcountError> {
        let bytes = self.download(url).await?;
        let pixels = decode_pixels(url, &bytes)?;
        debug!(
            url,
            width = pixels.width(),
            height = pixels.height(),
            "image decoded"
        );
        Ok(pixels)
    }
}
