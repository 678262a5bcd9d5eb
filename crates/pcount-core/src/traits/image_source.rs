// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image source trait: resolves a photo URL into pixel data.

use async_trait::async_trait;

use crate::error::PcountError;
use crate::traits::adapter::PluginAdapter;
use crate::types::PixelData;

/// Adapter that retrieves and decodes images.
///
/// Calls are independent and read-only, so the counting engine may issue
/// several concurrently.
#[async_trait]
pub trait ImageSource: PluginAdapter {
    /// Fetches the image at `url` and decodes it.
    ///
    /// Fails with [`PcountError::Fetch`] on network errors or undecodable bytes.
    async fn fetch(&self, url: &str) -> Result<PixelData, PcountError>;
}
