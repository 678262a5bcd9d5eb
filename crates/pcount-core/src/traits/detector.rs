// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Face detector trait.

use async_trait::async_trait;

use crate::error::PcountError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{BoundingBox, PixelData};

/// Pluggable face detection backend.
#[async_trait]
pub trait FaceDetector: PluginAdapter {
    /// Returns one bounding box per face found in `pixels`.
    async fn detect(&self, pixels: &PixelData) -> Result<Vec<BoundingBox>, PcountError>;
}
