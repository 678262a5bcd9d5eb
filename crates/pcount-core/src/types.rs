// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data contracts exchanged between the queue, the counting engine, and the adapters.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::PcountError;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role an adapter plays in the pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    ImageSource,
    FaceDetector,
    Publisher,
    Consumer,
    Observability,
}

// --- Wire contracts ---

/// One image to process. `id` is unique within a request only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoReference {
    pub id: String,
    pub url: String,
}

/// One unit of work decoded from the request queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingRequest {
    #[serde(rename = "lectureId")]
    pub lecture_id: String,
    pub photos: Vec<PhotoReference>,
}

/// Face count for a single photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountItem {
    pub image_id: String,
    pub number_of_people: usize,
}

/// Output of one counting request, in the same order as the request's photos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountingResult {
    pub lecture_id: String,
    pub people_counting_items: Vec<CountItem>,
}

// --- Adapter payloads ---

/// Decoded image as a row-major RGB8 buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelData {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl PixelData {
    /// Wraps an RGB8 buffer, checking that it holds `width * height * 3` bytes.
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, PcountError> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(PcountError::Internal(format!(
                "pixel buffer is {} bytes, expected {expected} for {width}x{height} RGB8",
                rgb.len()
            )));
        }
        Ok(Self { width, height, rgb })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }

    pub fn into_rgb(self) -> Vec<u8> {
        self.rgb
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// Pixel buffers are large; keep Debug output to the dimensions.
impl std::fmt::Debug for PixelData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelData")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgb.len())
            .finish()
    }
}

/// Rectangular region marking a detected face, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
    /// Detector score, when the backend reports one.
    pub confidence: Option<f64>,
}

impl BoundingBox {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

// --- Queue types ---

/// A message handed out by a [`QueueConsumer`](crate::traits::QueueConsumer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Broker-assigned tag used to settle this delivery.
    pub tag: u64,
    pub payload: Vec<u8>,
    /// Set by the broker when this message was delivered before.
    pub redelivered: bool,
}

/// How a delivery is settled with the broker once handling finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Disposition {
    /// Acknowledge; the message is removed from the queue.
    Ack,
    /// Reject without requeue; routed to the dead-letter exchange if one is bound.
    Reject,
    /// Reject with requeue; the message will be redelivered.
    Requeue,
}
