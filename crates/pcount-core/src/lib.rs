// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the pcount people-counting worker.
//!
//! This crate provides the data contracts exchanged over the queue, the
//! error type shared by every stage, and the adapter traits the counting
//! pipeline is built against. Concrete adapters (HTTP image fetch, face
//! detection, AMQP) live in their own crates and implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PcountError;
pub use types::{
    AdapterType, BoundingBox, CountItem, CountingRequest, CountingResult, Delivery, Disposition,
    HealthStatus, PhotoReference, PixelData,
};

// Re-export all adapter traits at crate root.
pub use traits::{FaceDetector, ImageSource, PluginAdapter, QueueConsumer, ResultPublisher};
