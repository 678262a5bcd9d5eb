// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the counting pipeline.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod detector;
pub mod image_source;
pub mod publisher;
pub mod queue;

pub use adapter::PluginAdapter;
pub use detector::FaceDetector;
pub use image_source::ImageSource;
pub use publisher::ResultPublisher;
pub use queue::QueueConsumer;
