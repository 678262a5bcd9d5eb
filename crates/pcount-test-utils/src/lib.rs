// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for pcount tests.
//!
//! Provides mock adapters and a harness for fast, deterministic tests
//! without a broker, network access, or a detection model.
//!
//! # Components
//!
//! - [`MockImageSource`] - URL-to-pixels table with injectable failures and delays
//! - [`MockFaceDetector`] - pixels-to-face-count table with injectable failures
//! - [`MockPublisher`] - captures published results
//! - [`MockQueue`] - injectable deliveries with recorded settlements
//! - [`TestHarness`] - a full worker wired to the mocks above

pub mod harness;
pub mod mock_detector;
pub mod mock_image_source;
pub mod mock_publisher;
pub mod mock_queue;

pub use harness::TestHarness;
pub use mock_detector::MockFaceDetector;
pub use mock_image_source::{tagged_pixels, MockImageSource};
pub use mock_publisher::MockPublisher;
pub use mock_queue::MockQueue;
