// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.

use metrics::{describe_counter, describe_histogram};

/// Register all pcount metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "pcount_requests_total",
        "Counting requests handled, by outcome"
    );
    describe_histogram!(
        "pcount_request_duration_seconds",
        "Time spent counting one request in seconds"
    );
    describe_histogram!("pcount_faces_detected", "Faces detected per photo");
}

/// Record one handled request. `outcome` is a short fixed label such as
/// `published` or `decode_failed`.
pub fn record_request(outcome: &'static str) {
    metrics::counter!("pcount_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_request_duration(seconds: f64) {
    metrics::histogram!("pcount_request_duration_seconds").record(seconds);
}

/// Record the face count of a single photo.
pub fn record_faces(count: usize) {
    metrics::histogram!("pcount_faces_detected").record(count as f64);
}
