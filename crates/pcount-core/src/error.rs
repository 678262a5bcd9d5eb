// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the pcount worker.

use thiserror::Error;

/// Boxed error used as the `source` of adapter failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across all pcount adapter traits and core operations.
#[derive(Debug, Error)]
pub enum PcountError {
    /// Inbound payload is not a well-formed counting request.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// A photo could not be retrieved or decoded into pixel data.
    #[error("fetch error for {url}: {message}")]
    Fetch {
        url: String,
        message: String,
        source: Option<BoxError>,
    },

    /// The face detector failed on valid pixel data.
    #[error("detection error: {message}")]
    Detection {
        message: String,
        source: Option<BoxError>,
    },

    /// A counting result could not be delivered to the result queue.
    #[error("publish error: {message}")]
    Publish {
        message: String,
        source: Option<BoxError>,
    },

    /// Broker connection, channel, or delivery settlement failure.
    #[error("broker error: {message}")]
    Broker {
        message: String,
        source: Option<BoxError>,
    },

    /// Configuration errors (invalid TOML, missing model file, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PcountError {
    /// Stable short label for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            PcountError::Decode { .. } => "decode",
            PcountError::Fetch { .. } => "fetch",
            PcountError::Detection { .. } => "detection",
            PcountError::Publish { .. } => "publish",
            PcountError::Broker { .. } => "broker",
            PcountError::Config(_) => "config",
            PcountError::Internal(_) => "internal",
        }
    }

    /// Shorthand for a [`PcountError::Fetch`] without an underlying source.
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        PcountError::Fetch {
            url: url.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`PcountError::Detection`] without an underlying source.
    pub fn detection(message: impl Into<String>) -> Self {
        PcountError::Detection {
            message: message.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_are_stable() {
        let cases = [
            (
                PcountError::Decode {
                    message: "x".into(),
                },
                "decode",
            ),
            (PcountError::fetch("http://a", "x"), "fetch"),
            (PcountError::detection("x"), "detection"),
            (
                PcountError::Publish {
                    message: "x".into(),
                    source: None,
                },
                "publish",
            ),
            (
                PcountError::Broker {
                    message: "x".into(),
                    source: Some(Box::new(std::io::Error::other("closed"))),
                },
                "broker",
            ),
            (PcountError::Config("x".into()), "config"),
            (PcountError::Internal("x".into()), "internal"),
        ];

        for (err, kind) in cases {
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn fetch_error_mentions_url() {
        let err = PcountError::fetch("http://img/1.jpg", "status 404");
        let msg = err.to_string();
        assert!(msg.contains("http://img/1.jpg"));
        assert!(msg.contains("status 404"));
    }
}
