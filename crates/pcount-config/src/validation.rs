// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: URL schemes, queue
//! name collisions, numeric ranges, and cross-field requirements.

use std::net::SocketAddr;

use crate::diagnostic::ConfigError;
use crate::model::{FailurePolicy, PcountConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// every collected validation error (does not fail fast).
pub fn validate_config(config: &PcountConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.worker.log_level.to_lowercase().as_str()) {
        fail(format!(
            "worker.log_level `{}` is not one of {}",
            config.worker.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    // Broker
    let url = config.broker.url.trim();
    if url.is_empty() {
        fail("broker.url must not be empty".to_string());
    } else if !(url.starts_with("amqp://") || url.starts_with("amqps://")) {
        fail(format!(
            "broker.url `{url}` must use the amqp:// or amqps:// scheme"
        ));
    }

    if config.broker.request_queue.trim().is_empty() {
        fail("broker.request_queue must not be empty".to_string());
    }
    if config.broker.result_queue.trim().is_empty() {
        fail("broker.result_queue must not be empty".to_string());
    }
    if config.broker.request_queue == config.broker.result_queue {
        fail(format!(
            "broker.request_queue and broker.result_queue must differ, both are `{}`",
            config.broker.request_queue
        ));
    }
    if config.broker.prefetch_count < 1 {
        fail("broker.prefetch_count must be at least 1".to_string());
    }

    // Engine and image fetch
    if config.engine.fetch_concurrency < 1 {
        fail("engine.fetch_concurrency must be at least 1".to_string());
    }
    if config.image.timeout_secs == 0 {
        fail("image.timeout_secs must be greater than 0".to_string());
    }
    if config.image.max_bytes == 0 {
        fail("image.max_bytes must be greater than 0".to_string());
    }

    // Detector
    if config.detector.model_path.trim().is_empty() {
        fail("detector.model_path must not be empty".to_string());
    }
    if config.detector.min_face_size < 20 {
        fail(format!(
            "detector.min_face_size must be at least 20, got {}",
            config.detector.min_face_size
        ));
    }
    let factor = config.detector.pyramid_scale_factor;
    if !(factor > 0.0 && factor < 1.0) {
        fail(format!(
            "detector.pyramid_scale_factor must be between 0 and 1 (exclusive), got {factor}"
        ));
    }
    if config.detector.slide_window_step < 1 {
        fail("detector.slide_window_step must be at least 1".to_string());
    }

    // Failure policy
    if config.failure.policy == FailurePolicy::DeadLetter
        && config
            .failure
            .dead_letter_exchange
            .as_deref()
            .is_none_or(|e| e.trim().is_empty())
    {
        fail(
            "failure.dead_letter_exchange is required when failure.policy = \"dead_letter\""
                .to_string(),
        );
    }

    if config.prometheus.enabled
        && config.prometheus.listen_address.parse::<SocketAddr>().is_err()
    {
        fail(format!(
            "prometheus.listen_address `{}` is not a valid socket address",
            config.prometheus.listen_address
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = PcountConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn http_broker_url_fails_validation() {
        let mut config = PcountConfig::default();
        config.broker.url = "http://localhost:15672".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "broker.url"));
    }

    #[test]
    fn same_request_and_result_queue_fails_validation() {
        let mut config = PcountConfig::default();
        config.broker.result_queue = config.broker.request_queue.clone();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "must differ"));
    }

    #[test]
    fn zero_fetch_concurrency_fails_validation() {
        let mut config = PcountConfig::default();
        config.engine.fetch_concurrency = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "engine.fetch_concurrency"));
    }

    #[test]
    fn dead_letter_policy_requires_exchange() {
        let mut config = PcountConfig::default();
        config.failure.policy = FailurePolicy::DeadLetter;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "dead_letter_exchange"));

        config.failure.dead_letter_exchange = Some("pcount-dlx".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn pyramid_factor_out_of_range_fails_validation() {
        let mut config = PcountConfig::default();
        config.detector.pyramid_scale_factor = 1.0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "pyramid_scale_factor"));
    }

    #[test]
    fn bad_listen_address_only_checked_when_enabled() {
        let mut config = PcountConfig::default();
        config.prometheus.listen_address = "not-an-address".to_string();
        assert!(validate_config(&config).is_ok());

        config.prometheus.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "prometheus.listen_address"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = PcountConfig::default();
        config.broker.url = String::new();
        config.image.timeout_secs = 0;
        config.worker.log_level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
