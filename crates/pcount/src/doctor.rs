// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pcount doctor` command implementation.
//!
//! Runs diagnostic checks against the worker environment to identify
//! configuration problems, a missing face model, and broker connectivity
//! issues before `serve` is started.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use pcount_amqp::QueueState;
use pcount_config::{ConfigError, PcountConfig};
use pcount_detector::RustfaceDetector;

const BROKER_TIMEOUT: Duration = Duration::from_secs(5);

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `pcount doctor` command. Returns `false` when any check failed.
pub async fn run_doctor(config: Result<PcountConfig, Vec<ConfigError>>, plain: bool) -> bool {
    let use_color = !plain && std::io::stdout().is_terminal();
    let mut results = vec![check_config(&config)];

    if let Ok(config) = &config {
        results.push(check_model(config));
        results.push(check_broker(config).await);
        results.push(check_prometheus(config));
    }

    println!();
    println!("  pcount doctor");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", format_line(result, use_color));
    }
    println!();
    println!("  {}", summary(&results));
    println!();

    !results.iter().any(|r| r.status == CheckStatus::Fail)
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();

    if !use_color {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        return format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        );
    }

    use colored::Colorize;
    let (symbol, message) = match result.status {
        CheckStatus::Pass => ("✓".green(), result.message.normal()),
        CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
        CheckStatus::Fail => ("✗".red(), result.message.red()),
    };
    format!(
        "    {symbol} {:<20} {message} ({duration_ms}ms)",
        result.name
    )
}

fn summary(results: &[CheckResult]) -> String {
    let issues = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .count();
    match issues {
        0 => "All checks passed.".to_string(),
        1 => "1 issue found.".to_string(),
        n => format!("{n} issues found."),
    }
}

fn check_config(config: &Result<PcountConfig, Vec<ConfigError>>) -> CheckResult {
    let start = Instant::now();
    match config {
        Ok(_) => CheckResult::new("Configuration", CheckStatus::Pass, "valid", start),
        Err(errors) => {
            pcount_config::render_errors(errors);
            CheckResult::new(
                "Configuration",
                CheckStatus::Fail,
                format!("{} error(s)", errors.len()),
                start,
            )
        }
    }
}

fn check_model(config: &PcountConfig) -> CheckResult {
    let start = Instant::now();
    match RustfaceDetector::from_config(&config.detector) {
        Ok(_) => CheckResult::new(
            "Face model",
            CheckStatus::Pass,
            format!("loaded {}", config.detector.model_path),
            start,
        ),
        Err(e) => CheckResult::new("Face model", CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_broker(config: &PcountConfig) -> CheckResult {
    let start = Instant::now();
    let inspect = pcount_amqp::inspect_queues(&config.broker);

    match tokio::time::timeout(BROKER_TIMEOUT, inspect).await {
        Ok(Ok(report)) => {
            let (status, message) = summarize_queues(&report);
            CheckResult::new("Broker", status, message, start)
        }
        Ok(Err(e)) => CheckResult::new("Broker", CheckStatus::Fail, e.to_string(), start),
        Err(_) => CheckResult::new(
            "Broker",
            CheckStatus::Fail,
            format!("no answer within {}s", BROKER_TIMEOUT.as_secs()),
            start,
        ),
    }
}

/// Missing queues only warn: `serve` declares them on startup.
fn summarize_queues(report: &[(String, QueueState)]) -> (CheckStatus, String) {
    let missing: Vec<&str> = report
        .iter()
        .filter(|(_, state)| *state == QueueState::Missing)
        .map(|(name, _)| name.as_str())
        .collect();
    if !missing.is_empty() {
        return (
            CheckStatus::Warn,
            format!("connected, not yet declared: {}", missing.join(", ")),
        );
    }

    let queues: Vec<String> = report
        .iter()
        .map(|(name, state)| match state {
            QueueState::Present { messages, .. } => format!("{name} ({messages} ready)"),
            QueueState::Missing => name.clone(),
        })
        .collect();
    (
        CheckStatus::Pass,
        format!("connected, {}", queues.join(", ")),
    )
}

fn check_prometheus(config: &PcountConfig) -> CheckResult {
    let start = Instant::now();
    if !config.prometheus.enabled {
        return CheckResult::new("Prometheus", CheckStatus::Pass, "exporter disabled", start);
    }
    CheckResult::new(
        "Prometheus",
        CheckStatus::Pass,
        format!("exporter on {}", config.prometheus.listen_address),
        start,
    )
}
