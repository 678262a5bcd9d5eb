// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./pcount.toml` > `~/.config/pcount/pcount.toml` > `/etc/pcount/pcount.toml`
//! with environment variable overrides via `PCOUNT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PcountConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/pcount/pcount.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "pcount.toml";

/// Top-level sections that `PCOUNT_<SECTION>_<KEY>` variables may target.
const ENV_SECTIONS: &[&str] = &[
    "worker",
    "broker",
    "engine",
    "image",
    "detector",
    "failure",
    "prometheus",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/pcount/pcount.toml`
/// 3. `~/.config/pcount/pcount.toml`
/// 4. `./pcount.toml`
/// 5. `PCOUNT_*` environment variables
pub fn load_config() -> Result<PcountConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<PcountConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PcountConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PcountConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PcountConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for XDG config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PcountConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// `~/.config/pcount/pcount.toml`, when the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pcount").join(LOCAL_CONFIG_FILE))
}

/// Create the environment variable provider.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `PCOUNT_BROKER_REQUEST_QUEUE` maps to `broker.request_queue`.
fn env_provider() -> Env {
    Env::prefixed("PCOUNT_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
