// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::time::Duration;

use rowcheck_core::{ScanPolicy, StorageLayout, DEFAULT_REPORT_DIR, DEFAULT_UPLOAD_DIR};
use serde::Serialize;

pub const ENV_BIND: &str = "ROWCHECK_BIND";
pub const ENV_UPLOAD_DIR: &str = "ROWCHECK_UPLOAD_DIR";
pub const ENV_REPORT_DIR: &str = "ROWCHECK_REPORT_DIR";
pub const ENV_MAX_UPLOAD_BYTES: &str = "ROWCHECK_MAX_UPLOAD_BYTES";
pub const ENV_NULL_TOKENS: &str = "ROWCHECK_NULL_TOKENS";
pub const ENV_LOG_JSON: &str = "ROWCHECK_LOG_JSON";
pub const ENV_SHUTDOWN_DRAIN_MS: &str = "ROWCHECK_SHUTDOWN_DRAIN_MS";

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    pub report_dir: PathBuf,
    /// Whole request body limit for uploads, multipart framing included.
    pub max_upload_bytes: usize,
    /// `None` keeps the default null-token set.
    pub null_tokens: Option<Vec<String>>,
    pub log_json: bool,
    pub shutdown_drain: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
            max_upload_bytes: 64 * 1024 * 1024,
            null_tokens: None,
            log_json: true,
            shutdown_drain: Duration::ZERO,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source; unset or
    /// unparsable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            bind_addr: lookup(ENV_BIND)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.bind_addr),
            upload_dir: env_path(&lookup, ENV_UPLOAD_DIR).unwrap_or(defaults.upload_dir),
            report_dir: env_path(&lookup, ENV_REPORT_DIR).unwrap_or(defaults.report_dir),
            max_upload_bytes: env_usize(&lookup, ENV_MAX_UPLOAD_BYTES, defaults.max_upload_bytes),
            null_tokens: lookup(ENV_NULL_TOKENS).map(|raw| env_list(&raw)),
            log_json: env_bool(&lookup, ENV_LOG_JSON, defaults.log_json),
            shutdown_drain: Duration::from_millis(env_u64(&lookup, ENV_SHUTDOWN_DRAIN_MS, 0)),
        }
    }

    #[must_use]
    pub fn storage_layout(&self) -> StorageLayout {
        StorageLayout::new(self.upload_dir.clone(), self.report_dir.clone())
    }

    #[must_use]
    pub fn scan_policy(&self) -> ScanPolicy {
        match &self.null_tokens {
            Some(tokens) => ScanPolicy::default().with_null_tokens(tokens.iter().cloned()),
            None => ScanPolicy::default(),
        }
    }
}

pub fn validate_startup_config_contract(cfg: &ServerConfig) -> Result<(), String> {
    if cfg.max_upload_bytes == 0 {
        return Err(format!("{ENV_MAX_UPLOAD_BYTES} must be > 0"));
    }
    if cfg.upload_dir == cfg.report_dir {
        return Err(format!(
            "{ENV_UPLOAD_DIR} and {ENV_REPORT_DIR} must be different directories"
        ));
    }
    cfg.bind_addr
        .parse::<std::net::SocketAddr>()
        .map_err(|e| format!("invalid {ENV_BIND} {}: {e}", cfg.bind_addr))?;
    Ok(())
}

fn env_bool<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str, default: bool) -> bool {
    lookup(name)
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str, default: u64) -> u64 {
    lookup(name)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str, default: usize) -> usize {
    lookup(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_path<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str) -> Option<PathBuf> {
    let raw = lookup(name)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}

fn env_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}
