use std::net::SocketAddr;

use thiserror::Error;

use crate::pipeline::structuring::variants::ModelVariant;

/// Application-level constants
pub const APP_NAME: &str = "report-digitizer";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default remote endpoint for the Gemini REST API.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Hard transport timeout for one extraction request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Upper bound for one multipart batch upload.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 25;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "report_digitizer=info,tower_http=info"
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` is allowed at startup; extraction requests then fail per item.
    pub api_key: Option<String>,
    pub api_base: String,
    pub timeout_secs: u64,
    pub bind_addr: SocketAddr,
    pub default_variant: ModelVariant,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            default_variant: ModelVariant::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Split out from `from_env` so tests never touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.api_key = non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY"));

        if let Some(base) = non_empty("DIGITIZER_API_BASE") {
            config.api_base = base.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = non_empty("DIGITIZER_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    var: "DIGITIZER_TIMEOUT_SECS",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    var: "DIGITIZER_TIMEOUT_SECS",
                    value: raw,
                    reason: "timeout must be greater than zero".into(),
                });
            }
            config.timeout_secs = secs;
        }

        if let Some(raw) = non_empty("DIGITIZER_BIND") {
            config.bind_addr = raw.trim().parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidValue {
                    var: "DIGITIZER_BIND",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        if let Some(raw) = non_empty("DIGITIZER_MODEL") {
            config.default_variant =
                raw.parse().map_err(|reason: String| ConfigError::InvalidValue {
                    var: "DIGITIZER_MODEL",
                    value: raw.clone(),
                    reason,
                })?;
        }

        if let Some(raw) = non_empty("DIGITIZER_MAX_UPLOAD_MB") {
            let mb: usize = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    var: "DIGITIZER_MAX_UPLOAD_MB",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
            config.max_upload_bytes = mb.saturating_mul(1024 * 1024);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.default_variant, ModelVariant::Flash);
    }

    #[test]
    fn gemini_key_wins_over_generic_key() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "primary"),
            ("API_KEY", "fallback"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn generic_key_used_as_fallback() {
        let config = AppConfig::from_lookup(lookup_from(&[("API_KEY", "fallback")])).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("fallback"));
    }

    #[test]
    fn blank_key_treated_as_missing() {
        let config = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn api_base_trailing_slash_trimmed() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("DIGITIZER_API_BASE", "http://localhost:9000/")]))
                .unwrap();
        assert_eq!(config.api_base, "http://localhost:9000");
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("DIGITIZER_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { var: "DIGITIZER_TIMEOUT_SECS", .. }
        ));
    }

    #[test]
    fn non_numeric_timeout_rejected() {
        assert!(AppConfig::from_lookup(lookup_from(&[("DIGITIZER_TIMEOUT_SECS", "soon")])).is_err());
    }

    #[test]
    fn model_variant_parsed() {
        let config = AppConfig::from_lookup(lookup_from(&[("DIGITIZER_MODEL", "pro")])).unwrap();
        assert_eq!(config.default_variant, ModelVariant::Pro);
    }

    #[test]
    fn unknown_model_rejected() {
        assert!(AppConfig::from_lookup(lookup_from(&[("DIGITIZER_MODEL", "ultra")])).is_err());
    }

    #[test]
    fn bad_bind_address_rejected() {
        assert!(AppConfig::from_lookup(lookup_from(&[("DIGITIZER_BIND", "not-an-addr")])).is_err());
    }

    #[test]
    fn upload_limit_in_megabytes() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("DIGITIZER_MAX_UPLOAD_MB", "2")])).unwrap();
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn app_name_is_stable() {
        assert_eq!(APP_NAME, "report-digitizer");
    }
}
