//! Startup configuration. All settings are read once at process start and
//! fixed for the process lifetime; a missing or invalid required setting is
//! fatal before any loop starts.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::ledger::Slot;

const ENV_SLOTS_PATH: &str = "SLOTS_CONFIG_PATH";

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 180;
pub const DEFAULT_MAX_FETCH_ITEMS: usize = 10;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub api_base: String,
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub to_number: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub poll_interval: Duration,
    pub max_fetch_items: usize,
    pub http_timeout: Duration,
    pub feed_url: String,
    /// Prepended to every outgoing message; defaults to the account handle.
    pub message_prefix: String,
    pub summarizer: SummarizerConfig,
    pub sms: SmsConfig,
    /// Required only when slots are configured.
    pub forecast_url: Option<String>,
    pub slots: Vec<Slot>,
}

impl Config {
    /// Read configuration from the environment (plus the slots file).
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut missing: Vec<String> = Vec::new();
        let mut require = |name: &str| -> String {
            match std::env::var(name) {
                Ok(v) if !v.trim().is_empty() => v,
                _ => {
                    missing.push(name.to_string());
                    String::new()
                }
            }
        };

        let feed_url = require("STATUS_FEED_URL");
        let account = require("FEED_ACCOUNT");
        let summary_key = require("SUMMARY_API_KEY");
        let account_sid = require("SMS_ACCOUNT_SID");
        let auth_token = require("SMS_AUTH_TOKEN");
        let from_number = require("SMS_FROM_NUMBER");
        let to_number = require("SMS_TO_NUMBER");

        if !missing.is_empty() {
            return Err(ConfigError::MissingVars { vars: missing });
        }

        let poll_secs = env_parsed("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        // The slot window is level-triggered on the hour value; an interval
        // of an hour or more could skip it entirely.
        if poll_secs == 0 || poll_secs >= 3600 {
            return Err(ConfigError::Invalid {
                field: "POLL_INTERVAL_SECS".into(),
                value: poll_secs.to_string(),
            });
        }

        let max_fetch_items = env_parsed("MAX_FETCH_ITEMS", DEFAULT_MAX_FETCH_ITEMS)?;
        if max_fetch_items == 0 {
            return Err(ConfigError::Invalid {
                field: "MAX_FETCH_ITEMS".into(),
                value: "0".into(),
            });
        }

        let http_timeout_secs = env_parsed("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;

        let message_prefix = std::env::var("MESSAGE_PREFIX")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| format!("{account}: "));

        let summarizer = SummarizerConfig {
            endpoint: std::env::var("SUMMARY_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),
            api_key: summary_key,
            model: std::env::var("SUMMARY_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        };

        let sms = SmsConfig {
            api_base: std::env::var("SMS_API_BASE")
                .unwrap_or_else(|_| "https://api.twilio.com".to_string()),
            account_sid,
            auth_token,
            from_number,
            to_number,
        };

        let slots = load_slots_default()?;
        let forecast_url = std::env::var("FORECAST_URL").ok().filter(|v| !v.is_empty());
        if !slots.is_empty() && forecast_url.is_none() {
            return Err(ConfigError::Invalid {
                field: "FORECAST_URL".into(),
                value: "(unset, but slots are configured)".into(),
            });
        }

        Ok(Self {
            poll_interval: Duration::from_secs(poll_secs),
            max_fetch_items,
            http_timeout: Duration::from_secs(http_timeout_secs),
            feed_url,
            message_prefix,
            summarizer,
            sms,
            forecast_url,
            slots,
        })
    }
}

fn env_parsed<T: std::str::FromStr + ToString>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            field: name.to_string(),
            value: raw,
        }),
    }
}

/// Load slot definitions from an explicit path. Supports TOML or JSON.
pub fn load_slots_from(path: &Path) -> Result<Vec<Slot>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::SlotsFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let slots = parse_slots(&content, ext.as_str()).map_err(|reason| ConfigError::SlotsFile {
        path: path.display().to_string(),
        reason,
    })?;
    validate_slots(&slots)?;
    Ok(slots)
}

/// Load slots using env var + fallbacks:
/// 1) $SLOTS_CONFIG_PATH
/// 2) config/slots.toml
/// 3) config/slots.json
/// No file present means no slots (the slot worker stays idle).
pub fn load_slots_default() -> Result<Vec<Slot>, ConfigError> {
    if let Ok(p) = std::env::var(ENV_SLOTS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_slots_from(&pb);
        }
        return Err(ConfigError::SlotsFile {
            path: pb.display().to_string(),
            reason: "SLOTS_CONFIG_PATH points to non-existent path".into(),
        });
    }
    let toml_p = PathBuf::from("config/slots.toml");
    if toml_p.exists() {
        return load_slots_from(&toml_p);
    }
    let json_p = PathBuf::from("config/slots.json");
    if json_p.exists() {
        return load_slots_from(&json_p);
    }
    Ok(Vec::new())
}

fn parse_slots(s: &str, hint_ext: &str) -> Result<Vec<Slot>, String> {
    #[derive(serde::Deserialize)]
    struct TomlSlots {
        slots: Vec<Slot>,
    }

    let try_toml = hint_ext == "toml" || s.contains("[[slots]]");
    if try_toml {
        if let Ok(v) = toml::from_str::<TomlSlots>(s) {
            return Ok(v.slots);
        }
    }
    if let Ok(v) = serde_json::from_str::<Vec<Slot>>(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = toml::from_str::<TomlSlots>(s) {
            return Ok(v.slots);
        }
    }
    Err("unsupported slots format".into())
}

fn validate_slots(slots: &[Slot]) -> Result<(), ConfigError> {
    for slot in slots {
        if slot.trigger_hour > 23 {
            return Err(ConfigError::Invalid {
                field: format!("slots.{}.trigger_hour", slot.name),
                value: slot.trigger_hour.to_string(),
            });
        }
        if slot.target_hour > 23 {
            return Err(ConfigError::Invalid {
                field: format!("slots.{}.target_hour", slot.name),
                value: slot.target_hour.to_string(),
            });
        }
    }
    let mut names: Vec<&str> = slots.iter().map(|s| s.name.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    if names.len() != slots.len() {
        return Err(ConfigError::Invalid {
            field: "slots".into(),
            value: "duplicate slot names".into(),
        });
    }
    Ok(())
}
