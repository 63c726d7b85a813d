use std::net::SocketAddr;

use tracing::warn;

use crate::error::ConfigError;

const BOT_TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
const BOT_TOKEN_ALIAS: &str = "SPORTSDATAIO_API_KEY";
const CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";
const CHAT_ID_ALIAS: &str = "TELEGRAM_CHATID";
const API_BASE_VAR: &str = "TELEGRAM_API_BASE";
const BIND_ADDR_VAR: &str = "RELAY_BIND_ADDR";
const SESSION_SECRET_VAR: &str = "SESSION_SECRET";
const TEST_MODE_VAR: &str = "SCHEDULER_TEST_MODE";

const MIN_SESSION_SECRET_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub relay: RelayConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Default destination for every outbound message
    pub chat_id: String,
    pub api_base: String,
}

// Keep the token out of Debug output; configs get logged.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Clone)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    pub session_secret: Option<String>,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("bind_addr", &self.bind_addr)
            .field(
                "session_secret",
                &self.session_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchedulerConfig {
    /// Register an extra one-off trigger shortly after startup
    pub test_mode: bool,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bot_token = with_alias(&get, BOT_TOKEN_VAR, BOT_TOKEN_ALIAS)
            .ok_or(ConfigError::Missing(BOT_TOKEN_VAR))?;
        let chat_id = with_alias(&get, CHAT_ID_VAR, CHAT_ID_ALIAS)
            .ok_or(ConfigError::Missing(CHAT_ID_VAR))?;
        let api_base = get(API_BASE_VAR)
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(default_api_base);

        let bind_addr = match get(BIND_ADDR_VAR) {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                name: BIND_ADDR_VAR,
                reason: format!("{raw:?} is not a socket address ({e})"),
            })?,
            None => default_bind_addr(),
        };

        let session_secret = get(SESSION_SECRET_VAR);
        if let Some(secret) = &session_secret {
            if secret.len() < MIN_SESSION_SECRET_LEN {
                return Err(ConfigError::Invalid {
                    name: SESSION_SECRET_VAR,
                    reason: format!("must be at least {MIN_SESSION_SECRET_LEN} characters"),
                });
            }
        }

        let test_mode = match get(TEST_MODE_VAR) {
            Some(raw) => parse_flag(&raw).ok_or_else(|| ConfigError::Invalid {
                name: TEST_MODE_VAR,
                reason: format!("{raw:?} is not a boolean"),
            })?,
            None => false,
        };

        Ok(Config {
            telegram: TelegramConfig {
                bot_token,
                chat_id,
                api_base,
            },
            relay: RelayConfig {
                bind_addr,
                session_secret,
            },
            scheduler: SchedulerConfig { test_mode },
        })
    }
}

/// Canonical name wins; the deprecated alias is only a fallback.
fn with_alias<G>(get: &G, canonical: &str, alias: &str) -> Option<String>
where
    G: Fn(&str) -> Option<String>,
{
    if let Some(value) = get(canonical) {
        return Some(value);
    }
    let value = get(alias)?;
    warn!("{} is deprecated; set {} instead", alias, canonical);
    Some(value)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
