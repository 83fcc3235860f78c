//! Process configuration, read from the environment.

use std::net::SocketAddr;

use thiserror::Error;

use stocktake_auth::warehouse::{ALL_WAREHOUSES_GROUP, WAREHOUSE_GROUP_PREFIX};
use stocktake_auth::{DEFAULT_CLIENT_ID, DEFAULT_ERP_USER, TokenSettings};
use stocktake_observability::LogFormat;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl ToString) -> Self {
        Self::Invalid {
            name,
            reason: reason.to_string(),
        }
    }
}

/// How bearer tokens are verified.
#[derive(Clone, PartialEq, Eq)]
pub enum TokenKey {
    Hs256Secret(String),
    Rs256Pem(String),
}

impl core::fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TokenKey::Hs256Secret(_) => f.write_str("Hs256Secret(..)"),
            TokenKey::Rs256Pem(_) => f.write_str("Rs256Pem(..)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub token_key: TokenKey,
    pub token: TokenSettings,
    /// Client id under which per-client roles are looked up.
    pub client_id: String,
    pub warehouse_group_prefix: String,
    pub all_warehouses_group: String,
    /// Apply warehouse checks to handlers that receive an `inventLocationId`.
    pub location_enforcement: bool,
    /// ERP actor used when a token carries no user name.
    pub default_erp_user: String,
    /// Session id of the in-memory ERP backend.
    pub erp_session_id: i64,
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            token_key: TokenKey::Hs256Secret(DEV_JWT_SECRET.to_string()),
            token: TokenSettings::default(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            warehouse_group_prefix: WAREHOUSE_GROUP_PREFIX.to_string(),
            all_warehouses_group: ALL_WAREHOUSES_GROUP.to_string(),
            location_enforcement: false,
            default_erp_user: DEFAULT_ERP_USER.to_string(),
            erp_session_id: 1,
            log_format: LogFormat::default(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Unset and blank values fall
    /// back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(addr) = var("BIND_ADDR") {
            config.bind_addr = addr.parse().map_err(|e| ConfigError::invalid("BIND_ADDR", e))?;
        }

        config.token_key = match (var("JWT_PUBLIC_KEY_PEM"), var("JWT_SECRET")) {
            (Some(pem), _) => TokenKey::Rs256Pem(pem),
            (None, Some(secret)) => TokenKey::Hs256Secret(secret),
            (None, None) => TokenKey::Hs256Secret(DEV_JWT_SECRET.to_string()),
        };

        config.token.issuer = var("JWT_ISSUER");
        if let Some(audience) = var("JWT_AUDIENCE") {
            config.token.audience = Some(audience);
        }
        if let Some(leeway) = var("JWT_LEEWAY_SECS") {
            config.token.leeway_secs = leeway
                .parse()
                .map_err(|e| ConfigError::invalid("JWT_LEEWAY_SECS", e))?;
        }

        if let Some(client_id) = var("IDP_CLIENT_ID") {
            config.client_id = client_id;
        }
        if let Some(prefix) = var("WAREHOUSE_GROUP_PREFIX") {
            config.warehouse_group_prefix = prefix;
        }
        if let Some(group) = var("WAREHOUSE_ALL_GROUP") {
            config.all_warehouses_group = group;
        }
        if let Some(flag) = var("LOCATION_ENFORCEMENT") {
            config.location_enforcement = parse_bool(&flag)
                .ok_or_else(|| ConfigError::invalid("LOCATION_ENFORCEMENT", "expected a boolean"))?;
        }
        if let Some(user) = var("DEFAULT_ERP_USER") {
            config.default_erp_user = user;
        }
        if let Some(session) = var("ERP_SESSION_ID") {
            config.erp_session_id = session
                .parse()
                .map_err(|e| ConfigError::invalid("ERP_SESSION_ID", e))?;
        }
        if let Some(format) = var("LOG_FORMAT") {
            config.log_format = format.parse().map_err(|e| ConfigError::invalid("LOG_FORMAT", e))?;
        }

        Ok(config)
    }

    /// Tokens are verified with the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        matches!(&self.token_key, TokenKey::Hs256Secret(secret) if secret == DEV_JWT_SECRET)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
