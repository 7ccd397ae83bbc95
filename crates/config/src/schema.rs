use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Public base URL used in mail links and attachment URLs.
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8080,
            public_base_url: "http://127.0.0.1:8080".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for access tokens. Overridden by PARLEY_ACCESS_SECRET.
    pub access_token_secret: String,
    /// HMAC secret for refresh tokens. Overridden by PARLEY_REFRESH_SECRET.
    pub refresh_token_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: "dev-access-secret-change-me".into(),
            refresh_token_secret: "dev-refresh-secret-change-me".into(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 7,
        }
    }
}

impl AuthConfig {
    /// Apply environment overrides for the secrets.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(s) = std::env::var("PARLEY_ACCESS_SECRET") {
            self.access_token_secret = s;
        }
        if let Ok(s) = std::env::var("PARLEY_REFRESH_SECRET") {
            self.refresh_token_secret = s;
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Directory uploaded attachments are written to and served from.
    pub public_dir: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            public_dir: "./public/images".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub from_address: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_address: "no-reply@parley.local".into(),
        }
    }
}
