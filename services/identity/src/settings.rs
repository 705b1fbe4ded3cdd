//! Service settings, read from `identity.toml` (optional) and the environment

use anyhow::{Context, Result, bail};
use common::{cache::RedisConfig, database::DatabaseConfig};
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;

use crate::{
    jwt::{JwtConfig, parse_expiry},
    oauth::GoogleOAuthConfig,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub database_min_connections: u32,
    #[serde(default = "default_connection_timeout")]
    pub database_connection_timeout: u64,

    pub at_jwt_secret: String,
    #[serde(default = "default_at_expire_in")]
    pub at_expire_in: String,
    pub rt_jwt_secret: String,
    #[serde(default = "default_rt_expire_in")]
    pub rt_expire_in: String,

    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_callback_url: Option<String>,
    #[serde(default = "default_oauth_success_redirect")]
    pub oauth_success_redirect: String,

    #[serde(default = "default_cors_allow_origin")]
    pub cors_allow_origin: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_at_expire_in() -> String {
    "1h".to_string()
}

fn default_rt_expire_in() -> String {
    "1d".to_string()
}

fn default_redis_url() -> String {
    RedisConfig::default().url
}

fn default_oauth_success_redirect() -> String {
    "http://localhost:4000".to_string()
}

fn default_cors_allow_origin() -> String {
    "*".to_string()
}

impl Settings {
    /// Load from `identity.toml` if present, then the process environment
    pub fn load() -> Result<Self> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("identity").required(false))
                .add_source(Environment::default().try_parsing(true)),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Settings = builder
            .build()?
            .try_deserialize()
            .context("invalid identity service configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            bail!("DATABASE_URL must not be empty");
        }
        self.jwt_config()?;
        reqwest::Url::parse(&self.oauth_success_redirect)
            .with_context(|| format!("invalid OAUTH_SUCCESS_REDIRECT '{}'", self.oauth_success_redirect))?;
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            database_url: self.database_url.clone(),
            max_connections: self.database_max_connections,
            min_connections: self.database_min_connections,
            connection_timeout: self.database_connection_timeout,
        }
    }

    pub fn redis_config(&self) -> RedisConfig {
        RedisConfig {
            url: self.redis_url.clone(),
        }
    }

    pub fn jwt_config(&self) -> Result<JwtConfig> {
        Ok(JwtConfig {
            access_secret: self.at_jwt_secret.clone(),
            access_token_expiry: parse_expiry(&self.at_expire_in).context("AT_EXPIRE_IN")?,
            refresh_secret: self.rt_jwt_secret.clone(),
            refresh_token_expiry: parse_expiry(&self.rt_expire_in).context("RT_EXPIRE_IN")?,
        })
    }

    /// Google settings, when all three values are present
    pub fn google_oauth(&self) -> Option<GoogleOAuthConfig> {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Some(GoogleOAuthConfig {
            client_id: non_empty(&self.google_client_id)?,
            client_secret: non_empty(&self.google_client_secret)?,
            redirect_url: non_empty(&self.google_callback_url)?,
        })
    }
}
