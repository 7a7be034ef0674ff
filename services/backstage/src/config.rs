//! Service configuration.
//!
//! Values come from `BACKSTAGE_*` environment variables; a YAML file named by
//! `BACKSTAGE_CONFIG` may override any of them.
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

pub const DEFAULT_PROFILE: &str = "prod";
pub const DEFAULT_PG_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_PG_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" => Ok(StorageBackend::Postgres),
            other => bail!("unknown storage backend `{other}`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    /// HS256 secret. Without one no token is trusted.
    pub jwt_secret: Option<String>,
    pub jwt_issuer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BackstageConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub profile: String,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub auth: AuthConfig,
}

#[derive(Debug, Default, Deserialize)]
struct BackstageConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    profile: Option<String>,
    storage: Option<StorageBackend>,
    postgres: Option<PostgresOverride>,
    jwt_secret: Option<String>,
    jwt_issuer: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PostgresOverride {
    url: Option<String>,
    max_connections: Option<u32>,
    connect_timeout_ms: Option<u64>,
    acquire_timeout_ms: Option<u64>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value.parse().with_context(|| format!("parse {key}")),
        Err(_) => Ok(default),
    }
}

impl BackstageConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_or("BACKSTAGE_BIND", "0.0.0.0:8080")
            .parse()
            .with_context(|| "parse BACKSTAGE_BIND")?;
        let metrics_bind = env_or("BACKSTAGE_METRICS_BIND", "0.0.0.0:9090")
            .parse()
            .with_context(|| "parse BACKSTAGE_METRICS_BIND")?;
        let storage: StorageBackend = env_or("BACKSTAGE_STORAGE", "memory")
            .parse()
            .with_context(|| "parse BACKSTAGE_STORAGE")?;
        let postgres = match std::env::var("BACKSTAGE_PG_URL") {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: env_parse(
                    "BACKSTAGE_PG_MAX_CONNECTIONS",
                    DEFAULT_PG_MAX_CONNECTIONS,
                )?,
                connect_timeout_ms: env_parse(
                    "BACKSTAGE_PG_CONNECT_TIMEOUT_MS",
                    DEFAULT_PG_TIMEOUT_MS,
                )?,
                acquire_timeout_ms: env_parse(
                    "BACKSTAGE_PG_ACQUIRE_TIMEOUT_MS",
                    DEFAULT_PG_TIMEOUT_MS,
                )?,
            }),
            Err(_) => None,
        };
        Ok(Self {
            bind_addr,
            metrics_bind,
            profile: env_or("BACKSTAGE_PROFILE", DEFAULT_PROFILE),
            storage,
            postgres,
            auth: AuthConfig {
                jwt_secret: std::env::var("BACKSTAGE_JWT_SECRET").ok(),
                jwt_issuer: std::env::var("BACKSTAGE_JWT_ISSUER").ok(),
            },
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("BACKSTAGE_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read BACKSTAGE_CONFIG: {path}"))?;
            let override_cfg: BackstageConfigOverride = serde_yaml::from_str(&contents)
                .with_context(|| "parse backstage config yaml")?;
            config.apply(override_cfg)?;
        }
        Ok(config)
    }

    fn apply(&mut self, override_cfg: BackstageConfigOverride) -> Result<()> {
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.profile {
            self.profile = value;
        }
        if let Some(value) = override_cfg.storage {
            self.storage = value;
        }
        if let Some(pg) = override_cfg.postgres {
            let base = match (self.postgres.take(), pg.url) {
                (_, Some(url)) => PostgresConfig {
                    url,
                    max_connections: DEFAULT_PG_MAX_CONNECTIONS,
                    connect_timeout_ms: DEFAULT_PG_TIMEOUT_MS,
                    acquire_timeout_ms: DEFAULT_PG_TIMEOUT_MS,
                },
                (Some(existing), None) => existing,
                (None, None) => bail!("postgres.url is required in the config file"),
            };
            self.postgres = Some(PostgresConfig {
                max_connections: pg.max_connections.unwrap_or(base.max_connections),
                connect_timeout_ms: pg.connect_timeout_ms.unwrap_or(base.connect_timeout_ms),
                acquire_timeout_ms: pg.acquire_timeout_ms.unwrap_or(base.acquire_timeout_ms),
                url: base.url,
            });
        }
        if let Some(value) = override_cfg.jwt_secret {
            self.auth.jwt_secret = Some(value);
        }
        if let Some(value) = override_cfg.jwt_issuer {
            self.auth.jwt_issuer = Some(value);
        }
        Ok(())
    }
}
