//! Server configuration loaded from environment variables (after `.env`).

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Upper bound on `HUSHBOX_TOKEN_TTL_DAYS` (ten years).
const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct Config {
    /// Env: `HUSHBOX_HOST` / `HUSHBOX_PORT`. Default: `0.0.0.0:3000`
    pub addr: SocketAddr,

    /// Env: `HUSHBOX_DB_PATH`. Default: `hushbox.db`
    pub db_path: PathBuf,

    /// Env: `HUSHBOX_JWT_SECRET`. Required.
    pub jwt_secret: String,

    /// Env: `HUSHBOX_TOKEN_TTL_DAYS`. Default: `30`
    pub token_ttl_days: i64,

    /// Base URL used to build public profile links.
    /// Env: `HUSHBOX_PUBLIC_URL`. Default: `http://localhost:3000`
    pub public_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("HUSHBOX_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("HUSHBOX_JWT_SECRET is unset or still a placeholder");
        }

        let host = lookup("HUSHBOX_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("HUSHBOX_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("HUSHBOX_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", host, port))?;

        let token_ttl_days: i64 = lookup("HUSHBOX_TOKEN_TTL_DAYS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("HUSHBOX_TOKEN_TTL_DAYS must be a whole number of days")?;
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&token_ttl_days) {
            bail!("HUSHBOX_TOKEN_TTL_DAYS must be between 1 and {}", MAX_TOKEN_TTL_DAYS);
        }

        Ok(Self {
            addr,
            db_path: lookup("HUSHBOX_DB_PATH").unwrap_or_else(|| "hushbox.db".into()).into(),
            jwt_secret,
            token_ttl_days,
            public_url: lookup("HUSHBOX_PUBLIC_URL").unwrap_or_else(|| "http://localhost:3000".into()),
        })
    }
}
