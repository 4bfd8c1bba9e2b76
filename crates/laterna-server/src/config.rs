use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
}

impl Config {
    /// Read configuration from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("LATERNA_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("LATERNA_JWT_SECRET is unset or still a placeholder; set it in .env");
        }

        let host = get("LATERNA_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("LATERNA_PORT")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .context("LATERNA_PORT must be a port number")?;
        let addr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let db_path = get("LATERNA_DB_PATH").unwrap_or_else(|| "laterna.db".into()).into();

        Ok(Self {
            addr,
            db_path,
            jwt_secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup(&[("LATERNA_JWT_SECRET", "s3cr3t")])).unwrap();
        assert_eq!(config.addr.port(), 5000);
        assert_eq!(config.db_path, PathBuf::from("laterna.db"));
    }

    #[test]
    fn placeholder_secret_is_refused() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("LATERNA_JWT_SECRET", "dev-secret-change-me")])).is_err());
    }

    #[test]
    fn bad_port_is_reported() {
        let result = Config::from_lookup(lookup(&[
            ("LATERNA_JWT_SECRET", "s3cr3t"),
            ("LATERNA_PORT", "http"),
        ]));
        assert!(result.is_err());
    }
}
