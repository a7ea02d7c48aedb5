use std::{fmt, path::PathBuf};

use anyhow::{Context, Result, anyhow};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub uploads: UploadConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    /// Base used to build public URLs for stored files.
    pub public_base_url: String,
    pub max_bytes: usize,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .finish()
    }
}

const DEFAULT_PORT: u16 = 7677;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Reads the configuration from the process environment.
pub fn load() -> Result<Config> {
    from_lookup(|key| std::env::var(key).ok())
}

pub fn from_lookup<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &str| {
        lookup(key)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("Missing environment variable '{}'", key))
    };

    let port = match lookup("SERVER_PORT") {
        Some(raw) => raw
            .parse::<u16>()
            .with_context(|| format!("Invalid SERVER_PORT: {}", raw))?,
        None => DEFAULT_PORT,
    };

    let max_bytes = match lookup("MAX_UPLOAD_BYTES") {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("Invalid MAX_UPLOAD_BYTES: {}", raw))?,
        None => DEFAULT_MAX_UPLOAD_BYTES,
    };

    let public_base_url = lookup("PUBLIC_BASE_URL")
        .unwrap_or_else(|| format!("http://localhost:{}", port))
        .trim_end_matches('/')
        .to_string();

    Ok(Config {
        server: ServerConfig {
            host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
        },
        database: DatabaseConfig {
            url: required("DATABASE_URL")?,
        },
        uploads: UploadConfig {
            dir: PathBuf::from(lookup("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string())),
            public_base_url,
            max_bytes,
        },
        auth: AuthConfig {
            jwt_secret: required("JWT_SECRET")?,
        },
    })
}
