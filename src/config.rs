use axum::http::HeaderValue;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Which browser origins may call the API.
#[derive(Debug, Clone, PartialEq)]
pub enum CorsPolicy {
    /// `CORS_ORIGIN=*`
    Any,
    Origin(HeaderValue),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub db_path: PathBuf,
    pub cors: CorsPolicy,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            bind_addr: lookup("BIND_ADDR")
                .unwrap_or_else(|| "0.0.0.0".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BIND_ADDR must be a valid IP address"))?,
            port: lookup("PORT")
                .unwrap_or_else(|| "3001".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))
                .and_then(|port: u16| {
                    if port == 0 {
                        anyhow::bail!("PORT must be a valid number between 1-65535");
                    }
                    Ok(port)
                })?,
            db_path: lookup("DB_PATH")
                .map(|path| {
                    if path.trim().is_empty() {
                        anyhow::bail!("DB_PATH cannot be empty");
                    }
                    Ok(PathBuf::from(path))
                })
                .unwrap_or_else(|| Ok(PathBuf::from("db.json")))?,
            cors: parse_cors_origin(
                lookup("CORS_ORIGIN")
                    .as_deref()
                    .unwrap_or("http://localhost:3000"),
            )?,
            request_timeout: lookup("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be a whole number"))
                .and_then(|secs: u64| {
                    if secs == 0 {
                        anyhow::bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
                    }
                    Ok(Duration::from_secs(secs))
                })?,
            max_body_bytes: lookup("MAX_BODY_BYTES")
                .unwrap_or_else(|| (1024 * 1024).to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_BODY_BYTES must be a whole number"))
                .and_then(|bytes: usize| {
                    if bytes == 0 {
                        anyhow::bail!("MAX_BODY_BYTES must be greater than zero");
                    }
                    Ok(bytes)
                })?,
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Client document: {}", config.db_path.display());
        tracing::debug!("CORS policy: {:?}", config.cors);
        tracing::debug!("Server address: {}:{}", config.bind_addr, config.port);

        Ok(config)
    }
}

fn parse_cors_origin(raw: &str) -> anyhow::Result<CorsPolicy> {
    let origin = raw.trim();
    if origin == "*" {
        return Ok(CorsPolicy::Any);
    }
    if !origin.starts_with("http://") && !origin.starts_with("https://") {
        anyhow::bail!("CORS_ORIGIN must be * or start with http:// or https://");
    }
    HeaderValue::from_str(origin)
        .map(CorsPolicy::Origin)
        .map_err(|_| anyhow::anyhow!("CORS_ORIGIN is not a valid header value"))
}
