//! API server configuration (spec §6 Environment inputs).

use std::time::Duration;

/// Server configuration, sourced from the env vars spec §6 enumerates.
/// `UPLOAD_SNS_ARN` is deliberately not read: this crate publishes job
/// messages onto `mentorup-bus`'s redis stream instead of an SNS topic (see
/// DESIGN.md Open Question #1).
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// `UPLOAD_ROOT` — dispatcher scratch directory for incoming video parts.
    pub upload_root: String,
    pub jwt_secret: String,
    /// Rewrites `http://` to `https://` in emitted `statusUrl`s when set.
    pub status_url_force_https: bool,
    pub cors_origins: Vec<String>,
    pub rate_limit_rps: u32,
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET not set"))?;

        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            upload_root: std::env::var("UPLOAD_ROOT").unwrap_or_else(|_| "./uploads".to_string()),
            jwt_secret,
            status_url_force_https: std::env::var("STATUS_URL_FORCE_HTTPS")
                .map(|s| matches!(s.to_lowercase().as_str(), "1" | "y" | "true" | "on"))
                .unwrap_or(false),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        })
    }

    /// Applies the `STATUS_URL_FORCE_HTTPS` rewrite rule (spec §6, §10.5).
    pub fn status_url(&self, url_root: &str, path: &str) -> String {
        let root = if self.status_url_force_https && url_root.starts_with("http://") {
            url_root.replacen("http://", "https://", 1)
        } else {
            url_root.to_string()
        };
        format!("{}/{}", root.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(force_https: bool) -> ApiConfig {
        ApiConfig {
            host: "0.0.0.0".into(),
            port: 8080,
            upload_root: "./uploads".into(),
            jwt_secret: "secret".into(),
            status_url_force_https: force_https,
            cors_origins: vec!["*".into()],
            rate_limit_rps: 10,
            request_timeout: Duration::from_secs(120),
        }
    }

    #[test]
    fn status_url_rewrites_http_when_forced() {
        let cfg = config(true);
        assert_eq!(
            cfg.status_url("http://api.example.com", "upload/answer/status/abc"),
            "https://api.example.com/upload/answer/status/abc"
        );
    }

    #[test]
    fn status_url_leaves_http_alone_by_default() {
        let cfg = config(false);
        assert_eq!(
            cfg.status_url("http://api.example.com", "upload/answer/status/abc"),
            "http://api.example.com/upload/answer/status/abc"
        );
    }
}
