// src/config.rs

use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

use crate::sandbox::SandboxConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub catalog_path: String,
    pub port: u16,
    pub sandbox: SandboxConfig,
    /// Upper bound on sandbox runs executing at the same time.
    pub sandbox_max_concurrency: usize,
    /// Endpoint of the AI tutor service. The tutor route answers 503 without it.
    pub tutor_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://academy.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let catalog_path = env::var("CATALOG_PATH")
            .unwrap_or_else(|_| "catalog.json".to_string());

        let sandbox = SandboxConfig {
            timeout: Duration::from_millis(env_or("SANDBOX_TIMEOUT_MS", 3_000)),
            loop_iteration_limit: env_or("SANDBOX_LOOP_LIMIT", 1_000_000),
            recursion_limit: env_or("SANDBOX_RECURSION_LIMIT", 512),
            max_code_bytes: env_or("SANDBOX_MAX_CODE_BYTES", 64 * 1024),
            max_output_chars: env_or("SANDBOX_MAX_OUTPUT_CHARS", 1024 * 1024),
        };

        let tutor_url = env::var("TUTOR_URL").ok().filter(|url| !url.trim().is_empty());

        Self {
            database_url,
            jwt_secret,
            rust_log,
            catalog_path,
            port: env_or("PORT", 3000),
            sandbox,
            sandbox_max_concurrency: env_or("SANDBOX_MAX_CONCURRENCY", 4),
            tutor_url,
        }
    }
}

/// Reads and parses an environment variable, falling back to `default` when it
/// is missing. A malformed value stops startup, like a missing `JWT_SECRET`.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    parse_or(key, env::var(key).ok(), default).unwrap_or_else(|e| panic!("{}", e))
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, String> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| format!("{} has a malformed value: {:?}", key, raw)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_blank_value_uses_default() {
        assert_eq!(parse_or("PORT", None, 3000u16), Ok(3000));
        assert_eq!(parse_or("PORT", Some("  ".to_string()), 3000u16), Ok(3000));
    }

    #[test]
    fn test_value_is_trimmed_and_parsed() {
        assert_eq!(parse_or("PORT", Some(" 8080 ".to_string()), 3000u16), Ok(8080));
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let err = parse_or("SANDBOX_TIMEOUT_MS", Some("3s".to_string()), 3_000u64).unwrap_err();
        assert!(err.contains("SANDBOX_TIMEOUT_MS"));
    }
}
