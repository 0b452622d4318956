use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::api::client::DEFAULT_API_URL;
use crate::sync::pagination::DEFAULT_PAGE_LIMIT;

/// Which timeout fallback the stores get.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Timed-out fetches show canned sample data.
    Development,
    /// Timed-out fetches show a retryable error (default).
    Production,
}

impl Mode {
    /// "development"/"dev" select development; anything else, or unset,
    /// is production.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("development") | Some("dev") => Mode::Development,
            _ => Mode::Production,
        }
    }
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. The API
/// token is passed through opaquely; obtaining it is someone else's job.
pub struct Config {
    /// Admin REST API base URL (defaults to http://localhost:5000/api).
    pub api_url: String,
    /// Bearer token sent with every request, if set.
    pub api_token: Option<String>,
    /// How long a fetch may run before the fallback policy applies.
    pub fetch_timeout: Duration,
    /// Rows per page for paginated lists.
    pub page_limit: u32,
    pub mode: Mode,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default; only malformed numbers are an error.
    pub fn load() -> Result<Self> {
        let mode = Mode::parse(env::var("ADMIN_MODE").ok().as_deref());
        let fetch_timeout_ms = parse_number(
            "ADMIN_FETCH_TIMEOUT_MS",
            env::var("ADMIN_FETCH_TIMEOUT_MS").ok(),
            10_000u64,
        )?;
        let page_limit = parse_number(
            "ADMIN_PAGE_LIMIT",
            env::var("ADMIN_PAGE_LIMIT").ok(),
            DEFAULT_PAGE_LIMIT,
        )?;
        if page_limit == 0 {
            anyhow::bail!("ADMIN_PAGE_LIMIT must be at least 1");
        }

        Ok(Self {
            api_url: env::var("ADMIN_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_token: env::var("ADMIN_API_TOKEN").ok().filter(|t| !t.is_empty()),
            fetch_timeout: Duration::from_millis(fetch_timeout_ms),
            page_limit,
            mode,
        })
    }
}

/// Parse an optional numeric variable, using `default` when unset.
fn parse_number<T: std::str::FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} is not a number: {raw}")),
        None => Ok(default),
    }
}
