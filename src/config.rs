use std::env;

use anyhow::{Result, anyhow};
use url::Url;

use crate::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match get("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|err| anyhow!("invalid PORT {value:?}: {err}"))?,
            None => DEFAULT_PORT,
        };
        let host = get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let base_url = match get("GEMINI_BASE_URL") {
            Some(value) => validate_http_url(&value)?,
            None => DEFAULT_BASE_URL.to_string(),
        };
        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .map_err(|err| anyhow!("invalid MAX_UPLOAD_BYTES {value:?}: {err}"))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            bind_address: format!("{}:{}", host.trim(), port),
            api_key: get("API_KEY").or_else(|| get("GEMINI_API_KEY")),
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url,
            max_upload_bytes,
        })
    }
}

pub fn validate_http_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|err| anyhow!("invalid URL {trimmed:?}: {err}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.trim_end_matches('/').to_string()),
        scheme => Err(anyhow!("only http or https URLs are allowed, got {scheme}")),
    }
}
