//! Framework minimal config: page token, verify token, API URL, session file,
//! log path. Loaded from environment variables.

use anyhow::Result;
use std::env;

/// Messenger bot framework minimal configuration.
pub struct BotConfig {
    pub page_access_token: String,
    pub verify_token: Option<String>,
    pub api_url: Option<String>,
    pub session_file: Option<String>,
    pub log_file: Option<String>,
}

impl BotConfig {
    /// Loads from environment: `PAGE_ACCESS_TOKEN` is required and missing it
    /// is a fatal construction error; `VERIFY_TOKEN`, `GRAPH_API_URL`,
    /// `SESSION_FILE`, `LOG_FILE` are optional.
    pub fn from_env() -> Result<Self> {
        let page_access_token = env::var("PAGE_ACCESS_TOKEN")
            .map_err(|_| anyhow::anyhow!("PAGE_ACCESS_TOKEN not set"))?;
        Ok(Self {
            page_access_token,
            verify_token: env::var("VERIFY_TOKEN").ok(),
            api_url: env::var("GRAPH_API_URL").ok(),
            session_file: env::var("SESSION_FILE").ok(),
            log_file: env::var("LOG_FILE").ok(),
        })
    }

    /// Constructs with the given token, everything else unset.
    pub fn with_token(page_access_token: String) -> Self {
        Self {
            page_access_token,
            verify_token: None,
            api_url: None,
            session_file: None,
            log_file: None,
        }
    }
}
