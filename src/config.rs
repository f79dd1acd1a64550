use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_LOG_FILE: &str = "object-access.log";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the REST API, without trailing slash
    pub api_url: String,
    /// Bearer credential; commands refuse to run without one
    pub token: Option<String>,
    /// Log destination for the interactive views
    pub log_file: PathBuf,
}

impl Config {
    /// CLI flags win over the environment
    pub fn with_overrides(mut self, api_url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.api_url = normalize_url(&url);
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }
        self
    }

    pub fn require_token(&self) -> anyhow::Result<&str> {
        match self.token.as_deref() {
            Some(t) => Ok(t),
            None => anyhow::bail!(
                "no API token configured. Set OBJECT_ACCESS_TOKEN or pass --token."
            ),
        }
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Read `.env` (if present) and the process environment
pub fn load() -> Config {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

fn from_lookup<F>(lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    Config {
        api_url: lookup("OBJECT_ACCESS_API_URL")
            .map(|u| normalize_url(&u))
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        token: lookup("OBJECT_ACCESS_TOKEN").filter(|t| !t.trim().is_empty()),
        log_file: lookup("OBJECT_ACCESS_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
    }
}
