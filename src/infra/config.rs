use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// How the process serves requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// HTTP: `/healthz`, streamable MCP at `/mcp`, plain JSON-RPC at `/v1/rpc`.
    Server,
    /// MCP over stdin/stdout.
    Stdio,
    /// Plain line-delimited JSON-RPC over stdin/stdout, no handshake.
    Lines,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server" => Ok(Mode::Server),
            "stdio" => Ok(Mode::Stdio),
            "lines" => Ok(Mode::Lines),
            other => Err(format!("Invalid MODE: {other}. Must be 'server', 'stdio' or 'lines'")),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Server => "server",
            Mode::Stdio => "stdio",
            Mode::Lines => "lines",
        })
    }
}

pub struct Config {
    pub mode: Mode,
    pub port: u16,
    pub deprecate_rest: bool,
}

impl Config {
    /// Unknown `MODE` values fall back to `server`; `cli config` reports them.
    pub fn from_env() -> Self {
        let mode = std::env::var("MODE")
            .ok()
            .and_then(|s| s.parse::<Mode>().ok())
            .unwrap_or(Mode::Server);
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        let deprecate_rest = std::env::var("DEPRECATE_REST")
            .map(|v| !v.is_empty())
            .unwrap_or(false);

        Self {
            mode,
            port,
            deprecate_rest,
        }
    }
}

/// Content-provider settings, fixed once at process start.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub language: String,
    pub user_agent: String,
    /// Overrides `https://{language}.wikipedia.org`.
    pub base_url: Option<String>,
    pub timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub retries: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            language: "en".into(),
            user_agent: format!(
                "{}/{} (https://github.com/wiki-mcp-gateway)",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ),
            base_url: None,
            timeout_ms: 10_000,
            connect_timeout_ms: 2_000,
            retries: 2,
        }
    }
}

impl ProviderConfig {
    /// Optional TOML file named by `WIKI_CONFIG`, then `WIKI_*` env overrides.
    pub fn from_env_and_toml() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("WIKI_CONFIG") {
            Ok(path) if !path.trim().is_empty() => {
                let raw = std::fs::read_to_string(&path)
                    .map_err(|e| anyhow::anyhow!("reading {path}: {e}"))?;
                Self::from_toml_str(&raw)?
            }
            _ => Self::default(),
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env(&mut self) {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        if let Some(lang) = non_empty("WIKI_LANG") {
            self.language = lang;
        }
        if let Some(ua) = non_empty("WIKI_USER_AGENT") {
            self.user_agent = ua;
        }
        if let Some(base) = non_empty("WIKI_BASE_URL") {
            self.base_url = Some(base);
        }
        if let Some(ms) = non_empty("WIKI_TIMEOUT_MS").and_then(|s| s.parse().ok()) {
            self.timeout_ms = ms;
        }
        if let Some(n) = non_empty("WIKI_RETRIES").and_then(|s| s.parse().ok()) {
            self.retries = n;
        }
    }

    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(base) => base.trim_end_matches('/').to_owned(),
            None => format!("https://{}.wikipedia.org", self.language),
        }
    }
}
