use anyhow::{anyhow, Result};
use std::env;
use std::net::SocketAddr;

pub const DEFAULT_TMDB_BASE: &str = "https://api.themoviedb.org/3";
const DEFAULT_API_VERSION: &str = "2024-10-21";
const DEFAULT_AGENT_NAME: &str = "Movie Assistant";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_ENVIRONMENT: &str = "Production";
const DEFAULT_MACHINE_NAME: &str = "unknown";

#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb: TmdbConfig,
    pub agent: AgentConfig,
    pub bind_addr: SocketAddr,
    /// Reported by `/version` only.
    pub environment: String,
    pub machine_name: String,
}

impl Config {
    /// Reads every setting once at startup. Missing required values are fatal.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("Missing required environment variable: {}", key))
        };
        let optional = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let tmdb = TmdbConfig {
            api_key: required("TMDB_API_KEY")?,
            base_url: optional("TMDB_BASE_URL", DEFAULT_TMDB_BASE)
                .trim_end_matches('/')
                .to_string(),
        };
        let agent = AgentConfig {
            endpoint: required("AZURE_OPENAI_ENDPOINT")?
                .trim_end_matches('/')
                .to_string(),
            api_key: required("AZURE_OPENAI_API_KEY")?,
            deployment: required("AZURE_OPENAI_DEPLOYMENT")?,
            api_version: optional("AZURE_OPENAI_API_VERSION", DEFAULT_API_VERSION),
            name: optional("AGENT_NAME", DEFAULT_AGENT_NAME),
        };
        let bind_raw = optional("BIND_ADDR", DEFAULT_BIND_ADDR);
        let bind_addr = bind_raw
            .parse()
            .map_err(|e| anyhow!("BIND_ADDR '{}' is not a socket address: {}", bind_raw, e))?;

        Ok(Self {
            tmdb,
            agent,
            bind_addr,
            environment: optional("APP_ENV", DEFAULT_ENVIRONMENT),
            machine_name: optional("HOSTNAME", DEFAULT_MACHINE_NAME),
        })
    }
}
