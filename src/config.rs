use std::{path::Path, time::Duration};

use tracing::debug;

use crate::error::{PlannerError, Result};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3-0324";
pub const DEFAULT_MAX_TURNS: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Runtime settings for the planner, resolved from `.env`, the process
/// environment, and CLI overrides (in increasing priority).
#[derive(Clone, Debug)]
pub struct PlannerConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_turns: usize,
    pub timeout: Duration,
    pub max_tokens: Option<u32>,
}

impl PlannerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_turns: DEFAULT_MAX_TURNS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
        }
    }

    /// Load the local configuration file and then read the environment.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        load_env_file(env_file)?;
        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::resolve(&ConfigOverrides::default(), lookup)
    }

    /// Resolve settings with `overrides` taking priority over `lookup`.
    ///
    /// A variable is only read when no override covers it, so a malformed
    /// environment value does not matter once a flag replaces it.
    pub fn resolve<F>(overrides: &ConfigOverrides, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = overrides
            .api_key
            .clone()
            .or_else(|| lookup("OPENROUTER_API_KEY"))
            .or_else(|| lookup("OPENAI_API_KEY"))
            .ok_or_else(|| {
                PlannerError::Config(
                    "OPENROUTER_API_KEY not found. Add it to your .env file or pass --api-key"
                        .to_string(),
                )
            })?;

        let mut config = Self::new(api_key);

        if let Some(base_url) = overrides
            .base_url
            .clone()
            .or_else(|| lookup("OPENROUTER_BASE_URL"))
            .or_else(|| lookup("OPENAI_BASE_URL"))
        {
            config = config.with_base_url(base_url);
        }

        if let Some(model) = overrides.model.clone().or_else(|| lookup("ITINERARY_MODEL")) {
            config = config.with_model(model);
        }

        let max_turns = match overrides.max_turns {
            Some(max_turns) => Some(max_turns),
            None => lookup("ITINERARY_MAX_TURNS")
                .map(|raw| parse_number(&raw, "ITINERARY_MAX_TURNS"))
                .transpose()?,
        };
        if let Some(max_turns) = max_turns {
            config = config.with_max_turns(max_turns);
        }

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => Some(secs),
            None => lookup("ITINERARY_TIMEOUT_SECS")
                .map(|raw| parse_number(&raw, "ITINERARY_TIMEOUT_SECS"))
                .transpose()?,
        };
        if let Some(secs) = timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(PlannerError::Config("API key is empty".to_string()));
        }
        if key.chars().any(char::is_whitespace) {
            return Err(PlannerError::Config(
                "API key must not contain whitespace".to_string(),
            ));
        }
        if self.max_turns == 0 {
            return Err(PlannerError::Config(
                "max turns must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(PlannerError::Config(
                "timeout must be at least 1 second".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(PlannerError::Config("model name is empty".to_string()));
        }
        Ok(())
    }
}

/// Settings given explicitly, usually on the command line.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_turns: Option<usize>,
    pub timeout_secs: Option<u64>,
}

/// Load variables from `env_file`, or from a `.env` in the working directory.
///
/// A missing default `.env` is fine; an explicitly requested file that
/// cannot be read is a configuration error.
pub fn load_env_file(env_file: Option<&Path>) -> Result<()> {
    match env_file {
        Some(path) => {
            dotenvy::from_path(path).map_err(|err| {
                PlannerError::Config(format!(
                    "failed to load configuration file {}: {}",
                    path.display(),
                    err
                ))
            })?;
        }
        None => {
            if let Ok(path) = dotenvy::dotenv() {
                debug!(target: "itinerary::config", "loaded {}", path.display());
            }
        }
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| PlannerError::Config(format!("{} must be a number, got `{}`", name, raw)))
}
