use crate::{
    config::{PlannerConfig, DEFAULT_MAX_TOKENS, DEFAULT_MAX_TURNS, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS},
    error::Result,
    services::chat_client::{ChatBackend, OpenRouterClient},
};
use std::{sync::Arc, time::Duration};

use super::session::ClarificationSession;

/// Entry point for itinerary planning.
///
/// Holds the AI backend and per-session limits; every call to
/// [`Planner::session`] starts an independent conversation.
#[derive(Debug, Clone)]
pub struct Planner {
    backend: Arc<dyn ChatBackend>,
    model: String,
    max_turns: usize,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl Planner {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_backend(Arc::new(OpenRouterClient::new(api_key)))
    }

    /// Planner backed by any [`ChatBackend`], e.g. a scripted one in tests.
    pub fn with_backend(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            model: DEFAULT_MODEL.to_string(),
            max_turns: DEFAULT_MAX_TURNS,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        config.validate()?;

        let client = OpenRouterClient::new(config.api_key.clone())
            .with_base_url(config.base_url.clone())
            .with_timeout(config.timeout);

        Ok(Self::with_backend(Arc::new(client))
            .with_model(config.model.clone())
            .with_max_turns(config.max_turns)
            .with_max_tokens(config.max_tokens)
            .with_timeout(config.timeout))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub(crate) fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn backend(&self) -> &dyn ChatBackend {
        self.backend.as_ref()
    }

    /// Start a new clarification conversation.
    pub fn session(&self) -> ClarificationSession<'_> {
        ClarificationSession::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlannerError;

    #[test]
    fn test_from_config_applies_settings() {
        let config = PlannerConfig::new("sk-test")
            .with_model("openai/gpt-4.1-mini")
            .with_max_turns(4)
            .with_timeout(Duration::from_secs(30));

        let planner = Planner::from_config(&config).unwrap();
        assert_eq!(planner.model(), "openai/gpt-4.1-mini");
        assert_eq!(planner.max_turns(), 4);
        assert_eq!(planner.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let err = Planner::from_config(&PlannerConfig::new("")).unwrap_err();
        assert!(matches!(err, PlannerError::Config(_)));
    }
}
