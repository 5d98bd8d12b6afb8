use crate::core::turns::SessionTurn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{itinerary::ItineraryResult, trip::TripRequest};

/// Terminal result of a clarification session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryOutcome {
    /// Itinerary as read from the AI payload, back-filled from the request
    pub itinerary: ItineraryResult,
    /// Payload exactly as the AI service returned it
    pub raw: Value,
    /// Trip details collected during the conversation
    pub request: TripRequest,
    /// Conversation transcript
    pub turns: Vec<SessionTurn>,
    /// Total tokens used (if available from API)
    pub tokens: Option<TokenUsage>,
    /// Wall-clock duration of the session
    pub duration: Duration,
    /// Number of request/response round-trips with the AI service
    pub exchanges: usize,
    /// Schema violations found in the raw payload
    pub schema_warnings: Vec<String>,
    /// RFC 3339 timestamp of when the itinerary arrived
    pub generated_at: String,
}

/// Token usage information from the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Read the `usage` object of a completion response.
    pub fn from_response(response: &Value) -> Option<Self> {
        let usage = response.get("usage")?;
        Some(Self {
            prompt_tokens: token_count(usage.get("prompt_tokens")?)?,
            completion_tokens: token_count(usage.get("completion_tokens")?)?,
            total_tokens: token_count(usage.get("total_tokens")?)?,
        })
    }

    pub fn accumulate(total: Option<Self>, next: Option<Self>) -> Option<Self> {
        match (total, next) {
            (Some(a), Some(b)) => Some(Self {
                prompt_tokens: a.prompt_tokens.saturating_add(b.prompt_tokens),
                completion_tokens: a.completion_tokens.saturating_add(b.completion_tokens),
                total_tokens: a.total_tokens.saturating_add(b.total_tokens),
            }),
            (a, b) => a.or(b),
        }
    }
}

/// Counts past `u32::MAX` clamp instead of wrapping.
fn token_count(value: &Value) -> Option<u32> {
    value
        .as_u64()
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

impl ItineraryOutcome {
    /// Whether the raw payload conformed to the itinerary schema
    pub fn is_well_formed(&self) -> bool {
        self.schema_warnings.is_empty()
    }

    pub fn question_count(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| matches!(t, SessionTurn::Question { .. }))
            .count()
    }

    /// Generate a human-readable replay of the session
    pub fn replay(&self) -> String {
        let mut lines = Vec::new();

        lines.push("=== Planning Session Trace ===".to_string());
        lines.push(format!("Duration: {:.2}s", self.duration.as_secs_f64()));
        lines.push(format!("Exchanges: {}", self.exchanges));
        lines.push(format!("Questions: {}", self.question_count()));

        if let Some(tokens) = &self.tokens {
            lines.push(format!(
                "Tokens: {} prompt + {} completion = {} total",
                tokens.prompt_tokens, tokens.completion_tokens, tokens.total_tokens
            ));
        }

        lines.push(String::new());
        lines.push("--- Turns ---".to_string());
        for (idx, turn) in self.turns.iter().enumerate() {
            lines.push(format!("{}. {}", idx + 1, turn.describe()));
        }

        lines.push(String::new());
        lines.push("--- Collected Request ---".to_string());
        lines.push(self.request.summary());

        if !self.schema_warnings.is_empty() {
            lines.push(String::new());
            lines.push("--- Schema Warnings ---".to_string());
            lines.extend(self.schema_warnings.iter().cloned());
        }

        lines.join("\n")
    }
}
