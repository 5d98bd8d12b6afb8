use super::turns::SessionTurn;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

/// Ordered record of the clarification conversation.
///
/// The system prompt is rebuilt every exchange from the collected trip
/// details, so it is passed in when rendering messages instead of stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMemory {
    turns: Vec<SessionTurn>,
}

impl SessionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_turn(&mut self, turn: SessionTurn) {
        info!(target: "itinerary::session", "{}", turn.describe());
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[SessionTurn] {
        &self.turns
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drop every turn recorded after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.turns.truncate(len);
    }

    pub fn count_questions(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| matches!(t, SessionTurn::Question { .. }))
            .count()
    }

    /// Tool call id of the question awaiting an answer, if it was a tool call.
    pub fn pending_tool_call_id(&self) -> Option<&str> {
        match self.turns.last() {
            Some(SessionTurn::Question {
                tool_call_id: Some(id),
                ..
            }) => Some(id.as_str()),
            _ => None,
        }
    }

    /// Convert memory to chat-completions message format
    pub fn as_messages(&self, system_prompt: &str) -> Vec<Value> {
        let mut messages = vec![json!({
            "role": "system",
            "content": system_prompt
        })];

        messages.extend(self.turns.iter().filter_map(SessionTurn::to_message));
        messages
    }
}
