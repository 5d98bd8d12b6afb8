use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::schemas::validation::ASK_FOLLOW_UP_TOOL_NAME;

/// A single entry in the clarification conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionTurn {
    /// Initial free-text trip description
    Request { content: String },
    /// Follow-up question from the AI service
    Question {
        question: String,
        /// Present when the question arrived as an `ask_follow_up` tool call
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<Value>,
    },
    /// Traveler's answer to the previous question
    Answer {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call_id: Option<String>,
    },
    /// Terminal itinerary received
    Itinerary { destination: Option<String> },
}

impl SessionTurn {
    /// Convert the turn to chat-completions message format.
    ///
    /// The terminal itinerary is never sent back, so it has no message.
    pub fn to_message(&self) -> Option<Value> {
        match self {
            SessionTurn::Request { content } => Some(json!({
                "role": "user",
                "content": content
            })),
            SessionTurn::Question {
                question,
                tool_call_id: Some(id),
                arguments,
            } => {
                let arguments = arguments
                    .clone()
                    .unwrap_or_else(|| json!({ "question": question }));
                Some(json!({
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": id,
                        "type": "function",
                        "function": {
                            "name": ASK_FOLLOW_UP_TOOL_NAME,
                            "arguments": arguments.to_string()
                        }
                    }]
                }))
            }
            SessionTurn::Question { question, .. } => Some(json!({
                "role": "assistant",
                "content": question
            })),
            SessionTurn::Answer {
                content,
                tool_call_id: Some(id),
            } => Some(json!({
                "role": "tool",
                "tool_call_id": id,
                "content": json!({ "answer": content }).to_string()
            })),
            SessionTurn::Answer { content, .. } => Some(json!({
                "role": "user",
                "content": content
            })),
            SessionTurn::Itinerary { .. } => None,
        }
    }

    /// Get a human-readable description of the turn
    pub fn describe(&self) -> String {
        match self {
            SessionTurn::Request { content } => format!("🧭 Request: {}", content),
            SessionTurn::Question { question, .. } => format!("❓ Question: {}", question),
            SessionTurn::Answer { content, .. } => format!("💬 Answer: {}", content),
            SessionTurn::Itinerary { destination } => format!(
                "✅ Itinerary: {}",
                destination.as_deref().unwrap_or("unknown destination")
            ),
        }
    }
}
