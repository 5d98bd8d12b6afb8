use std::time::Instant;

use serde_json::{json, Value};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::{
    error::{PlannerError, Result},
    schemas::{
        validation::{
            ask_follow_up_tool_definition, schema_violations, submit_itinerary_tool_definition,
        },
        CompletionSchema,
    },
    services::{
        chat_client::ChatCompletionRequest,
        prompts::system_prompt,
        reply::{parse_reply, AssistantReply},
    },
    types::{
        itinerary::ItineraryResult,
        outcome::{ItineraryOutcome, TokenUsage},
        trip::{FollowUp, TripRequest},
    },
};

use super::{memory::SessionMemory, planner::Planner, turns::SessionTurn};

/// Result of submitting one piece of user text.
#[derive(Debug, Clone)]
pub enum LoopStep {
    /// The AI service needs more information
    Question(FollowUp),
    /// The conversation is over
    Itinerary(Box<ItineraryOutcome>),
}

/// One clarification conversation with the AI service.
#[derive(Debug)]
pub struct ClarificationSession<'a> {
    planner: &'a Planner,
    memory: SessionMemory,
    request: TripRequest,
    ambiguity: Option<String>,
    exchanges: usize,
    tokens: Option<TokenUsage>,
    started: Instant,
    finished: bool,
}

impl<'a> ClarificationSession<'a> {
    pub(crate) fn new(planner: &'a Planner) -> Self {
        Self {
            planner,
            memory: SessionMemory::new(),
            request: TripRequest::default(),
            ambiguity: None,
            exchanges: 0,
            tokens: None,
            started: Instant::now(),
            finished: false,
        }
    }

    /// Trip details accepted so far
    pub fn request(&self) -> &TripRequest {
        &self.request
    }

    pub fn memory(&self) -> &SessionMemory {
        &self.memory
    }

    pub fn exchanges(&self) -> usize {
        self.exchanges
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// No exchanges left; submitting more text would fail.
    pub fn is_exhausted(&self) -> bool {
        self.exchanges >= self.planner.max_turns()
    }

    /// Send user text to the AI service and interpret the reply.
    ///
    /// On failure the conversation is left exactly as it was before the
    /// call, so the same answer can be submitted again.
    pub async fn submit(&mut self, text: &str) -> Result<LoopStep> {
        if self.finished {
            return Err(PlannerError::Session(
                "this session already produced its itinerary".to_string(),
            ));
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(PlannerError::Validation("input is empty".to_string()));
        }

        if self.is_exhausted() {
            return Err(PlannerError::MaxTurns(self.planner.max_turns()));
        }

        let checkpoint = self.memory.turn_count();
        let turn = if self.memory.is_empty() {
            SessionTurn::Request {
                content: text.to_string(),
            }
        } else {
            SessionTurn::Answer {
                content: text.to_string(),
                tool_call_id: self.memory.pending_tool_call_id().map(str::to_string),
            }
        };
        self.memory.add_turn(turn);

        let response = match self.exchange().await {
            Ok(response) => response,
            Err(err) => {
                warn!(target: "itinerary::session", error = %err, "exchange failed, rolling back");
                self.memory.truncate(checkpoint);
                return Err(err);
            }
        };

        let reply = match parse_reply(&response) {
            Ok(reply) => reply,
            Err(err) => {
                self.memory.truncate(checkpoint);
                return Err(err);
            }
        };

        self.exchanges += 1;
        self.tokens = TokenUsage::accumulate(self.tokens, TokenUsage::from_response(&response));

        Ok(match reply {
            AssistantReply::Question {
                follow_up,
                tool_call_id,
                arguments,
            } => LoopStep::Question(self.record_question(follow_up, tool_call_id, arguments)),
            AssistantReply::Itinerary { payload } => {
                LoopStep::Itinerary(Box::new(self.finish(payload)))
            }
        })
    }

    async fn exchange(&self) -> Result<Value> {
        let prompt = system_prompt(&self.request, self.ambiguity.as_deref());
        let tools = vec![
            ask_follow_up_tool_definition(FollowUp::schema()),
            submit_itinerary_tool_definition(ItineraryResult::schema()),
        ];

        let body = ChatCompletionRequest::new(self.planner.model(), self.memory.as_messages(&prompt))
            .with_tools(tools)
            .with_tool_choice(json!("auto"))
            .with_max_tokens(self.planner.max_tokens())
            .into_value();

        timeout(self.planner.timeout(), self.planner.backend().complete(&body))
            .await
            .map_err(|_| {
                PlannerError::Timeout(format!(
                    "AI service did not answer within {}s",
                    self.planner.timeout().as_secs()
                ))
            })?
    }

    fn record_question(
        &mut self,
        follow_up: FollowUp,
        tool_call_id: Option<String>,
        arguments: Option<Value>,
    ) -> FollowUp {
        let ambiguous = follow_up.needs_disambiguation.is_some();
        if let Some(collected) = follow_up.collected.clone() {
            for note in self.request.merge(collected, ambiguous) {
                warn!(target: "itinerary::session", "rejected collected value: {}", note);
            }
        }
        self.ambiguity = follow_up.needs_disambiguation.clone();

        self.memory.add_turn(SessionTurn::Question {
            question: follow_up.question.clone(),
            tool_call_id,
            arguments,
        });
        follow_up
    }

    fn finish(&mut self, payload: Value) -> ItineraryOutcome {
        let schema_warnings = schema_violations(ItineraryResult::schema(), &payload);
        for violation in &schema_warnings {
            warn!(target: "itinerary::session", "itinerary schema violation: {}", violation);
        }

        let duration = self.started.elapsed();
        let mut itinerary = ItineraryResult::from_value_lenient(&payload);
        itinerary.backfill(&self.request);
        if itinerary.generation_seconds.is_none() {
            itinerary.generation_seconds = Some(duration.as_secs_f64());
        }

        self.memory.add_turn(SessionTurn::Itinerary {
            destination: itinerary.destination.clone(),
        });
        self.finished = true;
        info!(
            target: "itinerary::session",
            exchanges = self.exchanges,
            "itinerary received after {:.1}s",
            duration.as_secs_f64()
        );

        ItineraryOutcome {
            itinerary,
            raw: payload,
            request: self.request.clone(),
            turns: self.memory.turns().to_vec(),
            tokens: self.tokens,
            duration,
            exchanges: self.exchanges,
            schema_warnings,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
