//! itinerary-agent-rs: a conversational travel itinerary generator
//!
//! A [`Planner`] talks to an OpenAI-compatible chat-completions API
//! (OpenRouter by default). Each [`ClarificationSession`] asks the traveler
//! follow-up questions until destination, duration, travelers and budget are
//! known, then receives a structured [`ItineraryResult`] that the
//! [`presenter`] renders as text, Markdown or JSON.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use itinerary_agent_rs::{LoopStep, Planner, PlannerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PlannerConfig::load(None)?;
//!     let planner = Planner::from_config(&config)?;
//!
//!     let mut session = planner.session();
//!     match session.submit("Four days in Lisbon for two adults, 1500 EUR").await? {
//!         LoopStep::Question(follow_up) => println!("{}", follow_up.question),
//!         LoopStep::Itinerary(outcome) => println!("{}", outcome.replay()),
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod presenter;
pub mod schemas;
pub mod services;
pub mod types;

pub use config::PlannerConfig;
pub use crate::core::{
    run_interactive, ClarificationSession, LoopStep, Planner, SessionEnd, SessionMemory,
    SessionTurn,
};
pub use error::{PlannerError, Result};
pub use presenter::OutputFormat;
pub use schemas::{CompletionSchema, SchemaHandle};
pub use services::{ChatBackend, OpenRouterClient};
pub use types::{
    deserialize_structured_response, FollowUp, ItineraryOutcome, ItineraryResult, TokenUsage,
    TripRequest,
};

#[cfg(feature = "cli")]
pub mod cli;
