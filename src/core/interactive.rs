use std::io::{BufRead, Write};

use tracing::info;

use crate::{
    error::{PlannerError, Result},
    types::outcome::ItineraryOutcome,
};

use super::session::{ClarificationSession, LoopStep};

const CANCEL_WORDS: [&str; 6] = ["quit", "exit", "q", "/quit", "/exit", "/cancel"];

/// How an interactive session ended.
#[derive(Debug)]
pub enum SessionEnd {
    Completed(Box<ItineraryOutcome>),
    Cancelled,
}

pub fn is_cancel_word(input: &str) -> bool {
    let lowered = input.trim().to_lowercase();
    CANCEL_WORDS.contains(&lowered.as_str())
}

/// Print `prompt` and read one line. `None` means end of input.
pub fn prompt_line<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> Result<Option<String>> {
    write!(output, "{}", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Drive a session from a line-oriented reader until it ends.
///
/// Every exchange with the AI service consumes one line of input, so the
/// loop cannot spin without the user. Errors the user can recover from are
/// printed and the user is asked again; the rest are returned.
pub async fn run_interactive<R: BufRead, W: Write>(
    session: &mut ClarificationSession<'_>,
    initial_request: Option<&str>,
    input: &mut R,
    output: &mut W,
) -> Result<SessionEnd> {
    info!(target: "itinerary::session", "starting clarification session");

    let mut pending = initial_request
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);
    let mut prompt = "Describe your trip: ";

    loop {
        let text = match pending.take() {
            Some(text) => text,
            None => match prompt_line(input, output, prompt)? {
                Some(text) => text,
                None => {
                    // EOF - treat as cancel
                    writeln!(output, "\nPlanning cancelled.")?;
                    return Ok(SessionEnd::Cancelled);
                }
            },
        };

        if text.is_empty() {
            continue;
        }

        if is_cancel_word(&text) {
            writeln!(output, "Planning cancelled.")?;
            return Ok(SessionEnd::Cancelled);
        }

        match session.submit(&text).await {
            Ok(LoopStep::Question(follow_up)) => {
                if session.is_exhausted() {
                    return Err(PlannerError::MaxTurns(session.exchanges()));
                }
                if let Some(note) = follow_up
                    .needs_disambiguation
                    .as_deref()
                    .filter(|note| *note != follow_up.question)
                {
                    writeln!(output, "\n🤔 {}", note)?;
                }
                writeln!(output, "\n{}\n", follow_up.question)?;
                prompt = "> ";
            }
            Ok(LoopStep::Itinerary(outcome)) => {
                writeln!(output, "\n✅ Itinerary ready.\n")?;
                return Ok(SessionEnd::Completed(outcome));
            }
            Err(err) if err.is_recoverable() => {
                writeln!(output, "\n⚠️  {}", err)?;
                writeln!(output, "Answer again to retry, or type 'quit' to cancel.\n")?;
            }
            Err(err) => return Err(err),
        }
    }
}
