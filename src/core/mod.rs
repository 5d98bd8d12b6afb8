pub mod interactive;
pub mod memory;
pub mod planner;
pub mod session;
pub mod turns;

pub use interactive::{is_cancel_word, prompt_line, run_interactive, SessionEnd};
pub use memory::SessionMemory;
pub use planner::Planner;
pub use session::{ClarificationSession, LoopStep};
pub use turns::SessionTurn;
