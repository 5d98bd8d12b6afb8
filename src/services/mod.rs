pub mod chat_client;
pub(crate) mod prompts;
pub(crate) mod reply;

pub use chat_client::{ChatBackend, ChatCompletionRequest, OpenRouterClient};
