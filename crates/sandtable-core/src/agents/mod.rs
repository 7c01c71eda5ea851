//! Agent adapters: completion boundary, prompts, tools, and the per-role
//! adapter that turns a world view into one produced message.

pub mod adapter;
pub mod completion;
pub mod prompts;
pub mod tools;

pub use adapter::{AgentAdapter, AgentTurn, Visibility, WorldView};
pub use completion::{CompletionClient, CompletionError, OllamaClient, OllamaConfig};
pub use tools::{tool_requests, ToolRegistry, ToolRequest};
