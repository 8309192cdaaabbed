//! Conversational core: session state, intent routing, prompt templates,
//! and the per-turn orchestrator.

pub mod handlers;
pub mod intent;
pub mod orchestrator;
pub mod prompts;
pub mod store;
