//! Email workflow — priority classification, context retrieval, and
//! priority-routed response generation.
//!
//! Every inbound email flows through:
//! 1. `PriorityClassifier::classify()` — rules fast path, then LLM
//! 2. `ContextStore::retrieve()` — related prior messages
//! 3. One of three `ResponseDrafter` paths, selected by priority
//!
//! Any step failure is logged once and propagated; the request fails
//! atomically.

pub mod classifier;
pub mod context;
pub mod drafter;
pub mod orchestrator;
pub mod rules;
pub mod types;

pub use classifier::{LlmClassifier, PriorityClassifier};
pub use context::{ContextStore, MessageIndex};
pub use drafter::{LlmDrafter, ResponseDrafter};
pub use orchestrator::Orchestrator;
pub use rules::PriorityRules;
pub use types::{
    ContextSnippet, DraftedReply, EmailContext, InboundEmail, Priority, ResponseKind,
    WorkflowResult,
};
