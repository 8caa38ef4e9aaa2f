// crates/core/src/error.rs

//! Error taxonomy for the agent loop.
//!
//! Only `Transport` and `MaxIterations` end a run. Everything else is
//! absorbed: validation failures drop the offending call, date failures
//! degrade to a flagged fallback, and store-level failures are fed back to
//! the model as failed tool results so its next turn can recover.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// The model endpoint stayed unreachable after the bounded retries.
    #[error("model transport failed: {0}")]
    Transport(String),

    /// A tool call named something outside the catalog.
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    /// A tool call omitted a field its schema marks required.
    #[error("tool '{tool}' is missing required argument '{field}'")]
    MissingArgument { tool: String, field: String },

    /// A date/time expression survived neither the relative vocabulary nor
    /// absolute parsing.
    #[error("unparseable date/time expression '{0}'")]
    UnparseableDate(String),

    /// No stored event matched a human-readable identifier.
    #[error("no calendar event matched '{0}'")]
    EventNotFound(String),

    /// The orchestrator hit its iteration ceiling before the model stopped
    /// calling tools.
    #[error("conversation did not complete within {0} iterations")]
    MaxIterations(usize),
}
