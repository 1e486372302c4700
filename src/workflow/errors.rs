//! Error types for the session/UI reconciler.

use thiserror::Error;

use crate::core::SessionId;
use crate::storage::StoreError;

use super::state::Phase;

/// Reconciler error type.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The command makes no sense in the current UI state.
    #[error("invalid command in phase {phase:?}: {reason}")]
    InvalidCommand {
        /// Phase the command arrived in.
        phase: Phase,
        /// What was missing.
        reason: &'static str,
    },
    /// No session with this id.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
    /// Persisting a message failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience result alias for reconciler operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
