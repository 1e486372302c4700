//! Session/UI reconciler.
//!
//! Transitions come only from stylist commands and from the action parsed
//! out of the following model reply. [`reduce`] computes them; a
//! [`Conversation`] runs the resulting effects in order; a [`Workspace`]
//! keeps the session list of one mode.

pub mod conversation;
pub mod errors;
pub mod reducer;
pub mod state;
pub mod templates;
pub mod workspace;

pub use conversation::{Conversation, history};
pub use errors::{WorkflowError, WorkflowResult};
pub use reducer::reduce;
pub use state::{DishImage, Effect, Phase, RevisionAspect, Transition, UiCommand, UiEvent, UiState};
pub use workspace::{Workspace, list_of_mode};
