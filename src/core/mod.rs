//! Core data model shared by every layer.

pub mod ids;
pub mod image;
pub mod session;

pub use ids::{MessageId, ProductId, SessionId};
pub use session::{Message, Product, Proposal, Role, Session, WorkMode};
