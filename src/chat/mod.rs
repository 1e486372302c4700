//! Chat transport: request multiplexing, rate-limit retry and the error
//! taxonomy of the `/api/chat` endpoint.

pub mod errors;
pub mod request;
pub mod service;
pub mod transport;

pub use errors::{ChatError, ChatResult};
pub use request::{ChatReply, ChatRequest, ErrorReply, ImageReply};
pub use service::ChatService;
pub use transport::{ChatFuture, ChatTransport, IMAGE_FAILURE_TEXT, ImageOutcome};
