pub mod error;
pub mod llm;
pub mod rate_limit;
pub mod turn;

pub use error::{AttemptFailure, CompletionError, TransportError};
pub use llm::{ChatRequest, CompletionClient, CompletionTransport, HttpTransport, RawResponse};
pub use rate_limit::RequestLedger;
pub use turn::{ConversationKey, InvalidKey, InvalidRole, Role, Turn};
