use thiserror::Error;

/// Failure of a single completion attempt. Every variant is retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    #[error("rate limited by remote (429)")]
    RateLimited,

    #[error("API error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Connection-level failure reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Connection(String),
}

impl From<TransportError> for AttemptFailure {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => AttemptFailure::Timeout,
            TransportError::Connection(msg) => AttemptFailure::Transport(msg),
        }
    }
}

/// Terminal outcome of `complete` when no reply text is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: AttemptFailure },

    #[error("malformed completion payload: {0}")]
    MalformedPayload(String),
}

impl CompletionError {
    /// Wording suitable for showing to a chat user in place of a reply.
    pub fn user_message(&self) -> String {
        match self {
            CompletionError::RetriesExhausted { last, .. } => match last {
                AttemptFailure::RateLimited => {
                    "Sorry, I'm currently rate limited. Please try again later.".to_string()
                }
                AttemptFailure::ServerError { status, .. } => {
                    format!("Sorry, I encountered an error: {}", status)
                }
                AttemptFailure::Timeout => {
                    "Sorry, the request timed out. Please try again.".to_string()
                }
                AttemptFailure::Transport(msg) => {
                    format!("Sorry, I encountered an unexpected error: {}", msg)
                }
            },
            CompletionError::MalformedPayload(_) => {
                "Sorry, I couldn't generate a response right now. Please try again.".to_string()
            }
        }
    }

    /// True when the remote answered but produced nothing usable.
    pub fn is_no_response(&self) -> bool {
        matches!(self, CompletionError::MalformedPayload(_))
    }
}
