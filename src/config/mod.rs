mod settings;

pub use settings::{
    HistoryConfig, LLMConfig, LoggingConfig, RateLimitConfig, ReplyConfig, RetryConfig, Settings,
};
