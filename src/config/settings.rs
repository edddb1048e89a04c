use anyhow::Result;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-r1-0528-qwen3-8b:free";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly and helpful AI assistant on Discord. \
You should be conversational, engaging, and provide useful responses. \
Keep your messages concise but informative. Use Discord markdown when appropriate \
(like **bold** for emphasis, `code` for code snippets, etc.). \
Be respectful and maintain a positive tone in all interactions.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub history: HistoryConfig,
    pub llm: LLMConfig,
    pub rate_limit: RateLimitConfig,
    pub retry: RetryConfig,
    pub reply: ReplyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub max_turns: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    pub base_url: String,
    pub model: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub request_timeout_secs: f64,
    pub referer: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests: usize,
    pub window_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub base_delay_secs: f64,
    pub max_retries: u32,
}

/// Maximum characters per outgoing chat message. Consumers split longer
/// replies; the completion client does not truncate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    pub max_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// Defaults, then `config/{CONFIG_ENV}` if present, then `APP__*` environment variables.
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let config = Self::defaults()?
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Defaults overlaid with a single configuration file. Environment is ignored.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::defaults()?
            .add_source(File::from(path.as_ref()))
            .build()?;

        config.try_deserialize()
    }

    pub fn api_key() -> Result<String> {
        env::var("OPENROUTER_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENROUTER_API_KEY environment variable not set"))
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("history.max_turns", 20)?
            .set_default("llm.base_url", DEFAULT_BASE_URL)?
            .set_default("llm.model", DEFAULT_MODEL)?
            .set_default("llm.system_prompt", DEFAULT_SYSTEM_PROMPT)?
            .set_default("llm.max_tokens", 2000)?
            .set_default("llm.temperature", 0.7)?
            .set_default("llm.top_p", 0.9)?
            .set_default("llm.request_timeout_secs", 30.0)?
            .set_default("llm.referer", "https://discord-ai-bot")?
            .set_default("llm.title", "Discord AI Bot")?
            .set_default("rate_limit.requests", 10)?
            .set_default("rate_limit.window_secs", 60.0)?
            .set_default("retry.base_delay_secs", 1.0)?
            .set_default("retry.max_retries", 3)?
            .set_default("reply.max_length", 2000)?
            .set_default("logging.level", "info")
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history: HistoryConfig { max_turns: 20 },
            llm: LLMConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                model: DEFAULT_MODEL.to_string(),
                system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
                max_tokens: 2000,
                temperature: 0.7,
                top_p: 0.9,
                request_timeout_secs: 30.0,
                referer: "https://discord-ai-bot".to_string(),
                title: "Discord AI Bot".to_string(),
            },
            rate_limit: RateLimitConfig {
                requests: 10,
                window_secs: 60.0,
            },
            retry: RetryConfig {
                base_delay_secs: 1.0,
                max_retries: 3,
            },
            reply: ReplyConfig { max_length: 2000 },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl LLMConfig {
    pub fn request_timeout(&self) -> Duration {
        secs(self.request_timeout_secs)
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        secs(self.window_secs)
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        secs(self.base_delay_secs)
    }
}

// Negative or NaN values from a misconfigured file collapse to zero.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_configuration() {
        let settings = Settings::default();
        assert_eq!(settings.history.max_turns, 20);
        assert_eq!(settings.rate_limit.requests, 10);
        assert_eq!(settings.rate_limit.window(), Duration::from_secs(60));
        assert_eq!(settings.retry.base_delay(), Duration::from_secs(1));
        assert_eq!(settings.retry.max_retries, 3);
        assert_eq!(settings.llm.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.reply.max_length, 2000);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[history]\nmax_turns = 5\n\n[rate_limit]\nrequests = 2\nwindow_secs = 0.5\n"
        )
        .unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.history.max_turns, 5);
        assert_eq!(settings.rate_limit.requests, 2);
        assert_eq!(settings.rate_limit.window(), Duration::from_millis(500));
        // untouched sections keep their defaults
        assert_eq!(settings.retry.max_retries, 3);
        assert_eq!(settings.llm.model, DEFAULT_MODEL);
    }

    // The only test that touches process environment or calls Settings::new().
    #[test]
    fn test_environment_overrides_defaults() {
        env::set_var("APP__HISTORY__MAX_TURNS", "7");
        env::set_var("APP__RETRY__BASE_DELAY_SECS", "0.25");
        let settings = Settings::new();
        env::remove_var("APP__HISTORY__MAX_TURNS");
        env::remove_var("APP__RETRY__BASE_DELAY_SECS");

        let settings = settings.unwrap();
        assert_eq!(settings.history.max_turns, 7);
        assert_eq!(settings.retry.base_delay(), Duration::from_millis(250));
        assert_eq!(settings.rate_limit.requests, 10);
    }

    #[test]
    fn test_negative_duration_collapses_to_zero() {
        assert_eq!(secs(-1.0), Duration::ZERO);
        assert_eq!(secs(f64::NAN), Duration::ZERO);
    }
}
