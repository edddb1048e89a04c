use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::config::Settings;
use crate::core::error::{AttemptFailure, CompletionError, TransportError};
use crate::core::rate_limit::RequestLedger;
use crate::core::turn::{Role, Turn};

/// Body of `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Turn>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub stream: bool,
}

/// Status and body of a completed HTTP exchange, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends one completion request over the wire.
///
/// Implementations report connection-level failures only; status codes are
/// interpreted by [`CompletionClient`].
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<RawResponse, TransportError>;
}

/// OpenRouter-compatible HTTP transport.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_key: String,
    referer: String,
    title: String,
}

impl HttpTransport {
    pub fn new(api_key: String, settings: &Settings) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!(
                "{}/chat/completions",
                settings.llm.base_url.trim_end_matches('/')
            ),
            api_key,
            referer: settings.llm.referer.clone(),
            title: settings.llm.title.clone(),
        }
    }

}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(request)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify_reqwest_error)?;

        Ok(RawResponse { status, body })
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connection(err.to_string())
    }
}

enum Attempt {
    Reply(String),
    Malformed(String),
    Failed(AttemptFailure),
}

/// Rate-limited, retrying completion client.
///
/// Every attempt, including retries, first takes a slot from the
/// [`RequestLedger`]. Retryable failures back off by `base * 2^n` after
/// attempt `n`; after `max_retries` retries the failure is returned.
pub struct CompletionClient {
    transport: Arc<dyn CompletionTransport>,
    ledger: Arc<RequestLedger>,
    settings: Settings,
}

impl CompletionClient {
    pub fn new(api_key: String, settings: Settings) -> Self {
        let transport = Arc::new(HttpTransport::new(api_key, &settings));
        Self::with_transport(transport, settings)
    }

    pub fn with_transport(transport: Arc<dyn CompletionTransport>, settings: Settings) -> Self {
        let ledger = Arc::new(RequestLedger::new(
            settings.rate_limit.requests,
            settings.rate_limit.window(),
        ));
        Self {
            transport,
            ledger,
            settings,
        }
    }

    /// Share a request budget with other clients.
    pub fn with_ledger(mut self, ledger: Arc<RequestLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn ledger(&self) -> &Arc<RequestLedger> {
        &self.ledger
    }

    /// One-off question without any conversation history.
    pub async fn ask(&self, question: impl Into<String>) -> Result<String, CompletionError> {
        self.complete(&[Turn::user(question)]).await
    }

    /// Turn a conversation into a single trimmed reply.
    pub async fn complete(&self, messages: &[Turn]) -> Result<String, CompletionError> {
        let request = self.build_request(messages);
        let max_retries = self.settings.retry.max_retries;
        let max_attempts = max_retries.saturating_add(1);

        let mut last_failure = AttemptFailure::Transport("no attempt made".to_string());

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = self.backoff(attempt - 1);
                tracing::warn!(
                    "[CompletionClient] Retrying API call (attempt {}/{}) after {:?} delay",
                    attempt + 1,
                    max_attempts,
                    delay
                );
                sleep(delay).await;
            }

            self.ledger.acquire().await;

            match self.send_once(&request).await {
                Attempt::Reply(content) => {
                    tracing::info!("[CompletionClient] Successfully generated AI response");
                    return Ok(content);
                }
                Attempt::Malformed(reason) => {
                    tracing::error!("[CompletionClient] Unusable completion payload: {}", reason);
                    return Err(CompletionError::MalformedPayload(reason));
                }
                Attempt::Failed(failure) => {
                    tracing::warn!(
                        "[CompletionClient] Attempt {}/{} failed: {}",
                        attempt + 1,
                        max_attempts,
                        failure
                    );
                    last_failure = failure;
                }
            }
        }

        tracing::error!(
            "[CompletionClient] Max retries exceeded after {} attempts: {}",
            max_attempts,
            last_failure
        );
        Err(CompletionError::RetriesExhausted {
            attempts: max_attempts,
            last: last_failure,
        })
    }

    /// Conversation as sent on the wire: exactly one leading system turn.
    pub fn with_system_prompt(&self, messages: &[Turn]) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(messages.len() + 1);
        let rest = match messages.split_first() {
            Some((first, rest)) if first.role() == Role::System => {
                turns.push(first.clone());
                rest
            }
            _ => {
                turns.push(Turn::system(self.settings.llm.system_prompt.as_str()));
                messages
            }
        };

        for turn in rest {
            if turn.role() == Role::System {
                tracing::debug!("[CompletionClient] Dropping non-leading system turn");
                continue;
            }
            turns.push(turn.clone());
        }
        turns
    }

    fn build_request(&self, messages: &[Turn]) -> ChatRequest {
        ChatRequest {
            model: self.settings.llm.model.clone(),
            messages: self.with_system_prompt(messages),
            max_tokens: self.settings.llm.max_tokens,
            temperature: self.settings.llm.temperature,
            top_p: self.settings.llm.top_p,
            stream: false,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.settings.retry.base_delay().saturating_mul(factor)
    }

    async fn send_once(&self, request: &ChatRequest) -> Attempt {
        let deadline = self.settings.llm.request_timeout();
        let response = match timeout(deadline, self.transport.send(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Attempt::Failed(err.into()),
            Err(_) => return Attempt::Failed(AttemptFailure::Timeout),
        };

        match response.status {
            429 => Attempt::Failed(AttemptFailure::RateLimited),
            200..=299 => parse_reply(response),
            status => Attempt::Failed(AttemptFailure::ServerError {
                status,
                body: response.body,
            }),
        }
    }
}

// Only an undecodable body is retried; any JSON without a string reply is terminal.
fn parse_reply(response: RawResponse) -> Attempt {
    let parsed: Value = match serde_json::from_str(&response.body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return Attempt::Failed(AttemptFailure::ServerError {
                status: response.status,
                body: format!("Response decode error: {}", e),
            })
        }
    };

    match parsed
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
    {
        None => Attempt::Malformed("No choices in API response".to_string()),
        Some(content) => {
            let trimmed = content.trim();
            if trimmed.is_empty() {
                Attempt::Malformed("Empty reply content".to_string())
            } else {
                Attempt::Reply(trimmed.to_string())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use tokio::time::Instant;

    #[derive(Debug, Clone)]
    pub enum Scripted {
        Respond(u16, String),
        Fail(TransportError),
        Hang,
    }

    impl Scripted {
        pub fn reply(content: &str) -> Self {
            Scripted::Respond(
                200,
                serde_json::json!({"choices": [{"message": {"content": content}}]}).to_string(),
            )
        }
    }

    /// In-process transport that plays back a script, then repeats a fallback.
    pub struct ScriptedTransport {
        script: Mutex<VecDeque<Scripted>>,
        fallback: Scripted,
        calls: Mutex<Vec<(Instant, ChatRequest)>>,
    }

    impl ScriptedTransport {
        pub fn new(script: Vec<Scripted>, fallback: Scripted) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                fallback,
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn always(response: Scripted) -> Arc<Self> {
            Self::new(Vec::new(), response)
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        pub fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().iter().map(|(at, _)| *at).collect()
        }

        pub fn requests(&self) -> Vec<ChatRequest> {
            self.calls.lock().iter().map(|(_, req)| req.clone()).collect()
        }
    }

    #[async_trait]
    impl CompletionTransport for ScriptedTransport {
        async fn send(&self, request: &ChatRequest) -> Result<RawResponse, TransportError> {
            self.calls.lock().push((Instant::now(), request.clone()));
            let next = self
                .script
                .lock()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone());

            match next {
                Scripted::Respond(status, body) => Ok(RawResponse::new(status, body)),
                Scripted::Fail(err) => Err(err),
                Scripted::Hang => {
                    sleep(Duration::from_secs(3600)).await;
                    Err(TransportError::Connection("hung call finished".to_string()))
                }
            }
        }
    }

    pub fn settings(max_retries: u32, requests: usize, window_secs: f64) -> Settings {
        let mut settings = Settings::default();
        settings.retry.max_retries = max_retries;
        settings.retry.base_delay_secs = 1.0;
        settings.rate_limit.requests = requests;
        settings.rate_limit.window_secs = window_secs;
        settings.llm.system_prompt = "be brief".to_string();
        settings
    }
}
