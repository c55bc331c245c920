//! Inference API interaction.
//!
//! This module sends the composed prompt to an OpenAI-compatible chat
//! completion endpoint and returns the completion text.
//!
//! # Architecture
//!
//! - [`CompletionProvider`]: The capability the pipeline depends on
//! - [`OpenAiChat`]: `POST {endpoint}/chat/completions` over `reqwest`
//! - [`RetryProvider`]: Decorator that retries transient failures of any
//!   provider with exponential backoff
//! - [`Credentials`]: A validated, non-blank API key
//!
//! # Error Mapping
//!
//! | Condition | Error |
//! |-----------|-------|
//! | 401 / 403 | [`SummarizeError::Authentication`] |
//! | connect failure, timeout, 429, 5xx | [`SummarizeError::TransientService`] |
//! | other status, bad JSON, no choices, blank content | [`SummarizeError::Response`] |

use crate::errors::SummarizeError;
use crate::models::Prompt;
use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Default OpenAI-compatible base URL.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

const TEMPERATURE: f32 = 0.4;

/// Something that can turn a prompt into completion text.
///
/// The pipeline only ever talks to this trait, so switching inference
/// vendors means adding one implementation.
pub trait CompletionProvider {
    /// Send `prompt` to `model` and return the full completion text.
    async fn summarize(&self, prompt: &Prompt, model: &str) -> Result<String, SummarizeError>;
}

/// A non-blank API key.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    /// Validate a key taken from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SummarizeError::Authentication`] if the key is absent or
    /// only whitespace. No network access happens here.
    pub fn new(api_key: Option<&str>) -> Result<Self, SummarizeError> {
        match api_key.map(str::trim) {
            Some(key) if !key.is_empty() => Ok(Self {
                api_key: key.to_string(),
            }),
            _ => Err(SummarizeError::Authentication(
                "OPENAI_API_KEY is not set".to_string(),
            )),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completion client.
#[derive(Debug)]
pub struct OpenAiChat {
    http: Client,
    url: String,
    credentials: Credentials,
}

impl OpenAiChat {
    /// Build a client for `endpoint` (e.g. `https://api.openai.com/v1`).
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Base URL; `/chat/completions` is appended
    /// * `credentials` - Validated API key
    /// * `timeout` - Bound on the whole request, connect to last byte
    pub fn new(
        endpoint: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, SummarizeError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SummarizeError::TransientService(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: format!("{}/chat/completions", endpoint.trim_end_matches('/')),
            credentials,
        })
    }
}

impl CompletionProvider for OpenAiChat {
    #[instrument(level = "info", skip_all, fields(url = %self.url, model = %model))]
    async fn summarize(&self, prompt: &Prompt, model: &str) -> Result<String, SummarizeError> {
        let t0 = Instant::now();
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.as_str(),
            }],
            temperature: TEMPERATURE,
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.credentials.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SummarizeError::TransientService(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SummarizeError::TransientService(e.to_string()))?;
        let elapsed_ms = t0.elapsed().as_millis() as u64;

        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                elapsed_ms,
                body = %truncate_for_log(&body, 300),
                "Inference endpoint returned an error status"
            );
            return Err(classify_status(status, &body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            SummarizeError::Response(format!(
                "undecodable completion ({e}): {}",
                truncate_for_log(&body, 200)
            ))
        })?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(SummarizeError::Response(
                "completion was empty".to_string(),
            ));
        }

        info!(elapsed_ms, chars = text.len(), "Received completion");
        Ok(text)
    }
}

fn classify_status(status: StatusCode, body: &str) -> SummarizeError {
    let detail = format!("HTTP {}: {}", status.as_u16(), truncate_for_log(body.trim(), 200));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SummarizeError::Authentication(detail),
        StatusCode::TOO_MANY_REQUESTS => SummarizeError::TransientService(detail),
        s if s.is_server_error() => SummarizeError::TransientService(detail),
        _ => SummarizeError::Response(detail),
    }
}

/// Wrapper that adds exponential backoff retry to any [`CompletionProvider`].
///
/// Only [`SummarizeError::TransientService`] is retried; authentication and
/// response errors are returned immediately. With `max_retries == 0` this is
/// a single attempt.
///
/// # Backoff Strategy
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryProvider<P> {
    inner: P,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<P> RetryProvider<P>
where
    P: CompletionProvider,
{
    pub fn new(inner: P, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl<P> fmt::Debug for RetryProvider<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryProvider")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<P> CompletionProvider for RetryProvider<P>
where
    P: CompletionProvider,
{
    #[instrument(level = "info", skip_all)]
    async fn summarize(&self, prompt: &Prompt, model: &str) -> Result<String, SummarizeError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.summarize(prompt, model).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    attempt += 1;
                    let elapsed_ms_attempt = attempt_t0.elapsed().as_millis() as u64;
                    let elapsed_ms_total = total_t0.elapsed().as_millis() as u64;

                    if !e.is_transient() || attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt,
                            elapsed_ms_total,
                            error = %e,
                            "summarize() giving up"
                        );
                        return Err(e);
                    }

                    let exp = u32::try_from(attempt - 1).unwrap_or(u32::MAX).min(16);
                    let delay = self.base_delay.saturating_mul(1 << exp).min(self.max_delay);
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt,
                        elapsed_ms_total,
                        ?delay,
                        error = %e,
                        "summarize() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Route, TestServer, unreachable_url};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const COMPLETION_OK: &str = r##"{"id":"chatcmpl-1","choices":[{"index":0,"message":{"role":"assistant","content":"  # Newsletter\n\nAll good.\n"}}]}"##;

    fn creds() -> Credentials {
        Credentials::new(Some("sk-test")).unwrap()
    }

    fn client(base: &str) -> OpenAiChat {
        OpenAiChat::new(base, creds(), Duration::from_secs(5)).unwrap()
    }

    fn prompt() -> Prompt {
        Prompt::new("Summarize these".to_string())
    }

    #[test]
    fn test_credentials_reject_missing_and_blank() {
        assert!(matches!(
            Credentials::new(None),
            Err(SummarizeError::Authentication(_))
        ));
        assert!(matches!(
            Credentials::new(Some("   ")),
            Err(SummarizeError::Authentication(_))
        ));
        assert!(Credentials::new(Some("sk-abc")).is_ok());
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let debug = format!("{:?}", Credentials::new(Some("sk-secret")).unwrap());
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, ""),
            SummarizeError::Authentication(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, ""),
            SummarizeError::Authentication(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            SummarizeError::TransientService(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, ""),
            SummarizeError::TransientService(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, "model not found"),
            SummarizeError::Response(_)
        ));
    }

    #[tokio::test]
    async fn test_summarize_returns_trimmed_completion() {
        let server = TestServer::start(vec![(
            "/v1/chat/completions",
            Route::ok("application/json", COMPLETION_OK),
        )])
        .await;

        let text = client(&server.url("/v1/"))
            .summarize(&prompt(), "gpt-4o-mini")
            .await
            .unwrap();

        assert_eq!(text, "# Newsletter\n\nAll good.");
        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/v1/chat/completions");
        assert_eq!(request.authorization.as_deref(), Some("Bearer sk-test"));
        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Summarize these");
    }

    #[tokio::test]
    async fn test_summarize_maps_unauthorized() {
        let server = TestServer::start(vec![(
            "/chat/completions",
            Route::status(401, r#"{"error":{"message":"Incorrect API key"}}"#),
        )])
        .await;

        let err = client(&server.url(""))
            .summarize(&prompt(), "gpt-4o-mini")
            .await
            .unwrap_err();
        assert!(matches!(err, SummarizeError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_summarize_maps_server_error_to_transient() {
        let server = TestServer::start(vec![(
            "/chat/completions",
            Route::status(500, "boom"),
        )])
        .await;

        let err = client(&server.url(""))
            .summarize(&prompt(), "m")
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_summarize_unreachable_is_transient() {
        let base = unreachable_url().await.replace("/feed.xml", "");
        let err = client(&base).summarize(&prompt(), "m").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_summarize_timeout_is_transient() {
        let server = TestServer::start(vec![(
            "/chat/completions",
            Route::ok("application/json", COMPLETION_OK).delayed(Duration::from_secs(3)),
        )])
        .await;
        let client = OpenAiChat::new(&server.url(""), creds(), Duration::from_millis(300)).unwrap();

        let err = client.summarize(&prompt(), "m").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_summarize_rejects_malformed_and_empty() {
        let server = TestServer::start(vec![
            ("/bad/chat/completions", Route::ok("application/json", "<html>oops</html>")),
            (
                "/blank/chat/completions",
                Route::ok(
                    "application/json",
                    r#"{"choices":[{"message":{"role":"assistant","content":"  \n "}}]}"#,
                ),
            ),
            ("/none/chat/completions", Route::ok("application/json", r#"{"choices":[]}"#)),
        ])
        .await;

        for base in ["/bad", "/blank", "/none"] {
            let err = client(&server.url(base))
                .summarize(&prompt(), "m")
                .await
                .unwrap_err();
            assert!(matches!(err, SummarizeError::Response(_)), "{base}: {err}");
        }
    }

    struct Flaky {
        calls: AtomicUsize,
        fail_first: usize,
        error: fn() -> SummarizeError,
    }

    impl CompletionProvider for Flaky {
        async fn summarize(&self, _prompt: &Prompt, _model: &str) -> Result<String, SummarizeError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err((self.error)())
            } else {
                Ok("# Done".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient() {
        let retry = RetryProvider::new(
            Flaky {
                calls: AtomicUsize::new(0),
                fail_first: 2,
                error: || SummarizeError::TransientService("timeout".into()),
            },
            3,
            Duration::from_millis(1),
        );
        assert_eq!(retry.summarize(&prompt(), "m").await.unwrap(), "# Done");
        assert_eq!(retry.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_does_not_retry_auth() {
        let retry = RetryProvider::new(
            Flaky {
                calls: AtomicUsize::new(0),
                fail_first: 10,
                error: || SummarizeError::Authentication("401".into()),
            },
            3,
            Duration::from_millis(1),
        );
        let err = retry.summarize(&prompt(), "m").await.unwrap_err();
        assert!(matches!(err, SummarizeError::Authentication(_)));
        assert_eq!(retry.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_retries_is_single_attempt() {
        let retry = RetryProvider::new(
            Flaky {
                calls: AtomicUsize::new(0),
                fail_first: 10,
                error: || SummarizeError::TransientService("down".into()),
            },
            0,
            Duration::from_millis(1),
        );
        assert!(retry.summarize(&prompt(), "m").await.is_err());
        assert_eq!(retry.inner.calls.load(Ordering::SeqCst), 1);
    }
}
