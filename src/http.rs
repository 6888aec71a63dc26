//! Resilient HTTP access for every provider
//!
//! Requests go through a `reqwest-middleware` client whose only middleware
//! retries transport failures and 5xx responses with exponential backoff.
//! Other statuses are handed back untouched for the caller to inspect.

use crate::config::HttpConfig;
use crate::{Result, TripError};
use async_trait::async_trait;
use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use reqwest_retry::{Retryable, RetryableStrategy};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded exponential backoff without jitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` counts every try including the first; zero is treated as one
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after failed attempt `attempt` (counted from 0): `base * 2^attempt`
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

/// Source of waiting between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately and remembers every requested delay
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .map(|delays| delays.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(duration);
        }
    }
}

/// Result of running an operation under a [`RetryPolicy`]
#[derive(Debug)]
pub struct Attempted<T> {
    /// Outcome of the last attempt
    pub outcome: T,
    /// Number of attempts made
    pub attempts: u32,
    /// True when the last outcome was still transient
    pub exhausted: bool,
}

/// Runs `operation` until it yields a non-transient outcome or the policy
/// runs out of attempts, sleeping `policy.delay_for(attempt)` in between.
pub async fn call_with_policy<T, F, Fut, C>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    is_transient: C,
    mut operation: F,
) -> Attempted<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = T>,
    C: Fn(&T) -> bool,
{
    let mut attempt = 0;
    loop {
        let outcome = operation(attempt).await;
        let transient = is_transient(&outcome);
        if !transient || attempt + 1 >= policy.max_attempts() {
            return Attempted {
                outcome,
                attempts: attempt + 1,
                exhausted: transient,
            };
        }

        let delay = policy.delay_for(attempt);
        debug!(
            attempt = attempt + 1,
            max_attempts = policy.max_attempts(),
            delay_ms = delay.as_millis() as u64,
            "Transient failure, backing off"
        );
        sleeper.sleep(delay).await;
        attempt += 1;
    }
}

/// Transport errors and 5xx responses are transient, everything else is final
#[derive(Debug, Default, Clone, Copy)]
pub struct ServerErrorStrategy;

impl RetryableStrategy for ServerErrorStrategy {
    fn handle(
        &self,
        res: &std::result::Result<Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(response) if response.status().is_server_error() => Some(Retryable::Transient),
            Ok(_) => None,
            Err(_) => Some(Retryable::Transient),
        }
    }
}

/// Retries each request according to a [`RetryPolicy`]
pub struct BackoffMiddleware {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    strategy: ServerErrorStrategy,
}

impl BackoffMiddleware {
    pub fn new(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            policy,
            sleeper,
            strategy: ServerErrorStrategy,
        }
    }

    fn is_transient(&self, res: &std::result::Result<Response, reqwest_middleware::Error>) -> bool {
        matches!(self.strategy.handle(res), Some(Retryable::Transient))
    }
}

#[async_trait]
impl Middleware for BackoffMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let url = req.url().to_string();

        // Streaming bodies cannot be replayed, so they get a single shot.
        let Some(template) = req.try_clone() else {
            return next.run(req, extensions).await;
        };

        let mut pending = Some(req);
        let attempted = call_with_policy(
            &self.policy,
            self.sleeper.as_ref(),
            |res| self.is_transient(res),
            |_| {
                let request = pending.take().or_else(|| template.try_clone());
                let next = next.clone();
                let mut attempt_extensions = extensions.clone();
                async move {
                    match request {
                        Some(request) => next.run(request, &mut attempt_extensions).await,
                        None => Err(reqwest_middleware::Error::middleware(
                            TripError::network("request could not be replayed"),
                        )),
                    }
                }
            },
        )
        .await;

        if !attempted.exhausted {
            return attempted.outcome;
        }

        match attempted.outcome {
            Ok(response) => {
                warn!(
                    url = %url,
                    status = response.status().as_u16(),
                    attempts = attempted.attempts,
                    "Server error after all attempts"
                );
                Err(reqwest_middleware::Error::middleware(TripError::network(
                    format!(
                        "Server error {} after {} attempts",
                        response.status(),
                        attempted.attempts
                    ),
                )))
            }
            Err(err) => {
                warn!(url = %url, attempts = attempted.attempts, error = %err, "Request failed after all attempts");
                Err(err)
            }
        }
    }
}

/// Shared HTTP client used by all providers
#[derive(Clone)]
pub struct HttpClient {
    raw: reqwest::Client,
    client: ClientWithMiddleware,
}

impl HttpClient {
    /// Client that sleeps on the tokio timer between retries
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(config: &HttpConfig, sleeper: Arc<dyn Sleeper>) -> Result<Self> {
        let raw = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TripError::config(format!("Failed to create HTTP client: {e}")))?;

        let client = ClientBuilder::new(raw.clone())
            .with(BackoffMiddleware::new(config.retry_policy(), sleeper))
            .build();

        Ok(Self { raw, client })
    }

    /// Start a GET request; send it with [`HttpClient::send`]
    pub fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.raw.get(url)
    }

    /// Start a POST request; send it with [`HttpClient::send`]
    pub fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.raw.post(url)
    }

    /// Send a request through the retry middleware
    pub async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        let request = request.build()?;
        debug!(method = %request.method(), url = %request.url(), "Sending request");
        Ok(self.client.execute(request).await?)
    }
}
