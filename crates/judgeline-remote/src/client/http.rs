//! HTTP layer: status mapping and retry.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::warn;

use crate::error::{RemoteError, RemoteResult};
use crate::types::RemoteConfig;

/// Whether a request may be repeated on transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Retry {
    /// Polls claim work server side; repeating one could claim twice.
    Never,
    Transient,
}

/// HTTP backend for making requests (holds reqwest client and config).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) config: RemoteConfig,
}

impl HttpBackend {
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a JSON request, retrying transient failures when allowed.
    pub(crate) async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &serde_json::Value,
        retry: Retry,
    ) -> RemoteResult<reqwest::Response> {
        use rand::Rng;

        let url = self.url(path);
        let max_retries = match retry {
            Retry::Never => 0,
            Retry::Transient => self.config.max_retries,
        };
        let mut retries = 0;

        loop {
            let result = self.request_once(method.clone(), &url, body).await;

            match result {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && retries < max_retries => {
                    retries += 1;

                    let backoff = match &e {
                        RemoteError::RateLimited {
                            retry_after: Some(retry_after),
                        } => {
                            let capped = (*retry_after).min(Duration::from_secs(30));
                            let base_ms = capped.as_millis() as u64;
                            let jitter_factor: f64 =
                                rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
                            let jittered_ms = ((base_ms as f64) * jitter_factor).round() as u64;
                            Duration::from_millis(jittered_ms.max(100))
                        }
                        _ => {
                            let base_backoff = Duration::from_secs(1 << retries);
                            let base_backoff = base_backoff.min(Duration::from_secs(30));
                            let jittered_ms =
                                rand::thread_rng().gen_range(0..=base_backoff.as_millis() as u64);
                            Duration::from_millis(jittered_ms.max(10))
                        }
                    };

                    warn!(
                        error = %e,
                        url = %url,
                        retry = retries,
                        max_retries = max_retries,
                        backoff_ms = backoff.as_millis(),
                        "retrying request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn request_once(
        &self,
        method: reqwest::Method,
        url: &str,
        body: &serde_json::Value,
    ) -> RemoteResult<reqwest::Response> {
        let response = self.client.request(method, url).json(body).send().await?;
        let status = response.status();

        match status.as_u16() {
            200..=299 => Ok(response),

            401 => Err(RemoteError::Unauthorized {
                message: "invalid runner id or key".to_string(),
            }),

            404 => Err(RemoteError::NotFound {
                url: url.to_string(),
            }),

            429 => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);

                Err(RemoteError::RateLimited { retry_after })
            }

            _ => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
                    Err(RemoteError::Network {
                        message: format!("HTTP {}: {}", status.as_u16(), message),
                    })
                } else {
                    Err(RemoteError::Rejected {
                        status: status.as_u16(),
                        message,
                    })
                }
            }
        }
    }
}
