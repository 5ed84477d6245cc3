use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use cs_core::ports::{CredentialPort, RemoteEndpoint, RemoteSyncPort, TransportError};
use cs_core::sync::protocol::{ApiEnvelope, SyncExchangeData, SyncExchangeRequest, SYNC_EXCHANGE_PATH};

type TransportResult<T> = std::result::Result<T, TransportError>;

const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);
const MAX_ERROR_BODY_CHARS: usize = 200;

/// reqwest client for the combined `/clipboard/sync` exchange.
pub struct HttpSyncTransport {
    client: reqwest::Client,
    credentials: Arc<dyn CredentialPort>,
    retry_backoff: Duration,
}

impl HttpSyncTransport {
    pub fn new(credentials: Arc<dyn CredentialPort>) -> TransportResult<Self> {
        // Timeouts are per request, taken from the endpoint.
        let client = reqwest::Client::builder()
            .user_agent(concat!("clipsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Network(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            credentials,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        })
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    async fn send_once(
        &self,
        url: &Url,
        endpoint: &RemoteEndpoint,
        request: &SyncExchangeRequest,
    ) -> TransportResult<SyncExchangeData> {
        let mut builder = self
            .client
            .post(url.clone())
            .timeout(endpoint.timeout)
            .json(request);
        if let Some(token) = self.credentials.bearer_token() {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            return Err(map_status_code(status, &body));
        }

        decode_envelope(&body)
    }

    async fn retry<F, Fut, T>(&self, op: &str, attempts: u32, mut action: F) -> TransportResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = TransportResult<T>>,
    {
        for attempt in 0..=attempts {
            match action().await {
                Ok(val) => return Ok(val),
                Err(err) => {
                    if attempt == attempts || !err.should_retry() {
                        error!("{} failed after {} attempts: {}", op, attempt + 1, err);
                        return Err(err);
                    }
                    let backoff = self.retry_backoff * (attempt + 1);
                    warn!(
                        "{} failed (attempt {}): {}. retrying in {:?}",
                        op,
                        attempt + 1,
                        err,
                        backoff
                    );
                    sleep(backoff).await;
                }
            }
        }

        Err(TransportError::Network(format!("{op}: retries exhausted")))
    }
}

#[async_trait]
impl RemoteSyncPort for HttpSyncTransport {
    async fn exchange(
        &self,
        endpoint: &RemoteEndpoint,
        request: &SyncExchangeRequest,
        cancel: CancellationToken,
    ) -> TransportResult<SyncExchangeData> {
        let url = exchange_url(&endpoint.server_url)?;
        info!(
            url = %url,
            local_items = request.local_items.len(),
            "starting sync exchange"
        );

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            result = self.retry("sync exchange", endpoint.max_retry_attempts, || {
                self.send_once(&url, endpoint, request)
            }) => result,
        };

        if let Ok(data) = &result {
            debug!(
                uploaded = data.uploaded_count(),
                remote_items = data.remote_items.len(),
                sync_time = %data.sync_time,
                "sync exchange completed"
            );
        }
        result
    }
}

fn exchange_url(server_url: &str) -> TransportResult<Url> {
    let base = server_url.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(TransportError::InvalidEndpoint("server url is empty".to_string()));
    }

    let url = Url::parse(&format!("{base}/{SYNC_EXCHANGE_PATH}"))
        .map_err(|e| TransportError::InvalidEndpoint(format!("{server_url}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(TransportError::InvalidEndpoint(format!(
            "unsupported scheme {other}"
        ))),
    }
}

fn decode_envelope(body: &str) -> TransportResult<SyncExchangeData> {
    let envelope: ApiEnvelope =
        serde_json::from_str(body).map_err(|e| TransportError::MalformedBody(e.to_string()))?;

    if !envelope.success {
        return Err(match envelope.error {
            Some(err) => TransportError::Rejected {
                code: err.code,
                message: err.message,
            },
            None => TransportError::Rejected {
                code: "UNKNOWN".to_string(),
                message: envelope.message.unwrap_or_default(),
            },
        });
    }

    let data = envelope
        .data
        .ok_or_else(|| TransportError::MalformedBody("success response without data".to_string()))?;
    serde_json::from_value(data).map_err(|e| TransportError::MalformedBody(e.to_string()))
}

fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if let Some(status) = error.status() {
        map_status_code(status, "")
    } else if error.is_builder() {
        TransportError::InvalidEndpoint(error.to_string())
    } else {
        TransportError::Network(error.to_string())
    }
}

fn map_status_code(code: StatusCode, body: &str) -> TransportError {
    match code {
        StatusCode::UNAUTHORIZED => TransportError::Unauthorized,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => TransportError::Timeout,
        _ => TransportError::HttpStatus {
            status: code.as_u16(),
            message: error_message(code, body),
        },
    }
}

/// Prefer the envelope's error message, then a prefix of the raw body.
fn error_message(code: StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiEnvelope>(body) {
        if let Some(err) = envelope.error {
            return err.message;
        }
        if let Some(message) = envelope.message {
            return message;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        code.canonical_reason().unwrap_or("unexpected status").to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
    }
}
