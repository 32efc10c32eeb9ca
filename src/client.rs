use std::env;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, StatusCode, header};
use url::Url;

use crate::backend::{ChatBackend, DeltaStream};
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::process_sse;
use crate::types::{AskRequest, HistorySummary, Message, RenameRequest};

/// Base URL used when neither the caller nor the environment provides one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1/";
/// Environment variable consulted for the base URL.
pub const BASE_URL_ENV: &str = "ASKSTREAM_BASE_URL";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for the question/answer service.
#[derive(Debug, Clone)]
pub struct Client {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl Client {
    /// Create a new client.
    ///
    /// The base URL is read from the ASKSTREAM_BASE_URL environment variable
    /// and falls back to [`DEFAULT_BASE_URL`].
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url
            .or_else(|| env::var(BASE_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        // The ask stream may legitimately outlive the timeout, so only the
        // connect phase is bounded here; JSON calls set a per-request timeout.
        let client = ReqwestClient::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The base every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn thread_endpoint(&self, chat_id: &str) -> Result<Url> {
        let mut url = self.endpoint("history")?;
        url.path_segments_mut()
            .map_err(|_| Error::url(format!("cannot append to {}", self.base_url), None))?
            .push(chat_id);
        Ok(url)
    }

    /// Headers shared by every request; the bearer token is omitted for guests.
    fn headers(&self, token: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                Error::validation(
                    format!("token is not a valid header value: {e}"),
                    Some("token".to_string()),
                )
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response, chat_id: Option<&str>) -> Error {
        let status = response.status();
        let status_code = status.as_u16();

        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };
        let message = error_message(status, &error_body);

        match status_code {
            400 => Error::bad_request(message),
            401 => Error::authentication(message),
            403 => Error::permission(message),
            404 => Error::not_found(message, chat_id.map(String::from)),
            408 => Error::timeout(message, None),
            429 => Error::rate_limit(message, retry_after),
            500 => Error::internal_server(message),
            502..=504 => Error::service_unavailable(message, retry_after),
            _ => Error::api(status_code, message),
        }
    }

    /// Send a request and turn non-success statuses into errors.
    async fn execute(&self, request: RequestBuilder, chat_id: Option<&str>) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let started = Instant::now();
        let outcome = match request.send().await {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(Self::process_error_response(response, chat_id).await),
            Err(e) => Err(self.map_send_error(e)),
        };
        CLIENT_REQUEST_DURATION.add(started.elapsed().as_secs_f64());
        if let Err(err) = &outcome {
            CLIENT_REQUEST_ERRORS.click();
            tracing::debug!(error = %err, "request failed");
        }
        outcome
    }

    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
        chat_id: Option<&str>,
    ) -> Result<T> {
        let response = self.execute(request.timeout(self.timeout), chat_id).await?;
        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {e}"),
                Some(Box::new(e)),
            )
        })
    }
}

#[async_trait::async_trait]
impl ChatBackend for Client {
    async fn history(&self, token: &str) -> Result<Vec<HistorySummary>> {
        let request = self
            .client
            .get(self.endpoint("history")?)
            .headers(self.headers(Some(token))?);
        self.execute_json(request, None).await
    }

    async fn thread(&self, token: &str, chat_id: &str) -> Result<Vec<Message>> {
        let request = self
            .client
            .get(self.thread_endpoint(chat_id)?)
            .headers(self.headers(Some(token))?);
        self.execute_json(request, Some(chat_id)).await
    }

    async fn ask(&self, token: Option<&str>, request: &AskRequest) -> Result<DeltaStream> {
        let mut headers = self.headers(token)?;
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );
        let builder = self
            .client
            .post(self.endpoint("ask")?)
            .headers(headers)
            .json(request);
        let response = self.execute(builder, Some(&request.chat_id)).await?;
        Ok(Box::pin(process_sse(response.bytes_stream())))
    }

    async fn clear_history(&self, token: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.endpoint("history")?)
            .headers(self.headers(Some(token))?)
            .timeout(self.timeout);
        self.execute(request, None).await.map(|_| ())
    }

    async fn rename_thread(&self, token: &str, request: &RenameRequest) -> Result<()> {
        let builder = self
            .client
            .put(self.endpoint("history/rename")?)
            .headers(self.headers(Some(token))?)
            .json(request)
            .timeout(self.timeout);
        self.execute(builder, Some(&request.chat_id))
            .await
            .map(|_| ())
    }

    async fn delete_thread(&self, token: &str, chat_id: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.thread_endpoint(chat_id)?)
            .headers(self.headers(Some(token))?)
            .timeout(self.timeout);
        self.execute(request, Some(chat_id)).await.map(|_| ())
    }
}

/// Parse a base URL, making sure relative joins keep its last path segment.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    let url = Url::parse(&raw)?;
    if url.cannot_be_a_base() {
        return Err(Error::url(format!("{raw} cannot be used as a base URL"), None));
    }
    Ok(url)
}

/// Pull a human-readable message out of an error body.
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let from_json = parsed.as_ref().and_then(|value| {
        ["message", "error", "detail"]
            .iter()
            .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
            .map(String::from)
    });
    match from_json {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    }
}
