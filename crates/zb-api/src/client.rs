//! Authenticated session and resource operations.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use zb_core::Event;

use crate::bucket::{Bucket, BucketPage, BucketRef, EventList, validate_label};
use crate::error::ApiError;

pub use reqwest::Method;

/// Production API host.
pub const DEFAULT_HOST: &str = "https://api.zenobase.com";
/// Default request timeout for API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Largest page the bucket listing accepts.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Connection settings for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL without a trailing slash.
    pub host: String,
    pub timeout: Duration,
    /// Reject page limits above [`MAX_PAGE_LIMIT`] instead of forwarding them.
    pub strict_limits: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            timeout: DEFAULT_TIMEOUT,
            strict_limits: true,
        }
    }
}

/// How a session is obtained.
#[derive(Clone)]
pub enum Credentials {
    /// `grant_type=password`.
    Password { username: String, password: String },
    /// `grant_type=client_credentials`.
    ClientCredentials,
}

impl Credentials {
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Password {
            username: username.into(),
            password: password.into(),
        }
    }

    fn form(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::Password { username, password } => vec![
                ("grant_type", "password"),
                ("username", username.as_str()),
                ("password", password.as_str()),
            ],
            Self::ClientCredentials => vec![("grant_type", "client_credentials")],
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::ClientCredentials => f.write_str("ClientCredentials"),
        }
    }
}

/// Token and client id backing every authorized call.
#[derive(Deserialize)]
struct Session {
    access_token: String,
    client_id: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .finish()
    }
}

#[derive(Debug)]
enum SessionState {
    Open(Session),
    Closed,
}

/// Body of a successful request.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The response declared a JSON content type.
    Json(Value),
    /// Anything else, verbatim.
    Text(String),
}

impl Response {
    /// Deserializes a JSON body into `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Self::Json(value) => serde_json::from_value(value)
                .map_err(|err| ApiError::InvalidResponse(err.to_string())),
            Self::Text(text) => Err(ApiError::InvalidResponse(format!(
                "expected JSON, got text: {text}"
            ))),
        }
    }
}

/// Zenobase API client.
///
/// Owns one session. The session is revoked by [`Client::close`], or when
/// the client is dropped while still open, so every exit path releases it.
/// Operations after close fail with [`ApiError::SessionClosed`] without
/// touching the network.
///
/// All calls block until the service answers or the timeout expires.
pub struct Client {
    http: HttpClient,
    host: String,
    strict_limits: bool,
    state: SessionState,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Opens a session against the production host.
    pub fn open(credentials: &Credentials) -> Result<Self, ApiError> {
        Self::open_with(ClientConfig::default(), credentials)
    }

    /// Opens a session with explicit connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Authentication`] if the service rejects the
    /// credentials, or a transport error if the exchange fails.
    pub fn open_with(config: ClientConfig, credentials: &Credentials) -> Result<Self, ApiError> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::ClientBuild)?;
        let host = config.host.trim_end_matches('/').to_string();

        let response = http
            .post(format!("{host}/oauth/token"))
            .form(&credentials.form())
            .send()?;
        let status = response.status();
        let body = response.text()?;
        let session = parse_token_response(status.as_u16(), &body)?;
        tracing::debug!(client_id = %session.client_id, "session opened");

        Ok(Self {
            http,
            host,
            strict_limits: config.strict_limits,
            state: SessionState::Open(session),
        })
    }

    /// Opens a client, runs `f`, and closes the session on every exit path.
    ///
    /// An error from `f` takes precedence over an error from closing.
    pub fn scoped<T, E, F>(config: ClientConfig, credentials: &Credentials, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<ApiError>,
    {
        let mut client = Self::open_with(config, credentials)?;
        let result = f(&client);
        let closed = client.close();
        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err.into()),
            (Err(err), closed) => {
                if let Err(close_err) = closed {
                    tracing::warn!(error = %close_err, "failed to revoke session");
                }
                Err(err)
            }
        }
    }

    pub const fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Open(_))
    }

    /// Client id of the open session.
    pub fn client_id(&self) -> Result<&str, ApiError> {
        Ok(self.session()?.client_id.as_str())
    }

    fn session(&self) -> Result<&Session, ApiError> {
        match &self.state {
            SessionState::Open(session) => Ok(session),
            SessionState::Closed => Err(ApiError::SessionClosed),
        }
    }

    /// Sends an authorized request to `endpoint` (relative to the host).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpStatus`] for any status outside 2xx.
    pub fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let session = self.session()?;
        self.send(session, method, endpoint, body)
    }

    fn send(
        &self,
        session: &Session,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        tracing::debug!(%method, endpoint, "sending request");
        let mut request = self
            .http
            .request(method, format!("{}{endpoint}", self.host))
            .header(AUTHORIZATION, format!("Bearer {}", session.access_token))
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send()?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));
        let text = response.text()?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), endpoint, "request rejected");
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }
        decode_body(is_json, text)
    }

    /// Lists one page of buckets ordered by label.
    pub fn list_buckets(&self, offset: u32, limit: u32) -> Result<BucketPage, ApiError> {
        if limit > MAX_PAGE_LIMIT {
            if self.strict_limits {
                return Err(ApiError::InvalidArgument(format!(
                    "bucket listing limit must be at most {MAX_PAGE_LIMIT}, got {limit}"
                )));
            }
            tracing::warn!(limit, "forwarding bucket listing limit above {MAX_PAGE_LIMIT}");
        }
        let client_id = self.client_id()?;
        self.request(
            Method::GET,
            &format!("/users/{client_id}/buckets/?order=label&offset={offset}&limit={limit}"),
            None,
        )?
        .decode()
    }

    /// Lists every bucket, one page of [`MAX_PAGE_LIMIT`] at a time.
    pub fn list_all_buckets(&self) -> Result<Vec<Bucket>, ApiError> {
        let mut buckets = Vec::new();
        loop {
            let offset = u32::try_from(buckets.len())
                .map_err(|_| ApiError::InvalidResponse("too many buckets".to_string()))?;
            let page = self.list_buckets(offset, MAX_PAGE_LIMIT)?;
            let received = page.buckets.len();
            if received == 0 {
                break;
            }
            buckets.extend(page.buckets);
            // Without a total, only a short page marks the end
            let done = match page.total {
                Some(total) => buckets.len() as u64 >= total,
                None => received < MAX_PAGE_LIMIT as usize,
            };
            if done {
                break;
            }
        }
        Ok(buckets)
    }

    pub fn get_bucket(&self, bucket_id: &str) -> Result<Bucket, ApiError> {
        self.request(Method::GET, &format!("/buckets/{bucket_id}"), None)?
            .decode()
    }

    /// Creates a bucket after checking the label locally.
    pub fn create_bucket(&self, label: &str, description: &str) -> Result<Bucket, ApiError> {
        validate_label(label)?;
        let body = json!({"label": label, "description": description});
        let bucket: Bucket = self
            .request(Method::POST, "/buckets/", Some(&body))?
            .decode()?;
        tracing::info!(bucket_id = %bucket.id, label, "created bucket");
        Ok(bucket)
    }

    /// Returns the first bucket labelled `label`, creating it if none exists.
    ///
    /// Not atomic: two concurrent callers can both create a bucket.
    pub fn create_or_get_bucket(&self, label: &str, description: &str) -> Result<Bucket, ApiError> {
        validate_label(label)?;
        if let Some(bucket) = self
            .list_all_buckets()?
            .into_iter()
            .find(|bucket| bucket.label == label)
        {
            tracing::debug!(bucket_id = %bucket.id, label, "found existing bucket");
            return Ok(bucket);
        }
        self.create_bucket(label, description)
    }

    pub fn delete_bucket(&self, bucket_id: &str) -> Result<(), ApiError> {
        self.request(Method::DELETE, &format!("/buckets/{bucket_id}"), None)?;
        tracing::info!(bucket_id, "deleted bucket");
        Ok(())
    }

    /// Lists every event in a bucket in a single call.
    pub fn list_events(&self, bucket_id: &str) -> Result<EventList, ApiError> {
        self.request(Method::GET, &format!("/buckets/{bucket_id}/"), None)?
            .decode()
    }

    pub fn create_event<'a>(
        &self,
        bucket: impl Into<BucketRef<'a>>,
        event: &Event,
    ) -> Result<Response, ApiError> {
        let bucket_id = bucket.into().id()?;
        let body = Value::Object(event.to_json());
        self.request(Method::POST, &format!("/buckets/{bucket_id}/"), Some(&body))
    }

    /// Submits a batch of events in one request.
    pub fn create_events<'a>(
        &self,
        bucket: impl Into<BucketRef<'a>>,
        events: &[Event],
    ) -> Result<Response, ApiError> {
        let bucket_id = bucket.into().id()?;
        let events: Vec<Value> = events
            .iter()
            .map(|event| Value::Object(event.to_json()))
            .collect();
        let body = json!({ "events": events });
        tracing::debug!(bucket_id, count = events.len(), "submitting events");
        self.request(Method::POST, &format!("/buckets/{bucket_id}/"), Some(&body))
    }

    /// Revokes the session.
    ///
    /// The client is closed afterwards even if the service rejects the
    /// revocation. A second call fails with [`ApiError::SessionClosed`].
    pub fn close(&mut self) -> Result<(), ApiError> {
        let SessionState::Open(session) = std::mem::replace(&mut self.state, SessionState::Closed)
        else {
            return Err(ApiError::SessionClosed);
        };
        let endpoint = format!("/authorizations/{}", session.access_token);
        self.send(&session, Method::DELETE, &endpoint, None)?;
        tracing::debug!(client_id = %session.client_id, "session revoked");
        Ok(())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(err) = self.close() {
                tracing::warn!(error = %err, "failed to revoke session on drop");
            }
        }
    }
}

fn parse_token_response(status: u16, body: &str) -> Result<Session, ApiError> {
    let value: Value = serde_json::from_str(body).map_err(|err| {
        if (200..300).contains(&status) {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::HttpStatus {
                status,
                body: body.to_string(),
            }
        }
    })?;

    if let Some(error) = value.get("error") {
        let reason = value
            .get("error_description")
            .and_then(Value::as_str)
            .or_else(|| error.as_str())
            .unwrap_or("invalid credentials");
        return Err(ApiError::Authentication {
            reason: reason.to_string(),
        });
    }
    if !(200..300).contains(&status) {
        return Err(ApiError::HttpStatus {
            status,
            body: body.to_string(),
        });
    }

    serde_json::from_value(value).map_err(|err| ApiError::InvalidResponse(err.to_string()))
}

fn decode_body(is_json: bool, text: String) -> Result<Response, ApiError> {
    if !is_json || text.trim().is_empty() {
        return Ok(Response::Text(text));
    }
    serde_json::from_str(&text)
        .map(Response::Json)
        .map_err(|err| ApiError::InvalidResponse(err.to_string()))
}
