use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use serde_json::Value;
use url::Url;
use workbench_logging::{bench_debug, bench_trace, redact};

use crate::csrf::{CookieAccessor, CSRF_COOKIE, CSRF_HEADER};
use crate::{BackendError, FailureKind};

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// One call to the workbench backend. Paths are relative to the base URL.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendRequest {
    Get {
        path: String,
    },
    PostJson {
        path: String,
        body: Value,
    },
    Delete {
        path: String,
    },
    Upload {
        path: String,
        field: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

impl BackendRequest {
    pub fn get(path: impl Into<String>) -> Self {
        BackendRequest::Get { path: path.into() }
    }

    pub fn post_json(path: impl Into<String>, body: Value) -> Self {
        BackendRequest::PostJson {
            path: path.into(),
            body,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        BackendRequest::Delete { path: path.into() }
    }

    pub fn path(&self) -> &str {
        match self {
            BackendRequest::Get { path }
            | BackendRequest::PostJson { path, .. }
            | BackendRequest::Delete { path }
            | BackendRequest::Upload { path, .. } => path,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            BackendRequest::Get { .. } => "GET",
            BackendRequest::PostJson { .. } | BackendRequest::Upload { .. } => "POST",
            BackendRequest::Delete { .. } => "DELETE",
        }
    }

    /// Requests the backend guards with its CSRF check.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, BackendRequest::Get { .. })
    }
}

/// Status and raw body of a backend response, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl BackendReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value, BackendError> {
        serde_json::from_slice(&self.body)
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))
    }

    /// The `error` text of a JSON error body.
    pub fn error_message(&self) -> Option<String> {
        let value: Value = serde_json::from_slice(&self.body).ok()?;
        value.get("error")?.as_str().map(str::to_string)
    }

    /// The JSON body of a successful reply. A non-2xx status or an `{error}`
    /// body becomes an error.
    pub fn into_json(self) -> Result<Value, BackendError> {
        if let Some(message) = self.error_message() {
            return Err(BackendError::new(
                FailureKind::Rejected {
                    status: self.status,
                },
                message,
            ));
        }
        if !self.is_success() {
            return Err(self.status_error());
        }
        self.json()
    }

    /// The raw body of a successful reply.
    pub fn into_bytes(self) -> Result<Vec<u8>, BackendError> {
        if self.is_success() {
            return Ok(self.body);
        }
        match self.error_message() {
            Some(message) => Err(BackendError::new(
                FailureKind::Rejected {
                    status: self.status,
                },
                message,
            )),
            None => Err(self.status_error()),
        }
    }

    fn status_error(&self) -> BackendError {
        let text = String::from_utf8_lossy(&self.body);
        BackendError::new(
            FailureKind::HttpStatus(self.status),
            text.chars().take(200).collect::<String>(),
        )
    }
}

#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn send(&self, request: BackendRequest) -> Result<BackendReply, BackendError>;
}

/// HTTP backend over reqwest. Keeps the cookies the server sets and echoes
/// the CSRF token on every mutating request.
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    client: reqwest::Client,
    jar: Arc<Jar>,
    base: Url,
}

impl ReqwestBackend {
    pub fn new(settings: &BackendSettings) -> Result<Self, BackendError> {
        let mut raw = settings.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .cookie_provider(jar.clone())
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client, jar, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Stores a CSRF token as if the server had set it.
    pub fn set_csrf_token(&self, token: &str) {
        self.jar.add_cookie_str(
            &format!("{CSRF_COOKIE}={}", urlencoding::encode(token)),
            &self.base,
        );
    }

    /// Loads the start page so the server hands out its CSRF cookie.
    pub async fn prime_csrf(&self) -> Result<Option<String>, BackendError> {
        self.send(BackendRequest::get("")).await?;
        let token = self.csrf_token();
        match &token {
            Some(token) => bench_debug!("csrf token primed ({})", redact(token)),
            None => bench_debug!("backend set no csrf cookie"),
        }
        Ok(token)
    }

    fn url(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))
    }
}

impl CookieAccessor for ReqwestBackend {
    fn cookie_header(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        header.to_str().ok().map(str::to_string)
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn send(&self, request: BackendRequest) -> Result<BackendReply, BackendError> {
        let url = self.url(request.path())?;
        let method = request.method();
        let csrf = if request.is_mutating() {
            self.csrf_token()
        } else {
            None
        };

        let mut builder = match request {
            BackendRequest::Get { .. } => self.client.get(url.clone()),
            BackendRequest::PostJson { body, .. } => self.client.post(url.clone()).json(&body),
            BackendRequest::Delete { .. } => self.client.delete(url.clone()),
            BackendRequest::Upload {
                field,
                file_name,
                bytes,
                ..
            } => {
                let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
                let form = reqwest::multipart::Form::new().part(field, part);
                self.client.post(url.clone()).multipart(form)
            }
        };
        if let Some(token) = csrf {
            builder = builder.header(CSRF_HEADER, token);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?.to_vec();
        bench_trace!("{method} {url} -> {status} ({} bytes)", body.len());
        Ok(BackendReply { status, body })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return BackendError::new(FailureKind::Decode, err.to_string());
    }
    BackendError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(status: u16, body: &str) -> BackendReply {
        BackendReply {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn error_body_is_a_rejection() {
        let err = reply(400, r#"{"error":"bad input"}"#).into_json().unwrap_err();
        assert_eq!(err.kind, FailureKind::Rejected { status: 400 });
        assert_eq!(err.message, "bad input");
    }

    #[test]
    fn bare_status_failure_keeps_the_code() {
        let err = reply(502, "gateway").into_json().unwrap_err();
        assert_eq!(err.kind, FailureKind::HttpStatus(502));
    }

    #[test]
    fn base_url_gains_a_trailing_slash() {
        let backend = ReqwestBackend::new(&BackendSettings {
            base_url: "http://localhost:8000/app".to_string(),
            ..BackendSettings::default()
        })
        .unwrap();
        assert_eq!(
            backend.url("/process-file/").unwrap().as_str(),
            "http://localhost:8000/app/process-file/"
        );
    }
}
