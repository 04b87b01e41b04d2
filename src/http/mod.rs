//! HTTP request/response model and the client abstraction
//!
//! Controllers assemble an [`HttpRequest`], hand it to the auth manager for
//! decoration, execute it through an [`HttpClient`], and validate the
//! resulting [`HttpResponse`]. Concrete clients live in submodules:
//!
//! - [`client::ReqwestHttpClient`] -- production client backed by `reqwest`.
//! - [`fake::FakeHttpClient`] -- scripted in-process client (cfg(test)
//!   only).
//!
//! Retries and timeouts are owned by the concrete client; nothing in this
//! module retries a request.

use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::error::{DropboxError, Result};

pub mod client;

#[cfg(test)]
pub mod fake;

pub use client::{HttpClientConfiguration, ReqwestHttpClient};

/// HTTP methods used by the SDK.
///
/// Dropbox RPC endpoints and the token endpoint are all `POST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post => write!(f, "POST"),
        }
    }
}

/// An outgoing HTTP request.
///
/// Header names are matched case-insensitively. Form fields are sent as an
/// `application/x-www-form-urlencoded` body in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Absolute request URL.
    pub url: String,
    /// Request headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Form fields; an empty list means no body.
    pub form_fields: Vec<(String, String)>,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            form_fields: Vec::new(),
        }
    }

    /// Creates a `POST` request.
    ///
    /// # Examples
    ///
    /// ```
    /// use dropbox_standard::http::HttpRequest;
    ///
    /// let request = HttpRequest::post("https://api.dropboxapi.com/2/file_requests/count")
    ///     .with_header("accept", "application/json");
    /// assert_eq!(request.header("Accept"), Some("application/json"));
    /// ```
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    /// Returns a copy of this request with `name` set to `value`.
    ///
    /// Any existing header with the same (case-insensitive) name is
    /// replaced.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Appends a form field.
    pub fn with_form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_fields.push((name.into(), value.into()));
        self
    }

    /// Looks up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Looks up the first form field with the given name.
    pub fn form_field(&self, name: &str) -> Option<&str> {
        self.form_fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Encodes the form fields as an `application/x-www-form-urlencoded`
    /// string.
    pub fn encoded_form(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.form_fields.iter())
            .finish()
    }
}

/// A response received from the server, with the body read as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Returns `true` for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Looks up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The request that was sent together with the response it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpContext {
    pub request: HttpRequest,
    pub response: HttpResponse,
}

impl HttpContext {
    pub fn new(request: HttpRequest, response: HttpResponse) -> Self {
        Self { request, response }
    }
}

/// Executes HTTP requests on behalf of the SDK.
///
/// The SDK holds clients as `Arc<dyn HttpClient>` so that callers can
/// substitute their own transport (proxies, custom TLS, test doubles).
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync + fmt::Debug {
    /// Sends `request` and returns the response.
    ///
    /// A non-success status is NOT an error at this layer; only transport
    /// failures are.
    ///
    /// # Errors
    ///
    /// Returns [`DropboxError::Http`] if the request could not be sent or
    /// the body could not be read.
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Executes `request`, abandoning it as soon as `cancel` fires.
///
/// # Errors
///
/// Returns [`DropboxError::Cancelled`] if `cancel` fired first; otherwise
/// whatever the client returned.
pub async fn execute_with_cancellation(
    client: &dyn HttpClient,
    request: &HttpRequest,
    cancel: &CancellationToken,
) -> Result<HttpResponse> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DropboxError::Cancelled.into()),
        response = client.execute(request) => response,
    }
}

/// Fails with [`DropboxError::Api`] unless the response status is 2xx.
///
/// Callers special-case any statuses they handle themselves (for example
/// 400/401 from the token endpoint) before calling this.
pub fn validate_response(context: &HttpContext) -> Result<()> {
    if context.response.is_success() {
        return Ok(());
    }

    tracing::debug!(
        status = context.response.status,
        url = %context.request.url,
        "HTTP response not OK"
    );

    Err(DropboxError::Api {
        status: context.response.status,
        message: "HTTP Response Not OK".to_string(),
        context: Box::new(context.clone()),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: "{}".to_string(),
        }
    }

    #[test]
    fn test_with_header_replaces_case_insensitively() {
        let request = HttpRequest::post("https://example.com")
            .with_header("authorization", "Basic abc")
            .with_header("Authorization", "Bearer tok");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("AUTHORIZATION"), Some("Bearer tok"));
    }

    #[test]
    fn test_with_header_leaves_original_untouched() {
        let original = HttpRequest::post("https://example.com");
        let decorated = original.clone().with_header("Authorization", "Bearer tok");
        assert!(original.header("Authorization").is_none());
        assert_eq!(decorated.header("authorization"), Some("Bearer tok"));
    }

    #[test]
    fn test_encoded_form_escapes_values() {
        let request = HttpRequest::post("https://example.com")
            .with_form_field("grant_type", "authorization_code")
            .with_form_field("redirect_uri", "https://app/cb");
        assert_eq!(
            request.encoded_form(),
            "grant_type=authorization_code&redirect_uri=https%3A%2F%2Fapp%2Fcb"
        );
        assert_eq!(request.form_field("redirect_uri"), Some("https://app/cb"));
    }

    #[test]
    fn test_response_success_range() {
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(199).is_success());
        assert!(!response(300).is_success());
        assert_eq!(response(200).header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_validate_response_accepts_2xx() {
        let ctx = HttpContext::new(HttpRequest::post("https://example.com"), response(201));
        assert!(validate_response(&ctx).is_ok());
    }

    #[test]
    fn test_validate_response_rejects_non_2xx_with_context() {
        let ctx = HttpContext::new(HttpRequest::post("https://example.com"), response(409));
        let err = validate_response(&ctx).unwrap_err();
        match err.downcast_ref::<DropboxError>() {
            Some(DropboxError::Api {
                status, context, ..
            }) => {
                assert_eq!(*status, 409);
                assert_eq!(context.request.url, "https://example.com");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_with_cancellation_returns_cancelled() {
        let (client, _log) = fake::FakeHttpClient::with_delay(
            std::time::Duration::from_secs(5),
            |_| fake::json_response(200, "{}"),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let request = HttpRequest::post("https://example.com");
        let err = execute_with_cancellation(&client, &request, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DropboxError>(),
            Some(DropboxError::Cancelled)
        ));
    }
}
