//! `reqwest`-backed [`HttpClient`]

use std::fmt;
use std::time::Duration;

use crate::error::{DropboxError, Result};
use crate::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);

/// Settings applied to the underlying HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfiguration {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Value of the `user-agent` header sent on every request.
    pub user_agent: String,
}

impl Default for HttpClientConfiguration {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
        }
    }
}

impl fmt::Display for HttpClientConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpClientConfiguration(timeout = {}s, user_agent = {})",
            self.timeout.as_secs(),
            self.user_agent
        )
    }
}

/// The SDK's user agent, `dropbox-standard/<version>`.
pub fn default_user_agent() -> String {
    format!("dropbox-standard/{}", env!("CARGO_PKG_VERSION"))
}

/// Production [`HttpClient`] backed by a shared `reqwest::Client`.
///
/// # Examples
///
/// ```
/// use dropbox_standard::http::{HttpClientConfiguration, ReqwestHttpClient};
///
/// let client = ReqwestHttpClient::new(HttpClientConfiguration::default()).unwrap();
/// assert_eq!(client.configuration().timeout.as_secs(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    http: reqwest::Client,
    configuration: HttpClientConfiguration,
}

impl ReqwestHttpClient {
    /// Builds a client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DropboxError::Http`] if the TLS backend fails to
    /// initialise.
    pub fn new(configuration: HttpClientConfiguration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(configuration.timeout)
            .user_agent(configuration.user_agent.clone())
            .build()
            .map_err(DropboxError::Http)?;

        Ok(Self {
            http,
            configuration,
        })
    }

    /// Returns the configuration this client was built with.
    pub fn configuration(&self) -> &HttpClientConfiguration {
        &self.configuration
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut req = match request.method {
            HttpMethod::Post => self.http.post(&request.url),
        };

        for (k, v) in &request.headers {
            req = req.header(k.as_str(), v.as_str());
        }

        if !request.form_fields.is_empty() {
            req = req.form(&request.form_fields);
        }

        tracing::debug!(method = %request.method, url = %request.url, "Sending request");

        let response = req.send().await.map_err(DropboxError::Http)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(DropboxError::Http)?;

        tracing::debug!(status, url = %request.url, "Received response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = HttpClientConfiguration::default();
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.user_agent.starts_with("dropbox-standard/"));
    }

    #[test]
    fn test_configuration_display() {
        let config = HttpClientConfiguration {
            timeout: Duration::from_secs(30),
            user_agent: "agent/1.0".to_string(),
        };
        assert_eq!(
            config.to_string(),
            "HttpClientConfiguration(timeout = 30s, user_agent = agent/1.0)"
        );
    }

    #[test]
    fn test_reqwest_client_keeps_configuration() {
        let config = HttpClientConfiguration {
            timeout: Duration::from_secs(5),
            user_agent: "test-agent".to_string(),
        };
        let client = ReqwestHttpClient::new(config.clone()).unwrap();
        assert_eq!(client.configuration(), &config);
    }
}
