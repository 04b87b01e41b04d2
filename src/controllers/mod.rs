//! Endpoint controllers
//!
//! Each controller groups the calls for one area of the API. Controllers
//! share a [`BaseController`] holding the resolved configuration and the
//! HTTP client; authorized controllers also hold the auth manager registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::configuration::Configuration;
use crate::error::Result;
use crate::http::{execute_with_cancellation, HttpClient, HttpContext, HttpRequest};

pub mod files;
pub mod oauth_authorization;

pub use files::FilesController;
pub use oauth_authorization::OAuthAuthorizationController;

/// Optional extra form fields appended to a request body.
///
/// Entries whose value is `None` are omitted from the body.
pub type FieldParameters = BTreeMap<String, Option<String>>;

/// State shared by every controller.
#[derive(Debug, Clone)]
pub struct BaseController {
    config: Arc<dyn Configuration>,
    http: Arc<dyn HttpClient>,
}

impl BaseController {
    pub fn new(config: Arc<dyn Configuration>, http: Arc<dyn HttpClient>) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &dyn Configuration {
        self.config.as_ref()
    }

    /// `user-agent` header value sent by every controller.
    pub fn user_agent(&self) -> &str {
        &self.config.http_client_config().user_agent
    }

    /// Sends `request` and pairs it with the response.
    pub async fn execute(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpContext> {
        let response = execute_with_cancellation(self.http.as_ref(), &request, cancel).await?;
        Ok(HttpContext::new(request, response))
    }
}

/// Appends `(name, value)` pairs, skipping absent values.
pub(crate) fn append_fields<'a, I>(mut request: HttpRequest, fields: I) -> HttpRequest
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    for (name, value) in fields {
        if let Some(value) = value {
            request = request.with_form_field(name, value);
        }
    }
    request
}

/// Appends caller-supplied field parameters, skipping `None` values.
pub(crate) fn append_field_parameters(
    request: HttpRequest,
    field_parameters: Option<&FieldParameters>,
) -> HttpRequest {
    match field_parameters {
        Some(params) => append_fields(
            request,
            params.iter().map(|(k, v)| (k.as_str(), v.as_deref())),
        ),
        None => request,
    }
}
