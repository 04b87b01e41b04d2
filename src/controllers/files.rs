//! File request endpoints

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::auth::{AuthManagers, AuthScheme};
use crate::configuration::Configuration;
use crate::controllers::BaseController;
use crate::environment::Server;
use crate::error::{DropboxError, Result};
use crate::http::{validate_response, HttpClient, HttpRequest};
use crate::models::FileRequestCount;

/// Calls under `/file_requests`.
#[derive(Debug, Clone)]
pub struct FilesController {
    base: BaseController,
    auth_managers: AuthManagers,
}

impl FilesController {
    pub fn new(
        config: Arc<dyn Configuration>,
        http: Arc<dyn HttpClient>,
        auth_managers: AuthManagers,
    ) -> Self {
        Self {
            base: BaseController::new(config, http),
            auth_managers,
        }
    }

    /// Returns the total number of file requests owned by the user.
    ///
    /// # Errors
    ///
    /// Returns whatever the `global` auth manager fails with when no
    /// token can be obtained, and [`DropboxError::Api`] on a non-2xx
    /// response.
    pub async fn get_file_count(&self) -> Result<FileRequestCount> {
        self.get_file_count_with_cancellation(&CancellationToken::new())
            .await
    }

    /// Cancellable form of [`Self::get_file_count`].
    pub async fn get_file_count_with_cancellation(
        &self,
        cancel: &CancellationToken,
    ) -> Result<FileRequestCount> {
        let url = format!(
            "{}/file_requests/count",
            self.base.config().base_uri(Server::Default)
        );
        let request = HttpRequest::post(url)
            .with_header("user-agent", self.base.user_agent())
            .with_header("accept", "application/json");

        let request = self
            .auth_managers
            .get(AuthScheme::Global)
            .apply_with_cancellation(request, cancel)
            .await?;

        let context = self.base.execute(request, cancel).await?;
        validate_response(&context)?;

        let count = serde_json::from_str(&context.response.body)
            .map_err(DropboxError::Serialization)?;
        Ok(count)
    }
}
