//! Data sources for the applet list.

use std::future::Future;
use std::path::{Path, PathBuf};

use super::error::{ApiError, ApiResult};
use super::manifest::AppletList;

/// Path of the applet list endpoint relative to the CMP base URL.
pub const APPLETS_ENDPOINT: &str = "api/v3/cmp/applets/";

/// A client that can list applet definitions.
pub trait AppletApi: Send + Sync {
    /// Fetch every applet definition.
    ///
    /// A response without `items` is an empty list, not an error.
    fn list(&self) -> impl Future<Output = ApiResult<AppletList>> + Send;
}

/// Applet API client backed by the CMP REST API.
#[derive(Debug, Clone)]
pub struct HttpAppletApi {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpAppletApi {
    /// Create a client for the CMP instance at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}/{}", base_url.trim_end_matches('/'), APPLETS_ENDPOINT),
            token: None,
        }
    }

    /// Authenticate requests with a bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl AppletApi for HttpAppletApi {
    async fn list(&self) -> ApiResult<AppletList> {
        let mut request = self.client.get(&self.url);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice::<Option<AppletList>>(&body)?.unwrap_or_default())
    }
}

/// Applet API backed by a local JSON file shaped like the list response.
#[derive(Debug, Clone)]
pub struct FileAppletApi {
    path: PathBuf,
}

impl FileAppletApi {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AppletApi for FileAppletApi {
    async fn list(&self) -> ApiResult<AppletList> {
        let content = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice::<Option<AppletList>>(&content)?.unwrap_or_default())
    }
}
