//! Authenticated JSON client for the Photos Library API.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Matches 401/403 bodies that indicate a scope or authentication problem,
/// as opposed to e.g. a rate limit dressed up as 403.
static SCOPE_ERROR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)insufficient|unauthenticated|unauthorized|invalid_grant|forbidden|permission|scope")
        .expect("valid regex")
});

/// HTTP client that attaches the bearer token to every request.
///
/// On a 401/403 whose body matches the scope/authentication pattern, the
/// cached token file is deleted and [`Error::PermissionDenied`] is returned
/// so the process fails fast; the next run re-authorizes from scratch.
pub struct ApiClient {
    http: reqwest::Client,
    access_token: String,
    token_path: PathBuf,
}

impl ApiClient {
    /// Creates a client for the given bearer token.
    #[must_use]
    pub fn new(access_token: String, token_path: PathBuf) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token,
            token_path,
        }
    }

    /// The underlying HTTP client, shared so downloads reuse its pool.
    #[must_use]
    pub fn http(&self) -> reqwest::Client {
        self.http.clone()
    }

    /// Issues a GET and deserializes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or a body
    /// that does not deserialize as `T`.
    pub async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        self.execute(self.http.get(url).query(query)).await
    }

    /// Issues a POST with a JSON body and deserializes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or a body
    /// that does not deserialize as `T`.
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, url: &str, body: &B) -> Result<T> {
        let payload = serde_json::to_vec(body)?;
        self.execute(self.http.post(url).body(payload)).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(&self.access_token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        log::error!("API error: {status} - {body}");

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
            && SCOPE_ERROR_RE.is_match(&body)
        {
            if self.token_path.exists() {
                if let Err(e) = std::fs::remove_file(&self.token_path) {
                    log::warn!(
                        "could not remove rejected token cache {}: {e}",
                        self.token_path.display()
                    );
                }
            }
            return Err(Error::PermissionDenied {
                status,
                message: "the cached token was rejected and has been deleted; \
                          re-run to authorize again"
                    .to_string(),
            });
        }

        Err(Error::Api { status, body })
    }
}
