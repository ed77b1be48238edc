//! OAuth 2.0 authorization with PKCE, token caching, and silent refresh.
//!
//! The authorizer moves between three states: no usable token, authorizing
//! (browser consent flow), and authorized. A cached token whose scopes no
//! longer match, or which has expired without a refresh token, drops back to
//! the consent flow; an expired token with a refresh token is refreshed
//! silently.

pub mod callback;
pub mod pkce;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{Endpoints, REDIRECT_PORT, REDIRECT_URI, REQUIRED_SCOPE};
use crate::error::{Error, Result};
use crate::models::TokenResponse;

use callback::CallbackServer;

/// OAuth client identity, loaded once from the local credentials file.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

impl Credentials {
    /// Loads the client identity from a JSON file.
    ///
    /// Accepts both the flat `{client_id, client_secret}` form and the
    /// `{"installed": {...}}` wrapper the Google Cloud Console produces.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not contain the
    /// two required fields.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&contents)?;
        let object = value.get("installed").unwrap_or(&value);
        Ok(serde_json::from_value(object.clone())?)
    }
}

/// Persisted token record.
///
/// Written as plain JSON so the cache stays inspectable and carries no
/// deserialization risk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCache {
    /// Bearer token presented on API requests.
    pub access_token: String,
    /// Refresh token, when the provider granted one.
    pub refresh_token: Option<String>,
    /// Instant the access token stops being accepted.
    pub expires_at: DateTime<Utc>,
    /// Scopes granted with this token.
    pub scopes: Vec<String>,
}

impl TokenCache {
    /// Loads the cache from disk, returning `None` when the file is absent
    /// or unreadable (either way a fresh authorization is needed).
    #[must_use]
    pub fn load(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    /// Saves the cache atomically (write tmp + rename).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_string_pretty(self)?)?;

        // The cache holds live credentials; keep it private on unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&tmp_path, perms)?;
        }

        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Whether the access token's lifetime has elapsed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Whether the granted scope set equals exactly `{required}`.
    #[must_use]
    pub fn scopes_match(&self, required: &str) -> bool {
        let granted: HashSet<&str> = self.scopes.iter().map(String::as_str).collect();
        granted.len() == 1 && granted.contains(required)
    }
}

/// What `authorize()` will do with a cached token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Token is valid and correctly scoped; use it as-is.
    UseAsIs,
    /// Token expired but a refresh token exists; refresh silently.
    Refresh,
    /// No cache, wrong scopes, or expired without refresh; run the full flow.
    Reauthorize,
}

/// Decides how a cached token should be treated.
#[must_use]
pub fn disposition(cache: Option<&TokenCache>, required_scope: &str) -> Disposition {
    let Some(cache) = cache else {
        return Disposition::Reauthorize;
    };
    if !cache.scopes_match(required_scope) {
        return Disposition::Reauthorize;
    }
    if !cache.is_expired() {
        return Disposition::UseAsIs;
    }
    if cache.refresh_token.is_some() {
        Disposition::Refresh
    } else {
        Disposition::Reauthorize
    }
}

/// Runs the OAuth flow end to end and owns the persisted token cache.
pub struct Authorizer {
    credentials: Credentials,
    endpoints: Endpoints,
    token_path: PathBuf,
    http: reqwest::Client,
}

impl Authorizer {
    /// Creates an authorizer for the given identity and cache location.
    #[must_use]
    pub fn new(credentials: Credentials, token_path: PathBuf, endpoints: Endpoints) -> Self {
        Self {
            credentials,
            endpoints,
            token_path,
            http: reqwest::Client::new(),
        }
    }

    /// Produces a valid token: cached, silently refreshed, or freshly
    /// granted through the browser consent flow.
    ///
    /// # Errors
    ///
    /// Returns an error if the consent flow yields no code or a token
    /// endpoint exchange fails.
    pub async fn authorize(&self) -> Result<TokenCache> {
        let cached = TokenCache::load(&self.token_path);
        match (disposition(cached.as_ref(), REQUIRED_SCOPE), cached) {
            (Disposition::UseAsIs, Some(cache)) => {
                log::info!("using cached access token");
                Ok(cache)
            }
            (Disposition::Refresh, Some(cache)) => match self.refresh(&cache).await {
                Ok(fresh) => Ok(fresh),
                Err(e) => {
                    log::warn!("token refresh failed, starting a new authorization: {e}");
                    self.discard_cache();
                    self.interactive_flow().await
                }
            },
            _ => {
                self.discard_cache();
                self.interactive_flow().await
            }
        }
    }

    /// Confirms the token actually works: introspects it, then issues one
    /// cheap API probe. Never fails the run; problems surface as warnings
    /// with guidance.
    pub async fn validate(&self, cache: &TokenCache) {
        self.check_tokeninfo(cache).await;
        self.check_api_reachable(cache).await;
    }

    fn discard_cache(&self) {
        if self.token_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.token_path) {
                log::warn!(
                    "could not remove stale token cache {}: {e}",
                    self.token_path.display()
                );
            }
        }
    }

    async fn refresh(&self, cache: &TokenCache) -> Result<TokenCache> {
        let refresh_token = cache
            .refresh_token
            .as_deref()
            .ok_or_else(|| Error::Auth("no refresh token available".to_string()))?;

        let response = self
            .http
            .post(&self.endpoints.token_url)
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!("token refresh failed with {status}: {body}")));
        }

        let token: TokenResponse = response.json().await?;
        let fresh = TokenCache {
            access_token: token.access_token,
            // Refresh responses omit the refresh token; keep the stored one.
            refresh_token: cache.refresh_token.clone(),
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
            scopes: cache.scopes.clone(),
        };
        fresh.save(&self.token_path)?;
        log::info!("access token refreshed");
        Ok(fresh)
    }

    async fn interactive_flow(&self) -> Result<TokenCache> {
        let pair = pkce::generate();
        let consent_url = self.consent_url(&pair.challenge)?;

        // Bind before opening the browser so the redirect cannot race us.
        let server = CallbackServer::bind(REDIRECT_PORT).await?;

        println!("Opening your browser for authorization...");
        if let Err(e) = open::that(consent_url.as_str()) {
            log::warn!("could not open a browser: {e}");
        }
        println!("If the browser did not open, visit:\n  {consent_url}");

        let code = server.recv_code().await?;
        let token = self.exchange_code(&code, &pair.verifier).await?;

        let scopes = token.scope.as_deref().map_or_else(
            || vec![REQUIRED_SCOPE.to_string()],
            |s| s.split_whitespace().map(str::to_string).collect(),
        );
        let cache = TokenCache {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
            scopes,
        };
        cache.save(&self.token_path)?;
        println!("Authentication successful!");
        Ok(cache)
    }

    fn consent_url(&self, challenge: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.endpoints.auth_url,
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("redirect_uri", REDIRECT_URI),
                ("response_type", "code"),
                ("scope", REQUIRED_SCOPE),
                ("code_challenge", challenge),
                ("code_challenge_method", "S256"),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| Error::Auth(format!("invalid authorization endpoint: {e}")))
    }

    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.endpoints.token_url)
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("code", code),
                ("code_verifier", verifier),
                ("grant_type", "authorization_code"),
                ("redirect_uri", REDIRECT_URI),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!("code exchange failed with {status}: {body}")));
        }
        Ok(response.json().await?)
    }

    async fn check_tokeninfo(&self, cache: &TokenCache) {
        let response = self
            .http
            .get(&self.endpoints.tokeninfo_url)
            .query(&[("access_token", cache.access_token.as_str())])
            .send()
            .await;

        let info: serde_json::Value = match response {
            Ok(r) if r.status().is_success() => match r.json().await {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("token introspection returned an unreadable body: {e}");
                    return;
                }
            },
            Ok(r) => {
                log::warn!(
                    "token introspection failed with {}; the token may already be revoked. \
                     Delete {} and re-run to authorize again.",
                    r.status(),
                    self.token_path.display()
                );
                return;
            }
            Err(e) => {
                log::warn!("token introspection request failed: {e}");
                return;
            }
        };

        let scope_ok = info
            .get("scope")
            .and_then(serde_json::Value::as_str)
            .is_some_and(|s| s.split_whitespace().any(|scope| scope == REQUIRED_SCOPE));
        if !scope_ok {
            log::warn!(
                "the token is missing the {REQUIRED_SCOPE} scope; API calls will \
                 likely fail with 403. Delete {} and re-run to authorize again.",
                self.token_path.display()
            );
        }

        // tokeninfo reports expires_in as a string on some responses.
        let expires_in = info.get("expires_in").and_then(|v| {
            v.as_i64()
                .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
        });
        match expires_in {
            Some(secs) if secs > 0 => {
                log::info!("token valid for another {secs}s");
            }
            Some(_) => log::warn!("token introspection reports the token as already expired"),
            None => {}
        }
    }

    async fn check_api_reachable(&self, cache: &TokenCache) {
        let probe = format!("{}/mediaItems", self.endpoints.api_base);
        let response = self
            .http
            .get(&probe)
            .bearer_auth(&cache.access_token)
            .query(&[("pageSize", "1")])
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => {
                log::info!("API probe succeeded");
            }
            Ok(r) => {
                log::warn!(
                    "API probe failed with {}; check that the Photos Library API is \
                     enabled for this project in the Cloud Console.",
                    r.status()
                );
            }
            Err(e) => log::warn!("API probe request failed: {e}"),
        }
    }
}
