//! Configuration: OAuth constants, remote endpoints, and local file paths.

use std::path::PathBuf;

use serde::Deserialize;

/// The single scope this tool requests and requires.
pub const REQUIRED_SCOPE: &str = "https://www.googleapis.com/auth/photoslibrary.readonly";

/// Fixed port for the one-shot OAuth callback listener.
///
/// Must match the redirect URI registered with the OAuth client.
pub const REDIRECT_PORT: u16 = 8080;

/// Redirect URI sent to the authorization and token endpoints.
pub const REDIRECT_URI: &str = "http://localhost:8080";

/// Remote endpoint URLs.
///
/// Defaults point at Google; tests swap in a local mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// OAuth consent page opened in the browser.
    pub auth_url: String,
    /// Token endpoint for code exchange and refresh.
    pub token_url: String,
    /// Token-introspection endpoint used for post-auth validation.
    pub tokeninfo_url: String,
    /// Photos Library API base, up to and including the version segment.
    pub api_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            tokeninfo_url: "https://www.googleapis.com/oauth2/v3/tokeninfo".to_string(),
            api_base: "https://photoslibrary.googleapis.com/v1".to_string(),
        }
    }
}

/// Local file paths used across a run.
///
/// Defaults match the working-directory layout the setup instructions
/// describe: the client identity next to the binary, state and archive
/// alongside it.
#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Client identity JSON downloaded from the Google Cloud Console.
    pub credentials_file: PathBuf,
    /// Cached OAuth token (created on first authorization).
    pub token_file: PathBuf,
    /// Persisted download-progress file.
    pub state_file: PathBuf,
    /// Output zip archive, opened in append mode.
    pub archive_file: PathBuf,
    /// Scratch directory for in-flight downloads.
    pub temp_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            credentials_file: PathBuf::from("credentials.json"),
            token_file: PathBuf::from("token.json"),
            state_file: PathBuf::from("download_state.json"),
            archive_file: PathBuf::from("unfiled_photos.zip"),
            temp_dir: PathBuf::from("temp_downloads"),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Local file paths.
    pub paths: PathConfig,
    /// Remote endpoints.
    pub endpoints: Endpoints,
}

/// Optional path overrides read from the config file.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    paths: RawPaths,
}

#[derive(Debug, Default, Deserialize)]
struct RawPaths {
    credentials_file: Option<PathBuf>,
    token_file: Option<PathBuf>,
    state_file: Option<PathBuf>,
    archive_file: Option<PathBuf>,
    temp_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Returns the location of the optional config file.
    #[must_use]
    pub fn config_file() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("unfiled-dl")
            .join("config.toml")
    }

    /// Loads configuration, applying overrides from the config file if one
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    pub fn load() -> crate::Result<Self> {
        let path = Self::config_file();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)?;
        let raw: RawConfig = toml::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Self::default().apply(raw))
    }

    fn apply(mut self, raw: RawConfig) -> Self {
        let p = raw.paths;
        if let Some(v) = p.credentials_file {
            self.paths.credentials_file = v;
        }
        if let Some(v) = p.token_file {
            self.paths.token_file = v;
        }
        if let Some(v) = p.state_file {
            self.paths.state_file = v;
        }
        if let Some(v) = p.archive_file {
            self.paths.archive_file = v;
        }
        if let Some(v) = p.temp_dir {
            self.paths.temp_dir = v;
        }
        self
    }
}
