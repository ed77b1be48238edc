//! unfiled-dl - downloads the Google Photos items that belong to no album.
//!
//! The tool authorizes against the Photos Library API (OAuth 2.0 with PKCE,
//! cached and silently refreshed tokens), enumerates every album's
//! membership and the whole library, computes the set difference, and
//! downloads the unfiled items into a zip archive. Progress is persisted
//! after every item, so an interrupted run resumes where it left off.
//!
//! # Example
//!
//! ```no_run
//! use unfiled_dl::{ApiClient, Authorizer, Credentials, DownloadState, NoProgress, Pipeline};
//!
//! # async fn example() -> unfiled_dl::Result<()> {
//! let config = unfiled_dl::AppConfig::load()?;
//!
//! // Authorize (cached token, silent refresh, or browser consent)
//! let credentials = Credentials::load(&config.paths.credentials_file)?;
//! let authorizer = Authorizer::new(
//!     credentials,
//!     config.paths.token_file.clone(),
//!     config.endpoints.clone(),
//! );
//! let token = authorizer.authorize().await?;
//!
//! // Inventory the library and download what is in no album
//! let client = ApiClient::new(token.access_token, config.paths.token_file.clone());
//! let inventory = unfiled_dl::inventory::build(&client, &config.endpoints).await?;
//! let mut state = DownloadState::load(&config.paths.state_file)?;
//! let pipeline = Pipeline::new(
//!     client.http(),
//!     config.paths.archive_file.clone(),
//!     config.paths.temp_dir.clone(),
//!     config.paths.state_file.clone(),
//! );
//! let stats = pipeline.run(&inventory.unfiled(), &mut state, &NoProgress).await?;
//! println!("Downloaded {} item(s)", stats.downloaded);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod api;
pub mod archive;
pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod fs;
pub mod inventory;
pub mod models;
pub mod pipeline;
pub mod state;
pub mod stats;

// Re-export main types for convenience
pub use api::ApiClient;
pub use auth::{Authorizer, Credentials, TokenCache};
pub use config::{AppConfig, Endpoints, PathConfig};
pub use error::{Error, Result};
pub use format::{format_bytes, format_duration};
pub use fs::{FileSystem, TokioFileSystem};
pub use inventory::Inventory;
pub use models::MediaItem;
pub use pipeline::{NoProgress, Pipeline, PipelineProgress};
pub use state::DownloadState;
pub use stats::RunStats;
