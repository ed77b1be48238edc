//! The download pipeline: fetch each unfiled item into the archive,
//! persisting progress after every success so runs are resumable.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::archive;
use crate::error::Result;
use crate::fs::{FileSystem, TokioFileSystem};
use crate::models::MediaItem;
use crate::state::DownloadState;
use crate::stats::{RunStats, RunStatsBuilder};

/// Trait for receiving per-item progress updates.
///
/// All methods have default no-op implementations; indexes are 1-based for
/// display.
pub trait PipelineProgress: Send + Sync {
    /// Called before an item's download starts.
    fn on_item_start(&self, _index: usize, _total: usize, _filename: &str) {}

    /// Called when an item is skipped via the resume set.
    fn on_item_skipped(&self, _index: usize, _total: usize, _filename: &str) {}

    /// Called after an item's bytes are in the archive and the state is
    /// persisted.
    fn on_item_complete(&self, _index: usize, _total: usize, _filename: &str, _bytes: u64) {}

    /// Called when an item fails; the run continues.
    fn on_item_error(&self, _index: usize, _total: usize, _filename: &str, _error: &str) {}
}

/// A null progress implementation that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl PipelineProgress for NoProgress {}

/// Downloads unfiled items one at a time into the archive.
pub struct Pipeline<F: FileSystem = TokioFileSystem> {
    http: reqwest::Client,
    archive_path: PathBuf,
    temp_dir: PathBuf,
    state_path: PathBuf,
    fs: F,
}

impl Pipeline<TokioFileSystem> {
    /// Creates a pipeline with the default file system.
    #[must_use]
    pub const fn new(
        http: reqwest::Client,
        archive_path: PathBuf,
        temp_dir: PathBuf,
        state_path: PathBuf,
    ) -> Self {
        Self {
            http,
            archive_path,
            temp_dir,
            state_path,
            fs: TokioFileSystem,
        }
    }
}

impl<F: FileSystem> Pipeline<F> {
    /// Creates a pipeline with a custom file system implementation.
    #[must_use]
    pub const fn with_fs(
        http: reqwest::Client,
        archive_path: PathBuf,
        temp_dir: PathBuf,
        state_path: PathBuf,
        fs: F,
    ) -> Self {
        Self {
            http,
            archive_path,
            temp_dir,
            state_path,
            fs,
        }
    }

    /// Runs the pipeline over `unfiled` in order.
    ///
    /// Items already in `state` are skipped. Each success appends to the
    /// archive and persists the state before the next item starts; each
    /// failure is logged and the loop continues. A failure to persist the
    /// state aborts the run, since resume correctness depends on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the temp directory cannot be created or the
    /// progress state cannot be persisted.
    pub async fn run(
        &self,
        unfiled: &[MediaItem],
        state: &mut DownloadState,
        progress: &dyn PipelineProgress,
    ) -> Result<RunStats> {
        let mut builder = RunStatsBuilder::new();
        if unfiled.is_empty() {
            return Ok(builder.build());
        }

        self.fs.create_dir_all(&self.temp_dir).await?;

        let total = unfiled.len();
        for (i, item) in unfiled.iter().enumerate() {
            let index = i + 1;
            if state.contains(&item.id) {
                progress.on_item_skipped(index, total, &item.filename);
                builder.add_skipped();
                continue;
            }

            progress.on_item_start(index, total, &item.filename);
            match self.fetch_and_archive(item).await {
                Ok(bytes) => {
                    state.mark_downloaded(item.id.clone(), &self.state_path)?;
                    builder.add_download(bytes);
                    progress.on_item_complete(index, total, &item.filename, bytes);
                }
                Err(e) => {
                    log::error!("failed to download {}: {e}", item.filename);
                    builder.add_failure();
                    progress.on_item_error(index, total, &item.filename, &e.to_string());
                }
            }
        }

        // Only removable when every temp file was cleaned up.
        let _ = self.fs.remove_dir(&self.temp_dir).await;

        Ok(builder.build())
    }

    /// Downloads one item to a temp file, appends it to the archive, and
    /// removes the temp file.
    async fn fetch_and_archive(&self, item: &MediaItem) -> Result<u64> {
        let temp_path = self.temp_dir.join(temp_name(item));
        self.fetch_to_file(&item.download_url(), &temp_path).await?;
        let bytes = archive::append_file(&self.archive_path, &item.filename, &temp_path)?;
        self.fs.remove_file(&temp_path).await?;
        Ok(bytes)
    }

    /// Streams a URL's bytes to a file.
    async fn fetch_to_file(&self, url: &str, path: &Path) -> Result<()> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        let mut stream = response.bytes_stream();

        let file = self.fs.create_file(path).await?;
        let mut writer = BufWriter::new(file);
        while let Some(chunk) = stream.next().await {
            writer.write_all(&chunk?).await?;
        }
        writer.flush().await?;
        Ok(())
    }
}

/// Temp file name for an item: the filename's final component only, so an
/// API-supplied name can never escape the temp directory.
fn temp_name(item: &MediaItem) -> String {
    Path::new(&item.filename).file_name().map_or_else(
        || item.id.clone(),
        |name| name.to_string_lossy().into_owned(),
    )
}
