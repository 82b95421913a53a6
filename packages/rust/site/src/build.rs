//! Static build: render every feed into an output directory.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use vitrine_cms::ContentSource;
use vitrine_shared::{Result, VitrineError};

use crate::context::SiteContext;
use crate::feeds::{FeedKind, compose_feed};

/// Name of the manifest written next to the feeds.
pub const MANIFEST_FILE_NAME: &str = "build-manifest.json";

/// A file written by the build.
#[derive(Debug, Clone, Serialize)]
pub struct BuiltFile {
    pub feed: &'static str,
    pub file_name: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Outcome of a successful build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub out_dir: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub files: Vec<BuiltFile>,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Progress callback for reporting build status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each feed file is written.
    fn feed_written(&self, file_name: &str, current: usize, total: usize);
    /// Called when the build completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn feed_written(&self, _file_name: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Render `feeds` into `out_dir`, then write a checksummed manifest.
///
/// Each file is written to a temporary name and renamed into place, so a
/// failed build never leaves a truncated feed behind.
#[instrument(skip_all, fields(out_dir = %out_dir.display(), feeds = feeds.len()))]
pub async fn build_feeds(
    source: &dyn ContentSource,
    ctx: &SiteContext,
    out_dir: &Path,
    feeds: &[FeedKind],
    now: DateTime<Utc>,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();

    progress.phase("Preparing output directory");
    std::fs::create_dir_all(out_dir).map_err(|e| VitrineError::io(out_dir, e))?;

    progress.phase("Rendering feeds");
    let mut files = Vec::with_capacity(feeds.len());
    for (i, kind) in feeds.iter().enumerate() {
        let body = compose_feed(*kind, source, ctx, now).await?;
        let file_name = kind.file_name();
        write_atomic(out_dir, &file_name, body.as_bytes())?;

        files.push(BuiltFile {
            feed: kind.name(),
            sha256: sha256_hex(body.as_bytes()),
            size_bytes: body.len(),
            file_name: file_name.clone(),
        });
        progress.feed_written(&file_name, i + 1, feeds.len());
    }

    let result = BuildResult {
        out_dir: out_dir.to_path_buf(),
        generated_at: now,
        files,
        elapsed: start.elapsed(),
    };

    progress.phase("Writing manifest");
    let manifest = serde_json::to_string_pretty(&result)
        .map_err(|e| VitrineError::parse(format!("manifest serialization: {e}")))?;
    write_atomic(out_dir, MANIFEST_FILE_NAME, manifest.as_bytes())?;

    info!(
        files = result.files.len(),
        elapsed_ms = result.elapsed.as_millis() as u64,
        "build complete"
    );
    progress.done(&result);
    Ok(result)
}

/// Build every feed.
pub async fn build_all(
    source: &dyn ContentSource,
    ctx: &SiteContext,
    out_dir: &Path,
    now: DateTime<Utc>,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    build_feeds(source, ctx, out_dir, &FeedKind::ALL, now, progress).await
}

fn write_atomic(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<()> {
    let target = dir.join(file_name);
    let temp = dir.join(format!(".{file_name}.tmp"));
    std::fs::write(&temp, bytes).map_err(|e| VitrineError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| VitrineError::io(&target, e))?;
    Ok(())
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
