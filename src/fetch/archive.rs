use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{error, info, instrument};
use zip::ZipArchive;

use super::client::ReportFetcher;
use crate::error::LocateError;

/// Unpacked yearly archives under one root directory.
///
/// Year directories this workspace downloads are removed again when it is
/// dropped, unless it was created with `keep = true`. Directories that were
/// already present are never touched.
pub struct ArchiveWorkspace {
    root: PathBuf,
    created: Vec<PathBuf>,
    keep: bool,
}

impl ArchiveWorkspace {
    pub fn new(root: impl Into<PathBuf>, keep: bool) -> Self {
        Self {
            root: root.into(),
            created: Vec::new(),
            keep,
        }
    }

    pub fn year_dir(&self, year: i32) -> PathBuf {
        self.root.join(year.to_string())
    }

    /// Directories created so far.
    pub fn created(&self) -> &[PathBuf] {
        &self.created
    }

    /// Make sure `<root>/<year>` holds the reports of that year, downloading
    /// and extracting the archive if the directory is missing.
    #[instrument(level = "info", skip(self, fetcher))]
    pub async fn ensure_year<F: ReportFetcher>(
        &mut self,
        year: i32,
        fetcher: &F,
    ) -> Result<PathBuf, LocateError> {
        let dir = self.year_dir(year);
        if dir.is_dir() {
            return Ok(dir);
        }

        let archive_err = |source: anyhow::Error| LocateError::Archive { year, source };

        let bytes = fetcher.fetch_archive(year).await.map_err(archive_err)?;
        info!(size = bytes.len(), "downloaded archive");

        let unpacked = self.unpack(&bytes, &dir);
        // register before checking the result so a half-written dir is cleaned too
        if dir.exists() {
            self.created.push(dir.clone());
        }
        let count = unpacked.map_err(archive_err)?;
        info!(reports = count, dir = %dir.display(), "extracted archive");
        Ok(dir)
    }

    fn unpack(&self, bytes: &[u8], dir: &Path) -> Result<usize> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating archive root {}", self.root.display()))?;
        let mut tmp = NamedTempFile::new_in(&self.root).context("creating temp archive file")?;
        tmp.write_all(bytes).context("writing temp archive file")?;
        tmp.flush()?;
        extract_reports(tmp.path(), dir)
    }

    /// Remove every directory this workspace created. A no-op for a
    /// workspace that keeps its downloads.
    pub fn cleanup(&mut self) -> Result<()> {
        if self.keep {
            return Ok(());
        }
        for dir in self.created.drain(..) {
            fs::remove_dir_all(&dir).with_context(|| format!("removing {}", dir.display()))?;
            info!(dir = %dir.display(), "removed archive directory");
        }
        Ok(())
    }
}

impl Drop for ArchiveWorkspace {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            error!("archive cleanup failed: {:#}", e);
        }
    }
}

/// Extract every PDF in `zip_path` into `dest`, flattened to its file name.
/// The archives nest reports under folders whose names changed over the
/// years; flattening puts them all directly under the year directory.
pub fn extract_reports(zip_path: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(zip_path)
        .with_context(|| format!("opening ZIP file {}", zip_path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("reading ZIP archive {}", zip_path.display()))?;
    fs::create_dir_all(dest).with_context(|| format!("creating {}", dest.display()))?;

    let mut count = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("accessing ZIP entry #{i}"))?;
        if !entry.is_file() || !entry.name().to_lowercase().ends_with(".pdf") {
            continue;
        }
        let Some(file_name) = entry
            .enclosed_name()
            .and_then(|p| p.file_name().map(|n| n.to_owned()))
        else {
            continue;
        };

        let target = dest.join(file_name);
        let mut out =
            File::create(&target).with_context(|| format!("creating {}", target.display()))?;
        io::copy(&mut entry, &mut out).with_context(|| format!("writing {}", target.display()))?;
        count += 1;
    }

    Ok(count)
}
