//! Delivery surfaces for finished artifacts.
//!
//! A [`DownloadSurface`] receives CSV bytes under a suggested filename. A
//! [`PrintSurface`] hands out a [`PrintWindow`] that loads a document,
//! prints it and is closed afterwards. The filesystem implementations here
//! write through a temporary sibling file that is renamed into place, so a
//! failed export never leaves a partial artifact behind.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{ExportError, ExportResult};

/// A delivered artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    /// Where the artifact ended up, when the surface has a location.
    pub location: Option<PathBuf>,
    pub bytes: usize,
}

/// Receives a finished file and saves it.
pub trait DownloadSurface: Send + Sync {
    fn save(&self, filename: &str, contents: &[u8]) -> ExportResult<Artifact>;
}

/// Source of print windows. `None` means the host refused to open one.
#[async_trait]
pub trait PrintSurface: Send + Sync {
    async fn open(&self) -> Option<Box<dyn PrintWindow>>;
}

/// A transient window holding one document.
#[async_trait]
pub trait PrintWindow: Send {
    /// Load the document; resolves once the window reports it loaded.
    async fn load(&mut self, filename: &str, document: &str) -> ExportResult<()>;

    async fn print(&mut self) -> ExportResult<Artifact>;

    async fn close(&mut self);
}

/// Saves downloads into a directory.
#[derive(Debug, Clone)]
pub struct DirectoryDownload {
    dir: PathBuf,
}

impl DirectoryDownload {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSurface for DirectoryDownload {
    fn save(&self, filename: &str, contents: &[u8]) -> ExportResult<Artifact> {
        let target = target_in(&self.dir, filename)?;
        let mut staged = StagedFile::create(&target)?;
        staged.write(contents)?;
        staged.commit()?;
        tracing::info!(path = %target.display(), bytes = contents.len(), "Export saved");
        Ok(Artifact {
            filename: filename.to_string(),
            location: Some(target),
            bytes: contents.len(),
        })
    }
}

/// Print surface that renders documents to HTML files in a directory.
///
/// "Printing" publishes the loaded document under its final name, ready to
/// be opened in a browser and printed to PDF. The surface is unavailable
/// when the directory cannot be created.
#[derive(Debug, Clone)]
pub struct HtmlFilePrintSurface {
    dir: PathBuf,
}

impl HtmlFilePrintSurface {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl PrintSurface for HtmlFilePrintSurface {
    async fn open(&self) -> Option<Box<dyn PrintWindow>> {
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            tracing::warn!(error = %e, dir = %self.dir.display(), "Cannot open print surface");
            return None;
        }
        Some(Box::new(HtmlFileWindow {
            dir: self.dir.clone(),
            staged: None,
        }))
    }
}

struct HtmlFileWindow {
    dir: PathBuf,
    staged: Option<(String, usize, StagedFile)>,
}

#[async_trait]
impl PrintWindow for HtmlFileWindow {
    async fn load(&mut self, filename: &str, document: &str) -> ExportResult<()> {
        let target = target_in(&self.dir, filename)?;
        let contents = document.as_bytes().to_vec();
        let staged = off_runtime(&self.dir, move || {
            let mut staged = StagedFile::create(&target)?;
            staged.write(&contents)?;
            Ok(staged)
        })
        .await?;
        self.staged = Some((filename.to_string(), document.len(), staged));
        Ok(())
    }

    async fn print(&mut self) -> ExportResult<Artifact> {
        let Some((filename, bytes, staged)) = self.staged.take() else {
            return Err(ExportError::io(
                &self.dir,
                std::io::Error::other("nothing loaded to print"),
            ));
        };
        let target = staged.target.clone();
        off_runtime(&self.dir, move || staged.commit()).await?;
        tracing::info!(path = %target.display(), bytes, "Printable document ready");
        Ok(Artifact {
            filename,
            location: Some(target),
            bytes,
        })
    }

    async fn close(&mut self) {
        // dropping an uncommitted staged file removes it
        self.staged = None;
    }
}

/// `dir/filename`, provided `filename` names a plain file inside `dir`.
fn target_in(dir: &Path, filename: &str) -> ExportResult<PathBuf> {
    let plain = !filename.contains(['/', '\\'])
        && Path::new(filename).file_name().is_some_and(|name| name == filename);
    if !plain {
        return Err(ExportError::InvalidFilename(filename.to_string()));
    }
    Ok(dir.join(filename))
}

/// Run blocking file work on the blocking pool.
async fn off_runtime<T, F>(dir: &Path, work: F) -> ExportResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ExportResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ExportError::io(dir, std::io::Error::other(e)))?
}

/// A file written under a temporary name and renamed over `target` on commit.
struct StagedFile {
    target: PathBuf,
    temp: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl StagedFile {
    fn create(target: &Path) -> ExportResult<Self> {
        let parent = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(parent).map_err(|e| ExportError::io(parent, e))?;

        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let name = target
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("artifact");
        let temp = parent.join(format!(".{name}.{nanos}.tmp"));

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp)
            .map_err(|e| ExportError::io(&temp, e))?;

        Ok(Self {
            target: target.to_path_buf(),
            temp,
            file: Some(file),
            committed: false,
        })
    }

    fn write(&mut self, contents: &[u8]) -> ExportResult<()> {
        match self.file.as_mut() {
            Some(file) => file
                .write_all(contents)
                .map_err(|e| ExportError::io(&self.temp, e)),
            None => Err(ExportError::io(
                &self.temp,
                std::io::Error::other("file handle already closed"),
            )),
        }
    }

    fn commit(mut self) -> ExportResult<()> {
        if let Some(file) = self.file.take() {
            file.sync_all().map_err(|e| ExportError::io(&self.temp, e))?;
        }
        fs::rename(&self.temp, &self.target).map_err(|e| ExportError::io(&self.target, e))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp);
        }
    }
}
