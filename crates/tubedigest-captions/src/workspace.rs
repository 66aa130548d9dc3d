//! Disposable working directory for one caption download.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tubedigest_common::{Error, Result};

const PREFIX: &str = "tubedigest-";

/// Scratch workspace for a single item's tool invocation.
///
/// The directory is removed when the workspace is dropped: on success, on an
/// early `?` return, and when the owning future is cancelled. [`close`]
/// removes it explicitly and reports any removal error.
///
/// [`close`]: ScratchWorkspace::close
///
/// # Example
///
/// ```no_run
/// use tubedigest_captions::ScratchWorkspace;
///
/// let workspace = ScratchWorkspace::new().unwrap();
/// let srt = workspace.file("subtitle.en.srt");
/// // ... run the caption tool inside workspace.path() ...
/// workspace.close().unwrap();
/// ```
#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: TempDir,
}

impl ScratchWorkspace {
    /// Create a workspace in the system temp directory.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(PREFIX)
            .tempdir()
            .map_err(|e| Error::tool("workspace", format!("failed to create temp dir: {e}")))?;
        Ok(Self { dir })
    }

    /// Create a workspace under `parent`.
    pub fn new_in(parent: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(PREFIX)
            .tempdir_in(parent)
            .map_err(|e| Error::tool("workspace", format!("failed to create temp dir: {e}")))?;
        Ok(Self { dir })
    }

    /// Path to the workspace directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for a named file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Remove the workspace now.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| {
            Error::tool(
                "workspace",
                format!("failed to remove {}: {e}", path.display()),
            )
        })
    }
}
