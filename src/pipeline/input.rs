//! Input handling: validate uploads, read local files, and scope temp storage.
//!
//! Uploads are checked in the cheapest order: is there a file, does its name
//! end in `.pdf`, do the bytes start with `%PDF`. Only then does anything
//! reach pdfium, so a stray `.txt` upload is rejected before decoding.
//!
//! Each HTTP request gets an [`UploadWorkspace`]: a private `TempDir` holding
//! the saved upload and the assembled output. The directory is removed when
//! the workspace is dropped, on success, on error and on panic alike.

use crate::error::ScanError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// The four bytes every PDF starts with.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Name the assembled output is stored under inside a workspace.
pub const OUTPUT_FILE_NAME: &str = "scanned_output.pdf";

/// Validate an uploaded filename and reduce it to a bare file name.
///
/// The name must be non-empty and end in `.pdf` exactly (lowercase; `SCAN.PDF`
/// is rejected). Directory components are stripped so a crafted name such as
/// `../../etc/x.pdf` cannot escape the workspace.
pub fn validate_upload_filename(filename: Option<&str>) -> Result<String, ScanError> {
    let reject = || ScanError::NotAPdfUpload {
        filename: filename.map(str::to_string),
    };

    let raw = filename
        .filter(|n| n.ends_with(".pdf"))
        .ok_or_else(reject)?;
    let base = Path::new(raw)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| n.ends_with(".pdf"))
        .ok_or_else(reject)?;

    Ok(base.to_string())
}

/// Reject byte buffers that are not PDFs before handing them to pdfium.
pub fn check_pdf_magic(bytes: &[u8]) -> Result<(), ScanError> {
    if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        return Err(ScanError::NotAPdf {
            magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
        });
    }
    Ok(())
}

/// Read a local PDF, validating existence, permissions and PDF magic bytes.
pub async fn read_local(path: &Path) -> Result<Vec<u8>, ScanError> {
    let path = path.to_path_buf();

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ScanError::PermissionDenied { path });
        }
        Err(_) => return Err(ScanError::FileNotFound { path }),
    };

    check_pdf_magic(&bytes)?;
    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Per-request scratch directory.
///
/// Holds the saved upload and the assembled output. Dropping the workspace
/// deletes the directory and everything in it.
pub struct UploadWorkspace {
    dir: TempDir,
}

impl UploadWorkspace {
    /// Create a fresh, empty workspace under the system temp directory.
    pub fn new() -> Result<Self, ScanError> {
        let dir = tempfile::Builder::new()
            .prefix("edgescan-")
            .tempdir()
            .map_err(|e| ScanError::Internal(format!("Failed to create workspace: {e}")))?;
        debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Workspace root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Store the upload under its validated file name and return its path.
    pub async fn save_upload(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ScanError> {
        let path = self.dir.path().join(file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ScanError::Internal(format!("Failed to save upload: {e}")))?;
        Ok(path)
    }

    /// Where the assembled output is written.
    pub fn output_path(&self) -> PathBuf {
        self.dir.path().join(OUTPUT_FILE_NAME)
    }
}
