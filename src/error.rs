//! Error types for the pdf-edgescan library.
//!
//! A request either produces a complete output document or fails as a whole,
//! so there is a single fatal error type, [`ScanError`]. Its variants fall into
//! two classes that callers (most notably the HTTP shell in
//! [`crate::server`]) treat differently:
//!
//! * **Client errors**: the caller must fix the input. No file was sent,
//!   the filename is not a `.pdf`, or the document has no pages. See
//!   [`ScanError::is_client_error`].
//!
//! * **Processing errors**: decoding, filtering, encoding or I/O failed.
//!   These surface with the underlying message and are never retried.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf-edgescan library.
#[derive(Debug, Error)]
pub enum ScanError {
    // ── Upload validation ─────────────────────────────────────────────────
    /// The multipart request carried no `file` field.
    #[error("No file part")]
    NoFilePart,

    /// The uploaded filename is missing or lacks a `.pdf` extension.
    #[error("Please upload a PDF file")]
    NotAPdfUpload { filename: Option<String> },

    /// The request body could not be read as a multipart form.
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The bytes were read but do not start with the `%PDF` signature.
    #[error("Input is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    // ── Decode errors ─────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt: {detail}")]
    CorruptPdf { detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF is encrypted and requires a password")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF")]
    WrongPassword,

    /// The document decoded successfully but contains no pages.
    #[error("No pages found")]
    EmptyDocument,

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── Encode errors ─────────────────────────────────────────────────────
    /// The filtered pages could not be assembled into an output PDF.
    #[error("PDF assembly failed: {detail}")]
    EncodeFailed { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is loaded at runtime. You can:\n\
  • Place libpdfium next to the executable or in the working directory.\n\
  • Install it system-wide so the dynamic loader can find it.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (or pass --pdfium-lib).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScanError {
    /// `true` when the caller must fix the request; `false` for processing failures.
    ///
    /// An empty document counts as a client error: the upload was a PDF, but
    /// there is nothing in it to scan.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ScanError::NoFilePart
                | ScanError::NotAPdfUpload { .. }
                | ScanError::MalformedUpload(_)
                | ScanError::EmptyDocument
        )
    }

    /// `true` for failures that happened while turning bytes into page images.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            ScanError::NotAPdf { .. }
                | ScanError::CorruptPdf { .. }
                | ScanError::PasswordRequired
                | ScanError::WrongPassword
                | ScanError::RasterisationFailed { .. }
        )
    }
}
