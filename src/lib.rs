//! # pdf-edgescan
//!
//! Turn a PDF into an edge-detected "scanned document" PDF.
//!
//! Every page is rasterised, reduced to grayscale, run through a Laplacian or
//! Sobel edge filter, normalised to the full 0..=255 range and inverted, so
//! edges come out dark on a white page. The filtered pages are reassembled,
//! in their original order, into a new PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input   validate the upload (name, %PDF magic), scope temp storage
//!  ├─ 2. Render  rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Filter  grayscale → Laplacian | Sobel → min-max normalise → invert
//!  └─ 4. Encode  one page per filtered image, 100 DPI, via printpdf
//! ```
//!
//! The same pipeline is reachable three ways: the [`process`] family of
//! library calls, the `edgescan` CLI, and the HTTP shell in [`server`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_edgescan::{process_file, FilterMethod, ScanConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScanConfig::builder().method(FilterMethod::Sobel).build()?;
//!     let stats = process_file("document.pdf", "scanned_document.pdf", &config).await?;
//!     eprintln!("{} pages in {}ms", stats.total_pages, stats.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `edgescan` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf-edgescan = { version = "0.1", default-features = false }
//! ```
//!
//! ## PDFium
//!
//! Rendering binds a pdfium shared library at runtime. It is looked up in
//! [`ScanConfig::pdfium_lib_path`], then `PDFIUM_LIB_PATH`, then next to the
//! executable, then the working directory, then the system loader path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ScanConfig, ScanConfigBuilder, ServerConfig};
pub use error::ScanError;
pub use output::{DocumentMetadata, ScanOutput, ScanStats};
pub use pipeline::encode::encode_pdf;
pub use pipeline::filter::{edge_filter, FilterMethod};
pub use pipeline::render::decode_pdf;
pub use process::{inspect, process, process_file, process_sync};
pub use progress::{NoopProgressCallback, ProgressCallback, ScanProgressCallback};
pub use server::{router, serve};

#[cfg(test)]
mod tests {
    #[test]
    fn package_description_is_plain_text() {
        let description = env!("CARGO_PKG_DESCRIPTION");
        assert!(!description.is_empty());
        assert!(!description.contains('\u{2014}'), "{description}");
    }
}
