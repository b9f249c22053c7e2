//! Result types returned by the scan entry points.

use crate::pipeline::filter::FilterMethod;
use serde::{Deserialize, Serialize};

/// The assembled output document plus what it took to build it.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    /// Encoded output PDF.
    pub pdf: Vec<u8>,
    /// Timings and sizes.
    pub stats: ScanStats,
    /// Metadata of the input document.
    pub metadata: DocumentMetadata,
}

/// Per-run statistics, serialisable for the CLI's `--json` mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanStats {
    pub method: FilterMethod,
    pub total_pages: usize,
    /// `(width, height)` of each rendered page, in page order.
    pub page_sizes: Vec<(u32, u32)>,
    pub input_bytes: usize,
    pub output_bytes: usize,
    pub render_duration_ms: u64,
    pub filter_duration_ms: u64,
    pub encode_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Information about the input PDF, read without rendering any page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}
