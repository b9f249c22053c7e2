//! Page processing entry points: decode → filter every page → encode.
//!
//! A scan is all-or-nothing. The first failure in any stage aborts the whole
//! document and no partial PDF is ever returned or written.
//!
//! Pages are independent, so filtering fans out over the blocking pool with
//! up to `config.concurrency` pages in flight. The stream is *buffered in
//! order*: results come back in page order no matter which page finishes
//! first, so the output is identical for every concurrency setting.

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::output::{DocumentMetadata, ScanOutput, ScanStats};
use crate::pipeline::{encode, filter, input, render};
use futures::stream::{self, StreamExt};
use image::{DynamicImage, GrayImage};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Scan an in-memory PDF and return the assembled output PDF.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// - [`ScanError::NotAPdf`] when the bytes lack the `%PDF` signature
/// - decode errors from pdfium (corrupt file, password, rasterisation)
/// - [`ScanError::EmptyDocument`] when the document has no pages
/// - [`ScanError::EncodeFailed`] / [`ScanError::Internal`] for anything later
pub async fn process(pdf_bytes: &[u8], config: &ScanConfig) -> Result<ScanOutput, ScanError> {
    let total_start = Instant::now();
    info!(
        "Starting scan: {} bytes, method={}",
        pdf_bytes.len(),
        config.method
    );

    // ── Step 1: Validate ─────────────────────────────────────────────────
    input::check_pdf_magic(pdf_bytes)?;

    // ── Step 2: Load once, read metadata, rasterise pages ────────────────
    let render_start = Instant::now();
    let (metadata, rendered) = render::decode_document(pdf_bytes, config).await?;
    debug!("PDF reports {} pages", metadata.page_count);
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    if rendered.is_empty() {
        return Err(ScanError::EmptyDocument);
    }
    info!(
        "Rendered {} pages in {}ms",
        rendered.len(),
        render_duration_ms
    );

    let total_pages = rendered.len();
    let page_sizes: Vec<(u32, u32)> = rendered.iter().map(|p| (p.width(), p.height())).collect();

    if let Some(ref cb) = config.progress_callback {
        cb.on_scan_start(total_pages);
    }

    // ── Step 3: Filter pages ─────────────────────────────────────────────
    let filter_start = Instant::now();
    let filtered = filter_pages(rendered, config).await?;
    let filter_duration_ms = filter_start.elapsed().as_millis() as u64;

    // ── Step 4: Assemble output PDF ──────────────────────────────────────
    let encode_start = Instant::now();
    let resolution = config.output_resolution_dpi;
    let pdf = tokio::task::spawn_blocking(move || encode::encode_pdf(&filtered, resolution))
        .await
        .map_err(|e| ScanError::Internal(format!("Encode task panicked: {}", e)))??;
    let encode_duration_ms = encode_start.elapsed().as_millis() as u64;

    let stats = ScanStats {
        method: config.method,
        total_pages,
        page_sizes,
        input_bytes: pdf_bytes.len(),
        output_bytes: pdf.len(),
        render_duration_ms,
        filter_duration_ms,
        encode_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Scan complete: {} pages, {} bytes, {}ms total",
        total_pages, stats.output_bytes, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_scan_complete(total_pages, pdf.len());
    }

    Ok(ScanOutput {
        pdf,
        stats,
        metadata,
    })
}

/// Scan a local PDF and write the output PDF to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn process_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ScanConfig,
) -> Result<ScanStats, ScanError> {
    let bytes = input::read_local(input_path.as_ref()).await?;
    let output = process(&bytes, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ScanError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &output.pdf)
        .await
        .map_err(|e| ScanError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ScanError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

/// Synchronous wrapper around [`process`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_sync(pdf_bytes: &[u8], config: &ScanConfig) -> Result<ScanOutput, ScanError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ScanError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process(pdf_bytes, config))
}

/// Read PDF metadata without filtering anything.
pub async fn inspect(
    input_path: impl AsRef<Path>,
    config: &ScanConfig,
) -> Result<DocumentMetadata, ScanError> {
    let bytes = input::read_local(input_path.as_ref()).await?;
    render::extract_metadata(&bytes, config).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Filter every page on the blocking pool, returning results in page order.
async fn filter_pages(
    pages: Vec<DynamicImage>,
    config: &ScanConfig,
) -> Result<Vec<GrayImage>, ScanError> {
    let total_pages = pages.len();
    let method = config.method;

    let results: Vec<Result<GrayImage, ScanError>> =
        stream::iter(pages.into_iter().enumerate().map(|(idx, page)| {
            let cb = config.progress_callback.clone();
            async move {
                let page_num = idx + 1;
                if let Some(ref cb) = cb {
                    cb.on_page_start(page_num, total_pages);
                }
                let filtered =
                    tokio::task::spawn_blocking(move || filter::edge_filter(&page, method))
                        .await
                        .map_err(|e| {
                            ScanError::Internal(format!(
                                "Filter task for page {} panicked: {}",
                                page_num, e
                            ))
                        })?;
                if let Some(ref cb) = cb {
                    cb.on_page_complete(page_num, total_pages);
                }
                Ok(filtered)
            }
        }))
        .buffered(config.concurrency.max(1))
        .collect()
        .await;

    results.into_iter().collect()
}
