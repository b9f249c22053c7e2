//! PDF rasterisation: decode PDF bytes into one `DynamicImage` per page.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, so the HTTP workers keep serving
//! while a large document renders.
//!
//! ## Density and cap
//!
//! Pages render at `config.dpi` (PDF user space is 72 units per inch, so the
//! scale factor is `dpi / 72`). `max_rendered_pixels` additionally caps both
//! dimensions, keeping memory bounded for poster-sized pages.
//!
//! ## One library instance
//!
//! pdfium's global state is initialised when a `Pdfium` is created and torn
//! down when it is dropped. Every caller therefore shares the single instance
//! returned by [`shared_pdfium`]; concurrent requests never drop it.

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::output::DocumentMetadata;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing::{debug, info};

/// Environment variable naming an explicit pdfium shared library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

static PDFIUM: OnceLock<Pdfium> = OnceLock::new();
static BIND_LOCK: Mutex<()> = Mutex::new(());

/// Rasterise every page of a PDF, in page order.
///
/// Returns an empty vector for a document without pages; deciding what that
/// means is up to the caller.
pub async fn decode_pdf(
    bytes: &[u8],
    config: &ScanConfig,
) -> Result<Vec<DynamicImage>, ScanError> {
    decode_document(bytes, config).await.map(|(_, pages)| pages)
}

/// Load the document once and return its metadata together with every
/// rendered page.
pub async fn decode_document(
    bytes: &[u8],
    config: &ScanConfig,
) -> Result<(DocumentMetadata, Vec<DynamicImage>), ScanError> {
    let bytes = bytes.to_vec();
    let scale = config.dpi as f32 / 72.0;
    let max_pixels = config.max_rendered_pixels;
    let password = config.password.clone();
    let lib_path = config.pdfium_lib_path.clone();

    tokio::task::spawn_blocking(move || {
        let pdfium = shared_pdfium(lib_path.as_deref())?;
        let document = load_document(pdfium, &bytes, password.as_deref())?;
        let metadata = read_metadata(&document);
        let pages = render_pages(&document, scale, max_pixels)?;
        Ok((metadata, pages))
    })
    .await
    .map_err(|e| ScanError::Internal(format!("Render task panicked: {}", e)))?
}

fn render_pages(
    document: &PdfDocument<'_>,
    scale: f32,
    max_pixels: u32,
) -> Result<Vec<DynamicImage>, ScanError> {
    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(scale)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut images = Vec::with_capacity(total_pages);

    for (idx, page) in pages.iter().enumerate() {
        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            ScanError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        images.push(image);
    }

    Ok(images)
}

/// Read document metadata without rendering pages.
pub async fn extract_metadata(
    bytes: &[u8],
    config: &ScanConfig,
) -> Result<DocumentMetadata, ScanError> {
    let bytes = bytes.to_vec();
    let password = config.password.clone();
    let lib_path = config.pdfium_lib_path.clone();

    tokio::task::spawn_blocking(move || {
        let pdfium = shared_pdfium(lib_path.as_deref())?;
        let document = load_document(pdfium, &bytes, password.as_deref())?;
        Ok(read_metadata(&document))
    })
    .await
    .map_err(|e| ScanError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn read_metadata(document: &PdfDocument<'_>) -> DocumentMetadata {
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    }
}

fn load_document<'a>(
    pdfium: &'a Pdfium,
    bytes: &'a [u8],
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, ScanError> {
    pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    ScanError::WrongPassword
                } else {
                    ScanError::PasswordRequired
                }
            } else {
                ScanError::CorruptPdf { detail: err_str }
            }
        })
}

/// The process-wide pdfium instance, bound on first use.
///
/// `Pdfium::new` initialises the library and dropping a `Pdfium` destroys
/// it for the whole process, so exactly one instance is ever created and it
/// lives until exit. Only the first call's `explicit` path takes effect.
pub fn shared_pdfium(explicit: Option<&Path>) -> Result<&'static Pdfium, ScanError> {
    if let Some(pdfium) = PDFIUM.get() {
        return Ok(pdfium);
    }

    let _guard = BIND_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(pdfium) = PDFIUM.get() {
        return Ok(pdfium);
    }
    let pdfium = bind_pdfium(explicit)?;
    info!("pdfium bound");
    Ok(PDFIUM.get_or_init(|| pdfium))
}

/// Bind to a pdfium library.
///
/// Search order: the explicit path, `$PDFIUM_LIB_PATH`, the executable's
/// directory, the working directory, then the system loader path.
fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, ScanError> {
    if let Some(path) = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from))
    {
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            ScanError::PdfiumBindingFailed(format!("{}: {:?}", path.display(), e))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(Pdfium::pdfium_platform_library_name_at_path(&dir));
    }
    candidates.push(Pdfium::pdfium_platform_library_name_at_path("./"));

    for candidate in &candidates {
        if let Ok(bindings) = Pdfium::bind_to_library(candidate) {
            debug!("Bound pdfium from {}", candidate.display());
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library()
        .map_err(|e| ScanError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_pdfium_is_one_instance_across_threads() {
        // Needs a pdfium library; nothing to check on hosts without one.
        let Ok(first) = shared_pdfium(None) else {
            return;
        };
        let addrs: Vec<usize> = (0..4)
            .map(|_| std::thread::spawn(|| shared_pdfium(None).map(|p| p as *const Pdfium as usize)))
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        for addr in addrs {
            assert_eq!(addr, first as *const Pdfium as usize);
        }
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        // Without a library this fails at binding; with one, at parsing.
        let err = tokio_test::block_on(decode_pdf(b"not a pdf", &ScanConfig::default()))
            .unwrap_err();
        assert!(
            matches!(err, ScanError::PdfiumBindingFailed(_) | ScanError::CorruptPdf { .. }),
            "got: {err:?}"
        );
    }
}
