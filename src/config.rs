//! Configuration types for PDF edge-scanning.
//!
//! Everything that shapes one scan lives in [`ScanConfig`], built via its
//! [`ScanConfigBuilder`]. The HTTP shell wraps a `ScanConfig` in a
//! [`ServerConfig`] and applies it to every request, letting each upload
//! override only the edge method.

use crate::error::ScanError;
use crate::pipeline::filter::FilterMethod;
use crate::progress::ProgressCallback;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration for a single PDF scan.
///
/// Built via [`ScanConfig::builder()`] or using [`ScanConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_edgescan::{FilterMethod, ScanConfig};
///
/// let config = ScanConfig::builder()
///     .method(FilterMethod::Sobel)
///     .dpi(150)
///     .build()
///     .unwrap();
/// assert_eq!(config.method, FilterMethod::Sobel);
/// ```
#[derive(Clone)]
pub struct ScanConfig {
    /// Edge-detection kernel. Default: [`FilterMethod::Laplacian`].
    pub method: FilterMethod,

    /// Rasterisation density for each PDF page. Range: 72–600. Default: 200.
    ///
    /// 200 DPI is the usual density for page-to-image conversion: thin strokes
    /// survive the 3×3 kernels without the page bitmaps growing unwieldy.
    pub dpi: u32,

    /// Cap on either rendered dimension in pixels. Default: 6000.
    ///
    /// An A0 poster at 200 DPI is roughly 6 600 × 9 400 px. This keeps one
    /// oversized page from exhausting memory; the other dimension scales
    /// proportionally.
    pub max_rendered_pixels: u32,

    /// Resolution the output PDF is written at. Default: 100.0.
    ///
    /// Every page uses the same setting, so a W×H pixel page becomes a
    /// (W/100)×(H/100) inch PDF page showing the image at native size.
    pub output_resolution_dpi: f32,

    /// Pages filtered at once on the blocking pool. Default: 1.
    ///
    /// Pages are independent, so raising this only changes wall-clock time:
    /// results are reassembled in page order either way.
    pub concurrency: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit pdfium shared library. If None, looks next to the executable,
    /// in the working directory, then on the system loader path.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            method: FilterMethod::default(),
            dpi: 200,
            max_rendered_pixels: 6000,
            output_resolution_dpi: 100.0,
            concurrency: 1,
            password: None,
            pdfium_lib_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanConfig")
            .field("method", &self.method)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("output_resolution_dpi", &self.output_resolution_dpi)
            .field("concurrency", &self.concurrency)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ScanProgressCallback>"),
            )
            .finish()
    }
}

impl ScanConfig {
    /// Create a new builder for `ScanConfig`.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder {
            config: Self::default(),
        }
    }

    /// Same configuration with a different edge method.
    pub fn with_method(&self, method: FilterMethod) -> Self {
        Self {
            method,
            ..self.clone()
        }
    }
}

/// Builder for [`ScanConfig`].
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl fmt::Debug for ScanConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ScanConfigBuilder {
    pub fn method(mut self, method: FilterMethod) -> Self {
        self.config.method = method;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn output_resolution_dpi(mut self, dpi: f32) -> Self {
        self.config.output_resolution_dpi = dpi;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScanConfig, ScanError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(ScanError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if !(c.output_resolution_dpi.is_finite() && c.output_resolution_dpi > 0.0) {
            return Err(ScanError::InvalidConfig(format!(
                "Output resolution must be a positive number, got {}",
                c.output_resolution_dpi
            )));
        }
        if c.concurrency == 0 {
            return Err(ScanError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

/// Configuration for the HTTP upload service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address. Default: `127.0.0.1:5000`.
    pub bind: SocketAddr,

    /// Largest accepted request body in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,

    /// Scan settings applied to every upload. The `edgemode` form field
    /// overrides `scan.method` per request.
    pub scan: ScanConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            max_upload_bytes: 50 * 1024 * 1024,
            scan: ScanConfig::default(),
        }
    }
}
