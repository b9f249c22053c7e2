//! Pipeline stages for PDF edge-scanning.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the rendering or assembly backend can change without
//! touching the filter.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ filter ──▶ encode
//! (upload)  (pdfium)   (kernels)  (printpdf)
//! ```
//!
//! 1. [`input`] : validate the upload and scope its temporary storage
//! 2. [`render`]: rasterise every page; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`filter`]: Laplacian or Sobel edge map, normalised and inverted
//! 4. [`encode`]: reassemble the filtered pages, in order, into one PDF

pub mod encode;
pub mod filter;
pub mod input;
pub mod render;
