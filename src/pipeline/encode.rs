//! PDF assembly: filtered page images → one output PDF.
//!
//! printpdf 0.8 builds documents from `PdfPage` values holding `Vec<Op>`
//! operation lists. Each filtered page is added as an 8-bit grayscale image
//! XObject and drawn once, unscaled, on a page sized to fit it exactly at the
//! configured resolution.

use crate::error::ScanError;
use image::GrayImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, warn};

/// Title written into the output's document information dictionary.
pub const OUTPUT_TITLE: &str = "Scanned Document";

/// Page edge length in millimetres for `pixels` at `dpi`.
fn pixels_to_mm(pixels: u32, dpi: f32) -> Mm {
    Mm(pixels as f32 / dpi * 25.4)
}

/// Encode filtered pages, in order, into a single PDF.
///
/// Every page shares the first page's resolution setting (`resolution_dpi`);
/// page sizes follow each image's own pixel dimensions.
pub fn encode_pdf(pages: &[GrayImage], resolution_dpi: f32) -> Result<Vec<u8>, ScanError> {
    if pages.is_empty() {
        return Err(ScanError::EmptyDocument);
    }
    if !(resolution_dpi.is_finite() && resolution_dpi > 0.0) {
        return Err(ScanError::EncodeFailed {
            detail: format!("invalid output resolution {resolution_dpi}"),
        });
    }

    let mut doc = PdfDocument::new(OUTPUT_TITLE);
    let mut pdf_pages: Vec<PdfPage> = Vec::with_capacity(pages.len());

    for (idx, page) in pages.iter().enumerate() {
        let (width, height) = page.dimensions();
        if width == 0 || height == 0 {
            return Err(ScanError::EncodeFailed {
                detail: format!("page {} has an empty bitmap", idx + 1),
            });
        }

        let raw = RawImage {
            pixels: RawImageData::U8(page.as_raw().clone()),
            width: width as usize,
            height: height as usize,
            data_format: RawImageFormat::R8,
            tag: Vec::new(),
        };
        let xobject_id = doc.add_image(&raw);

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                dpi: Some(resolution_dpi),
                rotate: None,
            },
        }];

        pdf_pages.push(PdfPage::new(
            pixels_to_mm(width, resolution_dpi),
            pixels_to_mm(height, resolution_dpi),
            ops,
        ));
        debug!("Placed page {} ({}x{} px)", idx + 1, width, height);
    }

    doc.with_pages(pdf_pages);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        warn!("printpdf reported {} warnings while saving", warnings.len());
    }

    Ok(output)
}
