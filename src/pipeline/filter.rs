//! Edge filtering: page image → inverted edge map ("scanned" look).
//!
//! Every page goes through the same four steps:
//!
//! ```text
//! RGB(A) page ──▶ luma ──▶ kernel response ──▶ min-max to 0..=255 ──▶ 255 - n
//! ```
//!
//! The two methods deliberately differ in the numeric type of their response
//! map. The Laplacian response is saturated into 8 bits before normalisation
//! (strong negative second derivatives collapse to 0) and its normalised
//! values are rounded. The Sobel magnitude stays in `f64` until normalisation
//! and is truncated on the final cast. The outputs therefore differ in
//! effective contrast; both behaviours are kept as they are and pinned by
//! tests below.
//!
//! A uniform page has `max == min`. Normalisation then uses a scale of zero,
//! every normalised value is 0 and the inverted page is plain white.
//!
//! Luma uses the ITU-R 601-2 weights in 16-bit fixed point, and both kernels
//! see the page mirrored around its edge pixel (reflect-101: `gfedcb|abcdefgh|gfedcba`),
//! so border responses come from real neighbours rather than repeated ones.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::laplacian_filter;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Edge-detection kernel applied to each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMethod {
    /// 3×3 four-neighbour Laplacian, 8-bit saturated response. (default)
    #[default]
    Laplacian,
    /// 3×3 Sobel gradient magnitude `sqrt(gx² + gy²)` in `f64`.
    Sobel,
}

impl FilterMethod {
    /// Lenient parse used for form fields: case-insensitive, and anything
    /// that is not `sobel` (empty, misspelt, unknown) selects the default.
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMethod::Laplacian => "laplacian",
            FilterMethod::Sobel => "sobel",
        }
    }
}

impl fmt::Display for FilterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by the strict [`FromStr`] parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown edge method '{0}' (expected 'laplacian' or 'sobel')")]
pub struct UnknownFilterMethod(pub String);

impl FromStr for FilterMethod {
    type Err = UnknownFilterMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "laplacian" => Ok(FilterMethod::Laplacian),
            "sobel" => Ok(FilterMethod::Sobel),
            _ => Err(UnknownFilterMethod(s.to_string())),
        }
    }
}

/// How normalised `f64` values become bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteCast {
    /// Round half to even, as an 8-bit normalisation does.
    Round,
    /// Drop the fraction, as a float-to-u8 cast does.
    Truncate,
}

/// Per-pixel kernel response, row-major.
struct ResponseMap {
    width: u32,
    height: u32,
    values: Vec<f64>,
    cast: ByteCast,
}

impl ResponseMap {
    /// Min-max normalise to `0..=255`, then invert so edges are dark on white.
    fn normalize_inverted(self) -> GrayImage {
        let (min, max) = self
            .values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        let range = max - min;
        let scale = if range > f64::EPSILON { 255.0 / range } else { 0.0 };

        let cast = self.cast;
        let pixels: Vec<u8> = self
            .values
            .iter()
            .map(|&v| {
                let n = (v - min) * scale;
                let byte = match cast {
                    ByteCast::Round => n.round_ties_even().clamp(0.0, 255.0) as u8,
                    ByteCast::Truncate => n as u8,
                };
                255 - byte
            })
            .collect();

        // Length is width * height by construction.
        GrayImage::from_raw(self.width, self.height, pixels)
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }
}

/// Apply the edge filter to one page image.
///
/// Pure and deterministic: the same image and method always give the same
/// bytes. The result is single-channel 8-bit with the input's dimensions.
pub fn edge_filter(image: &DynamicImage, method: FilterMethod) -> GrayImage {
    let gray = luma_601(image);
    let response = match method {
        FilterMethod::Laplacian => laplacian_response(&gray),
        FilterMethod::Sobel => sobel_response(&gray),
    };
    let out = response.normalize_inverted();
    debug!(
        "Filtered {}x{} page with {}",
        out.width(),
        out.height(),
        method
    );
    out
}

/// `L = (299 R + 587 G + 114 B) / 1000`, as 16-bit fixed point rounded half up.
fn luma_601(image: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = image {
        return gray.clone();
    }
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let l = (u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16;
        Luma([l as u8])
    })
}

/// Mirror index `i` into `0..n` without repeating the edge sample.
fn reflect_101(i: i64, n: u32) -> u32 {
    let n = i64::from(n);
    if n == 1 {
        return 0;
    }
    let mut i = i;
    if i < 0 {
        i = -i;
    }
    if i >= n {
        i = 2 * n - 2 - i;
    }
    i.clamp(0, n - 1) as u32
}

/// Grow `gray` by one reflect-101 pixel on every side.
///
/// imageproc's 3×3 kernels clamp at the border; on the padded image the
/// interior only ever reads real samples, so cropping the padding back off
/// leaves reflect-101 border behaviour.
fn pad_reflect_101(gray: &GrayImage) -> GrayImage {
    let (w, h) = gray.dimensions();
    GrayImage::from_fn(w + 2, h + 2, |x, y| {
        let sx = reflect_101(i64::from(x) - 1, w);
        let sy = reflect_101(i64::from(y) - 1, h);
        *gray.get_pixel(sx, sy)
    })
}

/// Row-major interior of a padded response, as `f64`.
fn crop_padding<T: Copy>(
    width: u32,
    height: u32,
    padded_width: u32,
    raw: &[T],
    to_f64: impl Fn(T) -> f64,
) -> Vec<f64> {
    let mut values = Vec::with_capacity((width * height) as usize);
    for y in 1..=height {
        let row = (y * padded_width) as usize;
        for x in 1..=width {
            values.push(to_f64(raw[row + x as usize]));
        }
    }
    values
}

/// Kernel `[0 -1 0; -1 4 -1; 0 -1 0]`, saturated into `0..=255`.
///
/// imageproc's Laplacian uses the negated kernel, so its response is negated
/// back before saturating.
fn laplacian_response(gray: &GrayImage) -> ResponseMap {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return ResponseMap {
            width,
            height,
            values: Vec::new(),
            cast: ByteCast::Round,
        };
    }
    let padded = pad_reflect_101(gray);
    let lap = laplacian_filter(&padded);
    let values = crop_padding(width, height, padded.width(), lap.as_raw().as_slice(), |v: i16| {
        f64::from((-i32::from(v)).clamp(0, 255))
    });
    ResponseMap {
        width,
        height,
        values,
        cast: ByteCast::Round,
    }
}

fn sobel_response(gray: &GrayImage) -> ResponseMap {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return ResponseMap {
            width,
            height,
            values: Vec::new(),
            cast: ByteCast::Truncate,
        };
    }
    let padded = pad_reflect_101(gray);
    let gx = horizontal_sobel(&padded);
    let gy = vertical_sobel(&padded);
    let magnitude: Vec<f64> = gx
        .as_raw()
        .iter()
        .zip(gy.as_raw().iter())
        .map(|(&x, &y)| {
            let x = f64::from(x);
            let y = f64::from(y);
            (x * x + y * y).sqrt()
        })
        .collect();
    let values = crop_padding(width, height, padded.width(), magnitude.as_slice(), |v| v);
    ResponseMap {
        width,
        height,
        values,
        cast: ByteCast::Truncate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    fn gray(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| Luma([f(x, y)])))
    }

    /// Black square on a white page.
    fn square_page() -> DynamicImage {
        let img = RgbImage::from_fn(40, 30, |x, y| {
            if (10..30).contains(&x) && (8..22).contains(&y) {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("SOBEL".parse::<FilterMethod>(), Ok(FilterMethod::Sobel));
        assert_eq!(" Laplacian ".parse::<FilterMethod>(), Ok(FilterMethod::Laplacian));
        assert!("canny".parse::<FilterMethod>().is_err());
    }

    #[test]
    fn unknown_method_falls_back_to_laplacian() {
        assert_eq!(FilterMethod::parse_or_default("foo"), FilterMethod::Laplacian);
        assert_eq!(FilterMethod::parse_or_default(""), FilterMethod::Laplacian);
        assert_eq!(FilterMethod::parse_or_default("Sobel"), FilterMethod::Sobel);
        assert_eq!(FilterMethod::default(), FilterMethod::Laplacian);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for m in [FilterMethod::Laplacian, FilterMethod::Sobel] {
            assert_eq!(m.to_string().parse::<FilterMethod>(), Ok(m));
        }
    }

    #[test]
    fn output_keeps_dimensions_and_is_single_channel() {
        let page = square_page();
        for m in [FilterMethod::Laplacian, FilterMethod::Sobel] {
            let out = edge_filter(&page, m);
            assert_eq!(out.dimensions(), (40, 30));
            assert_eq!(out.as_raw().len(), 40 * 30);
        }
    }

    #[test]
    fn uniform_page_becomes_white() {
        let page = gray(8, 6, |_, _| 137);
        for m in [FilterMethod::Laplacian, FilterMethod::Sobel] {
            let out = edge_filter(&page, m);
            assert!(out.pixels().all(|p| p.0[0] == 255), "{m}: expected all white");
        }
    }

    #[test]
    fn laplacian_marks_bright_point() {
        // Centre responds 4*100 = 400 → saturates to 255; its neighbours
        // respond -100 → saturate to 0.
        let page = gray(5, 5, |x, y| if (x, y) == (2, 2) { 100 } else { 0 });
        let out = edge_filter(&page, FilterMethod::Laplacian);
        assert_eq!(out.get_pixel(2, 2).0[0], 0);
        assert_eq!(out.get_pixel(1, 2).0[0], 255);
        assert_eq!(out.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn laplacian_saturates_negative_response() {
        // A dark hole in a bright field: the hole's own response is -800 and
        // clips to 0, so only the four neighbours (+200) show up as edges.
        let page = gray(5, 5, |x, y| if (x, y) == (2, 2) { 0 } else { 200 });
        let out = edge_filter(&page, FilterMethod::Laplacian);
        assert_eq!(out.get_pixel(2, 2).0[0], 255);
        for (x, y) in [(1, 2), (3, 2), (2, 1), (2, 3)] {
            assert_eq!(out.get_pixel(x, y).0[0], 0, "neighbour ({x},{y})");
        }
        assert_eq!(out.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn sobel_marks_vertical_step() {
        let page = gray(6, 4, |x, _| if x < 3 { 0 } else { 255 });
        let out = edge_filter(&page, FilterMethod::Sobel);
        for y in 0..4 {
            assert_eq!(out.get_pixel(2, y).0[0], 0);
            assert_eq!(out.get_pixel(3, y).0[0], 0);
            assert_eq!(out.get_pixel(0, y).0[0], 255);
            assert_eq!(out.get_pixel(5, y).0[0], 255);
        }
    }

    #[test]
    fn sobel_edges_concentrate_on_square_boundary() {
        let out = edge_filter(&square_page(), FilterMethod::Sobel);
        // Far from the square: background stays white.
        assert_eq!(out.get_pixel(2, 2).0[0], 255);
        // Deep inside the square: no gradient either.
        assert_eq!(out.get_pixel(20, 15).0[0], 255);
        // On the left boundary: dark edge.
        assert!(out.get_pixel(10, 15).0[0] < 128);
    }

    #[test]
    fn filter_is_deterministic() {
        let page = square_page();
        for m in [FilterMethod::Laplacian, FilterMethod::Sobel] {
            assert_eq!(edge_filter(&page, m), edge_filter(&page, m));
        }
    }

    #[test]
    fn filter_is_not_a_fixed_point() {
        let page = square_page();
        let once = edge_filter(&page, FilterMethod::Sobel);
        let twice = edge_filter(&DynamicImage::ImageLuma8(once.clone()), FilterMethod::Sobel);
        assert_ne!(once, twice);
    }

    #[test]
    fn rounding_differs_between_methods() {
        // min 0, max 510 → scale 0.5; value 3 normalises to exactly 1.5.
        let map = |cast| ResponseMap {
            width: 3,
            height: 1,
            values: vec![0.0, 3.0, 510.0],
            cast,
        };
        let rounded = map(ByteCast::Round).normalize_inverted();
        let truncated = map(ByteCast::Truncate).normalize_inverted();
        assert_eq!(rounded.as_raw(), &vec![255u8, 253, 0]);
        assert_eq!(truncated.as_raw(), &vec![255u8, 254, 0]);
    }

    #[test]
    fn luma_uses_601_weights() {
        let img = RgbImage::from_fn(4, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            2 => Rgb([0, 0, 255]),
            _ => Rgb([200, 200, 200]),
        });
        let l = luma_601(&DynamicImage::ImageRgb8(img));
        assert_eq!(l.as_raw(), &vec![76u8, 150, 29, 200]);
    }

    #[test]
    fn luma_passes_gray_through() {
        let page = gray(3, 1, |x, _| (x * 100) as u8);
        assert_eq!(luma_601(&page).as_raw(), &vec![0u8, 100, 200]);
    }

    #[test]
    fn reflect_101_mirrors_without_edge_repeat() {
        assert_eq!(reflect_101(-1, 4), 1);
        assert_eq!(reflect_101(0, 4), 0);
        assert_eq!(reflect_101(4, 4), 2);
        assert_eq!(reflect_101(-1, 1), 0);
        assert_eq!(reflect_101(1, 1), 0);
    }

    #[test]
    fn laplacian_border_sees_mirrored_neighbours() {
        // Column 0 is 100, the rest 0. At x = 0 the left neighbour mirrors
        // to x = 1, so the response is 4*100 - (0 + 0 + 100 + 100) = 200.
        let page = GrayImage::from_fn(4, 3, |x, _| Luma([if x == 0 { 100 } else { 0 }]));
        let map = laplacian_response(&page);
        assert_eq!(&map.values[0..4], &[200.0, 0.0, 0.0, 0.0]);
        assert_eq!(map.values.len(), 12);
    }

    #[test]
    fn sobel_border_of_ramp_is_flat() {
        let page = GrayImage::from_fn(4, 3, |x, _| Luma([(x * 10) as u8]));
        let map = sobel_response(&page);
        for row in map.values.chunks(4) {
            assert_eq!(row, &[0.0, 80.0, 80.0, 0.0]);
        }
    }

    #[test]
    fn single_pixel_page_is_white() {
        let page = gray(1, 1, |_, _| 42);
        for m in [FilterMethod::Laplacian, FilterMethod::Sobel] {
            assert_eq!(edge_filter(&page, m).as_raw(), &vec![255u8]);
        }
    }

    #[test]
    fn methods_disagree_on_same_page() {
        let page = square_page();
        assert_ne!(
            edge_filter(&page, FilterMethod::Laplacian),
            edge_filter(&page, FilterMethod::Sobel)
        );
    }
}
