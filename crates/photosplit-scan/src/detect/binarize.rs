// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Foreground masks: reduce a scan to a single channel where photo content is
// 255 and scanner background is 0, using one of several strategies.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::close;
use photosplit_core::config::DetectionStrategy;
use tracing::{debug, instrument, warn};

const FOREGROUND: u8 = 255;
const BACKGROUND: u8 = 0;

/// Build the foreground mask for `scan` according to `strategy`, then close
/// gaps of up to `close_radius` pixels.
#[instrument(skip(scan), fields(width = scan.width(), height = scan.height()))]
pub fn foreground_mask(scan: &DynamicImage, strategy: DetectionStrategy, close_radius: u8) -> GrayImage {
    let mask = match strategy {
        DetectionStrategy::Saturation { cutoff } if scan.color().has_color() => {
            saturation_mask(scan, cutoff)
        }
        DetectionStrategy::Saturation { .. } => {
            warn!("Scan has no colour channels; falling back to Otsu threshold");
            otsu_mask(&scan.to_luma8(), 0.0)
        }
        DetectionStrategy::Otsu { blur_sigma } => otsu_mask(&scan.to_luma8(), blur_sigma),
        DetectionStrategy::Adaptive { block_radius, c } => {
            adaptive_mask(&scan.to_luma8(), block_radius, c)
        }
        DetectionStrategy::Canny {
            blur_sigma,
            low,
            high,
        } => edge_mask(&scan.to_luma8(), blur_sigma, low, high),
    };

    if close_radius == 0 {
        return mask;
    }
    close(&mask, Norm::LInf, close_radius)
}

/// HSV saturation, scaled to 0-255, thresholded at `cutoff`.
///
/// White, gray and black all have zero saturation, so a colourless scanner
/// lid drops out regardless of its brightness.
pub fn saturation_mask(scan: &DynamicImage, cutoff: u8) -> GrayImage {
    let rgb = scan.to_rgb8();
    let (width, height) = rgb.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let saturation = if max == 0 {
            0
        } else {
            (u32::from(max - min) * 255 / u32::from(max)) as u8
        };
        Luma([if saturation > cutoff { FOREGROUND } else { BACKGROUND }])
    })
}

/// Global Otsu threshold; pixels at or below it (the darker class) are
/// foreground.
pub fn otsu_mask(gray: &GrayImage, blur_sigma: f32) -> GrayImage {
    let source = if blur_sigma > 0.0 {
        gaussian_blur_f32(gray, blur_sigma)
    } else {
        gray.clone()
    };
    let threshold = otsu_threshold(&source);
    debug!(threshold, "Otsu threshold computed");

    let (width, height) = source.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let val = source.get_pixel(x, y).0[0];
        Luma([if val <= threshold { FOREGROUND } else { BACKGROUND }])
    })
}

/// Local-mean threshold: a pixel is foreground when it is darker than the
/// mean of its `(2r+1)^2` neighbourhood minus `c`.
///
/// Uniform photo interiors match their local mean, so mostly edges survive;
/// external contour tracing still recovers the outline.
pub fn adaptive_mask(gray: &GrayImage, block_radius: u32, c: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let integral = compute_integral_image(gray);

    GrayImage::from_fn(width, height, |x, y| {
        let local_mean = region_mean(&integral, width, height, x, y, block_radius);
        let threshold = (local_mean as i32 - c).clamp(0, 255) as u8;
        let pixel_val = gray.get_pixel(x, y).0[0];
        Luma([if pixel_val < threshold { FOREGROUND } else { BACKGROUND }])
    })
}

/// Gaussian blur followed by Canny edge detection.
pub fn edge_mask(gray: &GrayImage, blur_sigma: f32, low: f32, high: f32) -> GrayImage {
    let blurred = if blur_sigma > 0.0 {
        gaussian_blur_f32(gray, blur_sigma)
    } else {
        gray.clone()
    };
    canny(&blurred, low, high)
}

// -- Integral image helpers ---------------------------------------------------

/// Compute the integral (summed-area table) of a grayscale image.
///
/// `integral[y * (width+1) + x]` contains the sum of all pixel values in the
/// rectangle [0, 0) to (x, y) (exclusive on both axes). The table has
/// dimensions `(width+1) x (height+1)` with a zero-padded border.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean pixel value within the square of the given radius around (cx, cy),
/// clamped to the image.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = (cx.saturating_add(radius).saturating_add(1) as usize).min(img_width as usize);
    let y2 = (cy.saturating_add(radius).saturating_add(1) as usize).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    // S = I[y2][x2] - I[y1][x2] - I[y2][x1] + I[y1][x1]
    let sum = integral[y2 * stride + x2] as f64
        - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}

/// Compute the Otsu threshold for a grayscale image.
///
/// Returns the largest value of the darker class for the split that
/// maximises between-class variance.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total_pixels = gray.width() as u64 * gray.height() as u64;
    if total_pixels == 0 {
        return 128;
    }

    let sum_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut sum_background: f64 = 0.0;
    let mut weight_background: u64 = 0;
    let mut max_variance: f64 = 0.0;
    let mut best_threshold: u8 = 0;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total_pixels - weight_background;
        if weight_foreground == 0 {
            break;
        }

        sum_background += t as f64 * count as f64;
        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (sum_total - sum_background) / weight_foreground as f64;

        let between_variance = weight_background as f64
            * weight_foreground as f64
            * (mean_background - mean_foreground).powi(2);

        if between_variance > max_variance {
            max_variance = between_variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// White sheet with a red block at (10..30, 5..15).
    fn red_on_white() -> DynamicImage {
        let mut img = RgbImage::from_pixel(40, 20, Rgb([250, 250, 250]));
        for y in 5..15 {
            for x in 10..30 {
                img.put_pixel(x, y, Rgb([200, 30, 30]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    fn count_foreground(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p.0[0] == FOREGROUND).count()
    }

    #[test]
    fn saturation_separates_colour_from_white() {
        let mask = saturation_mask(&red_on_white(), 20);
        assert_eq!(count_foreground(&mask), 200);
        assert_eq!(mask.get_pixel(10, 5).0[0], FOREGROUND);
        assert_eq!(mask.get_pixel(9, 5).0[0], BACKGROUND);
    }

    #[test]
    fn saturation_ignores_gray_background() {
        // A dim, colourless lid is still background.
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([90, 90, 90])));
        assert_eq!(count_foreground(&saturation_mask(&img, 20)), 0);
    }

    #[test]
    fn otsu_marks_dark_class() {
        let mask = otsu_mask(&red_on_white().to_luma8(), 0.0);
        assert_eq!(count_foreground(&mask), 200);
    }

    #[test]
    fn otsu_threshold_splits_bimodal_histogram() {
        let mut gray = GrayImage::from_pixel(10, 10, Luma([200u8]));
        for x in 0..5 {
            for y in 0..10 {
                gray.put_pixel(x, y, Luma([40]));
            }
        }
        let t = otsu_threshold(&gray);
        assert!((40..200).contains(&t), "threshold {t}");
    }

    #[test]
    fn grayscale_scan_falls_back_from_saturation() {
        let gray = DynamicImage::ImageLuma8(red_on_white().to_luma8());
        let mask = foreground_mask(&gray, DetectionStrategy::Saturation { cutoff: 20 }, 0);
        assert_eq!(count_foreground(&mask), 200);
    }

    #[test]
    fn adaptive_mask_finds_block_edges() {
        let mask = adaptive_mask(&red_on_white().to_luma8(), 3, 10);
        // Dark pixels next to the light border fall below the local mean.
        assert_eq!(mask.get_pixel(10, 10).0[0], FOREGROUND);
        // Far from any edge nothing is marked.
        assert_eq!(mask.get_pixel(2, 2).0[0], BACKGROUND);
    }

    #[test]
    fn canny_mask_outlines_block() {
        let mask = edge_mask(&red_on_white().to_luma8(), 1.0, 20.0, 60.0);
        assert!(count_foreground(&mask) > 0);
        assert_eq!(mask.get_pixel(2, 2).0[0], BACKGROUND);
        assert_eq!(mask.get_pixel(20, 10).0[0], BACKGROUND);
    }

    #[test]
    fn closing_fills_small_gaps() {
        let mut img = red_on_white().to_rgb8();
        // A one-pixel white scratch across the block.
        for y in 5..15 {
            img.put_pixel(20, y, Rgb([250, 250, 250]));
        }
        let scan = DynamicImage::ImageRgb8(img);
        let strategy = DetectionStrategy::Saturation { cutoff: 20 };
        assert_eq!(foreground_mask(&scan, strategy, 0).get_pixel(20, 10).0[0], BACKGROUND);
        assert_eq!(foreground_mask(&scan, strategy, 1).get_pixel(20, 10).0[0], FOREGROUND);
    }

    #[test]
    fn region_mean_uniform_image() {
        let gray = GrayImage::from_pixel(6, 6, Luma([77u8]));
        let integral = compute_integral_image(&gray);
        let mean = region_mean(&integral, 6, 6, 0, 0, 2);
        assert!((mean - 77.0).abs() < 1e-9);
    }
}
