// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview annotation: outlines quadrilaterals on a copy of the scan.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use photosplit_core::Quad;
use photosplit_core::config::AnnotationStyle;
use tracing::debug;

/// Draws closed quad outlines onto preview images.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationRenderer {
    style: AnnotationStyle,
}

impl AnnotationRenderer {
    pub fn new(style: AnnotationStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &AnnotationStyle {
        &self.style
    }

    /// Copy `scan` to RGBA and outline every quad on it. The input is never
    /// modified; corners outside the image are clipped by the line drawer.
    pub fn render(&self, scan: &DynamicImage, quads: &[Quad]) -> DynamicImage {
        let mut canvas = scan.to_rgba8();
        for quad in quads {
            self.draw_quad(&mut canvas, quad);
        }
        debug!(quads = quads.len(), "Annotated preview rendered");
        DynamicImage::ImageRgba8(canvas)
    }

    /// Draw the four edges `p[i] -> p[(i + 1) % 4]` in place.
    pub fn draw_quad(&self, canvas: &mut RgbaImage, quad: &Quad) {
        let color = Rgba(self.style.color);
        let thickness = self.style.weight.pixels(canvas.width()) as i32;
        // Offsets centred on the edge: 0 for 1px, 0..=1 for 2px, -1..=1 for 3px.
        let first = -((thickness - 1) / 2);

        for (from, to) in quad.edges() {
            let (x0, y0) = (from.x as f32, from.y as f32);
            let (x1, y1) = (to.x as f32, to.y as f32);
            for offset in (first..first + thickness).map(|o| o as f32) {
                draw_line_segment_mut(canvas, (x0 + offset, y0), (x1 + offset, y1), color);
                draw_line_segment_mut(canvas, (x0, y0 + offset), (x1, y1 + offset), color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use photosplit_core::config::LineWeight;
    use photosplit_core::{Point, Rect};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn gray_scan() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(100, 80, Luma([200])))
    }

    #[test]
    fn outlines_every_edge() {
        let quad = Quad::from_rect(Rect::new(10, 10, 50, 40));
        let out = AnnotationRenderer::default().render(&gray_scan(), &[quad]).to_rgba8();

        assert_eq!(out.get_pixel(30, 10), &RED);
        assert_eq!(out.get_pixel(60, 30), &RED);
        assert_eq!(out.get_pixel(30, 50), &RED);
        assert_eq!(out.get_pixel(10, 30), &RED);
        // Interior untouched.
        assert_eq!(out.get_pixel(35, 30), &Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn output_is_rgba_and_input_is_untouched() {
        let scan = gray_scan();
        let quad = Quad::from_rect(Rect::new(0, 0, 20, 20));
        let out = AnnotationRenderer::default().render(&scan, &[quad]);
        assert!(matches!(out, DynamicImage::ImageRgba8(_)));
        assert_eq!(scan.to_luma8().get_pixel(0, 0), &Luma([200]));
    }

    #[test]
    fn no_quads_is_a_plain_copy() {
        let scan = gray_scan();
        let out = AnnotationRenderer::default().render(&scan, &[]);
        assert_eq!(out.to_rgba8(), scan.to_rgba8());
    }

    #[test]
    fn thickness_follows_line_weight() {
        let quad = Quad::from_rect(Rect::new(10, 40, 80, 30));
        let thin = AnnotationRenderer::new(AnnotationStyle {
            weight: LineWeight::Fixed(1),
            ..AnnotationStyle::default()
        });
        let thick = AnnotationRenderer::new(AnnotationStyle {
            weight: LineWeight::Fixed(5),
            ..AnnotationStyle::default()
        });

        let thin_out = thin.render(&gray_scan(), &[quad]).to_rgba8();
        let thick_out = thick.render(&gray_scan(), &[quad]).to_rgba8();
        // Top edge at y = 40; the 5px line covers 38..=42.
        assert_ne!(thin_out.get_pixel(50, 42), &RED);
        assert_eq!(thick_out.get_pixel(50, 38), &RED);
        assert_eq!(thick_out.get_pixel(50, 42), &RED);
        assert_ne!(thick_out.get_pixel(50, 44), &RED);
    }

    #[test]
    fn corners_outside_the_image_are_clipped() {
        let quad = Quad::new([
            Point::new(-20, -20),
            Point::new(50, -20),
            Point::new(50, 40),
            Point::new(-20, 40),
        ]);
        let out = AnnotationRenderer::default().render(&gray_scan(), &[quad]).to_rgba8();
        assert_eq!(out.dimensions(), (100, 80));
        assert_eq!(out.get_pixel(50, 20), &RED);
        assert_eq!(out.get_pixel(20, 40), &RED);
    }
}
