// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectification: turns the final quadrilaterals into upright, individually
// cropped photos.

use image::DynamicImage;
use photosplit_core::config::RectifyConfig;
use photosplit_core::error::{PhotosplitError, Result};
use photosplit_core::{Point, Quad, effective_rotation};
use tracing::{debug, info, instrument};

use crate::geometry::{min_area_rect, most_negative_coordinate};
use crate::image::processor::{ImageProcessor, is_empty};

/// Crops and de-rotates photos out of a scan.
///
/// Two independent rotations are composed, scan rotation first: one for the
/// whole sheet (kept on the original canvas) and one per photo (canvas grows
/// so nothing is clipped). All angles are clockwise degrees.
#[derive(Debug, Clone, Default)]
pub struct Rectifier {
    config: RectifyConfig,
}

impl Rectifier {
    pub fn new(config: RectifyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RectifyConfig {
        &self.config
    }

    /// Produce one image per quad, in quad order.
    ///
    /// `rotations[i]` applies to `quads[i]`; a value equal to `sentinel`
    /// means no rotation. Quads may reach outside the scan: the scan is
    /// padded with white by the most negative coordinate (or
    /// `min_padding` when none is negative) before cropping, so such regions
    /// come back white rather than clipped.
    ///
    /// # Errors
    ///
    /// [`PhotosplitError::RotationCountMismatch`] when the two slices differ in
    /// length. [`PhotosplitError::CoordinateOutOfRange`] or
    /// [`PhotosplitError::CanvasTooLarge`] when a quad reaches so far out that
    /// the padded sheet cannot be addressed. Nothing is produced in any of
    /// these cases.
    #[instrument(skip(self, scan, quads, rotations), fields(quads = quads.len()))]
    pub fn rectify(
        &self,
        scan: &DynamicImage,
        scan_rotation: f64,
        quads: &[Quad],
        rotations: &[f64],
        sentinel: f64,
    ) -> Result<Vec<DynamicImage>> {
        if quads.len() != rotations.len() {
            return Err(PhotosplitError::RotationCountMismatch {
                quads: quads.len(),
                rotations: rotations.len(),
            });
        }
        if quads.is_empty() || is_empty(scan) {
            debug!("Nothing to rectify");
            return Ok(Vec::new());
        }

        let shift = match most_negative_coordinate(quads) {
            Some(most_negative) => most_negative.checked_neg().ok_or(
                PhotosplitError::CoordinateOutOfRange {
                    value: i64::from(most_negative),
                },
            )?,
            None => i32::try_from(self.config.min_padding).map_err(|_| {
                PhotosplitError::InvalidConfig(format!(
                    "min_padding {} is too large",
                    self.config.min_padding
                ))
            })?,
        };
        debug!(shift, scan_rotation, "Preparing sheet");

        let shifted = quads
            .iter()
            .map(|quad| quad.checked_translate(shift, shift))
            .collect::<Result<Vec<_>>>()?;
        let sheet = ImageProcessor::from_dynamic(scan.clone())
            .rotate_within_canvas(scan_rotation)
            .pad(shift.unsigned_abs())?;

        let mut photos = Vec::with_capacity(quads.len());
        for (index, (shifted, &rotation)) in shifted.iter().zip(rotations).enumerate() {
            let Some(rect) = min_area_rect(shifted.points()) else {
                continue;
            };
            let bounds = rect.bounding_rect();
            let angle = effective_rotation(rotation, sentinel);
            debug!(
                index,
                x = bounds.x,
                y = bounds.y,
                width = bounds.width,
                height = bounds.height,
                angle,
                "Cropping photo"
            );
            photos.push(sheet.region(bounds).rotate(angle).into_dynamic());
        }

        info!(photos = photos.len(), "Rectification complete");
        Ok(photos)
    }

    /// [`rectify`](Self::rectify) for raw point lists, as received from an
    /// editing front end.
    ///
    /// # Errors
    ///
    /// [`PhotosplitError::QuadArity`] if any list is not exactly four points,
    /// plus everything `rectify` reports.
    pub fn rectify_points(
        &self,
        scan: &DynamicImage,
        scan_rotation: f64,
        quads: &[Vec<Point>],
        rotations: &[f64],
        sentinel: f64,
    ) -> Result<Vec<DynamicImage>> {
        let quads = quads
            .iter()
            .map(|points| Quad::try_from(points.as_slice()))
            .collect::<Result<Vec<_>>>()?;
        self.rectify(scan, scan_rotation, &quads, rotations, sentinel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};
    use photosplit_core::{NO_ROTATION, Rect};

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const RED: Rgb<u8> = Rgb([220, 20, 20]);
    const GREEN: Rgb<u8> = Rgb([0, 200, 0]);

    /// 1000x800 white sheet with a red photo at (100,100)-(400,300) whose
    /// top-left pixel is green.
    fn sheet() -> DynamicImage {
        let mut img = RgbImage::from_pixel(1000, 800, WHITE);
        for y in 100..300 {
            for x in 100..400 {
                img.put_pixel(x, y, RED);
            }
        }
        img.put_pixel(100, 100, GREEN);
        DynamicImage::ImageRgb8(img)
    }

    fn photo_quad() -> Quad {
        Quad::from_rect(Rect::new(100, 100, 300, 200))
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = Rectifier::default()
            .rectify(&sheet(), 0.0, &[photo_quad(), photo_quad()], &[0.0], NO_ROTATION)
            .unwrap_err();
        assert!(matches!(
            err,
            PhotosplitError::RotationCountMismatch {
                quads: 2,
                rotations: 1
            }
        ));
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn wrong_point_count_is_rejected() {
        let points = vec![vec![Point::new(0, 0), Point::new(10, 0), Point::new(10, 10)]];
        let err = Rectifier::default()
            .rectify_points(&sheet(), 0.0, &points, &[0.0], NO_ROTATION)
            .unwrap_err();
        assert!(matches!(err, PhotosplitError::QuadArity { found: 3 }));
    }

    #[test]
    fn empty_inputs_produce_nothing() {
        let rectifier = Rectifier::default();
        assert!(rectifier.rectify(&sheet(), 0.0, &[], &[], NO_ROTATION).unwrap().is_empty());
        let blank = DynamicImage::new_rgb8(0, 0);
        let photos = rectifier
            .rectify(&blank, 0.0, &[photo_quad()], &[0.0], NO_ROTATION)
            .unwrap();
        assert!(photos.is_empty());
    }

    #[test]
    fn axis_aligned_crop_matches_bounding_box() {
        let photos = Rectifier::default()
            .rectify(&sheet(), 0.0, &[photo_quad()], &[NO_ROTATION], NO_ROTATION)
            .unwrap();
        assert_eq!(photos.len(), 1);
        let photo = photos[0].to_rgb8();
        assert_eq!(photo.dimensions(), (300, 200));
        assert_eq!(photo.get_pixel(0, 0), &GREEN);
        assert_eq!(photo.get_pixel(299, 199), &RED);
        assert!(matches!(photos[0], DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn quarter_turn_swaps_dimensions() {
        let quad = Quad::new([
            Point::new(100, 100),
            Point::new(400, 100),
            Point::new(400, 300),
            Point::new(100, 300),
        ]);
        let photos = Rectifier::default()
            .rectify(&sheet(), 0.0, &[quad], &[90.0], -1.0)
            .unwrap();
        assert_eq!(photos[0].dimensions(), (200, 300));
        // Clockwise: the green top-left pixel moves to the top-right.
        assert_eq!(photos[0].to_rgb8().get_pixel(199, 0), &GREEN);
    }

    #[test]
    fn half_turn_flips_both_axes() {
        let rectifier = Rectifier::default();
        let upright = rectifier
            .rectify(&sheet(), 0.0, &[photo_quad()], &[0.0], NO_ROTATION)
            .unwrap()
            .remove(0);
        let flipped = rectifier
            .rectify(&sheet(), 0.0, &[photo_quad()], &[180.0], NO_ROTATION)
            .unwrap()
            .remove(0);

        assert_eq!(flipped.dimensions(), upright.dimensions());
        assert_eq!(flipped.to_rgb8().get_pixel(299, 199), &GREEN);
        assert_eq!(flipped, upright.rotate180());
    }

    #[test]
    fn negative_coordinates_are_padded_with_white() {
        let scan = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, RED));
        let quad = Quad::from_rect(Rect::new(-15, 20, 65, 60));
        let photos = Rectifier::default()
            .rectify(&scan, 0.0, &[quad], &[0.0], NO_ROTATION)
            .unwrap();

        let photo = photos[0].to_rgb8();
        assert_eq!(photo.dimensions(), (65, 60));
        // Columns 0..15 lie left of the original scan.
        assert_eq!(photo.get_pixel(0, 10), &WHITE);
        assert_eq!(photo.get_pixel(14, 10), &WHITE);
        assert_eq!(photo.get_pixel(15, 10), &RED);
        assert_eq!(photo.get_pixel(64, 59), &RED);
    }

    #[test]
    fn extreme_coordinates_are_rejected() {
        let scan = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, RED));
        let rectifier = Rectifier::default();

        let at_limit = Quad::new([
            Point::new(i32::MIN, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ]);
        let err = rectifier
            .rectify(&scan, 0.0, &[at_limit], &[0.0], NO_ROTATION)
            .unwrap_err();
        assert!(err.is_invalid_argument(), "{err}");

        // Shifting the far corner by the padding would leave the i32 range.
        let spread = Quad::new([
            Point::new(-20, 0),
            Point::new(i32::MAX - 5, 0),
            Point::new(i32::MAX - 5, 10),
            Point::new(-20, 10),
        ]);
        let err = rectifier
            .rectify(&scan, 0.0, &[spread], &[0.0], NO_ROTATION)
            .unwrap_err();
        assert!(matches!(err, PhotosplitError::CoordinateOutOfRange { .. }));
    }

    #[test]
    fn quads_past_the_far_edge_come_back_white() {
        let scan = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, RED));
        let quad = Quad::from_rect(Rect::new(40, 40, 30, 30));
        let photo = Rectifier::default()
            .rectify(&scan, 0.0, &[quad], &[0.0], NO_ROTATION)
            .unwrap()
            .remove(0)
            .to_rgb8();
        assert_eq!(photo.dimensions(), (30, 30));
        assert_eq!(photo.get_pixel(5, 5), &RED);
        assert_eq!(photo.get_pixel(25, 25), &WHITE);
    }

    #[test]
    fn scan_rotation_is_applied_before_cropping() {
        let mut img = RgbImage::from_pixel(100, 100, WHITE);
        for y in 0..10 {
            for x in 0..10 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let scan = DynamicImage::ImageRgb8(img);
        let corner = Quad::from_rect(Rect::new(80, 0, 20, 20));
        let rectifier = Rectifier::default();

        let unrotated = rectifier
            .rectify(&scan, 0.0, &[corner], &[0.0], NO_ROTATION)
            .unwrap()
            .remove(0)
            .to_rgb8();
        assert_eq!(unrotated.get_pixel(15, 5), &WHITE);

        // A clockwise quarter turn moves the top-left block to the top-right.
        let rotated = rectifier
            .rectify(&scan, 90.0, &[corner], &[0.0], NO_ROTATION)
            .unwrap()
            .remove(0)
            .to_rgb8();
        assert_eq!(rotated.dimensions(), (20, 20));
        assert_eq!(rotated.get_pixel(15, 5), &Rgb([0, 0, 0]));
    }

    #[test]
    fn arbitrary_rotation_grows_the_canvas() {
        let photos = Rectifier::default()
            .rectify(&sheet(), 0.0, &[photo_quad()], &[30.0], NO_ROTATION)
            .unwrap();
        let (w, h) = photos[0].dimensions();
        // 300x200 at 30 degrees: 300cos + 200sin by 300sin + 200cos.
        assert!((w as i32 - 360).abs() <= 1, "width {w}");
        assert!((h as i32 - 323).abs() <= 1, "height {h}");
    }

    #[test]
    fn output_order_follows_input_order() {
        let small = Quad::from_rect(Rect::new(500, 500, 40, 30));
        let photos = Rectifier::default()
            .rectify(&sheet(), 0.0, &[small, photo_quad()], &[0.0, 0.0], NO_ROTATION)
            .unwrap();
        assert_eq!(photos[0].dimensions(), (40, 30));
        assert_eq!(photos[1].dimensions(), (300, 200));
    }
}
