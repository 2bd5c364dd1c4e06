// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: rotation (expanding or fixed canvas), white padding,
// out-of-bounds-tolerant cropping, and encoding. Operates on in-memory images
// using the `image` and `imageproc` crates.

use image::{DynamicImage, ImageBuffer, ImageFormat, Pixel, Primitive, imageops};
use imageproc::geometric_transformations::{
    Interpolation, Projection, rotate_about_center, warp_into,
};
use photosplit_core::Rect;
use photosplit_core::error::PhotosplitError;
use tracing::{debug, info, instrument};

/// Angles closer than this to a multiple of 90 degrees take the lossless path.
const RIGHT_ANGLE_TOLERANCE: f64 = 0.01;

/// Apply `$body` to the pixel buffer inside a `&DynamicImage`, keeping the
/// colour type. Float images are handled as 16-bit RGBA.
macro_rules! map_buffer {
    ($image:expr, |$buf:ident| $body:expr) => {
        match $image {
            DynamicImage::ImageLuma8($buf) => DynamicImage::ImageLuma8($body),
            DynamicImage::ImageLumaA8($buf) => DynamicImage::ImageLumaA8($body),
            DynamicImage::ImageRgb8($buf) => DynamicImage::ImageRgb8($body),
            DynamicImage::ImageRgba8($buf) => DynamicImage::ImageRgba8($body),
            DynamicImage::ImageLuma16($buf) => DynamicImage::ImageLuma16($body),
            DynamicImage::ImageLumaA16($buf) => DynamicImage::ImageLumaA16($body),
            DynamicImage::ImageRgb16($buf) => DynamicImage::ImageRgb16($body),
            DynamicImage::ImageRgba16($buf) => DynamicImage::ImageRgba16($body),
            other => {
                let converted = other.to_rgba16();
                let $buf = &converted;
                DynamicImage::ImageRgba16($body)
            }
        }
    };
}

/// Image processing pipeline operating on a single in-memory image.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed image, enabling method chaining.
/// Areas uncovered by a transformation are filled with white.
///
/// ```ignore
/// let photo = ImageProcessor::open("scan.png")?
///     .rotate_within_canvas(1.5)
///     .pad(10)?
///     .crop(Rect::new(110, 110, 300, 200))
///     .rotate(90.0)
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, PhotosplitError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            PhotosplitError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(
            width = img.width(),
            height = img.height(),
            "Image loaded"
        );
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, TIFF, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PhotosplitError> {
        let img = image::load_from_memory(data).map_err(|err| {
            PhotosplitError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// True when the image has no pixels.
    pub fn is_empty(&self) -> bool {
        is_empty(&self.image)
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Rotate the image clockwise by `degrees`, growing the canvas so no
    /// corner is clipped.
    ///
    /// For 90/180/270 degree rotations, lossless rotation is used. For other
    /// angles the canvas becomes `w|cos| + h|sin|` by `w|sin| + h|cos|` and
    /// bilinear interpolation is applied.
    #[instrument(skip(self))]
    pub fn rotate(self, degrees: f64) -> Self {
        // Fast-path for exact multiples of 90.
        let normalised = degrees.rem_euclid(360.0);
        if normalised < RIGHT_ANGLE_TOLERANCE || 360.0 - normalised < RIGHT_ANGLE_TOLERANCE {
            return self;
        }
        if (normalised - 90.0).abs() < RIGHT_ANGLE_TOLERANCE {
            return Self {
                image: self.image.rotate90(),
            };
        }
        if (normalised - 180.0).abs() < RIGHT_ANGLE_TOLERANCE {
            return Self {
                image: self.image.rotate180(),
            };
        }
        if (normalised - 270.0).abs() < RIGHT_ANGLE_TOLERANCE {
            return Self {
                image: self.image.rotate270(),
            };
        }
        if self.is_empty() {
            return self;
        }

        let (width, height) = (self.image.width(), self.image.height());
        let (out_w, out_h) = expanded_dimensions(width, height, degrees);
        let projection = Projection::translate(out_w as f32 / 2.0, out_h as f32 / 2.0)
            * Projection::rotate(degrees.to_radians() as f32)
            * Projection::translate(-(width as f32) / 2.0, -(height as f32) / 2.0);

        let rotated = map_buffer!(&self.image, |buf| {
            let mut output = ImageBuffer::from_pixel(out_w, out_h, white(buf));
            warp_into(buf, &projection, Interpolation::Bilinear, white(buf), &mut output);
            output
        });

        debug!(out_w, out_h, "General rotation applied");
        Self { image: rotated }
    }

    /// Rotate clockwise by `degrees` about the centre, keeping the canvas
    /// size. Corners rotated out of frame are lost; exposed areas are white.
    #[instrument(skip(self))]
    pub fn rotate_within_canvas(self, degrees: f64) -> Self {
        if degrees.rem_euclid(360.0).abs() < f64::EPSILON || self.is_empty() {
            return self;
        }
        info!(degrees, "Rotating within canvas");

        let theta = degrees.to_radians() as f32;
        let rotated = map_buffer!(&self.image, |buf| {
            rotate_about_center(buf, theta, Interpolation::Bilinear, white(buf))
        });
        Self { image: rotated }
    }

    /// Surround the image with a white border of `border` pixels on every
    /// side.
    ///
    /// # Errors
    ///
    /// [`PhotosplitError::CanvasTooLarge`] if either padded side would exceed
    /// `i32::MAX`, the largest extent pixel coordinates can address.
    #[instrument(skip(self))]
    pub fn pad(self, border: u32) -> Result<Self, PhotosplitError> {
        if border == 0 {
            return Ok(self);
        }
        let (width, height) =
            padded_dimensions(self.image.width(), self.image.height(), border)?;
        let offset = i64::from(border);
        let padded = map_buffer!(&self.image, |buf| {
            let mut output = ImageBuffer::from_pixel(width, height, white(buf));
            imageops::replace(&mut output, buf, offset, offset);
            output
        });
        debug!(width, height, "Padding applied");
        Ok(Self { image: padded })
    }

    /// Cut out `rect`. Parts of `rect` outside the image come back white
    /// rather than being clipped, so the output is always `rect`-sized.
    #[instrument(skip(self), fields(x = rect.x, y = rect.y, width = rect.width, height = rect.height))]
    pub fn crop(self, rect: Rect) -> Self {
        self.region(rect)
    }

    /// Like [`crop`](Self::crop) but leaves `self` intact, for cutting many
    /// regions from one image.
    pub fn region(&self, rect: Rect) -> Self {
        let (dx, dy) = (-i64::from(rect.x), -i64::from(rect.y));
        let cropped = map_buffer!(&self.image, |buf| {
            let mut output = ImageBuffer::from_pixel(rect.width, rect.height, white(buf));
            imageops::replace(&mut output, buf, dx, dy);
            output
        });
        Self { image: cropped }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, PhotosplitError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Write the image to a file. The format is inferred from the file extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), PhotosplitError> {
        self.image.save(path.as_ref()).map_err(|err| {
            PhotosplitError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

/// Size of a `width` x `height` image after adding `border` on every side.
fn padded_dimensions(
    width: u32,
    height: u32,
    border: u32,
) -> Result<(u32, u32), PhotosplitError> {
    let grow = |side: u32| {
        let grown = u64::from(side) + 2 * u64::from(border);
        u32::try_from(grown).ok().filter(|&v| v <= i32::MAX as u32).ok_or(grown)
    };
    match (grow(width), grow(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        (w, h) => Err(PhotosplitError::CanvasTooLarge {
            width: w.map_or_else(|grown| grown, u64::from),
            height: h.map_or_else(|grown| grown, u64::from),
        }),
    }
}

/// True when `image` has no pixels.
pub fn is_empty(image: &DynamicImage) -> bool {
    image.width() == 0 || image.height() == 0
}

/// Canvas size needed to hold a `width` x `height` image rotated by
/// `degrees` without clipping.
pub fn expanded_dimensions(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (sin, cos) = (sin.abs(), cos.abs());
    let (w, h) = (width as f64, height as f64);
    let out_w = (w * cos + h * sin).round().max(1.0) as u32;
    let out_h = (w * sin + h * cos).round().max(1.0) as u32;
    (out_w, out_h)
}

/// Every channel at its maximum: opaque white.
fn white<P: Pixel>(_: &ImageBuffer<P, Vec<P::Subpixel>>) -> P {
    let channels = vec![<P::Subpixel as Primitive>::DEFAULT_MAX_VALUE; usize::from(P::CHANNEL_COUNT)];
    *P::from_slice(&channels)
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(
    image: &DynamicImage,
    format: ImageFormat,
) -> Result<Vec<u8>, PhotosplitError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        PhotosplitError::ImageError(format!("image encoding failed: {}", err))
    })?;
    Ok(buffer)
}
