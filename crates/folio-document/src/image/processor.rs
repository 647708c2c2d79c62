// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: alpha flattening, rotation, aspect-ratio framing, and
// paper-size fitting. Operates on in-memory RGB buffers using the `image` and
// `imageproc` crates. No I/O.

use folio_core::error::{FolioError, Result};
use folio_core::types::{AspectRatio, FitMode, PaperTarget};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, instrument, warn};

/// Background used for padding, rotation fill, and alpha flattening.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Largest canvas, in pixels, that padding or rotation may produce.
pub const MAX_CANVAS_PIXELS: u64 = 400_000_000;

/// Angles closer than this to a multiple of 90 degrees take the lossless path.
const RIGHT_ANGLE_TOLERANCE: f32 = 0.01;

/// Geometry pipeline operating on a single opaque RGB image.
///
/// Every method consumes `self` and returns a new `ImageProcessor`, so the
/// per-image transforms chain in their fixed order:
///
/// ```ignore
/// let page = ImageProcessor::from_bytes(&bytes)?
///     .rotate(90.0)
///     .frame(AspectRatio::Ratio { width: 16, height: 9 }, FitMode::Pad)
///     .fit_paper(PaperTarget::Paper(PaperSize::A4), FitMode::Pad)
///     .into_rgb();
/// ```
pub struct ImageProcessor {
    /// The current working image. Always opaque.
    image: RgbImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes (JPEG, PNG, ...) and flatten onto white.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| FolioError::Decode(err.to_string()))?;
        debug!(
            width = img.width(),
            height = img.height(),
            color = ?img.color(),
            "Image decoded from bytes"
        );
        Ok(Self::from_dynamic(img))
    }

    /// Wrap an already-decoded `DynamicImage`, dropping any alpha channel.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self {
            image: flatten_onto_white(&image),
        }
    }

    /// Wrap an opaque RGB buffer as-is.
    pub fn from_rgb(image: RgbImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_rgb(self) -> RgbImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Rotate clockwise by `degrees`, growing the canvas to hold every corner.
    ///
    /// Multiples of 90 use lossless quarter turns. Other angles are resampled
    /// bilinearly onto a white canvas sized to the rotated bounding box.
    #[instrument(skip(self), fields(degrees))]
    pub fn rotate(self, degrees: f32) -> Self {
        if !degrees.is_finite() {
            debug!("Non-finite rotation ignored");
            return self;
        }
        let normalised = degrees.rem_euclid(360.0);
        if normalised < RIGHT_ANGLE_TOLERANCE || 360.0 - normalised < RIGHT_ANGLE_TOLERANCE {
            return self;
        }
        if (normalised - 90.0).abs() < RIGHT_ANGLE_TOLERANCE {
            return Self::from_rgb(imageops::rotate90(&self.image));
        }
        if (normalised - 180.0).abs() < RIGHT_ANGLE_TOLERANCE {
            return Self::from_rgb(imageops::rotate180(&self.image));
        }
        if (normalised - 270.0).abs() < RIGHT_ANGLE_TOLERANCE {
            return Self::from_rgb(imageops::rotate270(&self.image));
        }

        let (out_w, out_h) = rotated_bounds(self.width(), self.height(), normalised);
        if !within_canvas_budget(u64::from(out_w), u64::from(out_h)) {
            warn!(out_w, out_h, "Rotated canvas too large, keeping unrotated image");
            return self;
        }
        let src_cx = self.width() as f32 / 2.0;
        let src_cy = self.height() as f32 / 2.0;
        let dst_cx = out_w as f32 / 2.0;
        let dst_cy = out_h as f32 / 2.0;

        // Source centre lands on destination centre; rotate is clockwise in
        // image coordinates (y grows downward).
        let projection = Projection::translate(dst_cx, dst_cy)
            * Projection::rotate(normalised.to_radians())
            * Projection::translate(-src_cx, -src_cy);

        let mut canvas = RgbImage::from_pixel(out_w, out_h, WHITE);
        warp_into(
            &self.image,
            &projection,
            Interpolation::Bilinear,
            WHITE,
            &mut canvas,
        );

        debug!(
            from_w = self.width(),
            from_h = self.height(),
            out_w,
            out_h,
            "Expanded rotation applied"
        );
        Self::from_rgb(canvas)
    }

    /// Frame the image to `ratio` by cropping or padding one axis.
    ///
    /// All arithmetic is integer and floors. Crop windows and pad offsets are
    /// centred with floor division, so an odd leftover pixel goes to the
    /// bottom/right side. A pad whose canvas would exceed
    /// [`MAX_CANVAS_PIXELS`] is skipped.
    #[instrument(skip(self))]
    pub fn frame(self, ratio: AspectRatio, mode: FitMode) -> Self {
        let AspectRatio::Ratio {
            width: ratio_w,
            height: ratio_h,
        } = ratio
        else {
            return self;
        };

        let (w, h) = (u64::from(self.width()), u64::from(self.height()));
        let (rw, rh) = (u64::from(ratio_w), u64::from(ratio_h));

        // Compare w/h against rw/rh without floating point.
        let lhs = w * rh;
        let rhs = h * rw;
        if lhs == rhs {
            return self;
        }
        let too_wide = lhs > rhs;

        match mode {
            FitMode::Crop => {
                let (x, y, new_w, new_h) = if too_wide {
                    let new_w = (h * rw / rh).max(1);
                    ((w - new_w) / 2, 0, new_w, h)
                } else {
                    let new_h = (w * rh / rw).max(1);
                    (0, (h - new_h) / 2, w, new_h)
                };
                debug!(x, y, new_w, new_h, "Cropping to aspect ratio");
                let cropped =
                    imageops::crop_imm(&self.image, x as u32, y as u32, new_w as u32, new_h as u32)
                        .to_image();
                Self::from_rgb(cropped)
            }
            FitMode::Pad => {
                let (new_w, new_h) = if too_wide {
                    (w, (w * rh / rw).max(h))
                } else {
                    ((h * rw / rh).max(w), h)
                };
                if !within_canvas_budget(new_w, new_h) {
                    warn!(new_w, new_h, "Padded canvas too large, keeping original ratio");
                    return self;
                }
                let (x, y) = ((new_w - w) / 2, (new_h - h) / 2);
                debug!(x, y, new_w, new_h, "Padding to aspect ratio");
                let mut canvas = RgbImage::from_pixel(new_w as u32, new_h as u32, WHITE);
                imageops::replace(&mut canvas, &self.image, x as i64, y as i64);
                Self::from_rgb(canvas)
            }
        }
    }

    /// Bring the image to exactly the paper's pixel dimensions.
    ///
    /// `Crop` scales (Lanczos3) so the image covers the paper, then crops the
    /// overflow. `Pad` scales so the image fits inside the paper and centres
    /// it on a white sheet. An image already at the paper size is returned
    /// untouched, which makes the operation idempotent.
    #[instrument(skip(self))]
    pub fn fit_paper(self, target: PaperTarget, mode: FitMode) -> Self {
        let PaperTarget::Paper(size) = target else {
            return self;
        };
        let (paper_w, paper_h) = size.dimensions_px();
        if self.width() == paper_w && self.height() == paper_h {
            return self;
        }

        debug!(
            from_w = self.width(),
            from_h = self.height(),
            paper_w,
            paper_h,
            ?mode,
            "Fitting to paper"
        );
        let source = DynamicImage::ImageRgb8(self.image);
        match mode {
            FitMode::Crop => {
                let filled = source.resize_to_fill(paper_w, paper_h, FilterType::Lanczos3);
                Self::from_rgb(filled.to_rgb8())
            }
            FitMode::Pad => {
                let contained = source
                    .resize(paper_w, paper_h, FilterType::Lanczos3)
                    .to_rgb8();
                let x = (paper_w - contained.width().min(paper_w)) / 2;
                let y = (paper_h - contained.height().min(paper_h)) / 2;
                let mut sheet = RgbImage::from_pixel(paper_w, paper_h, WHITE);
                imageops::replace(&mut sheet, &contained, i64::from(x), i64::from(y));
                Self::from_rgb(sheet)
            }
        }
    }
}

/// Whether a `width` x `height` canvas stays within [`MAX_CANVAS_PIXELS`].
fn within_canvas_budget(width: u64, height: u64) -> bool {
    width.saturating_mul(height) <= MAX_CANVAS_PIXELS
}

/// Canvas size that fully contains a `width` x `height` image rotated by
/// `degrees`. Rounds up so no corner is clipped; the small slack absorbs
/// float noise such as `cos(90°) != 0`.
pub fn rotated_bounds(width: u32, height: u32, degrees: f32) -> (u32, u32) {
    const SLACK: f32 = 1e-3;
    let radians = degrees.to_radians();
    let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
    let (w, h) = (width as f32, height as f32);
    let out_w = (w * cos + h * sin - SLACK).ceil().max(1.0) as u32;
    let out_h = (w * sin + h * cos - SLACK).ceil().max(1.0) as u32;
    (out_w, out_h)
}

/// Composite any alpha channel over white and return opaque RGB.
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    let mut canvas =
        RgbaImage::from_pixel(rgba.width(), rgba.height(), Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut canvas, &rgba, 0, 0);
    DynamicImage::ImageRgba8(canvas).to_rgb8()
}
