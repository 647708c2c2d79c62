// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lossy recompression: a JPEG encode/decode round trip that bounds the size
// of each page image before it is embedded in the PDF.

use folio_core::error::{FolioError, Result};
use folio_core::types::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use tracing::{debug, instrument};

/// Run `pixels` through JPEG at `quality` and decode it back.
///
/// Quality 100 returns the buffer untouched without encoding. Must only be
/// called on the final page-sized buffer, after all geometry.
#[instrument(skip(pixels), fields(width = pixels.width(), height = pixels.height(), quality = quality.value()))]
pub fn recompress(pixels: RgbImage, quality: Quality) -> Result<RgbImage> {
    if quality.is_lossless() {
        return Ok(pixels);
    }

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.value());
    pixels
        .write_with_encoder(encoder)
        .map_err(|err| FolioError::ImageError(format!("JPEG encoding failed: {}", err)))?;

    let decoded = image::load_from_memory_with_format(&buffer, ImageFormat::Jpeg)
        .map_err(|err| FolioError::ImageError(format!("JPEG decoding failed: {}", err)))?;

    debug!(jpeg_bytes = buffer.len(), "Recompressed page image");
    Ok(decoded.to_rgb8())
}
