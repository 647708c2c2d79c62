// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: geometry normalisation and lossy recompression.

pub mod compress;
pub mod processor;

pub use processor::ImageProcessor;

use ::image::RgbImage;

/// A fully processed, page-ready pixel buffer bound for one PDF page.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Ingress index of the upload this page came from.
    pub source_index: usize,
    /// Opaque RGB pixels; the page is sized to these dimensions.
    pub pixels: RgbImage,
}

impl PageImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}
