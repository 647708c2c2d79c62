// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-document: the image-to-PDF assembly pipeline.
//
// Provides per-image geometry (flatten, rotate, aspect framing, paper fit),
// optional JPEG recompression, client ordering resolution, page assembly into
// a single PDF, and optional password encryption of the result.

pub mod image;
pub mod order;
pub mod pdf;
pub mod pipeline;

// Re-export the primary entry points so callers can use `folio_document::convert_batch` etc.
pub use image::processor::ImageProcessor;
pub use image::PageImage;
pub use order::resolve_order;
pub use pdf::encrypt::encrypt_document;
pub use pdf::writer::{AssembledDocument, PdfWriter};
pub use pipeline::convert_batch;
