// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: collate page images into a single multi-page PDF using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use folio_core::error::{FolioError, Result};
use folio_core::types::OutputArtifact;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::image::PageImage;

/// Image pixels map one-to-one onto PDF points at this resolution.
const PAGE_DPI: f32 = 72.0;

const MM_PER_INCH: f32 = 25.4;

/// An assembled, unencrypted PDF. Immutable once built.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    bytes: Vec<u8>,
    page_count: usize,
}

impl AssembledDocument {
    #[cfg(test)]
    pub(crate) fn from_parts(bytes: Vec<u8>, page_count: usize) -> Self {
        Self { bytes, page_count }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Hand the document out as-is, without encryption.
    pub fn into_artifact(self) -> OutputArtifact {
        OutputArtifact::pdf(self.bytes, self.page_count, false)
    }
}

/// Builds one PDF page per image, each page sized to its own image.
pub struct PdfWriter {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self {
            title: "Converted images".to_owned(),
        }
    }

    /// Collate `pages` in order, first image on page 1.
    ///
    /// Page size in points equals the image size in pixels, and the image
    /// covers the whole page. Fails with `EmptyInput` when there is nothing
    /// to place.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub fn assemble(&self, pages: &[PageImage]) -> Result<AssembledDocument> {
        if pages.is_empty() {
            return Err(FolioError::EmptyInput);
        }

        info!(title = %self.title, "Assembling image PDF");

        let mut doc = PdfDocument::new(&self.title);
        let mut pdf_pages: Vec<PdfPage> = Vec::with_capacity(pages.len());

        for page in pages {
            let raw = RawImage {
                pixels: RawImageData::U8(page.pixels.as_raw().clone()),
                width: page.width() as usize,
                height: page.height() as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: None,
                    scale_y: None,
                    dpi: Some(PAGE_DPI),
                    rotate: None,
                },
            }];

            pdf_pages.push(PdfPage::new(
                px_to_mm(page.width()),
                px_to_mm(page.height()),
                ops,
            ));
            debug!(
                source_index = page.source_index,
                width = page.width(),
                height = page.height(),
                "Page placed"
            );
        }

        doc.with_pages(pdf_pages);

        // Keep embedded images exactly as the pipeline produced them; lossy
        // recompression is the compression stage's job alone.
        let options = PdfSaveOptions {
            image_optimization: None,
            ..Default::default()
        };
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = doc.save(&options, &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings while saving");
        }

        if bytes.is_empty() {
            return Err(FolioError::PdfError("serialiser produced no output".into()));
        }

        debug!(output_bytes = bytes.len(), "PDF serialised");
        Ok(AssembledDocument {
            bytes,
            page_count: pages.len(),
        })
    }
}

/// Page length in millimetres for `px` pixels at [`PAGE_DPI`].
fn px_to_mm(px: u32) -> Mm {
    Mm(px as f32 * MM_PER_INCH / PAGE_DPI)
}
