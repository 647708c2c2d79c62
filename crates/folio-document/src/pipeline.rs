// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion pipeline: one request, start to finish.
//
//   resolve order -> for each image: decode -> rotate -> frame -> paper fit
//   -> recompress, then assemble -> encrypt.
//
// Images are processed strictly one after another on the calling thread.
// Per-image failures drop that image; only an empty result or an encryption
// failure aborts the batch.

use folio_core::error::Result;
use folio_core::types::{OutputArtifact, TransformRequest, Upload};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use crate::image::PageImage;
use crate::image::compress::recompress;
use crate::image::processor::ImageProcessor;
use crate::order::resolve_order;
use crate::pdf::encrypt::encrypt_document;
use crate::pdf::writer::PdfWriter;

/// Convert `uploads` into a single PDF according to `request`.
#[instrument(skip_all, fields(uploads = uploads.len()))]
pub fn convert_batch(uploads: &[Upload], request: &TransformRequest) -> Result<OutputArtifact> {
    let identifiers: Vec<&str> = uploads.iter().map(|u| u.identifier.as_str()).collect();
    let sequence = resolve_order(&identifiers, &request.order);

    // Translate client keys to ingress indices once; nothing below looks at
    // identifiers again.
    let rotations: Vec<f32> = identifiers
        .iter()
        .map(|identifier| request.rotation_for(identifier))
        .collect();

    let mut pages: Vec<PageImage> = Vec::with_capacity(sequence.len());
    for index in sequence {
        match process_image(index, &uploads[index].bytes, rotations[index], request) {
            Ok(page) => pages.push(page),
            Err(err) => warn!(
                index,
                identifier = %uploads[index].identifier,
                error = %err,
                "Dropping undecodable image"
            ),
        }
    }

    let document = PdfWriter::new().assemble(&pages)?;
    drop(pages);

    let artifact = match request.password.as_deref() {
        Some(password) => encrypt_document(&document, password)?,
        None => document.into_artifact(),
    };

    info!(
        pages = artifact.page_count,
        bytes = artifact.bytes.len(),
        encrypted = artifact.encrypted,
        sha256 = %hex::encode(Sha256::digest(&artifact.bytes)),
        "Conversion complete"
    );
    Ok(artifact)
}

/// Run one upload through the geometry and compression stages.
fn process_image(
    index: usize,
    bytes: &[u8],
    rotation: f32,
    request: &TransformRequest,
) -> Result<PageImage> {
    let framed = ImageProcessor::from_bytes(bytes)?
        .rotate(rotation)
        .frame(request.aspect_ratio, request.fit_mode)
        .fit_paper(request.paper, request.fit_mode)
        .into_rgb();

    let pixels = if request.quality.is_lossless() {
        framed
    } else {
        let fallback = framed.clone();
        recompress(framed, request.quality).unwrap_or_else(|err| {
            warn!(index, error = %err, "Recompression failed, keeping lossless page");
            fallback
        })
    };

    debug!(
        index,
        width = pixels.width(),
        height = pixels.height(),
        "Page image ready"
    );
    Ok(PageImage {
        source_index: index,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::FolioError;
    use folio_core::types::{AspectRatio, FitMode, PaperSize, PaperTarget, Quality};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use lopdf::{Document, Object};

    fn png(width: u32, height: u32, colour: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(colour));
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn page_widths(bytes: &[u8]) -> Vec<i64> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|id| {
                let rect = doc
                    .get_dictionary(*id)
                    .unwrap()
                    .get(b"MediaBox")
                    .unwrap()
                    .as_array()
                    .unwrap()
                    .clone();
                match &rect[2] {
                    Object::Integer(i) => *i,
                    Object::Real(r) => r.round() as i64,
                    other => panic!("unexpected {other:?}"),
                }
            })
            .collect()
    }

    fn page_heights(bytes: &[u8]) -> Vec<i64> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|id| {
                let rect = doc
                    .get_dictionary(*id)
                    .unwrap()
                    .get(b"MediaBox")
                    .unwrap()
                    .as_array()
                    .unwrap()
                    .clone();
                match &rect[3] {
                    Object::Integer(i) => *i,
                    Object::Real(r) => r.round() as i64,
                    other => panic!("unexpected {other:?}"),
                }
            })
            .collect()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    #[test]
    fn client_order_drives_page_order() {
        // Distinct widths identify each upload in the output.
        let uploads = vec![
            Upload::new("a.png", png(10, 5, [255, 0, 0])),
            Upload::new("b.png", png(20, 5, [0, 255, 0])),
            Upload::new("c.png", png(30, 5, [0, 0, 255])),
        ];
        let request = TransformRequest {
            order: "c.png,a.png,b.png".into(),
            ..Default::default()
        };
        let artifact = convert_batch(&uploads, &request).unwrap();
        assert_eq!(artifact.page_count, 3);
        assert_eq!(page_widths(&artifact.bytes), vec![30, 10, 20]);
    }

    #[test]
    fn pad_to_widescreen_keeps_content() {
        let uploads = vec![Upload::new("photo.png", png(100, 100, [0, 0, 0]))];
        let request = TransformRequest {
            aspect_ratio: AspectRatio::Ratio {
                width: 16,
                height: 9,
            },
            fit_mode: FitMode::Pad,
            paper: PaperTarget::Fit,
            ..Default::default()
        };
        let artifact = convert_batch(&uploads, &request).unwrap();
        assert_eq!(page_widths(&artifact.bytes), vec![177]);
        assert_eq!(page_heights(&artifact.bytes), vec![100]);
    }

    #[test]
    fn paper_size_normalises_every_page() {
        let uploads = vec![
            Upload::new("wide.png", png(300, 100, [10, 10, 10])),
            Upload::new("tall.png", png(50, 400, [10, 10, 10])),
        ];
        let request = TransformRequest {
            paper: PaperTarget::Paper(PaperSize::A4),
            quality: Quality::clamped(60),
            ..Default::default()
        };
        let artifact = convert_batch(&uploads, &request).unwrap();
        assert_eq!(page_widths(&artifact.bytes), vec![595, 595]);
        assert_eq!(page_heights(&artifact.bytes), vec![842, 842]);
    }

    #[test]
    fn rotation_is_looked_up_by_identifier() {
        let uploads = vec![
            Upload::new("turn.png", png(40, 10, [0, 0, 0])),
            Upload::new("keep.png", png(40, 10, [0, 0, 0])),
        ];
        let mut request = TransformRequest::default();
        request.rotations.insert("turn.png".into(), 90.0);
        request.rotations.insert("missing.png".into(), 180.0);
        let artifact = convert_batch(&uploads, &request).unwrap();
        assert_eq!(page_widths(&artifact.bytes), vec![10, 40]);
    }

    #[test]
    fn undecodable_images_are_dropped() {
        let uploads = vec![
            Upload::new("broken.png", b"garbage".to_vec()),
            Upload::new("ok.png", png(12, 12, [1, 2, 3])),
        ];
        let artifact = convert_batch(&uploads, &TransformRequest::default()).unwrap();
        assert_eq!(artifact.page_count, 1);
    }

    #[test]
    fn nothing_usable_is_empty_input() {
        let uploads = vec![
            Upload::new("one.png", b"nope".to_vec()),
            Upload::new("two.jpg", Vec::new()),
        ];
        let err = convert_batch(&uploads, &TransformRequest::default()).unwrap_err();
        assert!(matches!(err, FolioError::EmptyInput));

        let err = convert_batch(&[], &TransformRequest::default()).unwrap_err();
        assert!(matches!(err, FolioError::EmptyInput));
    }

    #[test]
    fn password_controls_encryption() {
        let uploads = vec![
            Upload::new("a.png", png(16, 16, [9, 9, 9])),
            Upload::new("b.png", png(16, 16, [200, 9, 9])),
        ];
        let locked = TransformRequest {
            password: TransformRequest::password_from_field("secret"),
            ..Default::default()
        };
        let artifact = convert_batch(&uploads, &locked).unwrap();
        assert!(artifact.encrypted);
        assert!(contains(&artifact.bytes, b"/Encrypt"));
        let doc = Document::load_mem(&artifact.bytes).unwrap();
        assert!(doc.get_pages().is_empty());
        assert!(doc.authenticate_user_password("secret").is_ok());
        assert!(doc.authenticate_password("wrong").is_err());
        assert!(doc.authenticate_password("").is_err());

        let open = TransformRequest {
            password: TransformRequest::password_from_field("   "),
            ..Default::default()
        };
        let artifact = convert_batch(&uploads, &open).unwrap();
        assert!(!artifact.encrypted);
        assert!(!contains(&artifact.bytes, b"/Encrypt"));
        assert_eq!(page_widths(&artifact.bytes), vec![16, 16]);
    }

    #[test]
    fn artifact_is_a_pdf_attachment() {
        let uploads = vec![Upload::new("a.png", png(4, 4, [0, 0, 0]))];
        let artifact = convert_batch(&uploads, &TransformRequest::default()).unwrap();
        assert_eq!(artifact.mime_type, "application/pdf");
        assert_eq!(artifact.filename, "converted.pdf");
    }
}
