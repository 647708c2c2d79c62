// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF encryption: re-parse an assembled document with `lopdf`, rebuild it
// page by page into a fresh document, and seal it with the standard security
// handler so that it needs a password to open.

use std::collections::HashMap;

use folio_core::error::{FolioError, Result};
use folio_core::types::OutputArtifact;
use lopdf::{
    Dictionary, Document, EncryptionState, EncryptionVersion, Object, ObjectId, Permissions,
    Stream, StringFormat, dictionary,
};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use crate::pdf::writer::AssembledDocument;

/// RC4 key length for the standard security handler (revision 3).
const KEY_LENGTH_BITS: usize = 128;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Produce an encrypted copy of `document` that opens only with `password`.
///
/// The source document is left untouched. The plaintext rebuild lives only
/// inside this call. Any failure is reported as `FolioError::Encryption` and
/// no bytes are returned.
#[instrument(skip_all, fields(pages = document.page_count()))]
pub fn encrypt_document(document: &AssembledDocument, password: &str) -> Result<OutputArtifact> {
    let source = Document::load_mem(document.bytes()).map_err(|err| {
        FolioError::Encryption(format!("assembled PDF could not be re-read: {}", err))
    })?;

    let mut target = rebuild_pages(&source)?;
    let page_count = target.get_pages().len();
    if page_count != document.page_count() {
        return Err(FolioError::Encryption(format!(
            "rebuilt document has {} pages, expected {}",
            page_count,
            document.page_count()
        )));
    }

    let file_id = file_identifier(document.bytes());
    target.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(file_id.clone(), StringFormat::Hexadecimal),
            Object::String(file_id, StringFormat::Hexadecimal),
        ]),
    );

    let version = EncryptionVersion::V2 {
        document: &target,
        owner_password: password,
        user_password: password,
        key_length: KEY_LENGTH_BITS,
        permissions: Permissions::all(),
    };
    let state = EncryptionState::try_from(version).map_err(|err| {
        FolioError::Encryption(format!("cannot derive encryption key: {}", err))
    })?;
    target
        .encrypt(&state)
        .map_err(|err| FolioError::Encryption(format!("cannot encrypt objects: {}", err)))?;

    let mut output = Vec::new();
    target.save_to(&mut output).map_err(|err| {
        FolioError::Encryption(format!("failed to serialise encrypted PDF: {}", err))
    })?;

    info!(
        pages = page_count,
        output_bytes = output.len(),
        "PDF encrypted"
    );
    Ok(OutputArtifact::pdf(output, page_count, true))
}

/// First 16 bytes of the SHA-256 of the plaintext, used as the trailer `/ID`.
fn file_identifier(plaintext: &[u8]) -> Vec<u8> {
    let digest = Sha256::digest(plaintext);
    digest[..16].to_vec()
}

/// Copy every page of `source`, in page order, into a new single-level page
/// tree.
fn rebuild_pages(source: &Document) -> Result<Document> {
    let mut target = Document::with_version("1.5");
    let pages_id = target.new_object_id();
    let mut cloned: HashMap<ObjectId, ObjectId> = HashMap::new();
    let mut kids: Vec<Object> = Vec::new();

    // `get_pages` is keyed by 1-based page number, so iteration is in order.
    for (page_number, page_id) in source.get_pages() {
        let page_dict = source.get_dictionary(page_id).map_err(|err| {
            FolioError::Encryption(format!("cannot read page {}: {}", page_number, err))
        })?;

        let mut new_page = clone_dictionary(source, &mut target, page_dict, &mut cloned)?;
        for key in INHERITABLE_KEYS {
            if new_page.has(key) {
                continue;
            }
            if let Some(inherited) = inherited_attribute(source, page_dict, key) {
                let value = deep_clone_object(source, &mut target, inherited, &mut cloned)?;
                new_page.set(key.to_vec(), value);
            }
        }
        new_page.set("Parent", Object::Reference(pages_id));

        let new_page_id = target.add_object(Object::Dictionary(new_page));
        kids.push(Object::Reference(new_page_id));
        debug!(page_number, ?new_page_id, "Page copied");
    }

    let count = kids.len() as i64;
    target.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = target.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    target.trailer.set("Root", Object::Reference(catalog_id));

    if let Ok(info) = source.trailer.get(b"Info") {
        match deep_clone_object(source, &mut target, info, &mut cloned) {
            Ok(value) => target.trailer.set("Info", value),
            Err(err) => warn!(%err, "Document info not carried over"),
        }
    }

    Ok(target)
}

/// Walk up the `/Parent` chain looking for an inheritable attribute.
fn inherited_attribute<'a>(
    source: &'a Document,
    page: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = page;
    // Depth bound guards against malformed cyclic page trees.
    for _ in 0..64 {
        let parent_id = current.get(b"Parent").ok()?.as_reference().ok()?;
        let parent = source.get_dictionary(parent_id).ok()?;
        if let Ok(value) = parent.get(key) {
            return Some(value);
        }
        current = parent;
    }
    None
}

/// Clone a dictionary, skipping `/Parent` (the caller patches it).
fn clone_dictionary(
    source: &Document,
    target: &mut Document,
    dict: &Dictionary,
    cloned: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Dictionary> {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        if key == b"Parent" {
            continue;
        }
        let cloned_value = deep_clone_object(source, target, value, cloned)?;
        new_dict.set(key.clone(), cloned_value);
    }
    Ok(new_dict)
}

/// Deep-clone an object from `source` into `target`, following references.
///
/// Each source object is copied at most once; later references to it reuse
/// the first copy, which also terminates reference cycles.
fn deep_clone_object(
    source: &Document,
    target: &mut Document,
    object: &Object,
    cloned: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match object {
        Object::Dictionary(dict) => Ok(Object::Dictionary(clone_dictionary(
            source, target, dict, cloned,
        )?)),
        Object::Array(arr) => {
            let mut new_arr = Vec::with_capacity(arr.len());
            for item in arr {
                new_arr.push(deep_clone_object(source, target, item, cloned)?);
            }
            Ok(Object::Array(new_arr))
        }
        Object::Reference(ref_id) => {
            if let Some(existing) = cloned.get(ref_id) {
                return Ok(Object::Reference(*existing));
            }
            let referenced = source.get_object(*ref_id).map_err(|err| {
                FolioError::Encryption(format!("dangling reference {:?}: {}", ref_id, err))
            })?;
            // Reserve the id first so cycles resolve to it.
            let new_id = target.new_object_id();
            cloned.insert(*ref_id, new_id);
            let copy = deep_clone_object(source, target, referenced, cloned)?;
            target.objects.insert(new_id, copy);
            Ok(Object::Reference(new_id))
        }
        Object::Stream(stream) => {
            let dict = clone_dictionary(source, target, &stream.dict, cloned)?;
            Ok(Object::Stream(Stream::new(dict, stream.content.clone())))
        }
        // Boolean, Integer, Real, String, Name, Null.
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PageImage;
    use crate::pdf::writer::PdfWriter;
    use image::{Rgb, RgbImage};

    fn assembled(count: usize) -> AssembledDocument {
        let pages: Vec<PageImage> = (0..count)
            .map(|index| PageImage {
                source_index: index,
                pixels: RgbImage::from_pixel(20 + index as u32, 10, Rgb([0, 0, 0])),
            })
            .collect();
        PdfWriter::new().assemble(&pages).unwrap()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    #[test]
    fn encrypted_output_has_security_handler() {
        let document = assembled(2);
        let artifact = encrypt_document(&document, "secret").unwrap();
        assert!(artifact.encrypted);
        assert_eq!(artifact.page_count, 2);
        assert!(artifact.bytes.starts_with(b"%PDF"));
        assert!(contains(&artifact.bytes, b"/Encrypt"));
        assert!(!contains(document.bytes(), b"/Encrypt"));
    }

    #[test]
    fn only_the_password_opens_the_output() {
        let document = assembled(2);
        let artifact = encrypt_document(&document, "secret").unwrap();

        let locked = Document::load_mem(&artifact.bytes).unwrap();
        assert!(locked.is_encrypted());
        // Objects stay unreadable until a password is supplied.
        assert!(locked.get_pages().is_empty());

        assert!(locked.authenticate_user_password("secret").is_ok());
        assert!(locked.authenticate_password("wrong").is_err());
        assert!(locked.authenticate_password("").is_err());
    }

    #[test]
    fn passwords_are_not_interchangeable() {
        let document = assembled(1);
        let first = encrypt_document(&document, "alpha").unwrap();
        let second = encrypt_document(&document, "beta").unwrap();

        let first = Document::load_mem(&first.bytes).unwrap();
        let second = Document::load_mem(&second.bytes).unwrap();
        assert!(first.authenticate_password("alpha").is_ok());
        assert!(first.authenticate_password("beta").is_err());
        assert!(second.authenticate_password("beta").is_ok());
        assert!(second.authenticate_password("alpha").is_err());
    }

    #[test]
    fn source_document_is_untouched() {
        let document = assembled(1);
        let before = document.bytes().to_vec();
        let _ = encrypt_document(&document, "secret").unwrap();
        assert_eq!(document.bytes(), before.as_slice());
    }

    #[test]
    fn rebuild_keeps_page_order_and_sizes() {
        let document = assembled(3);
        let source = Document::load_mem(document.bytes()).unwrap();
        let rebuilt = rebuild_pages(&source).unwrap();

        let widths: Vec<i64> = rebuilt
            .get_pages()
            .values()
            .map(|id| {
                let dict = rebuilt.get_dictionary(*id).unwrap();
                let rect = dict.get(b"MediaBox").unwrap().as_array().unwrap();
                match &rect[2] {
                    Object::Integer(i) => *i,
                    Object::Real(r) => r.round() as i64,
                    other => panic!("unexpected {other:?}"),
                }
            })
            .collect();
        assert_eq!(widths, vec![20, 21, 22]);
    }

    #[test]
    fn garbage_input_is_encryption_error() {
        let bogus = AssembledDocument::from_parts(b"not a pdf".to_vec(), 1);
        let err = encrypt_document(&bogus, "secret").unwrap_err();
        assert!(matches!(err, FolioError::Encryption(_)));
    }

    #[test]
    fn file_identifier_is_stable() {
        assert_eq!(file_identifier(b"abc"), file_identifier(b"abc"));
        assert_ne!(file_identifier(b"abc"), file_identifier(b"abd"));
        assert_eq!(file_identifier(b"abc").len(), 16);
    }
}
