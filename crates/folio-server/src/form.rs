// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multipart form handling for the conversion endpoint.
//
// Reading the stream and interpreting the fields are kept apart: the first
// step needs axum, the second is plain data and is where every lenient
// fallback lives.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use folio_core::error::FolioError;
use folio_core::types::{AspectRatio, FitMode, PaperTarget, Quality, TransformRequest, Upload};
use serde_json::Value;
use tracing::{debug, warn};

/// Field carrying the image files.
pub const IMAGES_FIELD: &str = "images";

/// One part of the submitted form.
#[derive(Debug, Clone)]
pub enum FormPart {
    /// An `images` part. The identifier is the part's filename.
    File { identifier: String, bytes: Vec<u8> },
    /// Any other named part, read as text.
    Text { name: String, value: String },
}

/// A fully interpreted submission.
#[derive(Debug, Clone, Default)]
pub struct ConversionForm {
    pub uploads: Vec<Upload>,
    pub request: TransformRequest,
}

/// Drain the multipart stream into [`FormPart`]s, in arrival order.
pub async fn read_parts(mut multipart: Multipart) -> Result<Vec<FormPart>, MultipartError> {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        if name == IMAGES_FIELD {
            let identifier = field.file_name().unwrap_or_default().to_owned();
            let bytes = field.bytes().await?.to_vec();
            debug!(identifier = %identifier, bytes = bytes.len(), "image part received");
            parts.push(FormPart::File { identifier, bytes });
        } else {
            let value = field.text().await?;
            parts.push(FormPart::Text { name, value });
        }
    }
    Ok(parts)
}

/// Interpret the parts. Never fails: every malformed setting has a default.
pub fn interpret(parts: Vec<FormPart>) -> ConversionForm {
    let mut form = ConversionForm::default();
    let mut quality: Option<String> = None;

    for part in parts {
        match part {
            FormPart::File { identifier, bytes } => {
                form.uploads.push(Upload::new(identifier, bytes));
            }
            FormPart::Text { name, value } => match name.as_str() {
                "order" => form.request.order = value,
                "rotations" => form.request.rotations = parse_rotations(&value),
                "aspect_ratio" => form.request.aspect_ratio = AspectRatio::parse(&value),
                "resize_mode" => form.request.fit_mode = FitMode::parse(&value),
                "paper_size" => form.request.paper = PaperTarget::parse(&value),
                "compress_ratio" => quality = Some(value),
                "pdf_password" => {
                    form.request.password = TransformRequest::password_from_field(&value)
                }
                other => debug!(field = other, "ignoring unknown form field"),
            },
        }
    }
    form.request.quality = Quality::parse(quality.as_deref());

    debug!(
        uploads = form.uploads.len(),
        rotations = form.request.rotations.len(),
        aspect_ratio = ?form.request.aspect_ratio,
        fit_mode = ?form.request.fit_mode,
        paper = ?form.request.paper,
        quality = form.request.quality.value(),
        encrypted = form.request.password.is_some(),
        "form interpreted"
    );
    form
}

/// Parse the `rotations` JSON object. A broken document yields no rotations;
/// a single unusable value yields 0 degrees for that identifier.
pub fn parse_rotations(raw: &str) -> HashMap<String, f32> {
    if raw.trim().is_empty() {
        return HashMap::new();
    }
    let object = match serde_json::from_str::<serde_json::Map<String, Value>>(raw) {
        Ok(object) => object,
        Err(e) => {
            warn!(error = %e, "rotations field is not a JSON object, ignoring it");
            return HashMap::new();
        }
    };

    object
        .into_iter()
        .map(|(identifier, value)| {
            let degrees = rotation_value(&value).unwrap_or_else(|e| {
                warn!(identifier = %identifier, error = %e, "using 0 degrees");
                0.0
            });
            (identifier, degrees)
        })
        .collect()
}

fn rotation_value(value: &Value) -> Result<f32, FolioError> {
    let degrees = match value {
        Value::Number(n) => n.as_f64().map(|d| d as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    };
    degrees
        .filter(|d| d.is_finite())
        .ok_or_else(|| FolioError::RotationParse(value.to_string()))
}
