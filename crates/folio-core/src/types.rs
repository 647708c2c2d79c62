// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Folio converter.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::FolioError;

/// Unique identifier for a conversion request, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
}

impl PaperSize {
    pub const ALL: [PaperSize; 6] = [
        Self::A3,
        Self::A4,
        Self::A5,
        Self::Letter,
        Self::Legal,
        Self::Tabloid,
    ];

    /// Page dimensions in pixels (width, height), one pixel per PDF point.
    pub fn dimensions_px(&self) -> (u32, u32) {
        match self {
            Self::A4 => (595, 842),
            Self::A3 => (842, 1191),
            Self::A5 => (420, 595),
            Self::Letter => (612, 792),
            Self::Legal => (612, 1008),
            Self::Tabloid => (792, 1224),
        }
    }

    /// Form keyword for this size, as rendered in the upload form.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::A3 => "A3",
            Self::A5 => "A5",
            Self::Letter => "Letter",
            Self::Legal => "Legal",
            Self::Tabloid => "Tabloid",
        }
    }

    /// Case-insensitive lookup by form keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|size| size.keyword().eq_ignore_ascii_case(keyword.trim()))
    }
}

/// Target page geometry: either keep the image size or fill a named paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperTarget {
    /// Pages keep the dimensions of the framed image.
    #[default]
    Fit,
    /// Every page is resized and cropped to exactly this paper.
    Paper(PaperSize),
}

impl PaperTarget {
    /// Parse the `paper_size` form value. Unknown keys fall back to `Fit`.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("fit") {
            return Self::Fit;
        }
        match PaperSize::from_keyword(value) {
            Some(size) => Self::Paper(size),
            None => {
                warn!(paper_size = value, "unknown paper size, keeping image size");
                Self::Fit
            }
        }
    }
}

/// Target width:height ratio for aspect framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// Leave the image's own ratio alone.
    #[default]
    Original,
    /// Frame to `width:height`; both terms are non-zero.
    Ratio { width: u32, height: u32 },
}

impl AspectRatio {
    /// Parse `"original"` or `"W:H"`. Malformed values fall back to `Original`.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("original") {
            return Self::Original;
        }
        let parsed = value.split_once(':').and_then(|(w, h)| {
            let width = w.trim().parse::<u32>().ok()?;
            let height = h.trim().parse::<u32>().ok()?;
            (width > 0 && height > 0).then_some(Self::Ratio { width, height })
        });
        parsed.unwrap_or_else(|| {
            warn!(aspect_ratio = value, "malformed aspect ratio, keeping original");
            Self::Original
        })
    }
}

/// How aspect framing reaches the target ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FitMode {
    /// Remove content symmetrically from the longer axis.
    #[default]
    Crop,
    /// Extend the shorter axis with a centred white border.
    Pad,
}

impl FitMode {
    /// Parse the `resize_mode` form value; anything but `pad` means crop.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("pad") {
            Self::Pad
        } else {
            Self::Crop
        }
    }
}

/// JPEG quality for the optional recompression pass (1..=100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quality(u8);

impl Quality {
    /// Quality at which the compression stage is skipped entirely.
    pub const LOSSLESS: Quality = Quality(100);

    /// Build a quality, clamping into 1..=100.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    /// Parse the `compress_ratio` form value.
    ///
    /// Missing or non-numeric input defaults to lossless; numeric input
    /// outside 1..=100 is clamped.
    pub fn parse(value: Option<&str>) -> Self {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::LOSSLESS;
        };
        match raw.parse::<i64>() {
            Ok(n) if (1..=100).contains(&n) => Self(n as u8),
            Ok(n) => {
                let err = FolioError::QualityRange(format!("{n} not in 1..=100"));
                let clamped = Self::clamped(n);
                warn!(error = %err, clamped = clamped.value(), "clamping compression quality");
                clamped
            }
            Err(_) => {
                warn!(compress_ratio = raw, "unparsable compression quality, using 100");
                Self::LOSSLESS
            }
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_lossless(&self) -> bool {
        self.0 >= 100
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::LOSSLESS
    }
}

/// Per-request conversion settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformRequest {
    pub aspect_ratio: AspectRatio,
    pub fit_mode: FitMode,
    pub paper: PaperTarget,
    /// Clockwise rotation in degrees keyed by client-supplied identifier.
    pub rotations: HashMap<String, f32>,
    /// Comma-separated client ordering of identifiers.
    pub order: String,
    pub quality: Quality,
    /// User password; `None` means the output is not encrypted.
    pub password: Option<String>,
}

impl TransformRequest {
    /// Normalise a raw password field: whitespace-only means no encryption.
    pub fn password_from_field(raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }

    /// Rotation for an identifier; missing keys mean no rotation.
    pub fn rotation_for(&self, identifier: &str) -> f32 {
        self.rotations.get(identifier).copied().unwrap_or(0.0)
    }
}

/// One uploaded file part before decoding.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied filename. Not unique, not sanitised.
    pub identifier: String,
    /// Encoded image bytes exactly as received.
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(identifier: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            identifier: identifier.into(),
            bytes,
        }
    }
}

/// The finished document handed back to the caller.
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub filename: &'static str,
    pub encrypted: bool,
    pub page_count: usize,
}

impl OutputArtifact {
    pub const MIME_TYPE: &'static str = "application/pdf";
    pub const FILENAME: &'static str = "converted.pdf";

    pub fn pdf(bytes: Vec<u8>, page_count: usize, encrypted: bool) -> Self {
        Self {
            bytes,
            mime_type: Self::MIME_TYPE,
            filename: Self::FILENAME,
            encrypted,
            page_count,
        }
    }

    /// `Content-Disposition` header value for an attachment download.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Lifecycle state of the HTTP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    Stopped,
    Starting,
    Running,
    Error,
}
