// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Folio.

use thiserror::Error;

/// Top-level error type for all Folio operations.
///
/// Per-image variants (`Decode`, `RotationParse`, `QualityRange`) are absorbed
/// inside the pipeline and never reach a client. The rest abort the request.
#[derive(Debug, Error)]
pub enum FolioError {
    // -- Per-image, absorbed locally --
    #[error("image could not be decoded: {0}")]
    Decode(String),

    #[error("invalid rotation: {0}")]
    RotationParse(String),

    #[error("compression quality out of range: {0}")]
    QualityRange(String),

    // -- Whole-batch failures --
    #[error("no usable images were uploaded")]
    EmptyInput,

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Request plumbing --
    #[error("malformed form submission: {0}")]
    InvalidForm(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FolioError {
    /// True when the error is the client's fault rather than ours.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::InvalidForm(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioError>;
