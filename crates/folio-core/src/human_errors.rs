// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the upload form.
//
// Every technical error is mapped to plain English with a clear suggestion
// and the HTTP status the server should answer with.

use crate::error::FolioError;

/// Who has to act for the request to succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The uploader must change something (pick images, fix the form).
    ActionRequired,
    /// Nothing the uploader can do; the server failed.
    Internal,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// HTTP status code for the response.
    pub status: u16,
    pub severity: Severity,
}

impl HumanError {
    fn action(message: &str, suggestion: String) -> Self {
        Self {
            message: message.into(),
            suggestion,
            status: 400,
            severity: Severity::ActionRequired,
        }
    }

    fn internal(message: &str, suggestion: String) -> Self {
        Self {
            message: message.into(),
            suggestion,
            status: 500,
            severity: Severity::Internal,
        }
    }

    /// Plain-text body sent back to the browser.
    pub fn body(&self) -> String {
        format!("{}\n{}\n", self.message, self.suggestion)
    }
}

/// Convert a `FolioError` into a `HumanError`.
pub fn humanize_error(err: &FolioError) -> HumanError {
    match err {
        FolioError::EmptyInput => HumanError::action(
            "None of the uploaded files could be read as an image.",
            "Choose one or more PNG, JPEG, GIF, BMP, TIFF or WebP files and try again.".into(),
        ),

        FolioError::InvalidForm(detail) => HumanError::action(
            "The upload didn't arrive in one piece.",
            format!("Reload the page and submit the form again. ({detail})"),
        ),

        FolioError::Decode(detail) => HumanError::action(
            "One of the files isn't an image we can read.",
            format!("Remove that file or save it as PNG or JPEG. ({detail})"),
        ),

        // Absorbed in the pipeline; only reachable if a caller surfaces them.
        FolioError::RotationParse(detail) | FolioError::QualityRange(detail) => {
            HumanError::action(
                "One of the settings wasn't understood.",
                format!("Check the rotation and compression values. ({detail})"),
            )
        }

        FolioError::Encryption(detail) => HumanError::internal(
            "We couldn't password-protect the PDF.",
            format!("Try again without a password, or with fewer images. ({detail})"),
        ),

        FolioError::PdfError(detail) => HumanError::internal(
            "We couldn't build the PDF.",
            format!("Try again with fewer or smaller images. ({detail})"),
        ),

        FolioError::ImageError(detail) => HumanError::internal(
            "We couldn't process one of the images.",
            format!("Try again, or convert the image to PNG first. ({detail})"),
        ),

        FolioError::Server(detail) => HumanError::internal(
            "The server had a problem.",
            format!("Try again in a moment. ({detail})"),
        ),

        FolioError::Io(e) => HumanError::internal(
            "The server couldn't read or write a file.",
            format!("Try again in a moment. ({e})"),
        ),

        FolioError::Serialization(e) => HumanError::internal(
            "The server's settings are damaged.",
            format!("Ask the administrator to check the configuration. ({e})"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_bad_request() {
        let human = humanize_error(&FolioError::EmptyInput);
        assert_eq!(human.status, 400);
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn encryption_is_internal() {
        let human = humanize_error(&FolioError::Encryption("no trailer".into()));
        assert_eq!(human.status, 500);
        assert_eq!(human.severity, Severity::Internal);
        assert!(human.suggestion.contains("no trailer"));
    }

    #[test]
    fn status_agrees_with_client_error_flag() {
        let errors = [
            FolioError::EmptyInput,
            FolioError::InvalidForm("eof".into()),
            FolioError::PdfError("x".into()),
            FolioError::Server("bind".into()),
        ];
        for err in &errors {
            let human = humanize_error(err);
            assert_eq!(human.status == 400, err.is_client_error(), "{err}");
        }
    }

    #[test]
    fn body_has_message_and_suggestion() {
        let body = humanize_error(&FolioError::EmptyInput).body();
        assert!(body.starts_with("None of the uploaded files"));
        assert_eq!(body.lines().count(), 2);
    }
}
