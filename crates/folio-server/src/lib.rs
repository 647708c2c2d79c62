// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio Server: the HTTP face of the converter. Serves the upload form,
// parses multipart submissions into `folio-core` requests, and hands them to
// the `folio-document` pipeline.

pub mod form;
pub mod page;
pub mod server;

pub use form::{ConversionForm, FormPart};
pub use server::{ConvertServer, router};
