// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: page assembly and password encryption.

pub mod encrypt;
pub mod writer;

pub use encrypt::encrypt_document;
pub use writer::{AssembledDocument, PdfWriter};
