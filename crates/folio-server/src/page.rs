// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Upload form served on `GET /`.

use folio_core::types::PaperSize;

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Folio: images to PDF</title>
<style>
body { font-family: sans-serif; max-width: 40rem; margin: 2rem auto; }
label { display: block; margin-top: 1rem; }
</style>
</head>
<body>
<h1>Images to PDF</h1>
<form method="post" action="/" enctype="multipart/form-data">
<label>Images <input type="file" name="images" accept="image/*" multiple required></label>
<label>Order (comma-separated filenames) <input type="text" name="order"></label>
<label>Rotations (JSON, filename to degrees clockwise) <input type="text" name="rotations" placeholder='{"scan.jpg": 90}'></label>
<label>Aspect ratio <input type="text" name="aspect_ratio" value="original" placeholder="original or 16:9"></label>
<label>Resize mode
<select name="resize_mode"><option value="crop">crop</option><option value="pad">pad</option></select>
</label>
<label>Paper size
<select name="paper_size"><option value="fit">fit to image</option>"#;

const TAIL: &str = r#"</select>
</label>
<label>Compression quality (1-100) <input type="number" name="compress_ratio" min="1" max="100" value="100"></label>
<label>Password (optional) <input type="password" name="pdf_password"></label>
<p><button type="submit">Convert</button></p>
</form>
</body>
</html>
"#;

/// Render the upload form. Paper options come from [`PaperSize::ALL`].
pub fn upload_form() -> String {
    let mut html = String::with_capacity(HEAD.len() + TAIL.len() + 256);
    html.push_str(HEAD);
    for paper in PaperSize::ALL {
        let (width, height) = paper.dimensions_px();
        html.push_str(&format!(
            r#"<option value="{}">{} ({}x{} pt)</option>"#,
            paper.keyword(),
            paper.keyword(),
            width,
            height
        ));
    }
    html.push_str(TAIL);
    html
}
