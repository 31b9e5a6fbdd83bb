//! Fixtures for loader and pipeline tests.

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose};
use image::{ImageFormat, Rgba, RgbaImage};

/// PNG bytes for a solid `width` x `height` image.
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([89, 129, 216, 255]));
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("encode test PNG");
    cursor.into_inner()
}

/// Inline data URI carrying a solid PNG.
pub(crate) fn png_data_uri(width: u32, height: u32) -> String {
    format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(png_bytes(width, height))
    )
}
