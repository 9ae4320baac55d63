//! Decoding of selected image bytes into displayable RGBA pixels.

/// A decoded preview: RGBA8 pixels ready for a GPU texture upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl PreviewImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Unmultiplied RGBA8 pixels, row-major, `width * height * 4` bytes.
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

/// Decodes raw image bytes. Format is sniffed from the content, so the
/// selection's file name plays no part here.
pub fn decode(bytes: &[u8]) -> Result<PreviewImage, image::ImageError> {
    let image = image::load_from_memory(bytes)?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(PreviewImage {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([180, 200, 120, 255]));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn decodes_png_to_rgba_pixels() {
        let preview = decode(&png_bytes(6, 4)).unwrap();
        assert_eq!(preview.width(), 6);
        assert_eq!(preview.height(), 4);
        assert_eq!(preview.rgba().len(), 6 * 4 * 4);
    }

    #[test]
    fn rejects_bytes_that_are_not_an_image() {
        assert!(decode(b"definitely not an image").is_err());
    }
}
