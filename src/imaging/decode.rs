use std::io::Cursor;

use image::{DynamicImage, ImageFormat, ImageReader};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("could not decode image: {0}")]
    Unsupported(String),
    #[error("could not decode image: image has zero width or height")]
    Empty,
}

/// An uploaded image decoded into memory, together with the encoding it
/// arrived in.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixels: DynamicImage,
    source_format: ImageFormat,
}

impl DecodedImage {
    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> DynamicImage {
        self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn source_format(&self) -> ImageFormat {
        self.source_format
    }

    /// Lowercase name of the source encoding, e.g. "jpeg" or "png".
    pub fn source_format_name(&self) -> &'static str {
        format_name(self.source_format)
    }
}

pub fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        _ => "unknown",
    }
}

/// Decodes raw upload bytes, sniffing the format from the content itself.
pub fn decode(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

    let source_format = reader
        .format()
        .ok_or_else(|| DecodeError::Unsupported("image: unknown format".to_string()))?;

    let pixels = reader
        .decode()
        .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(DecodeError::Empty);
    }

    tracing::debug!(
        format = format_name(source_format),
        width = pixels.width(),
        height = pixels.height(),
        "Decoded upload"
    );

    Ok(DecodedImage {
        pixels,
        source_format,
    })
}
