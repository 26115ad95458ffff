use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

use super::params::DEFAULT_JPEG_QUALITY;
use super::transform::{OutputEncoding, TransformResult};

#[derive(Debug, Error)]
#[error("could not encode image as {format}: {source}")]
pub struct EncodeError {
    format: &'static str,
    #[source]
    source: image::ImageError,
}

/// Serialized response body and its content type.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Bytes,
    pub content_type: mime::Mime,
}

impl OutputEncoding {
    pub fn content_type(&self) -> mime::Mime {
        match self {
            OutputEncoding::Jpeg { .. } => mime::IMAGE_JPEG,
            OutputEncoding::Png => mime::IMAGE_PNG,
        }
    }
}

pub fn encode(result: &TransformResult) -> Result<EncodedImage, EncodeError> {
    let bytes = match result.encoding {
        OutputEncoding::Jpeg { quality } => {
            encode_jpeg(&result.image, quality.unwrap_or(DEFAULT_JPEG_QUALITY))?
        }
        OutputEncoding::Png => encode_png(&result.image)?,
    };

    Ok(EncodedImage {
        bytes: Bytes::from(bytes),
        content_type: result.encoding.content_type(),
    })
}

// JPEG has no alpha channel, so the buffer is flattened to RGB8 first.
fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();

    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(&rgb)
        .map_err(|source| EncodeError {
            format: "jpeg",
            source,
        })?;

    Ok(buffer)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|source| EncodeError {
            format: "png",
            source,
        })?;

    Ok(buffer.into_inner())
}
