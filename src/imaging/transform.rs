use image::{DynamicImage, imageops::FilterType};
use thiserror::Error;

use super::decode::DecodedImage;
use super::params::{FlipAxis, OperationParameters, Rotation, TargetFormat};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(
        "crop rectangle {width}x{height} at ({x}, {y}) exceeds image bounds {image_width}x{image_height}"
    )]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },
    #[error("resize target {width}x{height} exceeds encoder limits")]
    TooLarge { width: u32, height: u32 },
}

/// Largest side a JPEG can carry.
const MAX_JPEG_SIDE: u32 = 65_535;
/// Bytes per pixel in the resampler's f32 RGBA scratch buffer.
const RESAMPLE_BYTES_PER_PIXEL: u64 = 16;

/// Encoding the response body must use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    /// `None` uses the codec default quality.
    Jpeg { quality: Option<u8> },
    Png,
}

/// Transformed pixels plus the encoding they are to be served in.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub image: DynamicImage,
    pub encoding: OutputEncoding,
}

/// Applies the resolved operation to the decoded image.
pub fn apply(
    source: DecodedImage,
    params: &OperationParameters,
) -> Result<TransformResult, DispatchError> {
    let default_jpeg = OutputEncoding::Jpeg { quality: None };

    let result = match *params {
        OperationParameters::Resize { width, height } => {
            let (w, h) = target_dimensions(source.width(), source.height(), width, height);
            check_resize_target(source.width(), w, h)?;
            tracing::debug!(
                from_width = source.width(),
                from_height = source.height(),
                to_width = w,
                to_height = h,
                "Resizing image"
            );
            TransformResult {
                image: source.pixels().resize_exact(w, h, FilterType::Lanczos3),
                encoding: default_jpeg,
            }
        }
        OperationParameters::Compress { quality } => TransformResult {
            image: source.into_pixels(),
            encoding: OutputEncoding::Jpeg {
                quality: Some(quality),
            },
        },
        OperationParameters::Convert { format } => TransformResult {
            image: source.into_pixels(),
            encoding: match format {
                TargetFormat::Jpeg => default_jpeg,
                TargetFormat::Png => OutputEncoding::Png,
            },
        },
        OperationParameters::Flip { axis } => {
            let image = match axis {
                FlipAxis::Horizontal => source.pixels().fliph(),
                FlipAxis::Vertical => source.pixels().flipv(),
            };
            TransformResult {
                image,
                encoding: default_jpeg,
            }
        }
        OperationParameters::Rotate { rotation } => {
            let image = match rotation {
                Rotation::Deg90 => source.pixels().rotate90(),
                Rotation::Deg180 => source.pixels().rotate180(),
                Rotation::Deg270 => source.pixels().rotate270(),
            };
            TransformResult {
                image,
                encoding: default_jpeg,
            }
        }
        OperationParameters::Crop {
            x,
            y,
            width,
            height,
        } => {
            let (image_width, image_height) = (source.width(), source.height());
            let fits = u64::from(x) + u64::from(width) <= u64::from(image_width)
                && u64::from(y) + u64::from(height) <= u64::from(image_height);

            if !fits {
                return Err(DispatchError::OutOfBounds {
                    x,
                    y,
                    width,
                    height,
                    image_width,
                    image_height,
                });
            }

            TransformResult {
                image: source.pixels().crop_imm(x, y, width, height),
                encoding: default_jpeg,
            }
        }
    };

    Ok(result)
}

/// Rejects resize targets the JPEG encoder cannot represent, or whose
/// output or vertical resampling pass would not fit the decoder allocation
/// budget.
fn check_resize_target(src_width: u32, width: u32, height: u32) -> Result<(), DispatchError> {
    let budget = image::Limits::default().max_alloc.unwrap_or(u64::MAX);
    let output = u64::from(width) * u64::from(height) * 4;
    let scratch = u64::from(src_width) * u64::from(height) * RESAMPLE_BYTES_PER_PIXEL;

    if width > MAX_JPEG_SIDE || height > MAX_JPEG_SIDE || output.max(scratch) > budget {
        return Err(DispatchError::TooLarge { width, height });
    }
    Ok(())
}

/// Fills in a zero dimension from the source aspect ratio, rounding to the
/// nearest pixel and never going below one.
pub fn target_dimensions(src_width: u32, src_height: u32, width: u32, height: u32) -> (u32, u32) {
    let scaled = |num: u32, of: u32, per: u32| -> u32 {
        let value = (f64::from(num) * f64::from(of) / f64::from(per)).round();
        (value as u32).max(1)
    };

    match (width, height) {
        (0, 0) => (src_width, src_height),
        (0, h) => (scaled(h, src_width, src_height), h),
        (w, 0) => (w, scaled(w, src_height, src_width)),
        (w, h) => (w, h),
    }
}
