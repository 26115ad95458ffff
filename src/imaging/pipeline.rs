//! Per-request orchestration: resolve, dispatch, encode.
//!
//! Extraction happens before this module is reached (see
//! `api::upload::ImageUpload`), so [`execute`] starts from an already
//! decoded image. Every stage either produces a new value or fails, and a
//! failure ends the request.

use std::fmt;

use thiserror::Error;

use super::decode::DecodedImage;
use super::encode::{self, EncodeError, EncodedImage};
use super::params::{self, OperationParameters, ParamError, QueryParams};
use super::transform::{self, DispatchError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Parameter(#[from] ParamError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Resize,
    Compress,
    Convert,
    Flip,
    Rotate,
    Crop,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Resize,
        Operation::Compress,
        Operation::Convert,
        Operation::Flip,
        Operation::Rotate,
        Operation::Crop,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Resize => "resize",
            Operation::Compress => "compress",
            Operation::Convert => "convert",
            Operation::Flip => "flip",
            Operation::Rotate => "rotate",
            Operation::Crop => "crop",
        }
    }

    pub fn resolve(&self, query: &QueryParams) -> Result<OperationParameters, ParamError> {
        match self {
            Operation::Resize => Ok(params::resolve_resize(query)),
            Operation::Compress => Ok(params::resolve_compress(query)),
            Operation::Convert => params::resolve_convert(query),
            Operation::Flip => params::resolve_flip(query),
            Operation::Rotate => params::resolve_rotate(query),
            Operation::Crop => params::resolve_crop(query),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn execute(
    operation: Operation,
    image: DecodedImage,
    query: &QueryParams,
) -> Result<EncodedImage, PipelineError> {
    let params = operation.resolve(query)?;
    tracing::debug!(%operation, %params, "Resolved parameters");

    let transformed = transform::apply(image, &params)?;
    let encoded = encode::encode(&transformed)?;

    tracing::debug!(
        %operation,
        content_type = %encoded.content_type,
        bytes = encoded.bytes.len(),
        "Encoded result"
    );

    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::decode::{decode, fixtures};
    use image::ImageFormat;

    fn png(width: u32, height: u32) -> DecodedImage {
        decode(&fixtures::encoded(&fixtures::gradient(width, height), ImageFormat::Png)).unwrap()
    }

    fn query(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_every_operation_has_unique_name() {
        let mut names: Vec<_> = Operation::ALL.iter().map(Operation::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Operation::ALL.len());
    }

    #[test]
    fn test_convert_to_png() {
        let out = execute(Operation::Convert, png(10, 10), &query(&[("format", "png")])).unwrap();
        assert_eq!(out.content_type, mime::IMAGE_PNG);
        assert_eq!(decode(&out.bytes).unwrap().width(), 10);
    }

    #[test]
    fn test_parameter_failure_short_circuits() {
        let err = execute(Operation::Rotate, png(10, 10), &query(&[("angle", "45")])).unwrap_err();
        assert!(matches!(err, PipelineError::Parameter(_)));
    }

    #[test]
    fn test_dispatch_failure_short_circuits() {
        let err = execute(
            Operation::Crop,
            png(10, 10),
            &query(&[("x", "0"), ("y", "0"), ("width", "11"), ("height", "1")]),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Dispatch(_)));
    }

    #[test]
    fn test_compress_never_fails_on_bad_quality() {
        let fallback = execute(Operation::Compress, png(16, 16), &query(&[("quality", "abc")])).unwrap();
        let default = execute(Operation::Compress, png(16, 16), &query(&[("quality", "75")])).unwrap();
        assert_eq!(fallback.bytes, default.bytes);
        assert_eq!(fallback.content_type, mime::IMAGE_JPEG);
    }
}
