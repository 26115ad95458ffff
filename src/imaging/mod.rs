//! Image transformation core, independent of the HTTP layer.

pub mod decode;
pub mod encode;
pub mod params;
pub mod pipeline;
pub mod transform;

pub use decode::{DecodeError, DecodedImage, decode};
pub use encode::{EncodeError, EncodedImage};
pub use params::{OperationParameters, ParamError, QueryParams};
pub use pipeline::{Operation, PipelineError, execute};
pub use transform::{DispatchError, OutputEncoding, TransformResult};
