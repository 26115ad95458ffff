//! Query-string parameter resolution.
//!
//! Every operation has its own resolver. Resize and Compress always succeed,
//! falling back to defaults for anything missing or malformed. Convert, Flip,
//! Rotate and Crop select between discrete choices and reject anything they do
//! not recognise.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

pub const DEFAULT_RESIZE_WIDTH: u32 = 500;
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("Invalid or missing '{name}' parameter. Supported: {accepted}")]
    Invalid {
        name: &'static str,
        accepted: &'static str,
    },
    #[error("Invalid or missing '{0}' parameter. Must be an integer.")]
    Missing(&'static str),
    #[error("Invalid '{name}' parameter '{value}'. {reason}")]
    OutOfRange {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl ParamError {
    /// Name of the offending query parameter.
    pub fn parameter(&self) -> &'static str {
        match self {
            ParamError::Invalid { name, .. } => name,
            ParamError::Missing(name) => name,
            ParamError::OutOfRange { name, .. } => name,
        }
    }
}

/// Raw query parameters of a single request. Only the first value of a
/// repeated key is kept.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self(params)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.parse::<i64>().ok())
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HashMap::new();
        for (k, v) in iter {
            map.entry(k.into()).or_insert_with(|| v.into());
        }
        Self(map)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Jpeg,
    Png,
}

impl TargetFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpeg",
            TargetFormat::Png => "png",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

/// Fully validated, fully defaulted parameters for one operation.
///
/// Variants are `non_exhaustive` so that values can only be built by the
/// resolvers in this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationParameters {
    /// Zero in either dimension means "derive from the aspect ratio".
    /// Never both zero.
    #[non_exhaustive]
    Resize { width: u32, height: u32 },
    #[non_exhaustive]
    Compress { quality: u8 },
    #[non_exhaustive]
    Convert { format: TargetFormat },
    #[non_exhaustive]
    Flip { axis: FlipAxis },
    #[non_exhaustive]
    Rotate { rotation: Rotation },
    #[non_exhaustive]
    Crop {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

impl fmt::Display for OperationParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationParameters::Resize { width, height } => {
                write!(f, "width={width} height={height}")
            }
            OperationParameters::Compress { quality } => write!(f, "quality={quality}"),
            OperationParameters::Convert { format } => write!(f, "format={}", format.as_str()),
            OperationParameters::Flip { axis } => write!(f, "direction={axis:?}"),
            OperationParameters::Rotate { rotation } => {
                write!(f, "angle={}", rotation.degrees())
            }
            OperationParameters::Crop {
                x,
                y,
                width,
                height,
            } => write!(f, "x={x} y={y} width={width} height={height}"),
        }
    }
}

pub fn resolve_resize(query: &QueryParams) -> OperationParameters {
    let dimension = |key| {
        query
            .integer(key)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0)
    };

    let mut width = dimension("width");
    let height = dimension("height");

    if width == 0 && height == 0 {
        width = DEFAULT_RESIZE_WIDTH;
    }

    OperationParameters::Resize { width, height }
}

pub fn resolve_compress(query: &QueryParams) -> OperationParameters {
    let quality = query
        .integer("quality")
        .filter(|q| (1..=100).contains(q))
        .and_then(|q| u8::try_from(q).ok())
        .unwrap_or(DEFAULT_JPEG_QUALITY);

    OperationParameters::Compress { quality }
}

pub fn resolve_convert(query: &QueryParams) -> Result<OperationParameters, ParamError> {
    let format = match query.get("format") {
        Some("jpeg") | Some("jpg") => TargetFormat::Jpeg,
        Some("png") => TargetFormat::Png,
        _ => {
            return Err(ParamError::Invalid {
                name: "format",
                accepted: "jpeg, png",
            });
        }
    };

    Ok(OperationParameters::Convert { format })
}

pub fn resolve_flip(query: &QueryParams) -> Result<OperationParameters, ParamError> {
    let axis = match query.get("direction") {
        Some("horizontal") => FlipAxis::Horizontal,
        Some("vertical") => FlipAxis::Vertical,
        _ => {
            return Err(ParamError::Invalid {
                name: "direction",
                accepted: "horizontal, vertical",
            });
        }
    };

    Ok(OperationParameters::Flip { axis })
}

pub fn resolve_rotate(query: &QueryParams) -> Result<OperationParameters, ParamError> {
    let invalid = ParamError::Invalid {
        name: "angle",
        accepted: "90, 180, 270",
    };

    let rotation = match query.integer("angle") {
        Some(90) => Rotation::Deg90,
        Some(180) => Rotation::Deg180,
        Some(270) => Rotation::Deg270,
        _ => return Err(invalid),
    };

    Ok(OperationParameters::Rotate { rotation })
}

pub fn resolve_crop(query: &QueryParams) -> Result<OperationParameters, ParamError> {
    let x = crop_field(query, "x", false)?;
    let y = crop_field(query, "y", false)?;
    let width = crop_field(query, "width", true)?;
    let height = crop_field(query, "height", true)?;

    Ok(OperationParameters::Crop {
        x,
        y,
        width,
        height,
    })
}

fn crop_field(query: &QueryParams, name: &'static str, positive: bool) -> Result<u32, ParamError> {
    let raw = query.get(name).ok_or(ParamError::Missing(name))?;
    let value: i64 = raw.parse().map_err(|_| ParamError::Missing(name))?;

    let out_of_range = |reason| ParamError::OutOfRange {
        name,
        value: raw.to_string(),
        reason,
    };

    if positive && value <= 0 {
        return Err(out_of_range("Must be greater than zero."));
    }
    if value < 0 {
        return Err(out_of_range("Must not be negative."));
    }

    u32::try_from(value).map_err(|_| out_of_range("Value is too large."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_resize_explicit_dimensions() {
        let params = resolve_resize(&query(&[("width", "5"), ("height", "7")]));
        assert_eq!(params, OperationParameters::Resize { width: 5, height: 7 });
    }

    #[test]
    fn test_resize_defaults_width_when_both_missing() {
        let params = resolve_resize(&QueryParams::default());
        assert_eq!(
            params,
            OperationParameters::Resize {
                width: DEFAULT_RESIZE_WIDTH,
                height: 0
            }
        );
    }

    #[test]
    fn test_resize_garbage_treated_as_zero() {
        let params = resolve_resize(&query(&[("width", "abc"), ("height", "-3")]));
        assert_eq!(
            params,
            OperationParameters::Resize {
                width: DEFAULT_RESIZE_WIDTH,
                height: 0
            }
        );

        let params = resolve_resize(&query(&[("width", "wide"), ("height", "40")]));
        assert_eq!(params, OperationParameters::Resize { width: 0, height: 40 });
    }

    #[test]
    fn test_compress_quality() {
        assert_eq!(
            resolve_compress(&query(&[("quality", "30")])),
            OperationParameters::Compress { quality: 30 }
        );
        assert_eq!(
            resolve_compress(&query(&[("quality", "1")])),
            OperationParameters::Compress { quality: 1 }
        );
        assert_eq!(
            resolve_compress(&query(&[("quality", "100")])),
            OperationParameters::Compress { quality: 100 }
        );
    }

    #[test]
    fn test_compress_falls_back_to_default() {
        for raw in ["0", "101", "256", "-5", "high", ""] {
            assert_eq!(
                resolve_compress(&query(&[("quality", raw)])),
                OperationParameters::Compress {
                    quality: DEFAULT_JPEG_QUALITY
                },
                "quality={raw}"
            );
        }
        assert_eq!(
            resolve_compress(&QueryParams::default()),
            OperationParameters::Compress {
                quality: DEFAULT_JPEG_QUALITY
            }
        );
    }

    #[test]
    fn test_convert_formats() {
        for (raw, expected) in [
            ("jpeg", TargetFormat::Jpeg),
            ("jpg", TargetFormat::Jpeg),
            ("png", TargetFormat::Png),
        ] {
            assert_eq!(
                resolve_convert(&query(&[("format", raw)])).unwrap(),
                OperationParameters::Convert { format: expected }
            );
        }
    }

    #[test]
    fn test_convert_rejects_unknown_and_missing() {
        for raw in ["gif", "PNG", "Jpeg", ""] {
            let err = resolve_convert(&query(&[("format", raw)])).unwrap_err();
            assert_eq!(err.parameter(), "format");
        }
        let err = resolve_convert(&QueryParams::default()).unwrap_err();
        assert!(err.to_string().contains("jpeg, png"));
    }

    #[test]
    fn test_flip_directions() {
        assert_eq!(
            resolve_flip(&query(&[("direction", "horizontal")])).unwrap(),
            OperationParameters::Flip {
                axis: FlipAxis::Horizontal
            }
        );
        assert_eq!(
            resolve_flip(&query(&[("direction", "vertical")])).unwrap(),
            OperationParameters::Flip {
                axis: FlipAxis::Vertical
            }
        );
        assert!(resolve_flip(&query(&[("direction", "diagonal")])).is_err());
        assert!(resolve_flip(&QueryParams::default()).is_err());
    }

    #[test]
    fn test_rotate_angles() {
        for (raw, degrees) in [("90", 90), ("180", 180), ("270", 270)] {
            match resolve_rotate(&query(&[("angle", raw)])).unwrap() {
                OperationParameters::Rotate { rotation } => assert_eq!(rotation.degrees(), degrees),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_rotate_rejects_other_values() {
        for raw in ["45", "0", "360", "-90", "ninety"] {
            let err = resolve_rotate(&query(&[("angle", raw)])).unwrap_err();
            assert_eq!(err.parameter(), "angle", "angle={raw}");
        }
        assert!(resolve_rotate(&QueryParams::default()).is_err());
    }

    #[test]
    fn test_crop_all_fields() {
        let params = resolve_crop(&query(&[
            ("x", "2"),
            ("y", "3"),
            ("width", "5"),
            ("height", "6"),
        ]))
        .unwrap();
        assert_eq!(
            params,
            OperationParameters::Crop {
                x: 2,
                y: 3,
                width: 5,
                height: 6
            }
        );
    }

    #[test]
    fn test_crop_names_missing_field() {
        let err = resolve_crop(&query(&[("x", "0"), ("y", "0"), ("width", "5")])).unwrap_err();
        assert_eq!(err, ParamError::Missing("height"));

        let err = resolve_crop(&query(&[("x", "a"), ("y", "0"), ("width", "5"), ("height", "5")]))
            .unwrap_err();
        assert_eq!(err.parameter(), "x");
    }

    #[test]
    fn test_crop_rejects_non_positive_size_and_negative_origin() {
        let err = resolve_crop(&query(&[("x", "0"), ("y", "0"), ("width", "0"), ("height", "5")]))
            .unwrap_err();
        assert_eq!(err.parameter(), "width");

        let err = resolve_crop(&query(&[("x", "0"), ("y", "-1"), ("width", "3"), ("height", "5")]))
            .unwrap_err();
        assert_eq!(err.parameter(), "y");
    }

    #[test]
    fn test_query_keeps_first_value() {
        let q = query(&[("format", "png"), ("format", "gif")]);
        assert_eq!(q.get("format"), Some("png"));
    }
}
