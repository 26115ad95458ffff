//! Multipart upload extraction.
//!
//! [`ImageUpload`] is an axum extractor shared by every transform endpoint:
//! it enforces POST, pulls the `image` field out of a multipart form and
//! decodes it.

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::Method;
use bytes::Bytes;
use thiserror::Error;

use super::error::ApiError;
use crate::imaging::{DecodeError, DecodedImage, decode};

pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("only POST method is allowed")]
    MethodNotAllowed,
    #[error("form field 'image' is missing")]
    MissingFile,
    #[error("failed to parse multipart form: {0}")]
    Malformed(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// A decoded image taken from the `image` field of a multipart request.
#[derive(Debug)]
pub struct ImageUpload {
    pub image: DecodedImage,
    pub file_name: Option<String>,
    /// Size of the encoded upload in bytes.
    pub size: usize,
}

impl<S> FromRequest<S> for ImageUpload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        extract(req, state).await.map_err(ApiError::from)
    }
}

async fn extract<S>(req: Request, state: &S) -> Result<ImageUpload, ExtractionError>
where
    S: Send + Sync,
{
    if req.method() != Method::POST {
        return Err(ExtractionError::MethodNotAllowed);
    }

    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|rejection| ExtractionError::Malformed(rejection.body_text()))?;

    let (file_name, data) = read_image_field(&mut multipart).await?;

    tracing::debug!(size = data.len(), "Received upload");

    let image = decode(&data)?;

    Ok(ImageUpload {
        image,
        file_name,
        size: data.len(),
    })
}

async fn read_image_field(
    multipart: &mut Multipart,
) -> Result<(Option<String>, Bytes), ExtractionError> {
    let malformed = |e: axum::extract::multipart::MultipartError| {
        ExtractionError::Malformed(e.body_text())
    };

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        tracing::debug!(
            content_type = field.content_type().unwrap_or(""),
            "Reading image field"
        );
        let file_name = field.file_name().map(str::to_owned);
        let data = field.bytes().await.map_err(malformed)?;
        return Ok((file_name, data));
    }

    Err(ExtractionError::MissingFile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::decode::fixtures::{encoded, gradient};
    use axum::body::Body;
    use axum::http::header;
    use image::ImageFormat;

    const BOUNDARY: &str = "imagebox-upload-boundary";

    fn form_request(fields: &[(&str, Option<&str>, &[u8])]) -> Request {
        let mut body = Vec::new();
        for (name, file_name, data) in fields {
            let disposition = match file_name {
                Some(file_name) => format!("name=\"{name}\"; filename=\"{file_name}\""),
                None => format!("name=\"{name}\""),
            };
            body.extend_from_slice(
                format!("--{BOUNDARY}\r\nContent-Disposition: form-data; {disposition}\r\n\r\n")
                    .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/resize")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_extracts_image_field_metadata() {
        let png = encoded(&gradient(7, 3), ImageFormat::Png);
        let request = form_request(&[
            ("note", None, b"ignored".as_slice()),
            ("image", Some("photo.png"), png.as_slice()),
        ]);

        let upload = extract(request, &()).await.unwrap();
        assert_eq!(upload.file_name.as_deref(), Some("photo.png"));
        assert_eq!(upload.image.source_format_name(), "png");
        assert_eq!((upload.image.width(), upload.image.height()), (7, 3));
        assert_eq!(upload.size, png.len());
    }

    #[tokio::test]
    async fn test_missing_image_field() {
        let request = form_request(&[("file", Some("photo.png"), b"abc".as_slice())]);
        let err = extract(request, &()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::MissingFile));
    }
}
