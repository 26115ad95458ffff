use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tracing::Instrument;
use uuid::Uuid;

use super::{error::ApiError, models::HealthResponse, state::AppState, upload::ImageUpload};
use crate::imaging::{self, Operation, QueryParams};

type RawQuery = Query<Vec<(String, String)>>;
type Upload = Result<ImageUpload, ApiError>;

/// Resize endpoint (POST /resize?width=&height=)
pub async fn resize(
    State(state): State<AppState>,
    Query(query): RawQuery,
    upload: Upload,
) -> Result<Response, ApiError> {
    transform(&state, Operation::Resize, query, upload).await
}

/// JPEG recompression endpoint (POST /compress?quality=)
pub async fn compress(
    State(state): State<AppState>,
    Query(query): RawQuery,
    upload: Upload,
) -> Result<Response, ApiError> {
    transform(&state, Operation::Compress, query, upload).await
}

/// Format conversion endpoint (POST /convert?format=jpeg|jpg|png)
pub async fn convert(
    State(state): State<AppState>,
    Query(query): RawQuery,
    upload: Upload,
) -> Result<Response, ApiError> {
    transform(&state, Operation::Convert, query, upload).await
}

/// Flip endpoint (POST /flip?direction=horizontal|vertical)
pub async fn flip(
    State(state): State<AppState>,
    Query(query): RawQuery,
    upload: Upload,
) -> Result<Response, ApiError> {
    transform(&state, Operation::Flip, query, upload).await
}

/// Rotate endpoint (POST /rotate?angle=90|180|270)
pub async fn rotate(
    State(state): State<AppState>,
    Query(query): RawQuery,
    upload: Upload,
) -> Result<Response, ApiError> {
    transform(&state, Operation::Rotate, query, upload).await
}

/// Crop endpoint (POST /crop?x=&y=&width=&height=)
pub async fn crop(
    State(state): State<AppState>,
    Query(query): RawQuery,
    upload: Upload,
) -> Result<Response, ApiError> {
    transform(&state, Operation::Crop, query, upload).await
}

/// Shared request flow for every transform endpoint.
///
/// The upload has already been extracted (or rejected) by the time this
/// runs; the rest of the pipeline executes inline on the request task.
async fn transform(
    state: &AppState,
    operation: Operation,
    query: Vec<(String, String)>,
    upload: Upload,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("transform", %operation, %request_id);

    async move {
        let result = upload.and_then(|upload| {
            let bytes_in = upload.size;
            tracing::info!(
                file_name = upload.file_name.as_deref().unwrap_or(""),
                source_format = upload.image.source_format_name(),
                width = upload.image.width(),
                height = upload.image.height(),
                bytes = bytes_in,
                "Processing upload"
            );
            let query: QueryParams = query.into_iter().collect();
            imaging::execute(operation, upload.image, &query)
                .map(|encoded| (bytes_in, encoded))
                .map_err(ApiError::from)
        });

        match result {
            Ok((bytes_in, encoded)) => {
                state
                    .metrics
                    .transform_succeeded(operation, bytes_in, encoded.bytes.len());
                tracing::info!(
                    content_type = %encoded.content_type,
                    bytes = encoded.bytes.len(),
                    "Transform complete"
                );

                let headers = [(header::CONTENT_TYPE, encoded.content_type.to_string())];
                Ok((StatusCode::OK, headers, encoded.bytes).into_response())
            }
            Err(err) => {
                state.metrics.transform_failed(operation);
                if err.status_code().is_server_error() {
                    tracing::error!(error = %err, "Transform failed");
                } else {
                    tracing::warn!(error = %err, code = err.code(), "Transform rejected");
                }
                Err(err)
            }
        }
    }
    .instrument(span)
    .await
}

/// Health check endpoint (GET /health)
///
/// Always 200 while the process is serving; includes per-operation counters.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        operations: state.metrics.snapshot().operations,
    };

    (StatusCode::OK, Json(response))
}

/// Fallback for unknown paths
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
