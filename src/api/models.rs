//! Response bodies for the JSON parts of the API.
//!
//! Transform endpoints answer with raw image bytes; only errors and the
//! liveness check are JSON.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::observability::OperationSnapshot;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub operations: BTreeMap<&'static str, OperationSnapshot>,
}
