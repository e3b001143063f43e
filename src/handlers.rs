//! Endpoint handlers for the admin API.
//!
//! Each handler is a plain function from its injected collaborators and a
//! parsed request to a `(StatusCode, JSON body)` pair. They carry no HTTP
//! server of their own; the CLI calls them directly and any server layer can
//! forward requests to them unchanged.
//!
//! | Handler | Request | Success |
//! |---------|---------|---------|
//! | [`revalidate_paths`] | `{"paths": [..]}` | `{"revalidated": true, "paths": [..], "now": ms}` |
//! | [`revalidate_tag`] | `{"tag": ".."}` | `{"revalidated": true, "now": ms}` |
//! | [`upload_audio`] | file + `recording_id` | `{"file_url", "file_path", "file_name"}` |
//!
//! Every handler checks the bearer token first. Failures are logged with
//! their context and answered with a fixed, generic error body.

use crate::auth::SessionVerifier;
use crate::invalidation::Invalidator;
use crate::uploads::{ObjectStore, Rejection, UploadLimits, is_valid_recording_id, object_path};
use chrono::Utc;
use http::StatusCode;
use serde_json::{Value, json};
use thiserror::Error;

pub type HandlerResponse = (StatusCode, Value);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    UploadRejected(Rejection),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UploadRejected(Rejection::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UploadRejected(Rejection::NotAudio) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> Value {
        json!({ "error": self.to_string() })
    }

    pub fn into_response(self) -> HandlerResponse {
        (self.status_code(), self.body())
    }
}

/// One uploaded file from a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// The audio upload form. Either field may be missing from the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioUploadForm {
    pub file: Option<UploadedFile>,
    pub recording_id: Option<String>,
}

/// Parse a raw request body. Anything that is not JSON reads as `null`,
/// which every handler treats as a missing field.
pub fn parse_body(raw: &[u8]) -> Value {
    serde_json::from_slice(raw).unwrap_or(Value::Null)
}

fn authorize(verifier: &dyn SessionVerifier, bearer: Option<&str>, op: &str) -> Result<(), ApiError> {
    let token = bearer
        .map(|b| {
            let b = b.trim();
            b.strip_prefix("Bearer ").unwrap_or(b).trim()
        })
        .filter(|t| !t.is_empty());
    match token.and_then(|t| verifier.verify(t)) {
        Some(_) => Ok(()),
        None => {
            tracing::warn!(op, "unauthorized request");
            Err(ApiError::Unauthorized)
        }
    }
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value?
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(String::from))
        .collect()
}

/// Invalidate a list of public paths.
pub fn revalidate_paths(
    verifier: &dyn SessionVerifier,
    invalidator: &dyn Invalidator,
    bearer: Option<&str>,
    body: &Value,
) -> HandlerResponse {
    if let Err(e) = authorize(verifier, bearer, "revalidate_paths") {
        return e.into_response();
    }
    let Some(paths) = string_list(body.get("paths")) else {
        return ApiError::BadRequest("Paths array is required".into()).into_response();
    };
    if let Err(e) = invalidator.invalidate_paths(&paths) {
        tracing::error!(op = "revalidate_paths", paths = ?paths, error = %e, "revalidation failed");
        return ApiError::Internal("Failed to revalidate".into()).into_response();
    }
    (
        StatusCode::OK,
        json!({
            "revalidated": true,
            "paths": paths,
            "now": Utc::now().timestamp_millis(),
        }),
    )
}

/// Invalidate every page carrying a cache tag.
pub fn revalidate_tag(
    verifier: &dyn SessionVerifier,
    invalidator: &dyn Invalidator,
    bearer: Option<&str>,
    body: &Value,
) -> HandlerResponse {
    if let Err(e) = authorize(verifier, bearer, "revalidate_tag") {
        return e.into_response();
    }
    let Some(tag) = body
        .get("tag")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
    else {
        return ApiError::BadRequest("Tag is required".into()).into_response();
    };
    if let Err(e) = invalidator.invalidate_tag(tag) {
        tracing::error!(op = "revalidate_tag", tag, error = %e, "revalidation failed");
        return ApiError::Internal("Failed to revalidate".into()).into_response();
    }
    (
        StatusCode::OK,
        json!({ "revalidated": true, "now": Utc::now().timestamp_millis() }),
    )
}

/// Store an uploaded recording and return where it can be fetched.
pub fn upload_audio(
    verifier: &dyn SessionVerifier,
    objects: &dyn ObjectStore,
    limits: &UploadLimits,
    bearer: Option<&str>,
    form: &AudioUploadForm,
) -> HandlerResponse {
    if let Err(e) = authorize(verifier, bearer, "upload_audio") {
        return e.into_response();
    }
    let recording_id = form
        .recording_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let (Some(file), Some(recording_id)) = (&form.file, recording_id) else {
        return ApiError::BadRequest("Missing file or recording_id".into()).into_response();
    };
    if !is_valid_recording_id(recording_id) {
        tracing::warn!(op = "upload_audio", recording_id, "invalid recording id");
        return ApiError::BadRequest("Invalid recording_id".into()).into_response();
    }

    if let Err(rejection) = limits.validate(&file.content_type, file.bytes.len() as u64) {
        tracing::warn!(
            op = "upload_audio",
            recording_id,
            file_name = %file.file_name,
            content_type = %file.content_type,
            %rejection,
            "upload rejected"
        );
        return ApiError::UploadRejected(rejection).into_response();
    }

    let path = object_path(recording_id, &file.file_name, Utc::now().timestamp_millis());
    if let Err(e) = objects.put(&path, &file.bytes, &file.content_type) {
        tracing::error!(op = "upload_audio", recording_id, path = %path, error = %e, "upload failed");
        return ApiError::Internal("Upload failed".into()).into_response();
    }
    (
        StatusCode::OK,
        json!({
            "file_url": objects.public_url(&path),
            "file_path": path,
            "file_name": file.file_name,
        }),
    )
}
