use crate::services::{
    listing_service::ListingError, object_store::ObjectStoreError,
    upload_coordinator::IngestError,
};
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// The one error type handlers return.
///
/// `message` is the human-readable summary shown to callers; `detail`
/// carries the underlying cause when there is one.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub detail: Option<String>,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl fmt::Display) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.message, detail),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "message": self.message,
            "error": self.detail,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

/// `InvalidRequest` only arises for a missing or empty image.
/// Both upload failure modes share one message: callers cannot tell an
/// orphaned upload from a failed one.
impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::InvalidRequest(reason) => {
                AppError::bad_request("No image file provided").with_detail(reason)
            }
            IngestError::StoreUploadFailed(source) => {
                tracing::error!("image upload failed: {}", source);
                AppError::internal("Error uploading image").with_detail(source)
            }
            IngestError::MetadataCommitFailed { source, .. } => {
                tracing::error!("image metadata commit failed: {}", source);
                AppError::internal("Error uploading image").with_detail(source)
            }
        }
    }
}

impl From<ListingError> for AppError {
    fn from(err: ListingError) -> Self {
        let ListingError::StoreUnavailable(source) = err;
        tracing::error!("image listing failed: {}", source);
        AppError::internal("Error fetching images").with_detail(source)
    }
}

impl From<ObjectStoreError> for AppError {
    fn from(err: ObjectStoreError) -> Self {
        match err {
            ObjectStoreError::NotFound(_) => AppError::not_found("Media not found"),
            err @ ObjectStoreError::InvalidObjectId(_) => {
                AppError::bad_request("Invalid media id").with_detail(err)
            }
            other => AppError::internal("Error reading media").with_detail(other),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
            "Request payload too large"
        } else {
            "Malformed multipart request"
        };
        AppError::new(status, message).with_detail(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::metadata_store::MetadataError;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn invalid_request_maps_to_400_envelope() {
        let err: AppError = IngestError::InvalidRequest("no image file provided".into()).into();
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "No image file provided");
        assert_eq!(body["error"], "no image file provided");
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn upload_failures_are_indistinguishable_500s() {
        let upload: AppError =
            IngestError::StoreUploadFailed(ObjectStoreError::Io(std::io::Error::other("quota")))
                .into();
        let commit: AppError = IngestError::MetadataCommitFailed {
            storage_object_id: "page-img/x.png".into(),
            source: MetadataError::Unavailable("down".into()),
        }
        .into();

        let (s1, b1) = body_json(upload).await;
        let (s2, b2) = body_json(commit).await;
        assert_eq!(s1, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(s2, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(b1["message"], b2["message"]);
        assert_eq!(b1["message"], "Error uploading image");
    }

    #[tokio::test]
    async fn listing_failure_maps_to_500() {
        let err: AppError =
            ListingError::StoreUnavailable(MetadataError::Unavailable("down".into())).into();
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Error fetching images");
    }

    #[test]
    fn missing_media_maps_to_404() {
        let err: AppError = ObjectStoreError::NotFound("page-img/x.png".into()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(err.detail.is_none());
    }
}
