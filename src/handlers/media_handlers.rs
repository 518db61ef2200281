//! HTTP handlers for image ingestion, listing and media download.
//! Multipart parsing stays here; the upload sequencing lives in
//! `UploadCoordinator`.

use crate::{
    errors::AppError,
    models::media_asset::{ImagePayload, MediaAsset},
    services::upload_coordinator::IngestRequest,
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Success envelope shared by the JSON endpoints.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// `POST /api/images`: multipart `title`, `description`, `image`.
///
/// The whole form is read before anything is stored, so malformed or
/// incomplete submissions never reach the object store.
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let request = read_ingest_form(multipart).await?;
    let asset = state.coordinator.ingest(request).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(asset)))
}

/// `GET /api/images`: every image, newest first.
pub async fn list_images(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<MediaAsset>>>, AppError> {
    let assets = state.listing.list_recent().await?;
    Ok(ApiResponse::ok(assets))
}

/// `GET /media/{*object_id}`: stream a stored binary back.
///
/// Objects are served from the API's own origin, so every response is
/// sandboxed and never sniffed. SVG may carry script and is only ever
/// offered as a download.
pub async fn get_media(
    State(state): State<AppState>,
    Path(object_id): Path<String>,
) -> Result<Response, AppError> {
    let (file, len, content_type) = state.objects.open(&object_id).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("sandbox; default-src 'none'"),
    );
    if content_type == "image/svg+xml" {
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment"),
        );
    }
    *response.status_mut() = StatusCode::OK;
    Ok(response)
}

/// Collect the ingest form fields, buffering the image in memory.
///
/// Unknown fields are skipped. An `image` field must be a file part (carry a
/// filename attribute) and may appear only once.
async fn read_ingest_form(mut multipart: Multipart) -> Result<IngestRequest, AppError> {
    let mut request = IngestRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => request.title = Some(field.text().await?),
            Some("description") => request.description = Some(field.text().await?),
            Some("image") => {
                if request.image.is_some() {
                    return Err(invalid("more than one image file provided"));
                }
                let Some(filename) = field.file_name().map(str::to_string) else {
                    return Err(invalid("image field is not a file"));
                };
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                debug!(%filename, size = bytes.len(), "received image part");

                request.image = Some(ImagePayload {
                    filename: Some(filename).filter(|f| !f.is_empty()),
                    content_type,
                    bytes,
                });
            }
            other => debug!("ignoring multipart field {:?}", other),
        }
    }

    Ok(request)
}

/// Form-shape problems; a missing or empty image is the coordinator's call.
fn invalid(reason: &str) -> AppError {
    AppError::bad_request("Invalid upload request").with_detail(reason)
}
