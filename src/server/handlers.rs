//! API request handlers.

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::{debug, info};

use super::{
    error::ApiError,
    types::{ApiState, HealthResponse, UploadMenuResponse},
};
use crate::error::MenuScanError;
use crate::pipeline::input::{MenuKind, UploadedMenu};

/// Name of the multipart field carrying the menu file.
pub const MENU_FIELD: &str = "menu";

/// Upload endpoint handler.
///
/// POST /api/upload-menu
///
/// Accepts multipart form data with one file in the `menu` field. A file
/// whose content type is neither `application/pdf` nor `image/*` is
/// dropped, exactly as if it had not been sent. Other fields are ignored.
///
/// Request body size is capped by the router's limit layers (413 when
/// exceeded).
pub async fn upload_menu_handler(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<Json<UploadMenuResponse>, ApiError> {
    let mut upload: Option<UploadedMenu> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Multipart(e.to_string()))?
    {
        if field.name() != Some(MENU_FIELD) || upload.is_some() {
            continue;
        }

        let mime_type = field.content_type().unwrap_or("").to_string();
        let file_name = field.file_name().map(|s| s.to_string());
        if MenuKind::from_mime(&mime_type).is_none() {
            info!("Ignoring upload with unaccepted content type '{}'", mime_type);
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Multipart(e.to_string()))?;
        debug!("Read '{}' field: {} bytes of {}", MENU_FIELD, bytes.len(), mime_type);

        upload = Some(UploadedMenu {
            bytes: bytes.to_vec(),
            mime_type,
            file_name,
        });
    }

    let upload = upload.ok_or(MenuScanError::NoMenuFile)?;
    let output = state.scanner.scan_upload(upload).await?;
    Ok(Json(UploadMenuResponse::ok(output.menu)))
}

/// Health check endpoint handler.
///
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
