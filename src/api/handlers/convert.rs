use crate::AppState;
use crate::api::error::AppError;
use crate::api::middleware::request_id::RequestId;
use crate::models::{UploadedFile, XLSX_MIME};
use crate::services::error::ConvertError;
use crate::utils::validation::is_unselected_part;
use axum::{
    Extension,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::info;

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// Collect every file part of the configured upload field, in submission order.
/// Parts without a `filename` are plain form values, not files.
async fn collect_uploads(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<Vec<UploadedFile>, AppError> {
    let mut saw_field = false;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(field_name) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        saw_field = true;

        let data = field.bytes().await.map_err(multipart_error)?;

        if is_unselected_part(&filename, &data) {
            continue;
        }

        let filename = if filename.trim().is_empty() {
            format!("upload-{}", files.len() + 1)
        } else {
            filename
        };

        info!(file = %filename, bytes = data.len(), "file received");
        files.push(UploadedFile::new(filename, data));
    }

    if !saw_field {
        return Err(ConvertError::missing_file_part().into());
    }
    if files.is_empty() {
        return Err(ConvertError::no_selected_file().into());
    }

    Ok(files)
}

#[utoipa::path(
    post,
    path = "/convert",
    request_body(content = Multipart, description = "One or more pipe-delimited files under the `file` field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Workbook attachment named atmos_converted_<YYYY-MM-DD>.xlsx"),
        (status = 400, description = "No file part / No selected file / malformed form", body = String),
        (status = 413, description = "Upload exceeds the configured size limit", body = String),
        (status = 500, description = "A file could not be decoded, parsed or exported", body = String)
    ),
    tag = "convert"
)]
pub async fn convert_files(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    // A request that is not multipart at all carries no file part.
    let multipart = multipart.map_err(|_| ConvertError::missing_file_part())?;

    let request_id = request_id
        .map(|Extension(RequestId(id))| id)
        .unwrap_or_else(|| "unknown".to_string());

    let files = collect_uploads(multipart, &state.config.upload_field).await?;

    info!(request_id = %request_id, files = files.len(), "starting conversion");
    let workbook = state.converter.convert(&request_id, files).await?;

    let disposition = format!("attachment; filename=\"{}\"", workbook.filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        workbook.bytes,
    )
        .into_response())
}
