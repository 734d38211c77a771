use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info};
use voltfilter_rs::{process_csv, FilteredSignal, InputError, PipelineError};

use crate::error::ApiError;
use crate::state::ServerState;

/// Multipart field carrying the CSV document
pub const FILE_FIELD: &str = "file";

/// Filter the voltage column of an uploaded CSV file
pub async fn upload_file(
    State(state): State<Arc<ServerState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FilteredSignal>, ApiError> {
    let limit = state.config.max_upload_size;
    let mut multipart = multipart.map_err(|e| {
        debug!("Request is not multipart: {}", e);
        ApiError::NoFilePart
    })?;

    let (filename, data) = read_file_part(&mut multipart, limit).await?;
    info!("File uploaded: {} ({} bytes)", filename, data.len());

    let config = state.pipeline;
    let report = tokio::task::spawn_blocking(move || process_csv(&data, &config))
        .await
        .map_err(|e| ApiError::Internal(format!("filter task failed: {}", e)))??;

    Ok(Json(FilteredSignal::from(report)))
}

/// Find the first `file` part that carries a filename and read it fully
async fn read_file_part(
    multipart: &mut Multipart,
    limit: usize,
) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit, ApiError::NoFilePart))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // Parts without a filename are plain form values, not files
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if filename.is_empty() {
            return Err(ApiError::NoFileSelected);
        }

        let data = field.bytes().await.map_err(|e| {
            multipart_error(e, limit, PipelineError::from(InputError::EmptyOrInvalid).into())
        })?;
        return Ok((filename, data));
    }

    Err(ApiError::NoFilePart)
}

fn multipart_error(err: MultipartError, limit: usize, fallback: ApiError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(limit)
    } else {
        debug!("Multipart read failed: {}", err);
        fallback
    }
}
