use crate::{
    api_types::{
        GetAllJobStatusResponse, ImportAccepted, ImportJobId, ImportJobInfo, ImportJobStatus,
        ImportRequest,
    },
    error::ApiError,
    state::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use log::info;

/// Queue an import of a public Drive folder. Responds before any file is fetched; failures
/// past this point only show up on the job status.
#[axum::debug_handler]
pub async fn import_google_drive(
    State(app_state): State<AppState>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ImportAccepted>), ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::InvalidInput(rejection.body_text()))?;

    let folder_url = request.folder_url.trim();
    if folder_url.is_empty() {
        return Err(ApiError::InvalidInput(
            "folder_url must not be empty".to_owned(),
        ));
    }

    let task_id = app_state
        .importer
        .start_import(folder_url.to_owned())
        .await
        .map_err(ApiError::internal("Import failed"))?;
    info!("queued import task={} folder={}", task_id, folder_url);

    Ok((
        StatusCode::ACCEPTED,
        Json(ImportAccepted {
            message: "Import started successfully".to_owned(),
            task_id,
            folder_url: folder_url.to_owned(),
            status: ImportJobStatus::Queued,
        }),
    ))
}

#[axum::debug_handler]
pub async fn import_job_status(
    Path(job_id): Path<ImportJobId>,
    State(app_state): State<AppState>,
) -> Result<Json<ImportJobInfo>, ApiError> {
    app_state
        .importer
        .get_import_status(&job_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no import job with id {job_id}")))
}

pub async fn import_job_status_all(
    State(app_state): State<AppState>,
) -> Json<GetAllJobStatusResponse> {
    let import_jobs = app_state.importer.get_all_job_status().await;

    Json(GetAllJobStatusResponse { import_jobs })
}
