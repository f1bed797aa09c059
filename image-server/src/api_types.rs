//! Types needed by the API of our project.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;

pub const PLACEHOLDER_STORAGE_URL: &str = "https://via.placeholder.com/300x200?text=No+Image";
pub const UNKNOWN_SOURCE: &str = "unknown";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub folder_url: String,
}

/// Acknowledgement returned by the import trigger. The import itself continues in the background.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImportAccepted {
    pub message: String,
    pub task_id: ImportJobId,
    pub folder_url: String,
    pub status: ImportJobStatus,
}

/// A catalog entry as exposed by `GET /images`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageResponse {
    pub id: i64,
    pub name: String,
    pub size: u64,
    pub storage_url: String,
    pub source: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub detail: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RootResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SeedResponse {
    pub message: String,
    pub count: usize,
}

// Have it enqueue a task, and return an ID
pub type ImportJobId = uuid::Uuid;

/// Status of an import job.
/// Import jobs move through the following states
/// - **[Queued]** - accepted, waiting for the worker task to pick it up
/// - **[InProgress]** - files are being listed, staged and recorded
/// - **[Completed]** - the folder was processed; carries the number of new records
/// - **[Failed]** - the import stopped with an error
///
/// [Queued]: ImportJobStatus::Queued
/// [InProgress]: ImportJobStatus::InProgress
/// [Completed]: ImportJobStatus::Completed
/// [Failed]: ImportJobStatus::Failed
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ImportJobStatus {
    #[serde(rename = "queued")]
    Queued,

    #[serde(rename = "in-progress")]
    InProgress {
        /// A numeric progress indicator between 0 (0%) and 1.0 (100%)
        progress: f32,
    },

    #[serde(rename = "completed")]
    Completed { images_imported: usize },

    #[serde(rename = "failed")]
    Failed { error: String },
}

impl Eq for ImportJobStatus {}

impl ImportJobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            ImportJobStatus::Completed { .. } | ImportJobStatus::Failed { .. }
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImportJobInfo {
    pub folder_url: String,
    pub status: ImportJobStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GetAllJobStatusResponse {
    pub import_jobs: HashMap<ImportJobId, ImportJobInfo>,
}
