use std::{collections::HashMap, path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;
use gdrive::{DriveClient, DriveFile};
use log::{info, warn};
use time::OffsetDateTime;
use tokio::sync::{
    mpsc::{self, Sender},
    RwLock,
};

use crate::{
    api_types::{ImportJobId, ImportJobInfo, ImportJobStatus},
    db::tables::{NewImage, DB},
};

pub const DRIVE_SOURCE: &str = "google_drive";

/// Finished jobs are forgotten after this long.
const JOB_TTL: time::Duration = time::Duration::hours(1);

/// Read access to a Drive folder. Implemented by [DriveClient]; tests substitute their own.
#[async_trait]
pub trait DriveSource {
    async fn list_images(&self, folder_id: &str) -> anyhow::Result<Vec<DriveFile>>;
    async fn download(&self, file_id: &str) -> anyhow::Result<Bytes>;
}

#[async_trait]
impl DriveSource for DriveClient {
    async fn list_images(&self, folder_id: &str) -> anyhow::Result<Vec<DriveFile>> {
        DriveClient::list_images(self, folder_id).await
    }

    async fn download(&self, file_id: &str) -> anyhow::Result<Bytes> {
        DriveClient::download(self, file_id).await
    }
}

/// Where an imported file ends up, which decides its `storage_url`.
#[derive(Debug, Clone)]
pub enum Staging {
    /// Keep the file on Drive and link to its public view URL.
    Linked,

    /// Copy the bytes under `root_dir`, served back at `{public_url}/files/`.
    Disk { root_dir: PathBuf, public_url: String },
}

impl Staging {
    async fn stage(&self, drive: &(dyn DriveSource + Send + Sync), file: &DriveFile) -> anyhow::Result<String> {
        match self {
            Staging::Linked => Ok(gdrive::view_url(&file.id)),
            Staging::Disk {
                root_dir,
                public_url,
            } => {
                let bytes = drive.download(&file.id).await?;
                let file_name = staged_file_name(file);
                let path = root_dir.join(&file_name);
                tokio::fs::write(&path, &bytes)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?;

                Ok(format!("{public_url}/files/{file_name}"))
            }
        }
    }
}

/// `<drive id>-<name>` with anything outside `[A-Za-z0-9._-]` replaced, so it is safe on disk and in a URL.
fn staged_file_name(file: &DriveFile) -> String {
    let name: String = file
        .name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("{}-{}", file.id, name)
}

/// Importer is the trait for types that can conduct external imports.
/// `start_import` must return as soon as the job is queued; the work happens in the background.
#[async_trait]
pub trait Importer {
    async fn start_import(&self, folder_url: String) -> anyhow::Result<ImportJobId>;
    async fn get_import_status(&self, task_id: &ImportJobId) -> Option<ImportJobInfo>;
    async fn get_all_job_status(&self) -> HashMap<ImportJobId, ImportJobInfo>;
}

/// Message used by our async task queue which interposes between the main task and the worker tasks doing
/// the importing.
enum Message {
    UpdateStatus {
        job: ImportJobId,
        status: ImportJobStatus,
    },
}

/// Everything a worker task needs, shared between jobs.
struct ImportContext {
    db: Arc<DB>,
    drive: Arc<dyn DriveSource + Send + Sync>,
    staging: Staging,
}

/// The default in-memory importer implementation. Uses a multi-producer single-consumer
/// task structure to asynchronously import folders and update the state tracker.
pub struct InMemoryImporter {
    /// Synchronized table of job statuses.
    job_status: Arc<RwLock<HashMap<ImportJobId, ImportJobInfo>>>,

    /// mpsc message channel for communication between the workers and the state-tracker.
    sender: Sender<Message>,

    context: Arc<ImportContext>,
}

impl InMemoryImporter {
    /// Must be called from within a tokio runtime: the state tracker is spawned immediately.
    pub fn new(db: Arc<DB>, drive: Arc<dyn DriveSource + Send + Sync>, staging: Staging) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Message>(128);
        let job_status = Arc::new(RwLock::new(HashMap::<ImportJobId, ImportJobInfo>::new()));

        let table_clone = Arc::clone(&job_status);
        tokio::spawn(async move {
            info!("Spawning background task for InMemoryImporter");
            while let Some(msg) = receiver.recv().await {
                match msg {
                    Message::UpdateStatus { job, status } => {
                        info!("Updating task={} status={:?}", job, &status);
                        let mut table = table_clone.write().await;
                        if let Some(entry) = table.get_mut(&job) {
                            entry.status = status;
                        }
                    }
                }
            }
            info!("Importer state tracker stopped");
        });

        Self {
            job_status,
            sender,
            context: Arc::new(ImportContext { db, drive, staging }),
        }
    }
}

async fn do_import(
    task_id: ImportJobId,
    folder_url: String,
    context: Arc<ImportContext>,
    sender: Sender<Message>,
) {
    info!("Starting import task {} from {}", task_id, &folder_url);

    let status = match import_folder(task_id, &folder_url, &context, &sender).await {
        Ok(images_imported) => {
            info!(
                "Import completed for {}. Inserted {} images.",
                &folder_url, images_imported
            );
            ImportJobStatus::Completed { images_imported }
        }
        Err(err) => {
            warn!("Error in import task {}: {:#}", task_id, err);
            ImportJobStatus::Failed {
                error: format!("{err:#}"),
            }
        }
    };

    if sender
        .send(Message::UpdateStatus {
            job: task_id,
            status,
        })
        .await
        .is_err()
    {
        warn!("state tracker gone, dropping final status of task {}", task_id);
    }
}

/// List the folder, stage every image that isn't catalogued yet, and record it. Returns the number of new rows.
async fn import_folder(
    task_id: ImportJobId,
    folder_url: &str,
    context: &ImportContext,
    sender: &Sender<Message>,
) -> anyhow::Result<usize> {
    let folder_id = gdrive::folder_id_from_url(folder_url)?;

    sender
        .send(Message::UpdateStatus {
            job: task_id,
            status: ImportJobStatus::InProgress { progress: 0.0 },
        })
        .await
        .context("failed to send status update")?;

    let files = context
        .drive
        .list_images(&folder_id)
        .await
        .with_context(|| format!("failed to list folder {folder_id}"))?;

    if let Staging::Disk { root_dir, .. } = &context.staging {
        tokio::fs::create_dir_all(root_dir)
            .await
            .with_context(|| format!("failed to create {}", root_dir.display()))?;
    }

    let total = files.len();
    let mut inserted_count = 0;
    for (index, file) in files.iter().enumerate() {
        match import_file(file, context).await {
            Ok(true) => inserted_count += 1,
            Ok(false) => info!("Skipping {} ({}): already imported", &file.name, &file.id),
            Err(err) => warn!("Error importing image {}: {:#}", &file.name, err),
        }

        sender
            .send(Message::UpdateStatus {
                job: task_id,
                status: ImportJobStatus::InProgress {
                    progress: (index + 1) as f32 / total as f32,
                },
            })
            .await
            .context("failed to send status update")?;
    }

    Ok(inserted_count)
}

#[tracing::instrument(level = "debug", skip_all, fields(file_id = %file.id))]
async fn import_file(file: &DriveFile, context: &ImportContext) -> anyhow::Result<bool> {
    if context.db.has_drive_file(&file.id).await? {
        return Ok(false);
    }

    let storage_url = context.staging.stage(context.drive.as_ref(), file).await?;
    context
        .db
        .insert_image(&NewImage {
            name: file.name.clone(),
            google_drive_id: Some(file.id.clone()),
            size: file.size,
            mime_type: Some(file.mime_type.clone()),
            storage_url,
            source: DRIVE_SOURCE.to_owned(),
        })
        .await
}

#[async_trait]
impl Importer for InMemoryImporter {
    async fn start_import(&self, folder_url: String) -> anyhow::Result<ImportJobId> {
        let task_id = uuid::Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        {
            let mut jq = self.job_status.write().await;
            jq.retain(|_, job| !(job.status.is_finished() && now - job.created_at > JOB_TTL));
            jq.insert(
                task_id,
                ImportJobInfo {
                    folder_url: folder_url.clone(),
                    status: ImportJobStatus::Queued,
                    created_at: now,
                },
            );
        }

        // Submit an async task to execute against the data, updating the jobs table as relevant.
        let sender = self.sender.clone();
        tokio::spawn(do_import(
            task_id,
            folder_url,
            Arc::clone(&self.context),
            sender,
        ));

        Ok(task_id)
    }

    async fn get_import_status(&self, task_id: &ImportJobId) -> Option<ImportJobInfo> {
        self.job_status.read().await.get(task_id).cloned()
    }

    async fn get_all_job_status(&self) -> HashMap<ImportJobId, ImportJobInfo> {
        self.job_status.read().await.clone()
    }
}
