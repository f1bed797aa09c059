use std::{sync::Arc, time::Duration};

use log::{debug, info, warn};
use tokio::{sync::Mutex, task::JoinHandle};

use crate::{
    api::{Backend, ImportAck},
    error::ClientError,
    render::render_page,
    state::{ListView, MessageKind, UiState},
};

/// Time given to the background import before the list is re-read.
pub const REFRESH_DELAY: Duration = Duration::from_secs(3);

/// How long a status message stays up.
pub const MESSAGE_TTL: Duration = Duration::from_secs(5);

/// UI state plus the bookkeeping that must change atomically with it.
struct Session {
    ui: UiState,

    /// Bumped by every list load; only the load holding the latest value may write its result.
    load_generation: u64,

    dismiss_timer: Option<JoinHandle<()>>,
    pending_refresh: Option<JoinHandle<()>>,
}

struct Inner<B> {
    backend: B,
    session: Mutex<Session>,
}

/// Drives one UI session against a [Backend]. Cloning yields another handle to the same session.
pub struct Controller<B> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for Controller<B> {
    fn clone(&self) -> Self {
        Controller {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend + 'static> Controller<B> {
    pub fn new(backend: B) -> Self {
        let ui = UiState::new(backend.base_url());
        Controller {
            inner: Arc::new(Inner {
                backend,
                session: Mutex::new(Session {
                    ui,
                    load_generation: 0,
                    dismiss_timer: None,
                    pending_refresh: None,
                }),
            }),
        }
    }

    pub async fn snapshot(&self) -> UiState {
        self.inner.session.lock().await.ui.clone()
    }

    pub async fn render(&self) -> String {
        render_page(&self.inner.session.lock().await.ui)
    }

    /// First thing a fresh session does: make sure the backend answers at all, then load the list.
    /// A dead backend gets a connectivity diagnostic instead of a confusing failed list read.
    pub async fn activate(&self) {
        if let Err(err) = self.inner.backend.probe().await {
            warn!("backend at {} is unreachable: {}", self.inner.backend.base_url(), err);
            let mut session = self.inner.session.lock().await;
            // Supersede any load that might still be in flight.
            session.load_generation += 1;
            session.ui.list = ListView::Failed(err);
            return;
        }

        self.load_images().await;
    }

    /// Read the list and render it. Overlapping loads are allowed; whichever was issued last wins.
    pub async fn load_images(&self) {
        let generation = {
            let mut session = self.inner.session.lock().await;
            session.load_generation += 1;
            session.ui.list = ListView::Loading;
            session.load_generation
        };

        let view = match self.inner.backend.list_images().await {
            Ok(records) if records.is_empty() => ListView::Empty,
            Ok(records) => {
                info!("loaded {} images", records.len());
                ListView::Images(records)
            }
            Err(err) => {
                warn!("failed to load images: {}", err);
                ListView::Failed(err)
            }
        };

        let mut session = self.inner.session.lock().await;
        if session.load_generation == generation {
            session.ui.list = view;
        } else {
            debug!(
                "discarding stale list response (load {} superseded by {})",
                generation, session.load_generation
            );
        }
    }

    /// The retry action offered by list diagnostics.
    pub async fn retry(&self) {
        self.load_images().await;
    }

    /// Ask the backend to import a Drive folder. The outcome is also reflected in the UI state,
    /// and on success a list refresh is scheduled [REFRESH_DELAY] later.
    pub async fn submit_import(&self, folder_url: &str) -> Result<ImportAck, ClientError> {
        let folder_url = folder_url.trim();
        if folder_url.is_empty() {
            let err = ClientError::InvalidInput("Please enter a Google Drive folder URL".to_owned());
            self.show_message(MessageKind::Error, err.to_string()).await;
            return Err(err);
        }

        {
            let mut session = self.inner.session.lock().await;
            if !session.ui.import.enabled {
                return Err(ClientError::InvalidInput(
                    "An import is already in progress".to_owned(),
                ));
            }
            session.ui.begin_import();
        }
        self.show_message(MessageKind::Info, "Starting import...").await;

        let result = self.inner.backend.trigger_import(folder_url).await;
        self.inner.session.lock().await.ui.end_import();

        match &result {
            Ok(ack) => {
                info!("import accepted task={:?}", ack.task_id);
                let message = ack.message.as_deref().unwrap_or("Import started");
                self.show_message(
                    MessageKind::Success,
                    format!(
                        "{message}. Refreshing in {} seconds...",
                        REFRESH_DELAY.as_secs()
                    ),
                )
                .await;
                self.schedule_refresh().await;
            }
            Err(err) => {
                warn!("import failed: {}", err);
                let text = match err {
                    ClientError::ServerRejected {
                        detail: Some(detail),
                        ..
                    } => detail.clone(),
                    other => format!("Import failed: {other}"),
                };
                self.show_message(MessageKind::Error, text).await;
            }
        }

        result
    }

    /// Submit an import and wait for the list refresh that follows it. A session whose liveness
    /// probe already failed keeps its connectivity diagnostic and sends nothing.
    pub async fn import_and_refresh(&self, folder_url: &str) -> Result<ImportAck, ClientError> {
        if let ListView::Failed(err @ ClientError::Unreachable(_)) =
            &self.inner.session.lock().await.ui.list
        {
            warn!("skipping import, backend is unreachable");
            return Err(err.clone());
        }

        let ack = self.submit_import(folder_url).await?;
        self.wait_for_refresh().await;
        Ok(ack)
    }

    /// Wait for a scheduled refresh, if there is one, to finish.
    pub async fn wait_for_refresh(&self) {
        let pending = self.inner.session.lock().await.pending_refresh.take();
        if let Some(handle) = pending {
            if let Err(err) = handle.await {
                debug!("scheduled refresh did not run: {}", err);
            }
        }
    }

    /// Show a message and (re)arm its dismiss timer. The previous timer is aborted so it can never
    /// clear this newer message.
    async fn show_message(&self, kind: MessageKind, text: impl Into<String>) {
        let mut session = self.inner.session.lock().await;
        let id = session.ui.show_message(kind, text);

        if let Some(timer) = session.dismiss_timer.take() {
            timer.abort();
        }

        let controller = self.clone();
        session.dismiss_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(MESSAGE_TTL).await;
            controller
                .inner
                .session
                .lock()
                .await
                .ui
                .dismiss_message(id);
        }));
    }

    async fn schedule_refresh(&self) {
        let controller = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(REFRESH_DELAY).await;
            controller.load_images().await;
        });

        let mut session = self.inner.session.lock().await;
        if let Some(previous) = session.pending_refresh.replace(handle) {
            previous.abort();
        }
    }
}
