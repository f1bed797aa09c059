use crate::{api::ImageRecord, error::ClientError};

pub const IMPORT_LABEL: &str = "Import Images";
pub const IMPORTING_LABEL: &str = "Importing...";

/// What the image list area currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    /// Nothing requested yet.
    NotLoaded,
    Loading,
    Images(Vec<ImageRecord>),
    Empty,
    Failed(ClientError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

impl MessageKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            MessageKind::Info => "info",
            MessageKind::Success => "success",
            MessageKind::Error => "error",
        }
    }
}

/// A transient banner. `id` identifies this particular showing so a dismiss timer only ever
/// removes the message it was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub id: u64,
    pub kind: MessageKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportControl {
    pub enabled: bool,
    pub label: &'static str,
}

/// The whole UI session: one list area, one import control, at most one status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub api_url: String,
    pub list: ListView,
    pub import: ImportControl,
    pub message: Option<StatusMessage>,
    next_message_id: u64,
}

impl UiState {
    pub fn new(api_url: &str) -> Self {
        UiState {
            api_url: api_url.to_owned(),
            list: ListView::NotLoaded,
            import: ImportControl {
                enabled: true,
                label: IMPORT_LABEL,
            },
            message: None,
            next_message_id: 0,
        }
    }

    /// Replace the current message, returning the id of the new one.
    pub fn show_message(&mut self, kind: MessageKind, text: impl Into<String>) -> u64 {
        self.next_message_id += 1;
        self.message = Some(StatusMessage {
            id: self.next_message_id,
            kind,
            text: text.into(),
        });
        self.next_message_id
    }

    /// Clear the message, but only if it is still the one identified by `id`.
    pub fn dismiss_message(&mut self, id: u64) -> bool {
        match &self.message {
            Some(message) if message.id == id => {
                self.message = None;
                true
            }
            _ => false,
        }
    }

    pub fn begin_import(&mut self) {
        self.import = ImportControl {
            enabled: false,
            label: IMPORTING_LABEL,
        };
    }

    pub fn end_import(&mut self) {
        self.import = ImportControl {
            enabled: true,
            label: IMPORT_LABEL,
        };
    }

    /// Whether the visible state reports a problem: a failed list or an error banner.
    pub fn has_error(&self) -> bool {
        matches!(self.list, ListView::Failed(_))
            || matches!(&self.message, Some(message) if message.kind == MessageKind::Error)
    }
}
