use thiserror::Error;

/// Every way a client action can fail. None of them end the session; the UI renders each one
/// and leaves a way to retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Rejected locally, no request was sent.
    #[error("{0}")]
    InvalidInput(String),

    /// The backend could not be reached at all.
    #[error("cannot reach the server: {0}")]
    Unreachable(String),

    /// The backend answered with a non-success status.
    #[error("{}", rejection_message(.status, .detail))]
    ServerRejected { status: u16, detail: Option<String> },

    /// A success status, but the body was not the structured data we asked for.
    #[error("unexpected response from the server: {0}")]
    MalformedResponse(String),
}

fn rejection_message(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => detail.to_owned(),
        None => format!("server returned status {status}"),
    }
}

impl ClientError {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::InvalidInput(_) => "InvalidInput",
            ClientError::Unreachable(_) => "Unreachable",
            ClientError::ServerRejected { .. } => "ServerRejected",
            ClientError::MalformedResponse(_) => "MalformedResponse",
        }
    }
}
