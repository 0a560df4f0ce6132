use common::{ErrorResponse, ValidationError};
use thiserror::Error;
use transport::TransportError;

/// Everything a repository call can fail with
#[derive(Debug, Error)]
pub enum CaseError {
    /// Detected locally; nothing was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Case {0} not found")]
    NotFound(String),

    /// HTTP status >= 400 other than a 404 on a case lookup
    #[error("Server returned {status_code}: {body}")]
    Remote { status_code: u16, body: String },

    #[error("Failed to parse server response: {0}")]
    Parse(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CaseError {
    /// Text shown to the user in the banner of the screen that failed
    pub fn user_message(&self) -> String {
        match self {
            CaseError::Validation(e) => e.to_string(),
            CaseError::NotFound(_) => "Case not found".to_string(),
            CaseError::Remote { status_code, body } => remote_message(*status_code, body),
            CaseError::Parse(_) => "Unexpected response from the analysis server".to_string(),
            CaseError::Transport(TransportError::Io { .. }) => self.to_string(),
            CaseError::Transport(_) => {
                "Unable to reach the analysis server. Check your connection and try again."
                    .to_string()
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CaseError::NotFound(_))
    }
}

/// Prefer the server's `error` field; fall back to the raw body
fn remote_message(status_code: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        return parsed.error;
    }
    let body = body.trim();
    if body.is_empty() {
        format!("Server error ({status_code})")
    } else {
        body.to_string()
    }
}
