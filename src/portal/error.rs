use crate::portal::captcha::CaptchaError;
use thiserror::Error;

/// Everything that can go wrong talking to the backend.
///
/// The `Display` text is shown to the user as-is, so the variants that carry
/// a backend message print only that message.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Connection refused, DNS failure, timeout, broken body.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx reply.
    #[error("{message}")]
    Status { code: u16, message: String },

    /// HTTP 401 from a data fetch: the session is no longer valid.
    #[error("{message}")]
    Unauthorized { message: String },

    /// 2xx reply with a failure status from the backend.
    #[error("{message}")]
    Rejected { message: String },

    /// Reply that does not match the expected shape.
    #[error("Unexpected reply from server: {0}")]
    Malformed(String),

    #[error(transparent)]
    Captcha(#[from] CaptchaError),

    /// A background task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PortalError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, PortalError::Unauthorized { .. })
    }
}
