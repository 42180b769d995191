//! Error types for the Google Voice client.

use thiserror::Error;

/// Why an authentication step failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("not logged in")]
    NotLoggedIn,

    #[error("session expired")]
    Expired,

    #[error("SMS verification failed: {0}")]
    Verification(String),
}

/// Errors that can occur when talking to Google Voice.
#[derive(Error, Debug)]
pub enum GvError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Unexpected response from {page}: {reason}")]
    Parse { page: String, reason: String },

    #[error("Request rejected by Google Voice: {0}")]
    Rejected(String),

    #[error("Download failed for message {id}: {reason}")]
    Download { id: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`GvError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    Network,
    Parse,
    Rejected,
    Download,
    Config,
    Io,
}

impl GvError {
    pub(crate) fn parse(page: impl Into<String>, reason: impl Into<String>) -> Self {
        GvError::Parse {
            page: page.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GvError::Auth(_) => ErrorKind::Authentication,
            GvError::Network(_) | GvError::HttpStatus { .. } => ErrorKind::Network,
            GvError::Parse { .. } => ErrorKind::Parse,
            GvError::Rejected(_) => ErrorKind::Rejected,
            GvError::Download { .. } => ErrorKind::Download,
            GvError::Config(_) => ErrorKind::Config,
            GvError::Io(_) => ErrorKind::Io,
        }
    }

    /// Stable machine-readable code, used in JSON error output.
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Authentication => "AUTH_FAILED",
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Parse => "PARSE_ERROR",
            ErrorKind::Rejected => "REJECTED",
            ErrorKind::Download => "DOWNLOAD_FAILED",
            ErrorKind::Config => "CONFIG_ERROR",
            ErrorKind::Io => "IO_ERROR",
        }
    }

    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }
}

pub type Result<T> = std::result::Result<T, GvError>;
