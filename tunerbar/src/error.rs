//! Error types for the front-end core.

use thiserror::Error;
use tunerbar_protocol::ErrCode;

use crate::viewer::LaunchError;

/// Errors surfaced by [`crate::app::App`] operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// A poll returned a non-success code. The previous snapshot is kept and
    /// polling stays suppressed for the rest of the session.
    #[error("Cannot reach the scheduling service ({0}); polling stopped until restart")]
    CollaboratorUnavailable(ErrCode),

    /// The service rejected a reservation change.
    #[error("Failed to change reservation: {0}")]
    ChangeReservationFailed(ErrCode),

    /// The viewer process could not be started.
    #[error("Failed to launch viewer: {0}")]
    ProcessLaunchFailed(#[from] LaunchError),

    /// A close request to a viewer process failed.
    #[error("Failed to close viewer: {0}")]
    ProcessCloseFailed(#[source] std::io::Error),

    /// A rendered row refers to an entity that vanished since it was drawn.
    #[error("Data unavailable: {0}")]
    StaleKeyLookup(String),

    /// The recording path could not be translated to a network path.
    #[error("Failed to get network path for {path}: {code}")]
    NetworkPathUnavailable { path: String, code: ErrCode },

    /// A web link template expanded to an unparseable URL.
    #[error("Invalid web link URL {url}: {source}")]
    InvalidWebLink {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The requested launch is turned off in the configuration.
    #[error("Viewer launch is disabled")]
    LaunchDisabled,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Placeholder text shown in place of data that could not be resolved.
    pub const PLACEHOLDER: &'static str = "番組情報を取得できませんでした";
}
