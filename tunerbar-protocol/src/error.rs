//! Status codes returned by the scheduling service.

use thiserror::Error;

/// Result code of a scheduling-service command.
///
/// Only [`ErrCode::Success`] carries usable data; every other code is an
/// error from the caller's point of view.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrCode {
    /// Command succeeded.
    #[error("success")]
    Success = 1,
    /// Generic failure.
    #[error("command failed")]
    Err = 0,
    /// Command not supported by the service.
    #[error("command not supported")]
    NonSupport = 2,
    /// Invalid argument.
    #[error("invalid argument")]
    InvalidArg = 3,
    /// Could not connect to the service.
    #[error("connection failed")]
    Connect = 4,
    /// Service disconnected mid-command.
    #[error("disconnected")]
    Disconnect = 5,
    /// Command timed out.
    #[error("timed out")]
    Timeout = 6,
    /// Service is busy.
    #[error("service busy")]
    Busy = 7,
    /// No result data.
    #[error("no result")]
    NoRes = 8,
}

impl From<u32> for ErrCode {
    fn from(value: u32) -> Self {
        match value {
            1 => ErrCode::Success,
            2 => ErrCode::NonSupport,
            3 => ErrCode::InvalidArg,
            4 => ErrCode::Connect,
            5 => ErrCode::Disconnect,
            6 => ErrCode::Timeout,
            7 => ErrCode::Busy,
            8 => ErrCode::NoRes,
            _ => ErrCode::Err,
        }
    }
}

impl From<ErrCode> for u32 {
    fn from(value: ErrCode) -> Self {
        value as u32
    }
}

impl ErrCode {
    /// Returns true if this code indicates success.
    pub fn is_success(self) -> bool {
        self == ErrCode::Success
    }

    /// Convert to a `Result`, mapping any non-success code to `Err`.
    pub fn into_result(self) -> Result<(), ErrCode> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }
}
