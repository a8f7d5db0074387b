//! Error types surfaced across the public API.
//!
//! Grounded on the teacher's `ConnectionError`/`SerialError`: a
//! `thiserror`-derived enum per failure domain, composed with `#[from]`/
//! `#[source]` conversions from the transport's own error type rather than
//! a single flat status code. [`FtpError::as_code`] still reproduces the
//! five legacy integer status codes for callers that need wire/FFI
//! compatibility with the original `danp_ftp_status_t` values.

use thiserror::Error;

/// Legacy status code constants, reproduced from the original protocol's
/// `danp_ftp_status_t` values.
pub mod status {
    pub const OK: i32 = 0;
    pub const ERROR: i32 = -1;
    pub const INVALID_PARAM: i32 = -2;
    pub const CONNECTION_FAILED: i32 = -3;
    pub const TRANSFER_FAILED: i32 = -4;
    pub const FILE_NOT_FOUND: i32 = -5;
}

/// Why a transfer failed partway through, once the handshake succeeded.
#[derive(Error, Debug)]
pub enum TransferFailure<E: std::error::Error + 'static> {
    #[error("timed out waiting for a response")]
    Timeout,
    #[error("crc mismatch on a received packet")]
    CrcMismatch,
    #[error("received a nack")]
    Nack,
    #[error("sequence mismatch: expected {expected}, got {got}")]
    SequenceMismatch { expected: u16, got: u16 },
    #[error("unexpected packet type {got}")]
    UnexpectedType { got: u8 },
    #[error("max retries exhausted")]
    RetriesExhausted,
    #[error("transport error: {0}")]
    Transport(#[source] E),
    #[error("packet framing error: {0}")]
    Framing(#[source] crate::decode::DecodeError),
}

/// A negative status returned by a source/sink callback, propagated
/// verbatim.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("callback returned error status {0}")]
pub struct CallbackError(pub i32);

/// The error type returned by [`crate::SessionHandle::init`],
/// [`crate::transmit`], and [`crate::receive`].
#[derive(Error, Debug)]
pub enum FtpError<E: std::error::Error + 'static> {
    #[error("invalid parameter: {0}")]
    InvalidParam(&'static str),

    #[error("connection failed: {0}")]
    ConnectionFailed(#[source] E),

    #[error("file not found")]
    FileNotFound,

    #[error("transfer failed: {0}")]
    TransferFailed(#[source] TransferFailure<E>),

    #[error("callback error: {0}")]
    Callback(#[source] CallbackError),
}

impl<E: std::error::Error + 'static> FtpError<E> {
    /// Collapses this error back down to one of the five legacy integer
    /// status codes.
    pub fn as_code(&self) -> i32 {
        match self {
            Self::InvalidParam(_) => status::INVALID_PARAM,
            Self::ConnectionFailed(_) => status::CONNECTION_FAILED,
            Self::FileNotFound => status::FILE_NOT_FOUND,
            Self::TransferFailed(_) => status::TRANSFER_FAILED,
            Self::Callback(_) => status::ERROR,
        }
    }

    pub(crate) fn transfer_failed(failure: TransferFailure<E>) -> Self {
        Self::TransferFailed(failure)
    }
}
