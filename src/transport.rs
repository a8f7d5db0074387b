//! The transport contract the protocol engine depends on.
//!
//! This crate does not own a transport implementation — the underlying
//! connection-oriented datagram transport (node addressing, timed receive,
//! blocking send) is an external collaborator, the same way the teacher
//! crate's [`Connection`](https://docs.rs/vex-v5-serial) trait is
//! implemented once per real link (serial, Bluetooth, ...) and consumed
//! generically everywhere else. A caller supplies a type implementing
//! [`Transport`]; [`crate::SessionHandle`] drives it.

use std::time::Duration;

/// The reserved service port FTP sessions connect on.
///
/// Real deployments typically hardcode this the way the original embedded
/// stack does (`CONFIG_DANP_FTP_SERVICE_PORT`); it is exposed here as a
/// default for [`Transport::connect`] callers that don't have their own
/// port allocation scheme.
pub const FTP_SERVICE_PORT: u16 = 21;

/// A connection-oriented datagram transport between two nodes.
///
/// Implementors own the underlying socket resource. [`Transport::recv`]
/// must deliver at most one whole packet per call and must be bounded by
/// `timeout`; a `Ok(0)` return means the timeout elapsed with nothing
/// received, matching the C `recv(..., timeout_ms)` contract this trait
/// replaces (`0 => timeout`, `Err => error`).
pub trait Transport {
    /// The error type produced by this transport's I/O operations.
    type Error: std::error::Error + 'static;

    /// Connects to `node_id` on `port`. Called once, by
    /// [`crate::SessionHandle::init`], before any send/recv traffic.
    fn connect(&mut self, node_id: u16, port: u16) -> Result<(), Self::Error>;

    /// Sends `bytes` as a single datagram. A short send is treated as an
    /// error by the protocol layer — there is no partial-send recovery.
    fn send(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Receives at most one packet into `buf`, waiting up to `timeout`.
    /// Returns the number of bytes received, or `0` on timeout.
    fn recv(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, Self::Error>;

    /// Closes the underlying socket. Called by [`crate::SessionHandle::deinit`]
    /// and on `Drop`; must be safe to call more than once.
    fn close(&mut self) -> Result<(), Self::Error>;
}
