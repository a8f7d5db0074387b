//! The session handle: transport ownership, sequence counter, state, byte
//! counter.
//!
//! Grounded on `danp_ftp_handle_t`/`danp_ftp_init`/`danp_ftp_deinit` in the
//! original C source, re-architected per the redesign note in SPEC_FULL.md
//! §9: the raw socket pointer plus `is_initialized` boolean becomes an
//! `Option<T>` resource slot whose `Drop` impl closes the transport,
//! making `deinit` implicit on scope exit while still allowing an explicit
//! call — the same ownership shape the teacher's `SerialConnection` gives
//! its `SerialStream`.

use log::{error, info, warn};

use crate::error::FtpError;
use crate::state::SessionState;
use crate::transport::{Transport, FTP_SERVICE_PORT};

/// An initialized (or formerly initialized) FTP session bound to one
/// destination node.
///
/// A handle may be reused across transfers: [`crate::transmit`] and
/// [`crate::receive`] reset the sequence counter, state, and byte counter
/// at the start of each call. Only one transfer is ever active on a
/// handle at a time — `transmit`/`receive` take `&mut SessionHandle`, so
/// the borrow checker enforces this statically.
pub struct SessionHandle<T: Transport> {
    transport: Option<T>,
    dst_node: u16,
    sequence_number: u16,
    state: SessionState,
    total_bytes_transferred: u64,
}

impl<T: Transport> SessionHandle<T> {
    /// Initializes a handle for communication with `dst_node`: connects
    /// `transport` to it on [`FTP_SERVICE_PORT`].
    ///
    /// On failure the transport is closed (if it was reachable at all)
    /// and a [`FtpError::ConnectionFailed`] is returned; no handle is
    /// produced.
    pub fn init(mut transport: T, dst_node: u16) -> Result<Self, FtpError<T::Error>> {
        match transport.connect(dst_node, FTP_SERVICE_PORT) {
            Ok(()) => {
                info!("ftp initialized for node {dst_node}");
                Ok(Self {
                    transport: Some(transport),
                    dst_node,
                    sequence_number: 0,
                    state: SessionState::Idle,
                    total_bytes_transferred: 0,
                })
            }
            Err(e) => {
                error!("ftp failed to connect to node {dst_node}: {e}");
                if let Err(close_err) = transport.close() {
                    warn!("ftp error closing transport after failed connect: {close_err}");
                }
                Err(FtpError::ConnectionFailed(e))
            }
        }
    }

    /// Whether this handle currently owns a connected transport.
    pub fn is_initialized(&self) -> bool {
        self.transport.is_some()
    }

    /// The destination node this handle was initialized for.
    pub fn dst_node(&self) -> u16 {
        self.dst_node
    }

    /// The largest chunk a single DATA packet can carry
    /// ([`crate::packet::MAX_PAYLOAD`]), named on the handle so callers
    /// don't need to reach into `packet` for it when sizing a
    /// [`crate::TransferConfig`].
    pub fn max_payload(&self) -> usize {
        crate::packet::MAX_PAYLOAD
    }

    /// The advisory session state (see [`SessionState`]).
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Cumulative bytes transferred in the current (or most recent)
    /// transfer.
    pub fn total_bytes_transferred(&self) -> u64 {
        self.total_bytes_transferred
    }

    /// Closes the transport and returns it to the caller. No-op
    /// (returning `None`) if the handle is already deinitialized.
    /// Idempotent.
    pub fn deinit(mut self) -> Option<T> {
        self.deinit_in_place()
    }

    fn deinit_in_place(&mut self) -> Option<T> {
        let mut transport = self.transport.take()?;
        if let Err(e) = transport.close() {
            warn!("ftp error closing transport during deinit: {e}");
        }
        self.state = SessionState::Idle;
        info!("ftp handle deinitialized");
        Some(transport)
    }

    pub(crate) fn transport_mut(&mut self) -> Result<&mut T, FtpError<T::Error>> {
        self.transport
            .as_mut()
            .ok_or(FtpError::InvalidParam("session handle is not initialized"))
    }

    pub(crate) fn reset_for_transfer(&mut self) {
        self.sequence_number = 0;
        self.state = SessionState::Connecting;
        self.total_bytes_transferred = 0;
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    pub(crate) fn sequence_number(&self) -> u16 {
        self.sequence_number
    }

    pub(crate) fn advance_sequence(&mut self) {
        self.sequence_number = self.sequence_number.wrapping_add(1);
    }

    pub(crate) fn set_bytes_transferred(&mut self, value: u64) {
        self.total_bytes_transferred = value;
    }
}

impl<T: Transport> Drop for SessionHandle<T> {
    fn drop(&mut self) {
        self.deinit_in_place();
    }
}
