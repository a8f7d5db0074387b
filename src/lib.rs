//! A reliable, chunked file-transfer protocol engine for connection-oriented
//! datagram transports.
//!
//! A [`SessionHandle`] owns a [`Transport`] connected to one peer node.
//! [`transmit`] pushes a file to that peer; [`receive`] pulls one from it.
//! Both run a stop-and-wait protocol over fixed-size [`packet`] frames
//! guarded by a CRC32 checksum: one DATA packet is outstanding at a time,
//! acknowledged before the next is sent, and retried up to
//! [`TransferConfig`]'s `max_retries` before the transfer is abandoned.
//!
//! Encoding and decoding is zero-allocation: [`Encode`](encode::Encode) and
//! [`Decode`](decode::Decode) work directly against a fixed scratch buffer
//! ([`packet::PacketBuffer`]), never a `Vec`.

pub mod config;
pub mod crc;
pub mod decode;
pub mod encode;
pub mod error;
pub mod packet;
pub mod receive;
pub mod session;
pub mod state;
pub mod transmit;
pub mod transport;

#[cfg(test)]
pub(crate) mod tests_support;

pub use config::TransferConfig;
pub use error::{CallbackError, FtpError, TransferFailure};
pub use packet::MAX_PAYLOAD;
pub use receive::receive;
pub use session::SessionHandle;
pub use state::SessionState;
pub use transmit::{transmit, SourceRead};
pub use transport::{Transport, FTP_SERVICE_PORT};
