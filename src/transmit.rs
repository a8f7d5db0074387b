//! The transmit engine: sends a file to a connected peer in chunks,
//! stop-and-wait style.
//!
//! Grounded line-for-line on `danp_ftp_transmit` in the original C source:
//! the handshake (COMMAND/WRITE, wait for RESPONSE), the chunk loop driven
//! by a source callback, first/last chunk flag computation, and the
//! per-chunk retry sub-loop bounded by `max_retries`.

use std::time::Duration;

use log::{debug, error, info, warn};

use crate::config::TransferConfig;
use crate::error::{CallbackError, FtpError, TransferFailure};
use crate::packet::{
    encode_command, CommandOpcode, DecodedPacket, Flags, PacketBuffer, PacketType, ResponseStatus,
    COMMAND_SCRATCH_SIZE,
};
use crate::session::SessionHandle;
use crate::state::SessionState;
use crate::transport::Transport;

/// What a source callback reported for one `read` call.
pub struct SourceRead {
    /// Number of bytes written into the supplied buffer.
    pub bytes_read: usize,
    /// Whether the source has more data after this chunk.
    pub more: bool,
}

/// Sends the data identified by `config.file_id()` to the peer `handle` is
/// connected to.
///
/// `source` is called repeatedly with the next write offset and a scratch
/// buffer sized to the resolved chunk size; it reports how many bytes it
/// wrote and whether more data follows. A `bytes_read` of `0` ends the
/// transfer immediately, regardless of `more`.
///
/// Returns the total number of bytes transmitted on success.
pub fn transmit<T: Transport>(
    handle: &mut SessionHandle<T>,
    config: &TransferConfig,
    mut source: impl FnMut(u64, &mut [u8]) -> Result<SourceRead, CallbackError>,
) -> Result<u64, FtpError<T::Error>> {
    let resolved = config.resolve().map_err(FtpError::InvalidParam)?;

    let mut command_scratch = [0u8; COMMAND_SCRATCH_SIZE];
    let command_payload =
        encode_command(&mut command_scratch, CommandOpcode::Write, resolved.file_id);

    handle.reset_for_transfer();
    let timeout = Duration::from_millis(resolved.timeout_ms as u64);
    let mut buf = PacketBuffer::new();

    // Every failure from here on must land the handle in `Error` — the C
    // original funnels every failure path through one `handle->state =
    // DANP_FTP_STATE_ERROR` assignment; this wrapper is that funnel.
    let result = run_transmit(
        handle,
        &mut buf,
        command_payload,
        timeout,
        resolved.max_retries,
        resolved.chunk_size,
        &mut source,
    );

    match &result {
        Ok(total) => {
            handle.set_state(SessionState::Complete);
            info!("ftp transmit complete: {total} bytes");
        }
        Err(_) => handle.set_state(SessionState::Error),
    }

    result
}

fn run_transmit<T: Transport>(
    handle: &mut SessionHandle<T>,
    buf: &mut PacketBuffer,
    command_payload: &[u8],
    timeout: Duration,
    max_retries: u8,
    chunk_size: u16,
    source: &mut impl FnMut(u64, &mut [u8]) -> Result<SourceRead, CallbackError>,
) -> Result<u64, FtpError<T::Error>> {
    send_message(
        handle.transport_mut()?,
        buf,
        PacketType::Command,
        Flags::empty(),
        handle.sequence_number(),
        command_payload,
    )
    .map_err(FtpError::transfer_failed)?;

    let response = receive_message(handle.transport_mut()?, buf, timeout)
        .map_err(FtpError::transfer_failed)?;

    if response.header.packet_type != PacketType::Response {
        error!(
            "ftp unexpected response type: {:?}",
            response.header.packet_type
        );
        return Err(FtpError::transfer_failed(TransferFailure::UnexpectedType {
            got: response.header.packet_type as u8,
        }));
    }

    match response.payload.first().copied().and_then(ResponseStatus::from_u8) {
        Some(ResponseStatus::Ok) => {}
        other => {
            error!("ftp write request rejected: {other:?}");
            return Err(FtpError::transfer_failed(TransferFailure::Nack));
        }
    }

    handle.set_state(SessionState::Transferring);
    handle.set_bytes_transferred(0);
    handle.advance_sequence();

    info!("ftp transmit started");

    let mut offset: u64 = 0;
    let mut chunk_buffer = vec![0u8; chunk_size as usize];

    loop {
        let read = source(offset, &mut chunk_buffer).map_err(FtpError::Callback)?;

        if read.bytes_read == 0 {
            break;
        }

        let mut flags = Flags::empty();
        if offset == 0 {
            flags |= Flags::FIRST_CHUNK;
        }
        if !read.more {
            flags |= Flags::LAST_CHUNK;
        }

        let payload = &chunk_buffer[..read.bytes_read];
        let sequence_number = handle.sequence_number();

        let mut retries = 0u8;
        let outcome: Result<(), FtpError<T::Error>> = loop {
            let transport = match handle.transport_mut() {
                Ok(transport) => transport,
                Err(e) => break Err(e),
            };

            // `transport` is reborrowed for each call in turn rather than
            // captured by a closure, so the fallible `transport_mut()`
            // above stays outside any context pinned to `TransferFailure`.
            let attempt = match send_message(transport, buf, PacketType::Data, flags, sequence_number, payload) {
                Ok(()) => wait_for_ack(transport, buf, sequence_number, timeout),
                Err(e) => Err(e),
            };

            match attempt {
                Ok(()) => break Ok(()),
                Err(failure) if retries < max_retries.saturating_sub(1) => {
                    retries += 1;
                    warn!(
                        "ftp retry {retries}/{max_retries} for seq {sequence_number}: {failure}"
                    );
                }
                Err(_) => break Err(FtpError::transfer_failed(TransferFailure::RetriesExhausted)),
            }
        };

        if let Err(e) = outcome {
            error!("ftp max retries exceeded");
            return Err(e);
        }

        offset += read.bytes_read as u64;
        handle.set_bytes_transferred(offset);
        handle.advance_sequence();

        if !read.more {
            break;
        }
    }

    Ok(offset)
}

pub(crate) fn send_message<T: Transport>(
    transport: &mut T,
    buf: &mut PacketBuffer,
    packet_type: PacketType,
    flags: Flags,
    sequence_number: u16,
    payload: &[u8],
) -> Result<(), TransferFailure<T::Error>> {
    let encoded = buf
        .encode(packet_type, flags, sequence_number, payload)
        .map_err(TransferFailure::Framing)?;

    transport.send(encoded).map_err(TransferFailure::Transport)?;

    debug!(
        "ftp tx: type={:?} flags={:?} seq={sequence_number} len={}",
        packet_type,
        flags,
        payload.len()
    );

    Ok(())
}

pub(crate) fn receive_message<'a, T: Transport>(
    transport: &mut T,
    buf: &'a mut PacketBuffer,
    timeout: Duration,
) -> Result<DecodedPacket<'a>, TransferFailure<T::Error>> {
    let received_len = transport
        .recv(buf.as_mut_slice(), timeout)
        .map_err(TransferFailure::Transport)?;

    if received_len == 0 {
        warn!("ftp receive timeout");
        return Err(TransferFailure::Timeout);
    }

    let decoded = buf.decode(received_len).map_err(|e| {
        warn!("ftp framing error on receive: {e}");
        TransferFailure::Framing(e)
    })?;

    debug!(
        "ftp rx: type={:?} flags={:?} seq={} len={}",
        decoded.header.packet_type,
        decoded.header.flags,
        decoded.header.sequence_number,
        decoded.header.payload_length
    );

    Ok(decoded)
}

fn wait_for_ack<T: Transport>(
    transport: &mut T,
    buf: &mut PacketBuffer,
    expected_seq: u16,
    timeout: Duration,
) -> Result<(), TransferFailure<T::Error>> {
    let message = receive_message(transport, buf, timeout)?;

    match message.header.packet_type {
        PacketType::Ack if message.header.sequence_number == expected_seq => Ok(()),
        PacketType::Ack => {
            warn!(
                "ftp ack seq mismatch: expected={expected_seq} got={}",
                message.header.sequence_number
            );
            Err(TransferFailure::SequenceMismatch {
                expected: expected_seq,
                got: message.header.sequence_number,
            })
        }
        PacketType::Nack => {
            warn!("ftp received nack");
            Err(TransferFailure::Nack)
        }
        other => {
            warn!("ftp unexpected packet type: {other:?}");
            Err(TransferFailure::UnexpectedType { got: other as u8 })
        }
    }
}
