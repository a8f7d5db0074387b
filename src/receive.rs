//! The receive engine: pulls a file from a connected peer in chunks,
//! NACKing anything that doesn't look like the next expected packet.
//!
//! Grounded line-for-line on `danp_ftp_receive` in the original C source:
//! the handshake (COMMAND/READ, wait for RESPONSE, FILE_NOT_FOUND
//! handling), the chunk loop that NACKs on wrong type or sequence number,
//! and ACK-per-accepted-chunk.

use std::time::Duration;

use log::{error, info, warn};

use crate::config::TransferConfig;
use crate::error::{CallbackError, FtpError, TransferFailure};
use crate::packet::{encode_command, CommandOpcode, Flags, PacketBuffer, PacketType, ResponseStatus, COMMAND_SCRATCH_SIZE};
use crate::session::SessionHandle;
use crate::state::SessionState;
use crate::transmit::{receive_message, send_message};
use crate::transport::Transport;

/// Receives the data identified by `config.file_id()` from the peer
/// `handle` is connected to.
///
/// `sink` is called once per accepted chunk with the write offset, the
/// chunk's bytes, and whether more chunks follow. Returns the total
/// number of bytes received on success.
pub fn receive<T: Transport>(
    handle: &mut SessionHandle<T>,
    config: &TransferConfig,
    mut sink: impl FnMut(u64, &[u8], bool) -> Result<(), CallbackError>,
) -> Result<u64, FtpError<T::Error>> {
    let resolved = config.resolve().map_err(FtpError::InvalidParam)?;

    let mut command_scratch = [0u8; COMMAND_SCRATCH_SIZE];
    let command_payload = encode_command(&mut command_scratch, CommandOpcode::Read, resolved.file_id);

    handle.reset_for_transfer();
    let timeout = Duration::from_millis(resolved.timeout_ms as u64);
    let mut buf = PacketBuffer::new();

    // Every failure from here on must land the handle in `Error` — the C
    // original funnels every failure path through one `handle->state =
    // DANP_FTP_STATE_ERROR` assignment; this wrapper is that funnel.
    let result = run_receive(handle, &mut buf, command_payload, timeout, &mut sink);

    match &result {
        Ok(total) => {
            handle.set_state(SessionState::Complete);
            info!("ftp receive complete: {total} bytes");
        }
        Err(_) => handle.set_state(SessionState::Error),
    }

    result
}

fn run_receive<T: Transport>(
    handle: &mut SessionHandle<T>,
    buf: &mut PacketBuffer,
    command_payload: &[u8],
    timeout: Duration,
    sink: &mut impl FnMut(u64, &[u8], bool) -> Result<(), CallbackError>,
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

    let response =
        receive_message(handle.transport_mut()?, buf, timeout).map_err(FtpError::transfer_failed)?;

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
        Some(ResponseStatus::FileNotFound) => {
            error!("ftp file not found");
            return Err(FtpError::FileNotFound);
        }
        Some(ResponseStatus::Ok) => {}
        other => {
            error!("ftp read request rejected: {other:?}");
            return Err(FtpError::transfer_failed(TransferFailure::Nack));
        }
    }

    handle.set_state(SessionState::Transferring);
    handle.set_bytes_transferred(0);
    handle.advance_sequence();

    info!("ftp receive started");

    let mut offset: u64 = 0;

    loop {
        let data = receive_message(handle.transport_mut()?, buf, timeout).map_err(|failure| {
            error!("ftp receive data failed: {failure}");
            FtpError::transfer_failed(failure)
        })?;

        if data.header.packet_type != PacketType::Data {
            warn!("ftp unexpected packet type: {:?}", data.header.packet_type);
            let _ = send_message(
                handle.transport_mut()?,
                buf,
                PacketType::Nack,
                Flags::empty(),
                handle.sequence_number(),
                &[],
            );
            continue;
        }

        let sequence_number = data.header.sequence_number;
        let expected = handle.sequence_number();
        if sequence_number != expected {
            warn!("ftp seq mismatch: expected={expected} got={sequence_number}");
            let _ = send_message(
                handle.transport_mut()?,
                buf,
                PacketType::Nack,
                Flags::empty(),
                expected,
                &[],
            );
            continue;
        }

        let more = !data.header.flags.contains(Flags::LAST_CHUNK);
        let payload_len = data.payload.len();

        sink(offset, data.payload, more).map_err(FtpError::Callback)?;

        send_message(
            handle.transport_mut()?,
            buf,
            PacketType::Ack,
            Flags::empty(),
            expected,
            &[],
        )
        .map_err(FtpError::transfer_failed)?;

        offset += payload_len as u64;
        handle.set_bytes_transferred(offset);
        handle.advance_sequence();

        if !more {
            break;
        }
    }

    Ok(offset)
}
