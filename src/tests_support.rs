//! An in-memory, scripted [`Transport`] double used only by the engine's
//! own unit tests and by the integration tests under `tests/`.
//!
//! Two modes: [`LoopbackTransport::scripted_transmit`] plays a compliant
//! (or deliberately lossy) receiving peer, echoing RESPONSE/ACK packets
//! back at whatever this end sends — used to exercise [`crate::transmit`].
//! [`LoopbackTransport::scripted_receive`] preloads a fixed script of
//! packets a sending peer would have emitted — used to exercise
//! [`crate::receive`].

use std::collections::VecDeque;
use std::convert::Infallible;
use std::time::Duration;

use crate::packet::{Flags, PacketBuffer, PacketType, ResponseStatus};
use crate::transport::Transport;

enum Mode {
    EchoPeer { drop_ack_for_send: Option<usize>, data_sends_seen: usize },
    Scripted,
}

/// One packet in a [`LoopbackTransport::scripted_receive`] script.
pub struct ScriptedChunk {
    pub sequence_number: u16,
    pub flags: Flags,
    pub payload: Vec<u8>,
    pub corrupt: bool,
}

impl ScriptedChunk {
    pub fn new(sequence_number: u16, flags: Flags, payload: &[u8]) -> Self {
        Self {
            sequence_number,
            flags,
            payload: payload.to_vec(),
            corrupt: false,
        }
    }

    pub fn corrupted(mut self) -> Self {
        self.corrupt = true;
        self
    }
}

pub struct LoopbackTransport {
    mode: Mode,
    inbox: VecDeque<Vec<u8>>,
    pub sent: Vec<Vec<u8>>,
}

impl LoopbackTransport {
    /// A peer that answers every COMMAND with RESPONSE/Ok and every DATA
    /// packet with a correctly sequenced ACK.
    pub fn scripted_transmit() -> Self {
        Self {
            mode: Mode::EchoPeer {
                drop_ack_for_send: None,
                data_sends_seen: 0,
            },
            inbox: VecDeque::new(),
            sent: Vec::new(),
        }
    }

    /// Like [`Self::scripted_transmit`], but silently drops the ACK for
    /// the `nth` (0-based) DATA packet sent, forcing a retry.
    pub fn scripted_transmit_dropping_ack(nth: usize) -> Self {
        Self {
            mode: Mode::EchoPeer {
                drop_ack_for_send: Some(nth),
                data_sends_seen: 0,
            },
            inbox: VecDeque::new(),
            sent: Vec::new(),
        }
    }

    /// A peer that answers the handshake with `response` and, if that is
    /// [`ResponseStatus::Ok`], proactively delivers `chunks` in order.
    pub fn scripted_receive(response: ResponseStatus, chunks: Vec<ScriptedChunk>) -> Self {
        let mut inbox = VecDeque::new();
        let mut scratch = PacketBuffer::new();

        let encoded = scratch
            .encode(PacketType::Response, Flags::empty(), 0, &[response as u8])
            .expect("status byte always fits")
            .to_vec();
        inbox.push_back(encoded);

        if response == ResponseStatus::Ok {
            for chunk in chunks {
                let mut scratch = PacketBuffer::new();
                let mut encoded = scratch
                    .encode(
                        PacketType::Data,
                        chunk.flags,
                        chunk.sequence_number,
                        &chunk.payload,
                    )
                    .expect("test script payload fits MAX_PAYLOAD")
                    .to_vec();
                if chunk.corrupt {
                    let last = encoded.len() - 1;
                    encoded[last] ^= 0x01;
                }
                inbox.push_back(encoded);
            }
        }

        Self {
            mode: Mode::Scripted,
            inbox,
            sent: Vec::new(),
        }
    }
}

impl Transport for LoopbackTransport {
    type Error = Infallible;

    fn connect(&mut self, _node_id: u16, _port: u16) -> Result<(), Infallible> {
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), Infallible> {
        self.sent.push(bytes.to_vec());

        if let Mode::EchoPeer {
            drop_ack_for_send,
            data_sends_seen,
        } = &mut self.mode
        {
            let packet_type = bytes[0];
            let sequence_number = u16::from_le_bytes([bytes[2], bytes[3]]);
            let mut scratch = PacketBuffer::new();

            if packet_type == PacketType::Command as u8 {
                let encoded = scratch
                    .encode(PacketType::Response, Flags::empty(), 0, &[ResponseStatus::Ok as u8])
                    .expect("status byte always fits")
                    .to_vec();
                self.inbox.push_back(encoded);
            } else if packet_type == PacketType::Data as u8 {
                let this_send = *data_sends_seen;
                *data_sends_seen += 1;
                if *drop_ack_for_send != Some(this_send) {
                    let encoded = scratch
                        .encode(PacketType::Ack, Flags::empty(), sequence_number, &[])
                        .expect("empty payload always fits")
                        .to_vec();
                    self.inbox.push_back(encoded);
                }
            }
        }

        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, Infallible> {
        match self.inbox.pop_front() {
            Some(bytes) => {
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok(bytes.len())
            }
            None => Ok(0),
        }
    }

    fn close(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}
