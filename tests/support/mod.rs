//! Scripted in-memory [`Transport`] double for the end-to-end scenarios in
//! `tests/transfer.rs`. A thin duplicate of the unit-test double in
//! `src/tests_support.rs` — integration tests compile against the public
//! API only, so it can't reach that `pub(crate)` module.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::Once;
use std::time::Duration;

use danp_ftp::packet::{Flags, PacketBuffer, PacketType, ResponseStatus};
use danp_ftp::Transport;

static LOGGER_INIT: Once = Once::new();

/// Initializes a terminal logger so `RUST_LOG`-style protocol tracing
/// (packet TX/RX, retries, NACKs) is visible under `cargo test -- --nocapture`,
/// the same way the teacher's demos init a `TermLogger` before driving the
/// real protocol. Safe to call from every test: only the first call wins.
pub fn init_logger() {
    LOGGER_INIT.call_once(|| {
        let _ = simplelog::TermLogger::init(
            log::LevelFilter::Debug,
            simplelog::Config::default(),
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        );
    });
}

enum Mode {
    EchoPeer {
        drop_ack_for_send: Option<usize>,
        data_sends_seen: usize,
    },
    Scripted,
}

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
}

impl LoopbackTransport {
    pub fn scripted_transmit() -> Self {
        Self {
            mode: Mode::EchoPeer {
                drop_ack_for_send: None,
                data_sends_seen: 0,
            },
            inbox: VecDeque::new(),
        }
    }

    pub fn scripted_transmit_dropping_ack(nth: usize) -> Self {
        Self {
            mode: Mode::EchoPeer {
                drop_ack_for_send: Some(nth),
                data_sends_seen: 0,
            },
            inbox: VecDeque::new(),
        }
    }

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
                    .encode(PacketType::Data, chunk.flags, chunk.sequence_number, &chunk.payload)
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
        }
    }
}

impl Transport for LoopbackTransport {
    type Error = Infallible;

    fn connect(&mut self, _node_id: u16, _port: u16) -> Result<(), Infallible> {
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), Infallible> {
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
