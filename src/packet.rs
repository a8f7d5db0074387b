//! Wire packet framing: header, payload kinds, and the fixed scratch
//! buffer packets are encoded into and decoded from.
//!
//! Layout (7-byte header, little-endian fields), per the wire format:
//!
//! ```text
//! +------+-------+-----------------+-----------------+---------+-----------------+
//! | type | flags | sequence_number | payload_length   | crc     | payload[..len]  |
//! | u8   | u8    | u16              | u16              | u32     |                 |
//! +------+-------+-----------------+-----------------+---------+-----------------+
//! ```

use bitflags::bitflags;

use crate::crc;
use crate::decode::{Decode, DecodeError, DecodeErrorKind};
use crate::encode::{Encode, MessageEncoder};

/// Size of the fixed packet header, in bytes.
pub const HEADER_SIZE: usize = 7;

/// Assumed maximum datagram size the underlying transport can carry in one
/// `send`/`recv`. This is the compile-time upper bound the spec's resource
/// model calls for; a transport with a smaller MTU should clamp
/// `chunk_size` in its [`crate::TransferConfig`] accordingly.
pub const MAX_PACKET_SIZE: usize = 512;

/// Maximum payload size: `MAX_PACKET_SIZE - HEADER_SIZE`.
pub const MAX_PAYLOAD: usize = MAX_PACKET_SIZE - HEADER_SIZE;

/// Size of the command-payload scratch buffer (opcode + file_id_len +
/// file_id).
pub const COMMAND_SCRATCH_SIZE: usize = 128;

/// Tightest bound on `file_id` length the 128-byte command scratch buffer
/// admits: 1 opcode byte + 1 length byte + up to 125 id bytes + 1 byte of
/// headroom. See the "command scratch buffer" open question in
/// SPEC_FULL.md §9.
pub const MAX_FILE_ID_LEN: usize = COMMAND_SCRATCH_SIZE - 3;

/// Packet type, carried in the header's `type` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    Command = 0,
    Response = 1,
    Ack = 2,
    Nack = 3,
    Data = 4,
}

impl PacketType {
    const ALL: &'static [u8] = &[0, 1, 2, 3, 4];

    fn from_u8(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(Self::Command),
            1 => Ok(Self::Response),
            2 => Ok(Self::Ack),
            3 => Ok(Self::Nack),
            4 => Ok(Self::Data),
            v => Err(DecodeError::new::<Self>(DecodeErrorKind::UnexpectedValue {
                value: v,
                expected: Self::ALL,
            })),
        }
    }
}

impl Encode for PacketType {
    fn size(&self) -> usize {
        1
    }

    fn encode(&self, data: &mut [u8]) {
        (*self as u8).encode(data);
    }
}

bitflags! {
    /// Header flag bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u8 {
        /// Marks the final DATA packet of a transfer.
        const LAST_CHUNK = 0x01;
        /// Marks the first DATA packet of a transfer.
        const FIRST_CHUNK = 0x02;
    }
}

impl Encode for Flags {
    fn size(&self) -> usize {
        1
    }

    fn encode(&self, data: &mut [u8]) {
        self.bits().encode(data);
    }
}

/// The 7-byte packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub packet_type: PacketType,
    pub flags: Flags,
    pub sequence_number: u16,
    pub payload_length: u16,
    pub crc: u32,
}

impl Encode for PacketHeader {
    fn size(&self) -> usize {
        HEADER_SIZE
    }

    fn encode(&self, data: &mut [u8]) {
        let mut enc = MessageEncoder::new(data);
        enc.write(&self.packet_type);
        enc.write(&self.flags);
        enc.write(&self.sequence_number);
        enc.write(&self.payload_length);
        enc.write(&self.crc);
    }
}

impl PacketHeader {
    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < HEADER_SIZE {
            return Err(DecodeError::new::<Self>(DecodeErrorKind::PacketTooShort));
        }
        let mut bytes = data[..HEADER_SIZE].iter().copied();
        let packet_type = PacketType::from_u8(u8::decode(&mut bytes)?)?;
        let flags = Flags::from_bits_truncate(u8::decode(&mut bytes)?);
        let sequence_number = u16::decode(&mut bytes)?;
        let payload_length = u16::decode(&mut bytes)?;
        let crc = u32::decode(&mut bytes)?;
        Ok(Self {
            packet_type,
            flags,
            sequence_number,
            payload_length,
            crc,
        })
    }
}

/// A fixed scratch buffer a packet is encoded into before it is handed to
/// the transport, and decoded from after it is received. No heap
/// allocation occurs on this path.
pub struct PacketBuffer {
    bytes: [u8; HEADER_SIZE + MAX_PAYLOAD],
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self {
            bytes: [0u8; HEADER_SIZE + MAX_PAYLOAD],
        }
    }
}

impl PacketBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes a packet with the given fields into this buffer and returns
    /// the slice that should be handed to the transport
    /// (`HEADER_SIZE + payload.len()` bytes).
    ///
    /// Returns [`DecodeErrorKind::PayloadTooLarge`] wrapped in a
    /// [`DecodeError`] if `payload` exceeds [`MAX_PAYLOAD`] (reused here as
    /// the single "oversized payload" error type for both directions).
    pub fn encode(
        &mut self,
        packet_type: PacketType,
        flags: Flags,
        sequence_number: u16,
        payload: &[u8],
    ) -> Result<&[u8], DecodeError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(DecodeError::new::<Self>(DecodeErrorKind::PayloadTooLarge {
                got: payload.len() as u16,
                max: MAX_PAYLOAD as u16,
            }));
        }

        self.bytes = [0u8; HEADER_SIZE + MAX_PAYLOAD];

        let header = PacketHeader {
            packet_type,
            flags,
            sequence_number,
            payload_length: payload.len() as u16,
            crc: crc::compute(payload),
        };
        header.encode(&mut self.bytes[..HEADER_SIZE]);
        self.bytes[HEADER_SIZE..HEADER_SIZE + payload.len()].copy_from_slice(payload);

        Ok(&self.bytes[..HEADER_SIZE + payload.len()])
    }

    /// Mutable access to the full buffer, for a transport's `recv` call.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Decodes the first `received_len` bytes of the buffer as a packet,
    /// validating the header's declared payload length and CRC before
    /// exposing the payload.
    pub fn decode(&self, received_len: usize) -> Result<DecodedPacket<'_>, DecodeError> {
        let data = &self.bytes[..received_len.min(self.bytes.len())];
        let header = PacketHeader::decode(data)?;

        if header.payload_length as usize > MAX_PAYLOAD {
            return Err(DecodeError::new::<PacketHeader>(DecodeErrorKind::PayloadTooLarge {
                got: header.payload_length,
                max: MAX_PAYLOAD as u16,
            }));
        }

        let payload_end = HEADER_SIZE + header.payload_length as usize;
        if data.len() < payload_end {
            return Err(DecodeError::new::<PacketHeader>(DecodeErrorKind::PacketTooShort));
        }
        let payload = &data[HEADER_SIZE..payload_end];

        let computed = crc::compute(payload);
        if computed != header.crc {
            return Err(DecodeError::new::<PacketHeader>(DecodeErrorKind::ChecksumMismatch {
                expected: header.crc,
                computed,
            }));
        }

        Ok(DecodedPacket { header, payload })
    }
}

/// A decoded, CRC-verified packet borrowed from a [`PacketBuffer`].
#[derive(Debug)]
pub struct DecodedPacket<'a> {
    pub header: PacketHeader,
    pub payload: &'a [u8],
}

/// Command opcodes carried in a COMMAND packet's first payload byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandOpcode {
    Read = 0x01,
    Write = 0x02,
    Abort = 0x03,
}

/// Response status codes carried in a RESPONSE packet's first payload
/// byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResponseStatus {
    Ok = 0x00,
    Error = 0x01,
    FileNotFound = 0x02,
    Busy = 0x03,
}

impl ResponseStatus {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Ok),
            0x01 => Some(Self::Error),
            0x02 => Some(Self::FileNotFound),
            0x03 => Some(Self::Busy),
            _ => None,
        }
    }
}

/// Builds a COMMAND payload: `[opcode][file_id_len][file_id...]`.
///
/// `out` must be at least `2 + file_id.len()` bytes; returns the slice
/// actually written.
pub fn encode_command<'a>(
    out: &'a mut [u8; COMMAND_SCRATCH_SIZE],
    opcode: CommandOpcode,
    file_id: &[u8],
) -> &'a [u8] {
    out[0] = opcode as u8;
    out[1] = file_id.len() as u8;
    out[2..2 + file_id.len()].copy_from_slice(file_id);
    &out[..2 + file_id.len()]
}
