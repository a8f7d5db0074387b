//! Little-endian decoding of packet fields from a received byte slice.

use thiserror::Error;

#[derive(Debug, PartialEq, Eq)]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub decoded_type: &'static str,
}

impl DecodeError {
    pub fn new<T>(kind: DecodeErrorKind) -> Self {
        Self {
            kind,
            decoded_type: std::any::type_name::<T>(),
        }
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to decode {}: {}", self.decoded_type, self.kind)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeErrorKind {
    #[error("packet too short")]
    PacketTooShort,
    #[error(
        "could not decode byte with unexpected value. found {value:x}, expected one of: {expected:x?}"
    )]
    UnexpectedValue {
        value: u8,
        expected: &'static [u8],
    },
    #[error("payload_length {got} exceeds the maximum payload size of {max}")]
    PayloadTooLarge { got: u16, max: u16 },
    #[error("crc mismatch: header said {expected:08x}, computed {computed:08x}")]
    ChecksumMismatch { expected: u32, computed: u32 },
}

pub trait Decode {
    fn decode(data: impl IntoIterator<Item = u8>) -> Result<Self, DecodeError>
    where
        Self: Sized;
}

impl Decode for u8 {
    fn decode(data: impl IntoIterator<Item = u8>) -> Result<Self, DecodeError> {
        let mut data = data.into_iter();
        data.next()
            .ok_or_else(|| DecodeError::new::<u8>(DecodeErrorKind::PacketTooShort))
    }
}

impl Decode for u16 {
    fn decode(data: impl IntoIterator<Item = u8>) -> Result<Self, DecodeError> {
        let mut data = data.into_iter();
        let lo = u8::decode(&mut data)?;
        let hi = u8::decode(&mut data)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }
}

impl Decode for u32 {
    fn decode(data: impl IntoIterator<Item = u8>) -> Result<Self, DecodeError> {
        let mut data = data.into_iter();
        let b0 = u8::decode(&mut data)?;
        let b1 = u8::decode(&mut data)?;
        let b2 = u8::decode(&mut data)?;
        let b3 = u8::decode(&mut data)?;
        Ok(u32::from_le_bytes([b0, b1, b2, b3]))
    }
}
