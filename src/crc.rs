//! CRC32 integrity codec.
//!
//! Packets are guarded by a reflected CRC-32 computed over the payload
//! bytes only (the header is never included). The algorithm — polynomial
//! 0xEDB88320, init 0xFFFFFFFF, final XOR 0xFFFFFFFF, both input and
//! output reflected — is the same one the `crc` crate ships as
//! [`crc::CRC_32_ISO_HDLC`].

use crc::Crc;

/// Reflected CRC-32 (poly 0xEDB88320, init/xorout 0xFFFFFFFF) used to guard
/// DATA packet payload integrity.
pub const PAYLOAD_CRC32: Crc<u32> = Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);

/// Computes the CRC32 of `payload`.
pub fn compute(payload: &[u8]) -> u32 {
    PAYLOAD_CRC32.checksum(payload)
}

/// Verifies that `payload` hashes to `expected`.
pub fn verify(expected: u32, payload: &[u8]) -> bool {
    compute(payload) == expected
}
