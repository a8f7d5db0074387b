//! Transfer configuration: file identifier, chunk size, timeout, retries.
//!
//! Grounded on `danp_ftp_transfer_config_t` (original C header) and the
//! defaulting block at the top of `danp_ftp_transmit`/`danp_ftp_receive`:
//! `chunk_size == 0` defaults to 64 and is clamped to
//! [`crate::packet::MAX_PAYLOAD`]; `timeout_ms == 0` defaults to 5000;
//! `max_retries == 0` defaults to 3.

use crate::packet::{MAX_FILE_ID_LEN, MAX_PAYLOAD};

const DEFAULT_CHUNK_SIZE: u16 = 64;
const DEFAULT_TIMEOUT_MS: u32 = 5000;
const DEFAULT_MAX_RETRIES: u8 = 3;

/// Parameters for a single transmit or receive operation.
///
/// `chunk_size`, `timeout_ms`, and `max_retries` of `0` mean "use the
/// default"; `chunk_size` is silently clamped to
/// [`crate::packet::MAX_PAYLOAD`].
#[derive(Debug, Clone)]
pub struct TransferConfig {
    file_id: Vec<u8>,
    chunk_size: u16,
    timeout_ms: u32,
    max_retries: u8,
}

impl TransferConfig {
    /// Creates a config for `file_id`, with every other field left at its
    /// "use the default" sentinel.
    pub fn new(file_id: impl Into<Vec<u8>>) -> Self {
        Self {
            file_id: file_id.into(),
            chunk_size: 0,
            timeout_ms: 0,
            max_retries: 0,
        }
    }

    pub fn chunk_size(mut self, chunk_size: u16) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn max_retries(mut self, max_retries: u8) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn file_id(&self) -> &[u8] {
        &self.file_id
    }

    /// Applies defaulting and clamping, returning an error message if the
    /// config is structurally invalid. Does not otherwise validate.
    pub(crate) fn resolve(&self) -> Result<ResolvedConfig, &'static str> {
        if self.file_id.is_empty() {
            return Err("file_id must not be empty");
        }
        if self.file_id.len() > MAX_FILE_ID_LEN {
            return Err("file_id exceeds the maximum supported length");
        }

        let chunk_size = match self.chunk_size {
            0 => DEFAULT_CHUNK_SIZE,
            n => n,
        }
        .min(MAX_PAYLOAD as u16);

        let timeout_ms = match self.timeout_ms {
            0 => DEFAULT_TIMEOUT_MS,
            n => n,
        };

        let max_retries = match self.max_retries {
            0 => DEFAULT_MAX_RETRIES,
            n => n,
        };

        Ok(ResolvedConfig {
            file_id: &self.file_id,
            chunk_size,
            timeout_ms,
            max_retries,
        })
    }
}

/// [`TransferConfig`] after defaulting and clamping has been applied.
pub(crate) struct ResolvedConfig<'a> {
    pub file_id: &'a [u8],
    pub chunk_size: u16,
    pub timeout_ms: u32,
    pub max_retries: u8,
}
