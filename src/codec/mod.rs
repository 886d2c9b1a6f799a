//! TC6 wire codec.
//!
//! Pure translation between the 32-bit words exchanged on the SPI link and
//! typed structures. Nothing here performs I/O or keeps state.
//!
//! - [`control`]: control headers and control replies
//! - [`data`]: data-chunk headers (host to MAC-PHY) and footers (MAC-PHY to host)
//!
//! Every word carries a parity bit in bit 0. TC6 uses odd parity: the parity
//! bit is chosen so that the whole 32-bit word contains an odd number of
//! ones. Decoding is total; any input yields a structure or a
//! [`DecodeError`], and received bytes are never indexed out of bounds.

pub mod control;
pub mod data;

pub use control::{
    ControlHeader, ControlReply, Mms, decode_control_reply, encode_control_header,
};
pub use data::{DataFooter, DataHeader, decode_footer};

use crate::internal::constants::WORD_SIZE;
use crate::internal::tc6_regs::PARITY;

// =============================================================================
// Decode Errors
// =============================================================================

/// Outcome of decoding an untrusted wire word that does not yield a structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Parity bit inconsistent with the other 31 bits
    Parity,
    /// Wrong length or a word of the wrong kind
    Malformed,
}

impl DecodeError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DecodeError::Parity => "parity error",
            DecodeError::Malformed => "malformed word",
        }
    }
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Parity
// =============================================================================

/// Parity bit (0 or 1) for `word`, ignoring whatever is in bit 0.
///
/// The result makes the total number of ones in the word odd.
#[inline]
pub const fn compute_parity(word: u32) -> u32 {
    if (word & !PARITY).count_ones() % 2 == 0 {
        1
    } else {
        0
    }
}

/// `word` with bit 0 replaced by its parity bit.
#[inline]
pub const fn with_parity(word: u32) -> u32 {
    (word & !PARITY) | compute_parity(word)
}

/// Whether a received word carries consistent parity.
#[inline]
pub const fn parity_ok(word: u32) -> bool {
    word.count_ones() % 2 == 1
}

// =============================================================================
// Word Helpers
// =============================================================================

/// Read one big-endian word; `Malformed` unless exactly four bytes.
pub fn word_from_bytes(bytes: &[u8]) -> Result<u32, DecodeError> {
    let word: [u8; WORD_SIZE] = bytes.try_into().map_err(|_| DecodeError::Malformed)?;
    Ok(u32::from_be_bytes(word))
}

#[inline]
pub(crate) const fn flag(set: bool, mask: u32) -> u32 {
    if set { mask } else { 0 }
}

#[inline]
pub(crate) const fn field(word: u32, mask: u32, shift: u32) -> u32 {
    (word & mask) >> shift
}

// =============================================================================
// Unit Tests
// =============================================================================
