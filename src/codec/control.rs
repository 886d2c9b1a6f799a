//! Control header and control reply layouts.
//!
//! A control transfer of `n` registers is `4 + 4n + 4` bytes in each
//! direction. The host sends the header, then `n` value words (zeros for a
//! read), then one ignored word. The MAC-PHY answers one word late: an
//! ignored word, the echoed header, then `n` data words (read values, or
//! the echoed write values).

use super::{DecodeError, field, flag, parity_ok, with_parity, word_from_bytes};
use crate::internal::constants::{MAX_CONTROL_REGS, WORD_SIZE};
use crate::internal::tc6_regs::ctrl;

// =============================================================================
// Memory Map Selector
// =============================================================================

/// Memory map selector (4-bit MMS field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mms(u8);

impl Mms {
    /// OPEN Alliance standard registers and Clause 22 PHY window
    pub const STANDARD: Mms = Mms(0);
    /// MAC registers
    pub const MAC: Mms = Mms(1);
    /// PHY PCS registers (MMD 3)
    pub const PHY_PCS: Mms = Mms(2);
    /// PHY PMA/PMD registers (MMD 1)
    pub const PHY_PMA_PMD: Mms = Mms(3);
    /// PHY vendor-specific registers (MMD 31), including PLCA
    pub const PHY_VENDOR: Mms = Mms(4);
    /// PHY auto-negotiation registers (MMD 7)
    pub const PHY_AN: Mms = Mms(5);
    /// PHY power unit registers (MMD 13)
    pub const PHY_POWER: Mms = Mms(6);

    /// Build a selector, `None` if it does not fit in four bits.
    pub const fn new(value: u8) -> Option<Self> {
        if value <= 0xF { Some(Mms(value)) } else { None }
    }

    /// Raw selector value
    pub const fn value(self) -> u8 {
        self.0
    }
}

// =============================================================================
// Control Header
// =============================================================================

/// Control header fields.
///
/// `count` is the number of registers (1..=128); the wire carries
/// `count - 1`. `header_bad` is only ever set in an echoed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlHeader {
    /// Write, not read
    pub write: bool,
    /// Address increment disable
    pub no_increment: bool,
    /// Memory map selector
    pub mms: Mms,
    /// First register address
    pub addr: u16,
    /// Register count (1..=128)
    pub count: u8,
    /// Header bad, reported by the MAC-PHY
    pub header_bad: bool,
}

impl ControlHeader {
    /// Read `count` consecutive registers.
    pub const fn read(mms: Mms, addr: u16, count: u8) -> Self {
        Self {
            write: false,
            no_increment: false,
            mms,
            addr,
            count,
            header_bad: false,
        }
    }

    /// Write `count` consecutive registers.
    pub const fn write(mms: Mms, addr: u16, count: u8) -> Self {
        Self {
            write: true,
            no_increment: false,
            mms,
            addr,
            count,
            header_bad: false,
        }
    }

    /// Number of registers as `usize`
    pub const fn word_count(&self) -> usize {
        self.count as usize
    }

    /// Encode with parity.
    ///
    /// `count` is clamped into 1..=128 so the LEN field cannot wrap.
    pub const fn encode(&self) -> u32 {
        let count = if self.count == 0 {
            1
        } else if self.count as usize > MAX_CONTROL_REGS {
            MAX_CONTROL_REGS as u8
        } else {
            self.count
        };
        let word = flag(self.header_bad, ctrl::HDRB)
            | flag(self.write, ctrl::WNR)
            | flag(self.no_increment, ctrl::AID)
            | (((self.mms.0 as u32) << ctrl::MMS_SHIFT) & ctrl::MMS_MASK)
            | ((self.addr as u32) << ctrl::ADDR_SHIFT)
            | (((count - 1) as u32) << ctrl::LEN_SHIFT);
        with_parity(word)
    }

    /// Encode to the four wire bytes.
    pub const fn to_bytes(&self) -> [u8; WORD_SIZE] {
        self.encode().to_be_bytes()
    }

    /// Decode a received control header word.
    ///
    /// A word with DNC set is a data header, not a control header.
    pub const fn decode(word: u32) -> Result<Self, DecodeError> {
        if !parity_ok(word) {
            return Err(DecodeError::Parity);
        }
        if word & ctrl::DNC != 0 {
            return Err(DecodeError::Malformed);
        }
        Ok(Self {
            write: word & ctrl::WNR != 0,
            no_increment: word & ctrl::AID != 0,
            mms: Mms(field(word, ctrl::MMS_MASK, ctrl::MMS_SHIFT) as u8),
            addr: field(word, ctrl::ADDR_MASK, ctrl::ADDR_SHIFT) as u16,
            count: field(word, ctrl::LEN_MASK, ctrl::LEN_SHIFT) as u8 + 1,
            header_bad: word & ctrl::HDRB != 0,
        })
    }

    /// Decode four received bytes.
    pub fn decode_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::decode(word_from_bytes(bytes)?)
    }

    /// Same request, ignoring the MAC-PHY's header-bad flag.
    pub const fn same_request(&self, other: &ControlHeader) -> bool {
        self.write == other.write
            && self.no_increment == other.no_increment
            && self.mms.0 == other.mms.0
            && self.addr == other.addr
            && self.count == other.count
    }
}

/// Encode a control header to wire bytes.
pub const fn encode_control_header(header: &ControlHeader) -> [u8; WORD_SIZE] {
    header.to_bytes()
}

// =============================================================================
// Control Reply
// =============================================================================

/// Decoded control reply: echoed header plus its data words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlReply<'a> {
    /// Echoed header
    pub header: ControlHeader,
    /// Raw data words (big-endian), `header.count` words long
    pub data: &'a [u8],
}

impl ControlReply<'_> {
    /// Data word `index`, `None` past the end.
    pub fn value(&self, index: usize) -> Option<u32> {
        let start = index.checked_mul(WORD_SIZE)?;
        let bytes = self.data.get(start..start.checked_add(WORD_SIZE)?)?;
        word_from_bytes(bytes).ok()
    }

    /// Iterate the data words.
    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        self.data
            .chunks_exact(WORD_SIZE)
            .map(|w| u32::from_be_bytes([w[0], w[1], w[2], w[3]]))
    }
}

/// Decode the receive side of a control transfer.
///
/// `bytes` is the whole received buffer: one ignored word, the echoed
/// header, then the data words announced by the echoed LEN field.
pub fn decode_control_reply(bytes: &[u8]) -> Result<ControlReply<'_>, DecodeError> {
    let header_bytes = bytes
        .get(WORD_SIZE..2 * WORD_SIZE)
        .ok_or(DecodeError::Malformed)?;
    let header = ControlHeader::decode_bytes(header_bytes)?;
    let data_start = 2 * WORD_SIZE;
    let data = bytes
        .get(data_start..data_start + header.word_count() * WORD_SIZE)
        .ok_or(DecodeError::Malformed)?;
    Ok(ControlReply { header, data })
}

// =============================================================================
// Unit Tests
// =============================================================================
