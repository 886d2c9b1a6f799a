//! Data chunk header and footer layouts.
//!
//! A data chunk on the host side is a header word followed by the payload;
//! the MAC-PHY side of the same exchange is a payload followed by a footer
//! word. Offsets follow the wire encoding: `start_word_offset` counts 32-bit
//! words from the start of the payload, `end_byte_offset` is the index of
//! the last valid byte.

use super::{DecodeError, field, flag, parity_ok, with_parity, word_from_bytes};
use crate::internal::constants::WORD_SIZE;
use crate::internal::tc6_regs::{data_ftr, data_hdr};

// =============================================================================
// Data Header
// =============================================================================

/// Data chunk header (host to MAC-PHY)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataHeader {
    /// Data chunk sequence bit
    pub seq: bool,
    /// Ask the MAC-PHY not to place receive data in this chunk
    pub no_rx: bool,
    /// Vendor specific (2 bits)
    pub vs: u8,
    /// Payload carries transmit data
    pub data_valid: bool,
    /// A frame starts in this chunk
    pub start_valid: bool,
    /// Word offset of the frame start (4 bits)
    pub start_word_offset: u8,
    /// A frame ends in this chunk
    pub end_valid: bool,
    /// Index of the frame's last byte in the payload (6 bits)
    pub end_byte_offset: u8,
    /// Transmit timestamp capture selector (2 bits)
    pub timestamp_capture: u8,
}

impl DataHeader {
    /// Header of a chunk that carries no transmit data.
    ///
    /// Used to poll for credits, pull receive data and deassert IRQn.
    pub const EMPTY: DataHeader = DataHeader {
        seq: false,
        no_rx: false,
        vs: 0,
        data_valid: false,
        start_valid: false,
        start_word_offset: 0,
        end_valid: false,
        end_byte_offset: 0,
        timestamp_capture: 0,
    };

    /// Encode with parity.
    pub const fn encode(&self) -> u32 {
        let word = data_hdr::DNC
            | flag(self.seq, data_hdr::SEQ)
            | flag(self.no_rx, data_hdr::NORX)
            | (((self.vs as u32) << data_hdr::VS_SHIFT) & data_hdr::VS_MASK)
            | flag(self.data_valid, data_hdr::DV)
            | flag(self.start_valid, data_hdr::SV)
            | (((self.start_word_offset as u32) << data_hdr::SWO_SHIFT) & data_hdr::SWO_MASK)
            | flag(self.end_valid, data_hdr::EV)
            | (((self.end_byte_offset as u32) << data_hdr::EBO_SHIFT) & data_hdr::EBO_MASK)
            | (((self.timestamp_capture as u32) << data_hdr::TSC_SHIFT) & data_hdr::TSC_MASK);
        with_parity(word)
    }

    /// Encode to the four wire bytes.
    pub const fn to_bytes(&self) -> [u8; WORD_SIZE] {
        self.encode().to_be_bytes()
    }

    /// Decode a data header word (as seen by a MAC-PHY or a test double).
    pub const fn decode(word: u32) -> Result<Self, DecodeError> {
        if !parity_ok(word) {
            return Err(DecodeError::Parity);
        }
        if word & data_hdr::DNC == 0 {
            return Err(DecodeError::Malformed);
        }
        Ok(Self {
            seq: word & data_hdr::SEQ != 0,
            no_rx: word & data_hdr::NORX != 0,
            vs: field(word, data_hdr::VS_MASK, data_hdr::VS_SHIFT) as u8,
            data_valid: word & data_hdr::DV != 0,
            start_valid: word & data_hdr::SV != 0,
            start_word_offset: field(word, data_hdr::SWO_MASK, data_hdr::SWO_SHIFT) as u8,
            end_valid: word & data_hdr::EV != 0,
            end_byte_offset: field(word, data_hdr::EBO_MASK, data_hdr::EBO_SHIFT) as u8,
            timestamp_capture: field(word, data_hdr::TSC_MASK, data_hdr::TSC_SHIFT) as u8,
        })
    }

    /// Decode four bytes.
    pub fn decode_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::decode(word_from_bytes(bytes)?)
    }
}

// =============================================================================
// Data Footer
// =============================================================================

/// Data chunk footer (MAC-PHY to host)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataFooter {
    /// Extended status pending in STATUS0
    pub extended_status: bool,
    /// The MAC-PHY rejected the matching data header
    pub header_bad: bool,
    /// Configuration synchronized
    pub sync: bool,
    /// Receive chunks available (5 bits)
    pub rx_chunks_available: u8,
    /// Vendor specific (2 bits)
    pub vs: u8,
    /// Payload carries receive data
    pub data_valid: bool,
    /// A frame starts in this chunk
    pub start_valid: bool,
    /// Word offset of the frame start (4 bits)
    pub start_word_offset: u8,
    /// Drop the frame that ends in this chunk
    pub frame_drop: bool,
    /// A frame ends in this chunk
    pub end_valid: bool,
    /// Index of the frame's last byte in the payload (6 bits)
    pub end_byte_offset: u8,
    /// A receive timestamp precedes the frame that starts here
    pub rx_timestamp_added: bool,
    /// Parity of that receive timestamp
    pub rx_timestamp_parity: bool,
    /// Transmit credits (5 bits)
    pub tx_credits: u8,
}

impl DataFooter {
    /// Encode with parity (the MAC-PHY side; used by test doubles).
    pub const fn encode(&self) -> u32 {
        let word = flag(self.extended_status, data_ftr::EXST)
            | flag(self.header_bad, data_ftr::HDRB)
            | flag(self.sync, data_ftr::SYNC)
            | (((self.rx_chunks_available as u32) << data_ftr::RCA_SHIFT) & data_ftr::RCA_MASK)
            | (((self.vs as u32) << data_ftr::VS_SHIFT) & data_ftr::VS_MASK)
            | flag(self.data_valid, data_ftr::DV)
            | flag(self.start_valid, data_ftr::SV)
            | (((self.start_word_offset as u32) << data_ftr::SWO_SHIFT) & data_ftr::SWO_MASK)
            | flag(self.frame_drop, data_ftr::FD)
            | flag(self.end_valid, data_ftr::EV)
            | (((self.end_byte_offset as u32) << data_ftr::EBO_SHIFT) & data_ftr::EBO_MASK)
            | flag(self.rx_timestamp_added, data_ftr::RTSA)
            | flag(self.rx_timestamp_parity, data_ftr::RTSP)
            | (((self.tx_credits as u32) << data_ftr::TXC_SHIFT) & data_ftr::TXC_MASK);
        with_parity(word)
    }

    /// Encode to the four wire bytes.
    pub const fn to_bytes(&self) -> [u8; WORD_SIZE] {
        self.encode().to_be_bytes()
    }

    /// Decode a footer word.
    pub const fn decode(word: u32) -> Result<Self, DecodeError> {
        if !parity_ok(word) {
            return Err(DecodeError::Parity);
        }
        Ok(Self {
            extended_status: word & data_ftr::EXST != 0,
            header_bad: word & data_ftr::HDRB != 0,
            sync: word & data_ftr::SYNC != 0,
            rx_chunks_available: field(word, data_ftr::RCA_MASK, data_ftr::RCA_SHIFT) as u8,
            vs: field(word, data_ftr::VS_MASK, data_ftr::VS_SHIFT) as u8,
            data_valid: word & data_ftr::DV != 0,
            start_valid: word & data_ftr::SV != 0,
            start_word_offset: field(word, data_ftr::SWO_MASK, data_ftr::SWO_SHIFT) as u8,
            frame_drop: word & data_ftr::FD != 0,
            end_valid: word & data_ftr::EV != 0,
            end_byte_offset: field(word, data_ftr::EBO_MASK, data_ftr::EBO_SHIFT) as u8,
            rx_timestamp_added: word & data_ftr::RTSA != 0,
            rx_timestamp_parity: word & data_ftr::RTSP != 0,
            tx_credits: field(word, data_ftr::TXC_MASK, data_ftr::TXC_SHIFT) as u8,
        })
    }

    /// Byte offset where a starting frame begins
    pub const fn start_byte(&self) -> usize {
        self.start_word_offset as usize * WORD_SIZE
    }

    /// Byte index of the last byte of an ending frame
    pub const fn end_byte(&self) -> usize {
        self.end_byte_offset as usize
    }
}

/// Decode a received footer.
///
/// Total over all inputs: anything other than four bytes is `Malformed`,
/// a word with inconsistent parity is `Parity`.
pub fn decode_footer(bytes: &[u8]) -> Result<DataFooter, DecodeError> {
    DataFooter::decode(word_from_bytes(bytes)?)
}

// =============================================================================
// Unit Tests
// =============================================================================
