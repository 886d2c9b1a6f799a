//! Device status, capabilities and driver statistics.
//!
//! - [`ExtendedStatus`]: STATUS0 flags, read when a footer carries EXST
//! - [`Capabilities`]: STDCAP fields latched at initialization
//! - [`Tc6Stats`]: counters maintained by the engine

use super::config::ChunkPayload;
use super::error::LinkError;
use crate::internal::tc6_regs::{bufsts, status0, stdcap};

// =============================================================================
// Extended Status
// =============================================================================

/// STATUS0 flags parsed from the raw register value.
///
/// The register is write-1-to-clear; [`to_raw`](Self::to_raw) gives the
/// value to write back to acknowledge exactly the flags that were seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExtendedStatus {
    /// Transmit protocol error
    pub tx_protocol_error: bool,
    /// Transmit buffer overflow
    pub tx_overflow: bool,
    /// Transmit buffer underflow
    pub tx_underflow: bool,
    /// Receive buffer overflow
    pub rx_overflow: bool,
    /// Loss of framing
    pub loss_of_frame: bool,
    /// Header error
    pub header_error: bool,
    /// Reset complete
    pub reset_complete: bool,
    /// PHY interrupt pending
    pub phy_interrupt: bool,
    /// Transmit timestamps captured (A, B, C)
    pub tx_timestamp_captured: [bool; 3],
    /// Transmit FCS error
    pub tx_fcs_error: bool,
    /// Control data protection error
    pub control_protection_error: bool,
}

impl ExtendedStatus {
    /// Create from the raw STATUS0 value
    #[inline]
    pub fn from_raw(status: u32) -> Self {
        Self {
            tx_protocol_error: (status & status0::TXPE) != 0,
            tx_overflow: (status & status0::TXBOE) != 0,
            tx_underflow: (status & status0::TXBUE) != 0,
            rx_overflow: (status & status0::RXBOE) != 0,
            loss_of_frame: (status & status0::LOFE) != 0,
            header_error: (status & status0::HDRE) != 0,
            reset_complete: (status & status0::RESETC) != 0,
            phy_interrupt: (status & status0::PHYINT) != 0,
            tx_timestamp_captured: [
                (status & status0::TTSCAA) != 0,
                (status & status0::TTSCAB) != 0,
                (status & status0::TTSCAC) != 0,
            ],
            tx_fcs_error: (status & status0::TXFCSE) != 0,
            control_protection_error: (status & status0::CDPE) != 0,
        }
    }

    /// Convert to the write-1-to-clear value
    #[inline]
    pub fn to_raw(&self) -> u32 {
        let flags = [
            (self.tx_protocol_error, status0::TXPE),
            (self.tx_overflow, status0::TXBOE),
            (self.tx_underflow, status0::TXBUE),
            (self.rx_overflow, status0::RXBOE),
            (self.loss_of_frame, status0::LOFE),
            (self.header_error, status0::HDRE),
            (self.reset_complete, status0::RESETC),
            (self.phy_interrupt, status0::PHYINT),
            (self.tx_timestamp_captured[0], status0::TTSCAA),
            (self.tx_timestamp_captured[1], status0::TTSCAB),
            (self.tx_timestamp_captured[2], status0::TTSCAC),
            (self.tx_fcs_error, status0::TXFCSE),
            (self.control_protection_error, status0::CDPE),
        ];
        flags
            .iter()
            .filter(|(set, _)| *set)
            .fold(0, |acc, (_, bit)| acc | bit)
    }

    /// Check if any flag is set
    #[inline]
    pub fn any(&self) -> bool {
        self.to_raw() != 0
    }

    /// The device-fatal condition reported, if any.
    ///
    /// Checked in order of severity: a header error usually accompanies
    /// loss of framing, and both outrank a transmit protocol error.
    pub fn fatal_error(&self) -> Option<LinkError> {
        if self.header_error {
            Some(LinkError::HeaderError)
        } else if self.loss_of_frame {
            Some(LinkError::LossOfFrame)
        } else if self.tx_protocol_error {
            Some(LinkError::TxProtocol)
        } else {
            None
        }
    }
}

// =============================================================================
// Capabilities
// =============================================================================

/// Fields of the STDCAP register
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capabilities {
    /// Direct PHY register access supported
    pub direct_phy_access: bool,
    /// Cut-through supported
    pub cut_through: bool,
    /// Frame timestamping supported
    pub frame_timestamps: bool,
    /// Address increment disable supported
    pub address_increment_disable: bool,
    /// Transmit sequence check supported
    pub sequence_check: bool,
    /// Smallest chunk payload the device accepts, if it reports one
    pub min_chunk_payload: Option<ChunkPayload>,
}

impl Capabilities {
    /// Parse the raw STDCAP value
    pub fn from_raw(raw: u32) -> Self {
        Self {
            direct_phy_access: raw & stdcap::DPRAC != 0,
            cut_through: raw & stdcap::CTC != 0,
            frame_timestamps: raw & stdcap::FTSC != 0,
            address_increment_disable: raw & stdcap::AIDC != 0,
            sequence_check: raw & stdcap::SEQC != 0,
            min_chunk_payload: ChunkPayload::from_cps(raw & stdcap::MINCPS_MASK),
        }
    }

    /// Whether the device accepts `payload` sized chunks
    pub fn supports_payload(&self, payload: ChunkPayload) -> bool {
        self.min_chunk_payload.is_none_or(|min| payload >= min)
    }
}

/// Split BUFSTS into (transmit credits, receive chunks available)
pub const fn parse_bufsts(raw: u32) -> (u8, u8) {
    (
        ((raw & bufsts::TXC_MASK) >> bufsts::TXC_SHIFT) as u8,
        (raw & bufsts::RCA_MASK) as u8,
    )
}

// =============================================================================
// Statistics
// =============================================================================

/// Counters maintained by the engine.
///
/// All counters saturate instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tc6Stats {
    /// Frames fully handed to the MAC-PHY
    pub tx_frames: u32,
    /// Bytes of fully handed-over frames
    pub tx_bytes: u32,
    /// Frames delivered to the receive queue
    pub rx_frames: u32,
    /// Bytes of delivered frames
    pub rx_bytes: u32,
    /// Received frames dropped by the MAC-PHY (footer FD)
    pub rx_dropped: u32,
    /// Received frames dropped because the receive queue was full
    pub rx_queue_full: u32,
    /// Partial frames abandoned by a new start or an overflow
    pub rx_aborted: u32,
    /// Frames ignored because they did not start at word 0
    pub rx_misaligned: u32,
    /// Receive buffer overflows reported by STATUS0
    pub rx_overflows: u32,
    /// Receive timestamps with bad parity
    pub rx_timestamp_errors: u32,
    /// Footers rejected for parity
    pub footer_parity_errors: u32,
    /// Footers with HDRB set
    pub header_bad: u32,
    /// Control exchanges repeated after a parity failure or a silent reply
    pub control_retries: u32,
    /// Empty chunks sent only to refresh credit or pull receive data
    pub credit_polls: u32,
    /// Completed SPI transfers
    pub transfers: u32,
}

impl Tc6Stats {
    #[inline]
    pub(crate) fn bump(counter: &mut u32) {
        *counter = counter.saturating_add(1);
    }

    #[inline]
    pub(crate) fn add(counter: &mut u32, amount: usize) {
        let amount = u32::try_from(amount).unwrap_or(u32::MAX);
        *counter = counter.saturating_add(amount);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
