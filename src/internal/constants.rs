//! Centralized Constants
//!
//! This module provides a single source of truth for all magic numbers and
//! configuration constants used throughout the TC6 driver.
//!
//! # Organization
//!
//! Constants are grouped by category:
//! - **Frame/Buffer sizes**: Ethernet frame dimensions
//! - **Chunk geometry**: TC6 chunk and transfer sizes
//! - **Timing**: Timeouts and polling intervals
//! - **Control retry limits**: Bounds on control and credit polling
//!
//! # Note
//!
//! Register addresses and bit definitions live in `tc6_regs.rs` (standard
//! OPEN Alliance map) and `lan865x_regs.rs` (vendor map).

// =============================================================================
// Frame and Buffer Sizes
// =============================================================================

/// Maximum Ethernet frame size including VLAN tag (1500 + 14 header + 4 CRC + 4 VLAN)
pub const MAX_FRAME_SIZE: usize = 1522;

/// Standard Ethernet MTU (Maximum Transmission Unit)
pub const MTU: usize = 1500;

/// Ethernet header size (dst MAC + src MAC + EtherType)
pub const ETH_HEADER_SIZE: usize = 14;

/// CRC/FCS size at end of frame
pub const CRC_SIZE: usize = 4;

/// MAC address length in bytes
pub const MAC_ADDR_LEN: usize = 6;

/// Default number of queued transmit frames
pub const DEFAULT_TX_FRAMES: usize = 4;

/// Default number of queued receive frames
pub const DEFAULT_RX_FRAMES: usize = 4;

// =============================================================================
// Chunk Geometry
// =============================================================================

/// Size of a header, footer or control word on the wire
pub const WORD_SIZE: usize = 4;

/// Largest chunk payload defined by TC6 (CPS = 6)
pub const MAX_CHUNK_PAYLOAD: usize = 64;

/// Largest chunk on the wire (header or footer plus payload)
pub const MAX_CHUNK_SIZE: usize = MAX_CHUNK_PAYLOAD + WORD_SIZE;

/// Maximum number of data chunks carried by one SPI transfer
pub const MAX_CHUNKS_PER_TRANSFER: usize = 16;

/// Maximum number of registers in one control transaction (7-bit LEN field)
pub const MAX_CONTROL_REGS: usize = 128;

/// Bytes in a control transfer for `count` registers
/// (header + values + trailing ignored word)
pub const fn control_transfer_size(count: usize) -> usize {
    WORD_SIZE + count * WORD_SIZE + WORD_SIZE
}

/// Scratch buffer size covering the largest data or control transfer
pub const SPI_BUFFER_SIZE: usize = {
    let data = MAX_CHUNKS_PER_TRANSFER * MAX_CHUNK_SIZE;
    let control = control_transfer_size(MAX_CONTROL_REGS);
    if data > control { data } else { control }
};

// =============================================================================
// Timing Constants
// =============================================================================

/// Default software reset timeout in milliseconds
pub const SOFT_RESET_TIMEOUT_MS: u32 = 1000;

/// Reset-complete poll interval in milliseconds
pub const RESET_POLL_INTERVAL_MS: u32 = 1;

// =============================================================================
// Retry Limits
// =============================================================================

/// Default number of exchanges attempted for one control transaction
pub const DEFAULT_CONTROL_ATTEMPTS: u8 = 3;

/// Default number of consecutive zero-credit footers tolerated while
/// transmit data is waiting
pub const DEFAULT_CREDIT_POLL_LIMIT: u16 = 64;

// =============================================================================
// Unit Tests
// =============================================================================
