//! Configuration types for the TC6 driver

use super::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    DEFAULT_CONTROL_ATTEMPTS, DEFAULT_CREDIT_POLL_LIMIT, MAX_CHUNK_PAYLOAD,
    MAX_CHUNKS_PER_TRANSFER, SOFT_RESET_TIMEOUT_MS,
};
use crate::internal::tc6_regs::config0;

/// Chunk payload size (CONFIG0.CPS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ChunkPayload {
    /// 8-byte payload
    Bytes8 = 3,
    /// 16-byte payload
    Bytes16 = 4,
    /// 32-byte payload
    Bytes32 = 5,
    /// 64-byte payload (default, mandatory for every MAC-PHY)
    #[default]
    Bytes64 = 6,
}

impl ChunkPayload {
    /// Payload size in bytes
    #[must_use]
    pub const fn bytes(self) -> usize {
        1 << (self as u8)
    }

    /// Value for the CONFIG0.CPS / STDCAP.MINCPS field
    #[must_use]
    pub const fn to_cps(self) -> u32 {
        self as u32
    }

    /// Decode a CPS field value
    #[must_use]
    pub const fn from_cps(cps: u32) -> Option<Self> {
        match cps {
            3 => Some(ChunkPayload::Bytes8),
            4 => Some(ChunkPayload::Bytes16),
            5 => Some(ChunkPayload::Bytes32),
            6 => Some(ChunkPayload::Bytes64),
            _ => None,
        }
    }
}

/// Receive timestamp width (CONFIG0.FTSS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimestampFormat {
    /// 32-bit timestamps (nanoseconds plus low seconds bits)
    Bits32,
    /// 64-bit timestamps (32-bit seconds, 32-bit nanoseconds)
    #[default]
    Bits64,
}

impl TimestampFormat {
    /// Timestamp length on the wire in bytes
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            TimestampFormat::Bits32 => 4,
            TimestampFormat::Bits64 => 8,
        }
    }

    /// CONFIG0 bits selecting this format
    #[must_use]
    pub const fn config0_bits(self) -> u32 {
        match self {
            TimestampFormat::Bits32 => 0,
            TimestampFormat::Bits64 => config0::FTSS,
        }
    }
}

/// Complete TC6 engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tc6Config {
    /// Chunk payload size
    pub chunk_payload: ChunkPayload,
    /// Force received frames to start at payload word 0 (LAN865x erratum s3)
    pub zero_align_rx: bool,
    /// Maximum data chunks per SPI transfer
    pub chunks_per_transfer: usize,
    /// Exchanges attempted per control transaction before giving up
    pub control_attempts: u8,
    /// Consecutive zero-credit polls (one per wake) tolerated while data waits
    pub credit_poll_limit: u16,
    /// Software reset timeout in milliseconds
    pub reset_timeout_ms: u32,
    /// Receive timestamp width used when timestamping is enabled
    pub timestamp_format: TimestampFormat,
    /// Set NORX while the receive queue is full
    pub rx_backpressure: bool,
}

impl Default for Tc6Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Tc6Config {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chunk_payload: ChunkPayload::Bytes64,
            zero_align_rx: true,
            chunks_per_transfer: MAX_CHUNKS_PER_TRANSFER,
            control_attempts: DEFAULT_CONTROL_ATTEMPTS,
            credit_poll_limit: DEFAULT_CREDIT_POLL_LIMIT,
            reset_timeout_ms: SOFT_RESET_TIMEOUT_MS,
            timestamp_format: TimestampFormat::Bits64,
            rx_backpressure: true,
        }
    }

    /// Configuration for LAN8650/1 devices.
    ///
    /// Zero-aligned receive is required by the silicon erratum on frames
    /// starting in the same chunk as the previous frame's end.
    #[must_use]
    pub const fn lan865x_default() -> Self {
        Self::new().with_zero_align_rx(true)
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the chunk payload size
    #[must_use]
    pub const fn with_chunk_payload(mut self, payload: ChunkPayload) -> Self {
        self.chunk_payload = payload;
        self
    }

    /// Enable or disable zero-aligned receive frames
    #[must_use]
    pub const fn with_zero_align_rx(mut self, enabled: bool) -> Self {
        self.zero_align_rx = enabled;
        self
    }

    /// Set the maximum number of data chunks per SPI transfer
    #[must_use]
    pub const fn with_chunks_per_transfer(mut self, chunks: usize) -> Self {
        self.chunks_per_transfer = chunks;
        self
    }

    /// Set the per-transaction control attempt budget
    #[must_use]
    pub const fn with_control_attempts(mut self, attempts: u8) -> Self {
        self.control_attempts = attempts;
        self
    }

    /// Set the zero-credit poll limit
    #[must_use]
    pub const fn with_credit_poll_limit(mut self, limit: u16) -> Self {
        self.credit_poll_limit = limit;
        self
    }

    /// Set the software reset timeout
    #[must_use]
    pub const fn with_reset_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.reset_timeout_ms = timeout_ms;
        self
    }

    /// Set the receive timestamp width
    #[must_use]
    pub const fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Enable or disable NORX backpressure
    #[must_use]
    pub const fn with_rx_backpressure(mut self, enabled: bool) -> Self {
        self.rx_backpressure = enabled;
        self
    }

    // =========================================================================
    // Derived Values
    // =========================================================================

    /// Chunk payload in bytes
    #[must_use]
    pub const fn payload_bytes(&self) -> usize {
        self.chunk_payload.bytes()
    }

    /// Chunk size on the wire (payload plus header or footer)
    #[must_use]
    pub const fn chunk_bytes(&self) -> usize {
        self.chunk_payload.bytes() + 4
    }

    /// Check the configuration for values the engine cannot honor
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.chunks_per_transfer == 0
            || self.chunks_per_transfer > MAX_CHUNKS_PER_TRANSFER
            || self.control_attempts == 0
            || self.credit_poll_limit == 0
            || self.chunk_payload.bytes() > MAX_CHUNK_PAYLOAD
        {
            return Err(ConfigError::InvalidConfig);
        }
        Ok(())
    }
}

/// Engine state
///
/// `Idle` and `Exchanging` alternate during normal operation; `Faulted`
/// is entered on any device-fatal condition and left through a resync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Not initialized
    #[default]
    Uninitialized,
    /// Initialized, waiting for work
    Idle,
    /// One SPI transfer in flight
    Exchanging,
    /// Teardown requested, finishing the current exchange
    Draining,
    /// Shut down
    Stopped,
    /// Device-fatal error seen; only resync or shutdown are accepted
    Faulted,
}

impl State {
    /// Whether data-path operations are accepted
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, State::Idle | State::Exchanging)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
