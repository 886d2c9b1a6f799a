//! Error types for the TC6 driver
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Initialization and configuration failures
//! - [`ControlError`]: Register-access (control transaction) failures
//! - [`LinkError`]: Device-fatal protocol conditions reported by the MAC-PHY
//! - [`IoError`]: Runtime frame-path and lifecycle failures
//!
//! The unified [`Error`] enum wraps all domain errors plus SPI transport
//! failures and is returned by most driver methods.

use embedded_hal::spi::ErrorKind;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and initialization errors
///
/// These errors occur during driver setup, software reset, or when a
/// requested feature is not offered by the MAC-PHY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Driver already initialized
    AlreadyInitialized,
    /// Invalid configuration parameter
    InvalidConfig,
    /// Software reset failed or timed out
    ResetFailed,
    /// Capability not advertised by the device
    Unsupported,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::AlreadyInitialized => "already initialized",
            ConfigError::InvalidConfig => "invalid configuration",
            ConfigError::ResetFailed => "software reset failed",
            ConfigError::Unsupported => "capability not supported by device",
        }
    }
}

// =============================================================================
// Control Transaction Errors
// =============================================================================

/// Register-access errors
///
/// Each control transaction fails on its own; none of these take the
/// device down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlError {
    /// Header parity rejected by either side after all attempts
    ParityError,
    /// Echoed header or data did not match the request
    ReplyMismatch,
    /// No usable reply within the attempt budget
    DeviceUnreachable,
    /// Register count outside 1..=128
    InvalidLength,
    /// Address range wraps past the end of the memory map
    InvalidAddress,
}

impl core::fmt::Display for ControlError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ControlError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ControlError::ParityError => "control header parity error",
            ControlError::ReplyMismatch => "control reply mismatch",
            ControlError::DeviceUnreachable => "device unreachable",
            ControlError::InvalidLength => "invalid register count",
            ControlError::InvalidAddress => "invalid register address",
        }
    }
}

// =============================================================================
// Link Errors
// =============================================================================

/// Device-fatal protocol conditions
///
/// After any of these the engine is faulted and must be resynchronized
/// or shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Transmit credit stayed at zero while data was waiting
    LinkStalled,
    /// Footer reported the configuration as unsynchronized
    ConfigUnsync,
    /// MAC-PHY rejected a data header (footer HDRB)
    HeaderBad,
    /// Transmit protocol error (STATUS0.TXPE)
    TxProtocol,
    /// Loss of framing (STATUS0.LOFE)
    LossOfFrame,
    /// Header error (STATUS0.HDRE)
    HeaderError,
}

impl core::fmt::Display for LinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LinkError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LinkError::LinkStalled => "link stalled on zero transmit credit",
            LinkError::ConfigUnsync => "device configuration not synchronized",
            LinkError::HeaderBad => "data header rejected by device",
            LinkError::TxProtocol => "transmit protocol error",
            LinkError::LossOfFrame => "loss of framing",
            LinkError::HeaderError => "header error",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Runtime frame-path and lifecycle errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// Transmit queue (or control slot) is full; retry later
    Busy,
    /// Frame larger than the frame buffer
    FrameTooLarge,
    /// Zero-length frame
    InvalidLength,
    /// Invalid state for operation (e.g., not initialized or faulted)
    InvalidState,
    /// Engine is shutting down
    Shutdown,
    /// Buffer too small for received frame
    BufferTooSmall,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::Busy => "queue full",
            IoError::FrameTooLarge => "frame too large",
            IoError::InvalidLength => "invalid frame length",
            IoError::InvalidState => "invalid state for operation",
            IoError::Shutdown => "engine shut down",
            IoError::BufferTooSmall => "buffer too small for frame",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Control(ControlError::DeviceUnreachable)) => { /* ... */ }
///     Err(Error::Link(LinkError::LinkStalled)) => { /* mark interface down */ }
///     Err(Error::Io(IoError::Busy)) => { /* retry later */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// Control transaction error
    Control(ControlError),
    /// Device-fatal link error
    Link(LinkError),
    /// I/O error
    Io(IoError),
    /// SPI transport error
    Spi(ErrorKind),
}

impl Error {
    /// Build from any `embedded-hal` SPI error.
    pub fn spi<E: embedded_hal::spi::Error>(err: &E) -> Self {
        Error::Spi(err.kind())
    }

    /// Whether the engine must be resynchronized or shut down after this error.
    #[must_use]
    pub const fn is_device_fatal(&self) -> bool {
        matches!(self, Error::Link(_) | Error::Spi(_))
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Control(e) => write!(f, "control: {}", e.as_str()),
            Error::Link(e) => write!(f, "link: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
            Error::Spi(kind) => write!(f, "spi: {kind}"),
        }
    }
}

// From impls for automatic conversion
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<ControlError> for Error {
    fn from(e: ControlError) -> Self {
        Error::Control(e)
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Error::Link(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for TC6 operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for control transactions
pub type ControlResult<T> = core::result::Result<T, ControlError>;

/// Result type alias for I/O operations
pub type IoResult<T> = core::result::Result<T, IoError>;

// =============================================================================
// Unit Tests
// =============================================================================
