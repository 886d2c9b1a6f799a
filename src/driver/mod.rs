//! Core driver components for TC6 MAC-PHY devices.
//!
//! This module contains the building blocks of the serial transport:
//!
//! - [`config`] - Configuration types and builder patterns
//! - [`error`] - Error types and result aliases
//! - [`status`] - Capability, extended status and statistics types
//! - [`credit`] - Transmit credit and receive availability tracking
//! - [`control`] - Single-slot control transaction engine
//! - [`queue`] - Fixed-capacity frame buffers and queues
//! - [`framer`] - Frame to chunk segmentation and reassembly
//! - [`engine`] - The [`Tc6`] engine driving all of the above over SPI
//!
//! # Example
//!
//! ```ignore
//! use oa_tc6::driver::{ChunkPayload, Tc6, Tc6Config};
//!
//! let config = Tc6Config::new()
//!     .with_chunk_payload(ChunkPayload::Bytes64)
//!     .with_zero_align_rx(true);
//! ```

// Submodules
pub mod config;
pub mod control;
pub mod credit;
pub mod engine;
pub mod error;
pub mod framer;
pub mod queue;
pub mod status;

// Re-exports for convenience
pub use config::{ChunkPayload, State, Tc6Config, TimestampFormat};
pub use control::{ControlEngine, ControlProgress, ControlRequest, ControlResponse};
pub use credit::CreditTracker;
pub use engine::{Activity, Shutdown, Tc6};
pub use error::{
    ConfigError, ConfigResult, ControlError, ControlResult, Error, IoError, IoResult, LinkError,
    Result,
};
pub use framer::{RxFramer, TxCursor, TxFramer};
pub use queue::{FrameBuf, FrameQueue};
pub use status::{Capabilities, ExtendedStatus, Tc6Stats};
