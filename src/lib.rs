//! OPEN Alliance TC6 MAC-PHY Driver Core
//!
//! A `no_std`, `no_alloc` Rust implementation of the host side of the
//! OPEN Alliance 10BASE-T1x MAC-PHY Serial Interface (TC6), the SPI
//! protocol spoken by parts such as the Microchip LAN8650/1.
//!
//! Ethernet frames and register accesses travel over one full-duplex SPI
//! link as fixed-size chunks. The MAC-PHY reports transmit credit and
//! receive availability in a footer on every chunk and raises IRQn when it
//! wants attention.
//!
//! # Architecture
//!
//! The driver is organized into layers:
//!
//! 1. **Codec** ([`codec`]): Pure encode/decode of control and data chunk
//!    headers and footers, with odd-parity checking
//! 2. **Engine** ([`driver`]): The [`Tc6`] transfer loop, credit tracking,
//!    frame segmentation/reassembly, control transactions and error recovery
//! 3. **HAL** ([`hal`]): [`RegisterAccess`] for layered collaborators and an
//!    MDIO bridge to the internal PHY
//! 4. **Devices** ([`device`]): LAN865x MAC programming and the PTP clock,
//!    built only on [`RegisterAccess`]
//!
//! ## Standard Compliance
//!
//! - **OPEN Alliance TC6**: chunk format, standard register map (MMS 0),
//!   configuration/status/interrupt handling
//! - **IEEE 802.3cg**: 10BASE-T1S frame sizes, Clause 22/45 PHY register
//!   access through memory map selectors
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for error types and defmt logging
//! - `log`: Route internal logging through the `log` facade
//! - `smoltcp`: Enable smoltcp network stack integration
//! - `critical-section`: Enable ISR-safe [`SharedTc6`](sync::SharedTc6) wrapper
//! - `async`: Enable the async runner/client split
//!
//! # Example
//!
//! ```ignore
//! use oa_tc6::{Activity, Tc6, Tc6Config};
//! use oa_tc6::device::Lan865x;
//!
//! let mut tc6: Tc6<_> = Tc6::new(spi_device);
//! tc6.init(Tc6Config::lan865x_default(), &mut delay)?;
//!
//! let mut lan = Lan865x::new();
//! lan.init(&mut tc6, [0x02, 0x00, 0x00, 0x12, 0x34, 0x56])?;
//! lan.hw_enable(&mut tc6)?;
//!
//! tc6.transmit(&frame)?;
//! loop {
//!     if irq_pin.is_low() {
//!         tc6.signal_interrupt();
//!     }
//!     while tc6.poll()? == Activity::Exchanged {}
//!     while let Some(frame) = tc6.receive_frame() {
//!         handle(frame.as_slice());
//!     }
//! }
//! ```
//!
//! # Memory Requirements
//!
//! With default configuration (4 transmit frames, 4 receive frames):
//! - Frame queues: 8 x ~1.5 KB
//! - SPI scratch: two buffers sized for a 128-register control transaction
//!
//! Everything is statically sized; there is no heap use.

#![no_std]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
// Clippy lint levels live here and in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]

// =============================================================================
// Modules
// =============================================================================

pub mod codec;
pub mod device;
pub mod driver;
pub mod hal;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(feature = "smoltcp")]
#[cfg_attr(docsrs, doc(cfg(feature = "smoltcp")))]
pub mod integration;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use codec::{DataFooter, DataHeader, Mms};
pub use driver::config::{ChunkPayload, State, Tc6Config, TimestampFormat};
pub use driver::control::{ControlRequest, ControlResponse};
pub use driver::engine::{Activity, Shutdown, Tc6};
pub use driver::error::{
    ConfigError, ConfigResult, ControlError, ControlResult, Error, IoError, IoResult, LinkError,
    Result,
};
pub use driver::queue::FrameBuf;
pub use driver::status::{Capabilities, ExtendedStatus, Tc6Stats};
pub use hal::{MdioBus, RegisterAccess, Tc6Mdio};

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::SharedTc6;

// Re-export async types when async feature is enabled
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use sync::asynch::{Tc6Channel, Tc6Client, Tc6Runner};

/// Shared driver constants.
///
/// These are grouped into a dedicated module to keep the top-level facade
/// focused on driver types and integration points.
pub mod constants {
    pub use crate::internal::constants::{
        // Frame sizes
        CRC_SIZE,
        // Queue depths
        DEFAULT_RX_FRAMES,
        DEFAULT_TX_FRAMES,
        ETH_HEADER_SIZE,
        MAC_ADDR_LEN,
        // Chunk geometry
        MAX_CHUNK_PAYLOAD,
        MAX_CHUNKS_PER_TRANSFER,
        MAX_CONTROL_REGS,
        MAX_FRAME_SIZE,
        MTU,
        // Timing
        RESET_POLL_INTERVAL_MS,
        SOFT_RESET_TIMEOUT_MS,
    };
}

// =============================================================================
// Macro Helpers
// =============================================================================

/// Declare a static, ISR-safe engine slot for synchronous use.
///
/// Expands to a [`SharedTc6`](sync::SharedTc6) static; install the engine
/// once the SPI device exists.
///
/// # Examples
///
/// ```ignore
/// oa_tc6::tc6_static!(TC6, MySpi);
///
/// let mut tc6 = Tc6::new(spi);
/// tc6.init(Tc6Config::lan865x_default(), &mut delay)?;
/// TC6.install(tc6);
/// ```
#[cfg(feature = "critical-section")]
#[macro_export]
macro_rules! tc6_static {
    ($name:ident, $spi:ty) => {
        $crate::tc6_static!(
            $name,
            $spi,
            $crate::constants::DEFAULT_TX_FRAMES,
            $crate::constants::DEFAULT_RX_FRAMES
        );
    };
    ($name:ident, $spi:ty, $txq:expr, $rxq:expr) => {
        static $name: $crate::sync::SharedTc6<$spi, { $txq }, { $rxq }> =
            $crate::sync::SharedTc6::new();
    };
}

/// Declare a static channel for the async runner/client split.
///
/// # Examples
///
/// ```ignore
/// oa_tc6::tc6_channel_static!(CHANNEL);
///
/// #[interrupt]
/// fn EXTI0() {
///     CHANNEL.on_interrupt();
/// }
///
/// let client = CHANNEL.client();
/// let mut runner = Tc6Runner::new(tc6, &CHANNEL);
/// ```
#[cfg(feature = "async")]
#[macro_export]
macro_rules! tc6_channel_static {
    ($name:ident) => {
        $crate::tc6_channel_static!(
            $name,
            $crate::constants::DEFAULT_TX_FRAMES,
            $crate::constants::DEFAULT_RX_FRAMES
        );
    };
    ($name:ident, $txq:expr, $rxq:expr) => {
        static $name: $crate::sync::Tc6Channel<{ $txq }, { $rxq }> =
            $crate::sync::Tc6Channel::new();
    };
}
