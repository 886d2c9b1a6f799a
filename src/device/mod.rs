//! Device-specific support
//!
//! Everything in this module works over [`RegisterAccess`](crate::hal::RegisterAccess)
//! and can be driven from a [`Tc6`](crate::Tc6), a
//! [`SharedTc6`](crate::sync::SharedTc6) guard, or a mock.
//!
//! # Supported Devices
//!
//! | Device | Module |
//! |--------|--------|
//! | Microchip LAN8650/1 | [`lan865x`], [`ptp`] |

pub mod lan865x;
pub mod ptp;

pub use lan865x::{DeviceId, Lan865x, MacAddress, RxMode, hash_registers, multicast_hash};
pub use ptp::{PtpClock, PtpTime};
