//! External Stack Integrations
//!
//! - **smoltcp** (`smoltcp`): Integration with the smoltcp TCP/IP network stack
//!   - Implements `smoltcp::phy::Device` for [`Tc6`](crate::Tc6)
//!   - RX/TX token support
//!   - Requires `smoltcp` feature
//!
//! # Feature Flags
//!
//! - `smoltcp`: Enables smoltcp integration (`smoltcp` submodule)
//!
//! # Example
//!
//! ```ignore
//! use smoltcp::phy::Device;
//! let caps = Device::capabilities(&tc6);
//! ```

#[cfg(feature = "smoltcp")]
pub mod smoltcp;

#[cfg(feature = "smoltcp")]
pub use smoltcp::{Tc6RxToken, Tc6TxToken, ethernet_address};
