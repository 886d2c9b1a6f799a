//! smoltcp Network Stack Integration
#![cfg_attr(docsrs, doc(cfg(feature = "smoltcp")))]
//!
//! Implements `smoltcp::phy::Device` for [`Tc6`], so the engine can back a
//! smoltcp `Interface` directly.
//!
//! # Example
//!
//! ```ignore
//! use smoltcp::iface::{Config, Interface, SocketSet};
//! use oa_tc6::integration::smoltcp::ethernet_address;
//!
//! let mut tc6: Tc6<_> = Tc6::new(spi);
//! tc6.init(Tc6Config::lan865x_default(), &mut delay)?;
//! let mut lan = Lan865x::new();
//! lan.init(&mut tc6, mac)?;
//! lan.hw_enable(&mut tc6)?;
//!
//! let config = Config::new(ethernet_address(mac).into());
//! let mut iface = Interface::new(config, &mut tc6, now());
//!
//! loop {
//!     while tc6.poll()? == Activity::Exchanged {}
//!     iface.poll(now(), &mut tc6, &mut sockets);
//! }
//! ```
//!
//! The transfer loop is not driven from here; call [`Tc6::poll`] (or run
//! the engine behind [`SharedTc6`](crate::sync::SharedTc6)) alongside
//! `Interface::poll`.
//!
//! # Token Ownership
//!
//! smoltcp wants an `RxToken` and a `TxToken` from the same `receive()`
//! call. The received frame is popped into the `RxToken` up front, leaving
//! the `TxToken` as the only borrow of the engine. A receive token that is
//! dropped without being consumed loses its frame.

use embedded_hal::spi::SpiDevice;
use smoltcp::phy::{Checksum, ChecksumCapabilities, Device, DeviceCapabilities, Medium};
use smoltcp::time::Instant;

use crate::device::MacAddress;
use crate::driver::engine::Tc6;
use crate::driver::queue::FrameBuf;
use crate::internal::constants::{MAX_FRAME_SIZE, MTU};
use crate::internal::log::warn;

// =============================================================================
// RX Token
// =============================================================================

/// Receive token holding one frame taken from the engine's receive queue
pub struct Tc6RxToken {
    frame: FrameBuf,
}

impl Tc6RxToken {
    /// Timestamp captured with the frame, if timestamping is enabled
    pub fn timestamp(&self) -> Option<u64> {
        self.frame.timestamp()
    }
}

impl smoltcp::phy::RxToken for Tc6RxToken {
    fn consume<R, F>(self, f: F) -> R
    where
        F: FnOnce(&[u8]) -> R,
    {
        f(self.frame.as_slice())
    }
}

// =============================================================================
// TX Token
// =============================================================================

/// Transmit token borrowing the engine until the frame is queued
pub struct Tc6TxToken<'a, SPI, const TXQ: usize, const RXQ: usize> {
    tc6: &'a mut Tc6<SPI, TXQ, RXQ>,
}

impl<SPI, const TXQ: usize, const RXQ: usize> smoltcp::phy::TxToken
    for Tc6TxToken<'_, SPI, TXQ, RXQ>
where
    SPI: SpiDevice,
{
    fn consume<R, F>(self, len: usize, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        let len = len.min(MAX_FRAME_SIZE);
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let result = f(&mut buffer[..len]);

        // Only reachable with a full queue via receive()
        if let Err(e) = self.tc6.transmit(&buffer[..len]) {
            warn!("smoltcp: frame dropped: {}", e);
        }

        result
    }
}

// =============================================================================
// Device Implementation
// =============================================================================

impl<SPI, const TXQ: usize, const RXQ: usize> Device for Tc6<SPI, TXQ, RXQ>
where
    SPI: SpiDevice,
{
    type RxToken<'a>
        = Tc6RxToken
    where
        Self: 'a;
    type TxToken<'a>
        = Tc6TxToken<'a, SPI, TXQ, RXQ>
    where
        Self: 'a;

    fn receive(&mut self, _timestamp: Instant) -> Option<(Self::RxToken<'_>, Self::TxToken<'_>)> {
        if !self.state().is_running() {
            return None;
        }
        let frame = self.receive_frame()?;
        Some((Tc6RxToken { frame }, Tc6TxToken { tc6: self }))
    }

    fn transmit(&mut self, _timestamp: Instant) -> Option<Self::TxToken<'_>> {
        if !self.can_transmit() {
            return None;
        }
        Some(Tc6TxToken { tc6: self })
    }

    fn capabilities(&self) -> DeviceCapabilities {
        let mut caps = DeviceCapabilities::default();
        caps.medium = Medium::Ethernet;
        caps.max_transmission_unit = MTU;
        caps.max_burst_size = Some(TXQ);

        // The MAC-PHY appends the FCS but does no IP offload
        caps.checksum = ChecksumCapabilities::default();
        caps.checksum.ipv4 = Checksum::Both;
        caps.checksum.udp = Checksum::Both;
        caps.checksum.tcp = Checksum::Both;
        caps.checksum.icmpv4 = Checksum::Both;

        caps
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Convert a station address into a smoltcp `EthernetAddress`
pub fn ethernet_address(mac: MacAddress) -> smoltcp::wire::EthernetAddress {
    smoltcp::wire::EthernetAddress(mac)
}
