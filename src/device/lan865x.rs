//! LAN8650/1 MAC-PHY Support
//!
//! Helpers for the Microchip LAN8650/1 10BASE-T1S MAC-PHY. Everything here
//! goes through [`RegisterAccess`]: nothing below this layer knows about
//! MAC addresses or receive filters, and nothing here knows about chunks.
//!
//! # Bring-up
//!
//! ```ignore
//! use oa_tc6::device::{Lan865x, RxMode};
//!
//! tc6.init(Tc6Config::lan865x_default(), &mut delay)?;
//!
//! let mut mac = Lan865x::new();
//! mac.init(&mut tc6, [0x02, 0x00, 0x00, 0x12, 0x34, 0x56])?;
//! mac.set_rx_mode(&mut tc6, RxMode::UnicastOnly)?;
//! mac.hw_enable(&mut tc6)?;
//! ```
//!
//! # Errata
//!
//! AN1760 requires a fixup write to MMS 1 register 0x77 and zero-aligned
//! receive frames (CONFIG0.ZARFE); [`Lan865x::init`] applies both.

use crate::codec::Mms;
use crate::driver::error::{ConfigError, Result};
use crate::hal::registers::RegisterAccess;
use crate::internal::constants::MAC_ADDR_LEN;
use crate::internal::lan865x_regs::{mac, net_cfg, net_ctl, pattern, phy_id};
use crate::internal::log::{debug, info, warn};
use crate::internal::tc6_regs::{config0, reg};

/// A 48-bit Ethernet address
pub type MacAddress = [u8; MAC_ADDR_LEN];

// =============================================================================
// Device Identification
// =============================================================================

/// Fields of the PHYID register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId {
    /// Organizationally unique identifier (22 bits)
    pub oui: u32,
    /// Model number (6 bits)
    pub model: u8,
    /// Silicon revision (4 bits)
    pub revision: u8,
}

impl DeviceId {
    /// Split a raw PHYID value
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            oui: raw >> phy_id::OUI_SHIFT,
            model: ((raw & phy_id::MODEL_MASK) >> phy_id::MODEL_SHIFT) as u8,
            revision: (raw & 0xF) as u8,
        }
    }

    /// Whether this is a LAN8650/1
    pub const fn is_lan865x(&self) -> bool {
        self.oui == phy_id::OUI_MCHP && self.model as u32 == phy_id::MODEL_LAN865X
    }
}

// =============================================================================
// Receive Filtering
// =============================================================================

/// Receive address filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxMode<'a> {
    /// Accept every frame
    Promiscuous,
    /// Accept every multicast frame plus our own address
    AllMulticast,
    /// Accept the listed multicast groups (hash matched) plus our own address
    Multicast(&'a [MacAddress]),
    /// Accept only frames for our own address
    UnicastOnly,
}

/// Multicast hash bit (0..=63) for `addr`
///
/// The top six bits of the bit-reversed Ethernet CRC. Bits 0..=31 live in
/// the low hash register, 32..=63 in the high one.
pub fn multicast_hash(addr: &MacAddress) -> u8 {
    const CRC32_POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;

    for byte in addr {
        let mut data = *byte;
        for _ in 0..8 {
            if ((crc ^ u32::from(data)) & 1) != 0 {
                crc = (crc >> 1) ^ CRC32_POLY;
            } else {
                crc >>= 1;
            }
            data >>= 1;
        }
    }
    ((crc.reverse_bits() >> 26) & 0x3F) as u8
}

/// Low and high hash register values accepting every address in `groups`
pub fn hash_registers(groups: &[MacAddress]) -> (u32, u32) {
    groups.iter().fold((0, 0), |(low, high), addr| {
        let bit = multicast_hash(addr);
        if bit < 32 {
            (low | (1 << bit), high)
        } else {
            (low, high | (1 << (bit - 32)))
        }
    })
}

// =============================================================================
// LAN865x Helper
// =============================================================================

/// LAN8650/1 MAC configuration
///
/// Remembers the programmed MAC address so a failed update can be rolled
/// back.
#[derive(Debug, Default)]
pub struct Lan865x {
    mac_address: Option<MacAddress>,
}

impl Lan865x {
    /// Create a helper for a device whose MAC address is not yet programmed
    pub const fn new() -> Self {
        Self { mac_address: None }
    }

    /// The MAC address last programmed successfully
    pub fn mac_address(&self) -> Option<MacAddress> {
        self.mac_address
    }

    /// Read and decode PHYID
    pub fn identify<R: RegisterAccess>(regs: &mut R) -> Result<DeviceId> {
        let id = DeviceId::from_raw(regs.read_register(Mms::STANDARD, reg::PHYID)?);
        debug!("lan865x: oui {:#x} model {:#x} rev {}", id.oui, id.model, id.revision);
        Ok(id)
    }

    /// Apply the AN1760 fixup, enable zero-aligned receive and program the
    /// MAC address.
    ///
    /// # Errors
    /// - `Unsupported` - PHYID does not identify a LAN8650/1
    pub fn init<R: RegisterAccess>(&mut self, regs: &mut R, address: MacAddress) -> Result<()> {
        let id = Self::identify(regs)?;
        if !id.is_lan865x() {
            warn!("lan865x: unexpected device id");
            return Err(ConfigError::Unsupported.into());
        }
        Self::configure_fixup(regs)?;
        Self::set_zarfe(regs)?;
        self.set_mac_address(regs, address)?;
        info!("lan865x: configured, revision {}", id.revision);
        Ok(())
    }

    /// Write the AN1760 configuration fixup.
    pub fn configure_fixup<R: RegisterAccess>(regs: &mut R) -> Result<()> {
        regs.write_register(Mms::MAC, mac::FIXUP, mac::FIXUP_VALUE)
    }

    /// Set CONFIG0.ZARFE, keeping the other configuration bits.
    pub fn set_zarfe<R: RegisterAccess>(regs: &mut R) -> Result<()> {
        regs.modify_register(Mms::STANDARD, reg::CONFIG0, 0, config0::RFA_ZARFE)?;
        Ok(())
    }

    // =========================================================================
    // MAC Address
    // =========================================================================

    /// Program the station address
    ///
    /// The low register holds bytes 0..=3, the high register bytes 4..=5.
    /// If the high write fails the low register is put back to the previous
    /// address and the high write's error is returned.
    ///
    /// # Errors
    /// - `InvalidConfig` - multicast or all-zero address
    pub fn set_mac_address<R: RegisterAccess>(
        &mut self,
        regs: &mut R,
        address: MacAddress,
    ) -> Result<()> {
        if address[0] & 0x01 != 0 || address == [0; MAC_ADDR_LEN] {
            return Err(ConfigError::InvalidConfig.into());
        }
        if self.mac_address == Some(address) {
            return Ok(());
        }

        regs.write_register(Mms::MAC, mac::L_SADDR1, Self::address_low(&address))?;
        if let Err(e) = regs.write_register(Mms::MAC, mac::H_SADDR1, Self::address_high(&address))
        {
            let previous = self.mac_address.unwrap_or_default();
            if regs
                .write_register(Mms::MAC, mac::L_SADDR1, Self::address_low(&previous))
                .is_err()
            {
                warn!("lan865x: could not restore MAC address");
            }
            return Err(e);
        }

        self.mac_address = Some(address);
        Ok(())
    }

    const fn address_low(address: &MacAddress) -> u32 {
        u32::from_le_bytes([address[0], address[1], address[2], address[3]])
    }

    const fn address_high(address: &MacAddress) -> u32 {
        ((address[5] as u32) << 8) | address[4] as u32
    }

    // =========================================================================
    // Receive Mode
    // =========================================================================

    /// Program address filtering
    ///
    /// Hash registers are cleared for unicast-only, loaded from the group
    /// list for multicast, and left alone otherwise.
    pub fn set_rx_mode<R: RegisterAccess>(&mut self, regs: &mut R, mode: RxMode<'_>) -> Result<()> {
        let cfg = match mode {
            RxMode::Promiscuous => net_cfg::PROMISCUOUS,
            RxMode::AllMulticast => net_cfg::MULTICAST,
            RxMode::Multicast(groups) => {
                let (low, high) = hash_registers(groups);
                regs.write_register(Mms::MAC, mac::H_HASH, high)?;
                regs.write_register(Mms::MAC, mac::L_HASH, low)?;
                net_cfg::UNICAST
            }
            RxMode::UnicastOnly => {
                regs.write_register(Mms::MAC, mac::H_HASH, 0)?;
                regs.write_register(Mms::MAC, mac::L_HASH, 0)?;
                0
            }
        };
        regs.write_register(Mms::MAC, mac::NET_CFG, cfg)
    }

    // =========================================================================
    // Enable / Disable
    // =========================================================================

    /// Enable the MAC transmitter and receiver.
    pub fn hw_enable<R: RegisterAccess>(&mut self, regs: &mut R) -> Result<()> {
        regs.modify_register(Mms::MAC, mac::NET_CTL, 0, net_ctl::TXEN | net_ctl::RXEN)?;
        Ok(())
    }

    /// Disable the MAC transmitter and receiver.
    pub fn hw_disable<R: RegisterAccess>(&mut self, regs: &mut R) -> Result<()> {
        regs.modify_register(Mms::MAC, mac::NET_CTL, net_ctl::TXEN | net_ctl::RXEN, 0)?;
        Ok(())
    }

    // =========================================================================
    // PTP Frame Matching
    // =========================================================================

    /// Match PTP frames (EtherType 0x88F7) in both directions so the
    /// MAC-PHY timestamps them.
    ///
    /// `tx_delay` enables the matched-packet delay with the given value
    /// (11 bits).
    pub fn configure_ptp_filters<R: RegisterAccess>(
        &mut self,
        regs: &mut R,
        tx_delay: Option<u16>,
    ) -> Result<()> {
        let rx = [
            (pattern::RXMMSKH, 0),
            (pattern::RXMMSKL, 0),
            (pattern::RXMPATH, pattern::PTP_PATTERN_HIGH),
            (pattern::RXMPATL, pattern::PTP_PATTERN_LOW),
            (pattern::RXMLOC, pattern::LOCATION_SOF),
            (pattern::RXMCTL, pattern::MATCH_ENABLE),
        ];
        let delay = match tx_delay {
            Some(delay) => pattern::TXMDLY_EN | (u32::from(delay) & pattern::TXMDLY_MASK),
            None => 0,
        };
        let tx = [
            (pattern::TXMMSKH, 0),
            (pattern::TXMMSKL, 0),
            (pattern::TXMPATH, pattern::PTP_PATTERN_HIGH),
            (pattern::TXMPATL, pattern::PTP_PATTERN_LOW),
            (pattern::TXMLOC, pattern::TX_LOCATION_PTP),
            (pattern::TXMDLY, delay),
            (pattern::TXMCTL, pattern::MATCH_ENABLE),
        ];
        for (addr, value) in rx.into_iter().chain(tx) {
            regs.write_register(Mms::PHY_VENDOR, addr, value)?;
        }
        debug!("lan865x: PTP pattern match enabled");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
