//! MDIO access to the integrated PHY
//!
//! TC6 MAC-PHYs expose the PHY's register space through memory maps instead
//! of a management bus. Clause 22 registers sit in the standard map at
//! `0xFF00 + reg`; Clause 45 MMDs each have their own MMS. [`Tc6Mdio`]
//! implements [`MdioBus`] over any [`RegisterAccess`], so PHY helpers written
//! against the bus work unchanged.

use super::registers::RegisterAccess;
use crate::codec::Mms;
use crate::driver::error::{ConfigError, Result};
use crate::internal::tc6_regs::reg::PHY_C22_BASE;

// =============================================================================
// MDIO Constants
// =============================================================================

/// Maximum valid PHY address (5-bit field)
pub const MAX_PHY_ADDR: u8 = 31;

/// Maximum valid Clause 22 register address (5-bit field)
pub const MAX_REG_ADDR: u8 = 31;

/// Clause 45 MMD device addresses with a TC6 memory map
pub mod mmd {
    /// PMA/PMD
    pub const PMA_PMD: u8 = 1;
    /// PCS
    pub const PCS: u8 = 3;
    /// Auto-negotiation
    pub const AN: u8 = 7;
    /// Power unit
    pub const POWER_UNIT: u8 = 13;
    /// Vendor specific 2 (PLCA and vendor registers)
    pub const VEND2: u8 = 31;
}

/// Memory map holding a Clause 45 MMD, if the TC6 standard defines one.
pub const fn mms_for_mmd(devad: u8) -> Option<Mms> {
    match devad {
        mmd::PCS => Some(Mms::PHY_PCS),
        mmd::PMA_PMD => Some(Mms::PHY_PMA_PMD),
        mmd::VEND2 => Some(Mms::PHY_VENDOR),
        mmd::AN => Some(Mms::PHY_AN),
        mmd::POWER_UNIT => Some(Mms::PHY_POWER),
        _ => None,
    }
}

// =============================================================================
// MDIO Bus Trait
// =============================================================================

/// Trait for MDIO bus operations
///
/// This trait can be implemented by different backends, allowing
/// PHY helpers to work with various MDIO implementations.
pub trait MdioBus {
    /// Read a Clause 22 PHY register
    fn read(&mut self, phy_addr: u8, reg_addr: u8) -> Result<u16>;

    /// Write a Clause 22 PHY register
    fn write(&mut self, phy_addr: u8, reg_addr: u8, value: u16) -> Result<()>;

    /// Read a Clause 45 register
    fn read_c45(&mut self, phy_addr: u8, devad: u8, reg_addr: u16) -> Result<u16>;

    /// Write a Clause 45 register
    fn write_c45(&mut self, phy_addr: u8, devad: u8, reg_addr: u16, value: u16) -> Result<()>;

    /// Read-modify-write a Clause 45 register, skipping the write when
    /// nothing changes.
    fn modify_c45(&mut self, phy_addr: u8, devad: u8, reg_addr: u16, mask: u16, value: u16) -> Result<()> {
        let current = self.read_c45(phy_addr, devad, reg_addr)?;
        let new = (current & !mask) | (value & mask);
        if new != current {
            self.write_c45(phy_addr, devad, reg_addr, new)?;
        }
        Ok(())
    }
}

// =============================================================================
// TC6 MDIO Bridge
// =============================================================================

/// MDIO bus backed by TC6 register access
///
/// There is one PHY per MAC-PHY; the PHY address is range-checked and
/// otherwise ignored.
#[derive(Debug)]
pub struct Tc6Mdio<R> {
    regs: R,
}

impl<R: RegisterAccess> Tc6Mdio<R> {
    /// Wrap a register accessor (usually `&mut Tc6<..>`)
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Give back the register accessor
    pub fn into_inner(self) -> R {
        self.regs
    }

    /// Read the 32-bit PHY identifier (PHYIDR1:PHYIDR2)
    pub fn phy_id(&mut self, phy_addr: u8) -> Result<u32> {
        let high = self.read(phy_addr, phy_reg::PHYIDR1)?;
        let low = self.read(phy_addr, phy_reg::PHYIDR2)?;
        Ok((u32::from(high) << 16) | u32::from(low))
    }

    /// Whether BMSR reports link up
    pub fn link_up(&mut self, phy_addr: u8) -> Result<bool> {
        Ok(self.read(phy_addr, phy_reg::BMSR)? & bmsr::LINK_STATUS != 0)
    }
}

fn check_phy_addr(phy_addr: u8) -> Result<()> {
    if phy_addr > MAX_PHY_ADDR {
        return Err(ConfigError::InvalidConfig.into());
    }
    Ok(())
}

fn c45_map(phy_addr: u8, devad: u8) -> Result<Mms> {
    check_phy_addr(phy_addr)?;
    mms_for_mmd(devad).ok_or_else(|| ConfigError::Unsupported.into())
}

impl<R: RegisterAccess> MdioBus for Tc6Mdio<R> {
    fn read(&mut self, phy_addr: u8, reg_addr: u8) -> Result<u16> {
        check_phy_addr(phy_addr)?;
        if reg_addr > MAX_REG_ADDR {
            return Err(ConfigError::InvalidConfig.into());
        }
        let value = self
            .regs
            .read_register(Mms::STANDARD, PHY_C22_BASE | u16::from(reg_addr))?;
        Ok(value as u16)
    }

    fn write(&mut self, phy_addr: u8, reg_addr: u8, value: u16) -> Result<()> {
        check_phy_addr(phy_addr)?;
        if reg_addr > MAX_REG_ADDR {
            return Err(ConfigError::InvalidConfig.into());
        }
        self.regs.write_register(
            Mms::STANDARD,
            PHY_C22_BASE | u16::from(reg_addr),
            u32::from(value),
        )
    }

    fn read_c45(&mut self, phy_addr: u8, devad: u8, reg_addr: u16) -> Result<u16> {
        let mms = c45_map(phy_addr, devad)?;
        Ok(self.regs.read_register(mms, reg_addr)? as u16)
    }

    fn write_c45(&mut self, phy_addr: u8, devad: u8, reg_addr: u16, value: u16) -> Result<()> {
        let mms = c45_map(phy_addr, devad)?;
        self.regs.write_register(mms, reg_addr, u32::from(value))
    }
}

// =============================================================================
// PHY Register Definitions (IEEE 802.3 standard registers)
// =============================================================================

/// Standard PHY register addresses (IEEE 802.3 Clause 22)
pub mod phy_reg {
    /// Basic Mode Control Register
    pub const BMCR: u8 = 0;
    /// Basic Mode Status Register
    pub const BMSR: u8 = 1;
    /// PHY Identifier 1
    pub const PHYIDR1: u8 = 2;
    /// PHY Identifier 2
    pub const PHYIDR2: u8 = 3;
}

/// BMCR (Basic Mode Control Register) bits
pub mod bmcr {
    /// Soft reset
    pub const RESET: u16 = 1 << 15;
    /// Loopback mode
    pub const LOOPBACK: u16 = 1 << 14;
    /// Power down
    pub const POWER_DOWN: u16 = 1 << 11;
    /// Isolate
    pub const ISOLATE: u16 = 1 << 10;
}

/// BMSR (Basic Mode Status Register) bits
pub mod bmsr {
    /// Link status
    pub const LINK_STATUS: u16 = 1 << 2;
    /// Extended capabilities
    pub const EXT_CAPABLE: u16 = 1 << 0;
}

// =============================================================================
// Unit Tests
// =============================================================================
