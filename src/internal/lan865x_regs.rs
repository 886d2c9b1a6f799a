//! LAN865x Vendor-Specific Register Definitions
//!
//! This module contains the register definitions used by the LAN8650/1
//! 10BASE-T1S MAC-PHY helpers.
//!
//! # Module Organization
//!
//! - `phy_id`: PHY identifier constants
//! - `mac`: MAC block registers (MMS 1)
//! - `net_ctl`, `net_cfg`: MAC network control/configuration bits
//! - `timer`: PTP timer registers (MMS 1)
//! - `pattern`: Timestamp pattern-match registers (MMS 4)
//!
//! # References
//!
//! - LAN8650/1 Datasheet (DS60001734)
//! - LAN8650/1 Errata (DS80001075)
//! - AN1760 configuration application note

#![allow(dead_code)]

// =============================================================================
// LAN865x PHY Identifier
// =============================================================================

/// PHY identifier constants (PHYID register, MMS 0)
pub mod phy_id {
    /// Microchip organizationally unique identifier
    pub const OUI_MCHP: u32 = 0x0080_0F;
    /// OUI field shift
    pub const OUI_SHIFT: u32 = 10;
    /// Model number for LAN8650/1
    pub const MODEL_LAN865X: u32 = 0x1B;
    /// Model field shift
    pub const MODEL_SHIFT: u32 = 4;
    /// Model field mask
    pub const MODEL_MASK: u32 = 0x3F << MODEL_SHIFT;
}

// =============================================================================
// MAC Registers (MMS 1)
// =============================================================================

/// MAC block register addresses
pub mod mac {
    /// Network control
    pub const NET_CTL: u16 = 0x0000;
    /// Network configuration
    pub const NET_CFG: u16 = 0x0001;
    /// Hash register bottom
    pub const L_HASH: u16 = 0x0020;
    /// Hash register top
    pub const H_HASH: u16 = 0x0021;
    /// Specific address 1 bottom
    pub const L_SADDR1: u16 = 0x0022;
    /// Specific address 1 top
    pub const H_SADDR1: u16 = 0x0023;
    /// Configuration fixup register from AN1760 (shares the timer increment slot)
    pub const FIXUP: u16 = 0x0077;
    /// Configuration fixup value from AN1760
    pub const FIXUP_VALUE: u32 = 0x0028;
}

/// Network control register bits
pub mod net_ctl {
    /// Transmit enable
    pub const TXEN: u32 = 1 << 3;
    /// Receive enable
    pub const RXEN: u32 = 1 << 2;
}

/// Network configuration register bits
pub mod net_cfg {
    /// Copy all frames
    pub const PROMISCUOUS: u32 = 1 << 4;
    /// Accept multicast frames matching the hash
    pub const MULTICAST: u32 = 1 << 6;
    /// Accept unicast frames matching the hash
    pub const UNICAST: u32 = 1 << 7;
}

// =============================================================================
// PTP Timer Registers (MMS 1)
// =============================================================================

/// MAC timer registers
pub mod timer {
    /// Sub-nanosecond increment
    pub const TISUBN: u16 = 0x006F;
    /// Timer seconds, high 16 bits
    pub const TSH: u16 = 0x0070;
    /// Timer seconds, low 32 bits
    pub const TSL: u16 = 0x0074;
    /// Timer nanoseconds
    pub const TN: u16 = 0x0075;
    /// Timer adjust
    pub const TA: u16 = 0x0076;
    /// Timer increment (whole nanoseconds per tick)
    pub const TI: u16 = 0x0077;

    /// Timer adjust: subtract when set
    pub const TA_ADJ: u32 = 1 << 31;
    /// Timer adjust: nanosecond delta field
    pub const TA_ITDT_MASK: u32 = 0x3FFF_FFFF;
    /// Seconds-high register mask
    pub const TSH_MASK: u32 = 0xFFFF;
    /// Sub-nanosecond field mask (24 bits, 2^-24 ns units)
    pub const TISUBN_MASK: u32 = 0x00FF_FFFF;
    /// Nominal increment for the 25 MHz timer clock
    pub const NOMINAL_INCREMENT_NS: u32 = 40;
}

// =============================================================================
// Pattern-Match Registers (MMS 4)
// =============================================================================

/// Timestamp pattern-match registers
pub mod pattern {
    /// Transmit match control
    pub const TXMCTL: u16 = 0x0040;
    /// Transmit match pattern high
    pub const TXMPATH: u16 = 0x0041;
    /// Transmit match pattern low
    pub const TXMPATL: u16 = 0x0042;
    /// Transmit match mask high
    pub const TXMMSKH: u16 = 0x0043;
    /// Transmit match mask low
    pub const TXMMSKL: u16 = 0x0044;
    /// Transmit match location
    pub const TXMLOC: u16 = 0x0045;
    /// Transmit matched packet delay
    pub const TXMDLY: u16 = 0x0049;
    /// Receive match control
    pub const RXMCTL: u16 = 0x0050;
    /// Receive match pattern high
    pub const RXMPATH: u16 = 0x0051;
    /// Receive match pattern low
    pub const RXMPATL: u16 = 0x0052;
    /// Receive match mask high
    pub const RXMMSKH: u16 = 0x0053;
    /// Receive match mask low
    pub const RXMMSKL: u16 = 0x0054;
    /// Receive match location
    pub const RXMLOC: u16 = 0x0055;

    /// Match enable bit in TXMCTL/RXMCTL
    pub const MATCH_ENABLE: u32 = 0x2;
    /// Matched packet delay enable
    pub const TXMDLY_EN: u32 = 1 << 15;
    /// Matched packet delay mask
    pub const TXMDLY_MASK: u32 = 0x7FF;
    /// PTP EtherType high byte
    pub const PTP_PATTERN_HIGH: u32 = 0x88;
    /// PTP EtherType low byte followed by the PTP message header byte
    pub const PTP_PATTERN_LOW: u32 = 0xF710;
    /// Match from the start of frame
    pub const LOCATION_SOF: u32 = 0;
    /// Transmit match location for PTP frames
    pub const TX_LOCATION_PTP: u32 = 30;
}
