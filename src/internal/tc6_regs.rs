//! OPEN Alliance TC6 register map and wire-word bit fields.
//!
//! Standard registers live in memory map 0. The header and footer layouts
//! are the 32-bit words exchanged on the SPI link, most significant byte
//! first.
//!
//! # References
//!
//! - OPEN Alliance 10BASE-T1x MAC-PHY Serial Interface, version 1.1

#![allow(dead_code)]

// =============================================================================
// Standard Register Addresses (MMS 0)
// =============================================================================

/// Standard register addresses
pub mod reg {
    /// Identification and version
    pub const IDVER: u16 = 0x0000;
    /// PHY identifier
    pub const PHYID: u16 = 0x0001;
    /// Standard capabilities
    pub const STDCAP: u16 = 0x0002;
    /// Reset control and status
    pub const RESET: u16 = 0x0003;
    /// Configuration register 0
    pub const CONFIG0: u16 = 0x0004;
    /// Status register 0 (write 1 to clear)
    pub const STATUS0: u16 = 0x0008;
    /// Buffer status
    pub const BUFSTS: u16 = 0x000B;
    /// Interrupt mask register 0
    pub const INT_MASK0: u16 = 0x000C;
    /// Base of the Clause 22 PHY register window
    pub const PHY_C22_BASE: u16 = 0xFF00;
}

// =============================================================================
// STDCAP Bits
// =============================================================================

/// Standard capabilities register bits
pub mod stdcap {
    /// Direct PHY register access capability
    pub const DPRAC: u32 = 1 << 8;
    /// Cut-through capability
    pub const CTC: u32 = 1 << 7;
    /// Frame timestamp capability
    pub const FTSC: u32 = 1 << 6;
    /// Address increment disable capability
    pub const AIDC: u32 = 1 << 5;
    /// Sequence check capability
    pub const SEQC: u32 = 1 << 4;
    /// Minimum supported chunk payload size mask
    pub const MINCPS_MASK: u32 = 0x7;
}

// =============================================================================
// RESET Bits
// =============================================================================

/// Reset control register bits
pub mod reset {
    /// Software reset, self-clearing
    pub const SWRESET: u32 = 1 << 0;
}

// =============================================================================
// CONFIG0 Bits
// =============================================================================

/// Configuration register 0 bits
pub mod config0 {
    /// Configuration synchronized
    pub const SYNC: u32 = 1 << 15;
    /// Transmit FCS validation enable
    pub const TXFCSVE: u32 = 1 << 14;
    /// Receive frame alignment shift
    pub const RFA_SHIFT: u32 = 12;
    /// Receive frame alignment mask
    pub const RFA_MASK: u32 = 0x3 << RFA_SHIFT;
    /// Zero-align receive frames (RFA = 01b)
    pub const RFA_ZARFE: u32 = 0x1 << RFA_SHIFT;
    /// Transmit cut-through enable
    pub const TXCTE: u32 = 1 << 9;
    /// Receive cut-through enable
    pub const RXCTE: u32 = 1 << 8;
    /// Frame timestamp enable
    pub const FTSE: u32 = 1 << 7;
    /// Frame timestamp select (set = 64-bit)
    pub const FTSS: u32 = 1 << 6;
    /// Control data read/write protection enable
    pub const PROTE: u32 = 1 << 5;
    /// Transmit data header sequence check enable
    pub const SEQE: u32 = 1 << 4;
    /// Chunk payload size mask
    pub const CPS_MASK: u32 = 0x7;
}

// =============================================================================
// STATUS0 / INT_MASK0 Bits
// =============================================================================

/// Status register 0 bits (INT_MASK0 uses the same positions)
pub mod status0 {
    /// Transmit protocol error
    pub const TXPE: u32 = 1 << 0;
    /// Transmit buffer overflow error
    pub const TXBOE: u32 = 1 << 1;
    /// Transmit buffer underflow error
    pub const TXBUE: u32 = 1 << 2;
    /// Receive buffer overflow error
    pub const RXBOE: u32 = 1 << 3;
    /// Loss of framing error
    pub const LOFE: u32 = 1 << 4;
    /// Header error
    pub const HDRE: u32 = 1 << 5;
    /// Reset complete
    pub const RESETC: u32 = 1 << 6;
    /// PHY interrupt
    pub const PHYINT: u32 = 1 << 7;
    /// Transmit timestamp capture available A
    pub const TTSCAA: u32 = 1 << 8;
    /// Transmit timestamp capture available B
    pub const TTSCAB: u32 = 1 << 9;
    /// Transmit timestamp capture available C
    pub const TTSCAC: u32 = 1 << 10;
    /// Transmit frame check sequence error
    pub const TXFCSE: u32 = 1 << 11;
    /// Control data protection error
    pub const CDPE: u32 = 1 << 12;

    /// Errors the driver unmasks during initialization
    pub const UNMASKED_ERRORS: u32 = TXPE | RXBOE | LOFE | HDRE;
}

// =============================================================================
// BUFSTS Fields
// =============================================================================

/// Buffer status register fields
pub mod bufsts {
    /// Transmit credits shift
    pub const TXC_SHIFT: u32 = 8;
    /// Transmit credits mask
    pub const TXC_MASK: u32 = 0xFF << TXC_SHIFT;
    /// Receive chunks available mask
    pub const RCA_MASK: u32 = 0xFF;
}

// =============================================================================
// Control Header (host -> MAC-PHY, echoed back)
// =============================================================================

/// Control header bit fields
pub mod ctrl {
    /// Data, not control
    pub const DNC: u32 = 1 << 31;
    /// Header bad (set by the MAC-PHY in the echo)
    pub const HDRB: u32 = 1 << 30;
    /// Write, not read
    pub const WNR: u32 = 1 << 29;
    /// Address increment disable
    pub const AID: u32 = 1 << 28;
    /// Memory map selector shift
    pub const MMS_SHIFT: u32 = 24;
    /// Memory map selector mask
    pub const MMS_MASK: u32 = 0xF << MMS_SHIFT;
    /// Register address shift
    pub const ADDR_SHIFT: u32 = 8;
    /// Register address mask
    pub const ADDR_MASK: u32 = 0xFFFF << ADDR_SHIFT;
    /// Length (register count minus one) shift
    pub const LEN_SHIFT: u32 = 1;
    /// Length mask
    pub const LEN_MASK: u32 = 0x7F << LEN_SHIFT;
}

// =============================================================================
// Data Header (host -> MAC-PHY)
// =============================================================================

/// Data header bit fields
pub mod data_hdr {
    /// Data, not control
    pub const DNC: u32 = 1 << 31;
    /// Data chunk sequence
    pub const SEQ: u32 = 1 << 30;
    /// No receive
    pub const NORX: u32 = 1 << 29;
    /// Vendor specific shift
    pub const VS_SHIFT: u32 = 22;
    /// Vendor specific mask
    pub const VS_MASK: u32 = 0x3 << VS_SHIFT;
    /// Data valid
    pub const DV: u32 = 1 << 21;
    /// Start valid
    pub const SV: u32 = 1 << 20;
    /// Start word offset shift
    pub const SWO_SHIFT: u32 = 16;
    /// Start word offset mask
    pub const SWO_MASK: u32 = 0xF << SWO_SHIFT;
    /// End valid
    pub const EV: u32 = 1 << 14;
    /// End byte offset shift
    pub const EBO_SHIFT: u32 = 8;
    /// End byte offset mask
    pub const EBO_MASK: u32 = 0x3F << EBO_SHIFT;
    /// Transmit timestamp capture shift
    pub const TSC_SHIFT: u32 = 6;
    /// Transmit timestamp capture mask
    pub const TSC_MASK: u32 = 0x3 << TSC_SHIFT;
}

// =============================================================================
// Data Footer (MAC-PHY -> host)
// =============================================================================

/// Data footer bit fields
pub mod data_ftr {
    /// Extended status
    pub const EXST: u32 = 1 << 31;
    /// Header bad
    pub const HDRB: u32 = 1 << 30;
    /// Configuration synchronized
    pub const SYNC: u32 = 1 << 29;
    /// Receive chunks available shift
    pub const RCA_SHIFT: u32 = 24;
    /// Receive chunks available mask
    pub const RCA_MASK: u32 = 0x1F << RCA_SHIFT;
    /// Vendor specific shift
    pub const VS_SHIFT: u32 = 22;
    /// Vendor specific mask
    pub const VS_MASK: u32 = 0x3 << VS_SHIFT;
    /// Data valid
    pub const DV: u32 = 1 << 21;
    /// Start valid
    pub const SV: u32 = 1 << 20;
    /// Start word offset shift
    pub const SWO_SHIFT: u32 = 16;
    /// Start word offset mask
    pub const SWO_MASK: u32 = 0xF << SWO_SHIFT;
    /// Frame drop
    pub const FD: u32 = 1 << 15;
    /// End valid
    pub const EV: u32 = 1 << 14;
    /// End byte offset shift
    pub const EBO_SHIFT: u32 = 8;
    /// End byte offset mask
    pub const EBO_MASK: u32 = 0x3F << EBO_SHIFT;
    /// Receive timestamp added
    pub const RTSA: u32 = 1 << 7;
    /// Receive timestamp parity
    pub const RTSP: u32 = 1 << 6;
    /// Transmit credits shift
    pub const TXC_SHIFT: u32 = 1;
    /// Transmit credits mask
    pub const TXC_MASK: u32 = 0x1F << TXC_SHIFT;
}

/// Parity bit shared by every wire word
pub const PARITY: u32 = 1 << 0;
