//! LAN865x PTP Hardware Clock
//!
//! The MAC timer counts 48-bit seconds (TSH:TSL) and nanoseconds (TN),
//! advancing by TI + TISUBN/2^24 ns on every 25 MHz tick. Offsets are
//! applied through the timer adjust register (TA), which moves the clock by
//! up to 2^30 - 1 ns per write without stopping it.

use crate::codec::Mms;
use crate::driver::error::{ConfigError, Result};
use crate::hal::registers::RegisterAccess;
use crate::internal::lan865x_regs::timer;
use crate::internal::log::{debug, trace};

/// Nanoseconds per second
const NANOS_PER_SEC: u32 = 1_000_000_000;

/// Largest valid seconds value (48 bits)
const MAX_SECONDS: u64 = (1 << 48) - 1;

/// Offsets up to this size are applied with TA writes only
const MAX_STEPPED_ADJUST: u64 = 4 * timer::TA_ITDT_MASK as u64;

/// Sub-nanosecond fraction bits in TI:TISUBN
const INCREMENT_FRACTION_BITS: u32 = 24;

// =============================================================================
// PTP Time
// =============================================================================

/// A PTP timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PtpTime {
    /// Seconds (48 bits)
    pub seconds: u64,
    /// Nanoseconds (< 1_000_000_000)
    pub nanoseconds: u32,
}

impl PtpTime {
    /// Build a timestamp, rejecting out-of-range fields
    pub const fn new(seconds: u64, nanoseconds: u32) -> Option<Self> {
        if seconds > MAX_SECONDS || nanoseconds >= NANOS_PER_SEC {
            return None;
        }
        Some(Self {
            seconds,
            nanoseconds,
        })
    }

    /// Timestamp from a nanosecond count
    pub const fn from_nanos(nanos: u128) -> Option<Self> {
        let seconds = nanos / NANOS_PER_SEC as u128;
        if seconds > MAX_SECONDS as u128 {
            return None;
        }
        Some(Self {
            seconds: seconds as u64,
            nanoseconds: (nanos % NANOS_PER_SEC as u128) as u32,
        })
    }

    /// Total nanoseconds
    pub const fn as_nanos(&self) -> u128 {
        self.seconds as u128 * NANOS_PER_SEC as u128 + self.nanoseconds as u128
    }
}

// =============================================================================
// PTP Clock
// =============================================================================

/// PTP clock over register access
#[derive(Debug)]
pub struct PtpClock<R> {
    regs: R,
}

impl<R: RegisterAccess> PtpClock<R> {
    /// Wrap a register accessor (usually `&mut Tc6<..>`)
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Give back the register accessor
    pub fn into_inner(self) -> R {
        self.regs
    }

    /// Program the nominal 40 ns increment.
    pub fn init(&mut self) -> Result<()> {
        self.regs.write_register(Mms::MAC, timer::TISUBN, 0)?;
        self.regs
            .write_register(Mms::MAC, timer::TI, timer::NOMINAL_INCREMENT_NS)
    }

    /// Read the current time
    ///
    /// If the low seconds word moves while nanoseconds are read, the
    /// nanoseconds and high seconds are read again so all three fields
    /// belong to the same second.
    pub fn get_time(&mut self) -> Result<PtpTime> {
        let mut high = self.regs.read_register(Mms::MAC, timer::TSH)?;
        let low = self.regs.read_register(Mms::MAC, timer::TSL)?;
        let mut nanos = self.regs.read_register(Mms::MAC, timer::TN)?;
        let low_again = self.regs.read_register(Mms::MAC, timer::TSL)?;

        if low_again != low {
            trace!("ptp: seconds rolled over during read");
            nanos = self.regs.read_register(Mms::MAC, timer::TN)?;
            high = self.regs.read_register(Mms::MAC, timer::TSH)?;
        }

        Ok(PtpTime {
            seconds: (u64::from(high & timer::TSH_MASK) << 32) | u64::from(low_again),
            nanoseconds: nanos,
        })
    }

    /// Set the time. The nanoseconds write loads all three fields.
    pub fn set_time(&mut self, time: PtpTime) -> Result<()> {
        if time.seconds > MAX_SECONDS || time.nanoseconds >= NANOS_PER_SEC {
            return Err(ConfigError::InvalidConfig.into());
        }
        self.regs
            .write_register(Mms::MAC, timer::TSH, (time.seconds >> 32) as u32)?;
        self.regs
            .write_register(Mms::MAC, timer::TSL, time.seconds as u32)?;
        self.regs
            .write_register(Mms::MAC, timer::TN, time.nanoseconds)
    }

    /// Shift the clock by `delta` nanoseconds
    ///
    /// Small offsets go through TA in steps of at most 2^30 - 1 ns. Larger
    /// ones are applied by reading the time, normalizing and writing it
    /// back.
    ///
    /// # Errors
    /// - `InvalidConfig` - the result would be before the epoch or past
    ///   the 48-bit seconds range
    pub fn adjust_time(&mut self, delta: i64) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        let magnitude = delta.unsigned_abs();

        if magnitude > MAX_STEPPED_ADJUST {
            let now = self.get_time()?.as_nanos() as i128;
            let target = now + i128::from(delta);
            if target < 0 {
                return Err(ConfigError::InvalidConfig.into());
            }
            let time = PtpTime::from_nanos(target as u128).ok_or(ConfigError::InvalidConfig)?;
            debug!("ptp: stepped clock by {} ns", delta);
            return self.set_time(time);
        }

        let sign = if delta < 0 { timer::TA_ADJ } else { 0 };
        let mut remaining = magnitude;
        while remaining > 0 {
            let step = remaining.min(u64::from(timer::TA_ITDT_MASK));
            self.regs
                .write_register(Mms::MAC, timer::TA, sign | step as u32)?;
            remaining -= step;
        }
        Ok(())
    }

    /// Adjust the clock rate by `scaled_ppm` (parts per million with a
    /// 16-bit fractional part)
    ///
    /// # Errors
    /// - `InvalidConfig` - the increment would be zero, negative or exceed
    ///   the 8-bit TI field
    pub fn adjust_frequency(&mut self, scaled_ppm: i64) -> Result<()> {
        let base = i128::from(timer::NOMINAL_INCREMENT_NS) << INCREMENT_FRACTION_BITS;
        let adjust = base * i128::from(scaled_ppm) / (1_000_000_i128 << 16);
        let increment = base + adjust;

        let whole = increment >> INCREMENT_FRACTION_BITS;
        if increment <= 0 || whole > 0xFF {
            return Err(ConfigError::InvalidConfig.into());
        }

        let fraction = (increment as u32) & timer::TISUBN_MASK;
        self.regs.write_register(Mms::MAC, timer::TISUBN, fraction)?;
        self.regs.write_register(Mms::MAC, timer::TI, whole as u32)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
