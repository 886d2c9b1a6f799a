//! Register access abstraction
//!
//! Everything layered on top of the transport (MAC programming, the PTP
//! clock, PHY access over MDIO) talks to the MAC-PHY through this trait
//! and never sees chunks, credits or footers.

use crate::codec::Mms;
use crate::driver::error::Result;

/// Trait for register-level access to a MAC-PHY
///
/// Each call is atomic with respect to itself only. Multi-step operations
/// that must be undone on failure are the caller's responsibility.
pub trait RegisterAccess {
    /// Read one register
    fn read_register(&mut self, mms: Mms, addr: u16) -> Result<u32>;

    /// Write one register
    fn write_register(&mut self, mms: Mms, addr: u16, value: u32) -> Result<()>;

    /// Read `values.len()` consecutive registers starting at `addr`
    fn read_registers(&mut self, mms: Mms, addr: u16, values: &mut [u32]) -> Result<()> {
        for (offset, value) in values.iter_mut().enumerate() {
            *value = self.read_register(mms, addr.wrapping_add(offset as u16))?;
        }
        Ok(())
    }

    /// Write consecutive registers starting at `addr`
    fn write_registers(&mut self, mms: Mms, addr: u16, values: &[u32]) -> Result<()> {
        for (offset, &value) in values.iter().enumerate() {
            self.write_register(mms, addr.wrapping_add(offset as u16), value)?;
        }
        Ok(())
    }

    /// Read-modify-write: clear the `clear` bits, set the `set` bits.
    ///
    /// Returns the value written.
    fn modify_register(&mut self, mms: Mms, addr: u16, clear: u32, set: u32) -> Result<u32> {
        let value = (self.read_register(mms, addr)? & !clear) | set;
        self.write_register(mms, addr, value)?;
        Ok(value)
    }
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &mut T {
    fn read_register(&mut self, mms: Mms, addr: u16) -> Result<u32> {
        (**self).read_register(mms, addr)
    }

    fn write_register(&mut self, mms: Mms, addr: u16, value: u32) -> Result<()> {
        (**self).write_register(mms, addr, value)
    }

    fn read_registers(&mut self, mms: Mms, addr: u16, values: &mut [u32]) -> Result<()> {
        (**self).read_registers(mms, addr, values)
    }

    fn write_registers(&mut self, mms: Mms, addr: u16, values: &[u32]) -> Result<()> {
        (**self).write_registers(mms, addr, values)
    }

    fn modify_register(&mut self, mms: Mms, addr: u16, clear: u32, set: u32) -> Result<u32> {
        (**self).modify_register(mms, addr, clear, set)
    }
}
