//! ISR-safe engine wrapper using critical sections.
//!
//! [`SharedTc6`] lets a `static` hold the engine so thread code and the
//! IRQn handler can both reach it.

use embedded_hal::spi::SpiDevice;

use super::primitives::CriticalSectionCell;
use crate::codec::Mms;
use crate::driver::engine::{Activity, Tc6};
use crate::driver::error::{IoError, Result};
use crate::hal::registers::RegisterAccess;
use crate::internal::constants::{DEFAULT_RX_FRAMES, DEFAULT_TX_FRAMES};

/// ISR-safe engine slot
///
/// Starts empty so it can live in a `static`; [`install`](Self::install)
/// the engine once the SPI device exists. Every access runs inside
/// `critical_section::with()`, including any SPI exchange a closure
/// performs, so keep closures short.
///
/// Interrupts reported through [`on_interrupt`](Self::on_interrupt) are
/// latched separately and handed to the engine on the next access, so an
/// interrupt arriving while thread code holds the engine is not lost.
///
/// # Example
///
/// ```ignore
/// static TC6: SharedTc6<MySpi> = SharedTc6::new();
///
/// TC6.install(tc6);
///
/// #[interrupt]
/// fn EXTI0() {
///     TC6.on_interrupt();
/// }
///
/// loop {
///     while TC6.poll() == Some(Ok(Activity::Exchanged)) {}
///     TC6.with(|tc6| tc6.drain_received(|f| stack.input(f.as_slice())));
/// }
/// ```
pub struct SharedTc6<SPI, const TXQ: usize = DEFAULT_TX_FRAMES, const RXQ: usize = DEFAULT_RX_FRAMES>
{
    inner: CriticalSectionCell<Option<Tc6<SPI, TXQ, RXQ>>>,
    irq: CriticalSectionCell<bool>,
}

impl<SPI, const TXQ: usize, const RXQ: usize> SharedTc6<SPI, TXQ, RXQ> {
    /// Create an empty slot (const, suitable for static initialization)
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionCell::new(None),
            irq: CriticalSectionCell::new(false),
        }
    }

    /// Latch an IRQn assertion. Safe to call from the interrupt handler.
    #[inline]
    pub fn on_interrupt(&self) {
        self.irq.with(|pending| *pending = true);
    }

    /// Whether an engine is installed
    pub fn is_installed(&self) -> bool {
        self.inner.with_ref(Option::is_some)
    }
}

impl<SPI, const TXQ: usize, const RXQ: usize> SharedTc6<SPI, TXQ, RXQ>
where
    SPI: SpiDevice,
{
    /// Put `tc6` in the slot, returning whatever was there.
    pub fn install(&self, tc6: Tc6<SPI, TXQ, RXQ>) -> Option<Tc6<SPI, TXQ, RXQ>> {
        self.inner.replace(Some(tc6))
    }

    /// Remove the engine (for example to call [`Tc6::shutdown`]).
    pub fn take(&self) -> Option<Tc6<SPI, TXQ, RXQ>> {
        self.inner.replace(None)
    }

    /// Run `f` with exclusive access to the engine
    ///
    /// Returns `None` if no engine is installed.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Tc6<SPI, TXQ, RXQ>) -> R,
    {
        self.inner.with(|slot| {
            let tc6 = slot.as_mut()?;
            self.deliver_interrupt(tc6);
            Some(f(tc6))
        })
    }

    /// Like [`with`](Self::with), but also returns `None` if the engine is
    /// already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Tc6<SPI, TXQ, RXQ>) -> R,
    {
        self.inner
            .try_with(|slot| {
                let tc6 = slot.as_mut()?;
                self.deliver_interrupt(tc6);
                Some(f(tc6))
            })
            .flatten()
    }

    /// Run one transfer-loop iteration.
    pub fn poll(&self) -> Option<Result<Activity>> {
        self.with(Tc6::poll)
    }

    fn deliver_interrupt(&self, tc6: &mut Tc6<SPI, TXQ, RXQ>) {
        if self.irq.replace(false) {
            tc6.signal_interrupt();
        }
    }

    fn access<R>(&self, f: impl FnOnce(&mut Tc6<SPI, TXQ, RXQ>) -> Result<R>) -> Result<R> {
        self.with(f).unwrap_or(Err(IoError::InvalidState.into()))
    }
}

impl<SPI, const TXQ: usize, const RXQ: usize> Default for SharedTc6<SPI, TXQ, RXQ> {
    fn default() -> Self {
        Self::new()
    }
}

/// Register access through the shared slot, so device helpers can run
/// against a `static` engine. Fails with `InvalidState` while empty.
impl<SPI, const TXQ: usize, const RXQ: usize> RegisterAccess for &SharedTc6<SPI, TXQ, RXQ>
where
    SPI: SpiDevice,
{
    fn read_register(&mut self, mms: Mms, addr: u16) -> Result<u32> {
        self.access(|tc6| tc6.read_register(mms, addr))
    }

    fn write_register(&mut self, mms: Mms, addr: u16, value: u32) -> Result<()> {
        self.access(|tc6| tc6.write_register(mms, addr, value))
    }

    fn read_registers(&mut self, mms: Mms, addr: u16, values: &mut [u32]) -> Result<()> {
        self.access(|tc6| tc6.read_registers(mms, addr, values))
    }

    fn write_registers(&mut self, mms: Mms, addr: u16, values: &[u32]) -> Result<()> {
        self.access(|tc6| tc6.write_registers(mms, addr, values))
    }
}
