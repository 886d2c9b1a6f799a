//! Synchronization and Concurrency Support
//!
//! - **Primitives** (`primitives`): [`CriticalSectionCell`] for ISR-safe
//!   interior mutability; with `async`, [`AtomicWaker`] and [`WakerSet`]
//! - **Shared wrapper** (`shared`): [`SharedTc6`], a `static`-friendly
//!   engine slot that thread code and the IRQn handler can both reach
//! - **Async split** (`asynch`): [`Tc6Channel`], [`Tc6Runner`] and
//!   [`Tc6Client`]; one task owns the engine, the rest send it requests
//!
//! # Feature Flags
//!
//! - `critical-section`: `primitives` and `shared`
//! - `async`: `asynch` (implies `critical-section`)
//!
//! # Example
//!
//! ```ignore
//! use oa_tc6::sync::SharedTc6;
//!
//! static TC6: SharedTc6<MySpi> = SharedTc6::new();
//!
//! fn main() {
//!     let mut tc6 = Tc6::new(spi);
//!     tc6.init(Tc6Config::lan865x_default(), &mut delay).unwrap();
//!     TC6.install(tc6);
//!
//!     loop {
//!         while let Some(Ok(Activity::Exchanged)) = TC6.poll() {}
//!         wait_for_interrupt();
//!     }
//! }
//!
//! #[interrupt]
//! fn EXTI0() {
//!     TC6.on_interrupt();
//! }
//! ```

mod primitives;

pub use primitives::CriticalSectionCell;
#[cfg(feature = "async")]
pub use primitives::{AtomicWaker, WakerSet};

mod shared;

pub use shared::SharedTc6;

#[cfg(feature = "async")]
pub mod asynch;

#[cfg(feature = "async")]
pub use asynch::{Tc6Channel, Tc6Client, Tc6Runner};
