//! Synchronization primitives for ISR-safe access.
//!
//! Building blocks for [`SharedTc6`](super::SharedTc6) and the async
//! runner/client split.

use core::cell::RefCell;
#[cfg(feature = "async")]
use core::task::Waker;
use critical_section::Mutex;

/// Interior mutability guarded by a critical section
///
/// Usable from thread context and interrupt handlers alike; every access
/// runs with interrupts disabled.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Create a cell (const, suitable for statics)
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` with exclusive access.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Run `f` with exclusive access, or return `None` if the cell is
    /// already borrowed (re-entrant call from an interrupt handler).
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            let mut value = self.inner.borrow(cs).try_borrow_mut().ok()?;
            Some(f(&mut value))
        })
    }

    /// Run `f` with shared access.
    #[inline]
    pub fn with_ref<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        critical_section::with(|cs| f(&self.inner.borrow_ref(cs)))
    }

    /// Swap in a new value and return the old one.
    pub fn replace(&self, value: T) -> T {
        critical_section::with(|cs| self.inner.replace(cs, value))
    }
}

/// Waker slot shared between a task and whoever wakes it
///
/// Holds at most one waker; registering a different one replaces it.
#[cfg(feature = "async")]
pub struct AtomicWaker {
    waker: CriticalSectionCell<Option<Waker>>,
}

#[cfg(feature = "async")]
impl AtomicWaker {
    /// Create an empty slot (const, suitable for statics)
    pub const fn new() -> Self {
        Self {
            waker: CriticalSectionCell::new(None),
        }
    }

    /// Store `waker`, unless an equivalent one is already stored.
    pub fn register(&self, waker: &Waker) {
        self.waker.with(|slot| {
            if !slot.as_ref().is_some_and(|w| w.will_wake(waker)) {
                *slot = Some(waker.clone());
            }
        });
    }

    /// Wake and clear the stored waker, if any.
    #[inline]
    pub fn wake(&self) {
        // Wake outside the critical section
        if let Some(waker) = self.waker.with(Option::take) {
            waker.wake();
        }
    }

    /// Whether a waker is stored
    pub fn is_registered(&self) -> bool {
        self.waker.with_ref(Option::is_some)
    }
}

#[cfg(feature = "async")]
impl Default for AtomicWaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Wakers of several tasks waiting on the same event
///
/// Holds up to `N` distinct wakers. When a new one does not fit, every
/// stored waker is woken first; those tasks re-register when polled.
#[cfg(feature = "async")]
pub struct WakerSet<const N: usize> {
    wakers: CriticalSectionCell<[Option<Waker>; N]>,
}

#[cfg(feature = "async")]
impl<const N: usize> WakerSet<N> {
    /// Create an empty set (const, suitable for statics)
    pub const fn new() -> Self {
        Self {
            wakers: CriticalSectionCell::new([const { None }; N]),
        }
    }

    /// Add `waker` unless an equivalent one is already stored.
    pub fn register(&self, waker: &Waker) {
        let overflow = self.wakers.with(|slots| {
            if slots.iter().flatten().any(|w| w.will_wake(waker)) {
                return None;
            }
            if let Some(free) = slots.iter_mut().find(|slot| slot.is_none()) {
                *free = Some(waker.clone());
                return None;
            }
            let evicted = core::mem::replace(slots, [const { None }; N]);
            slots[0] = Some(waker.clone());
            Some(evicted)
        });
        for w in overflow.into_iter().flatten().flatten() {
            w.wake();
        }
    }

    /// Wake and clear every stored waker.
    pub fn wake_all(&self) {
        let wakers = self.wakers.with(|slots| core::mem::replace(slots, [const { None }; N]));
        for w in wakers.into_iter().flatten() {
            w.wake();
        }
    }

    /// Number of stored wakers
    pub fn len(&self) -> usize {
        self.wakers.with_ref(|slots| slots.iter().flatten().count())
    }

    /// Whether no waker is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(feature = "async")]
impl<const N: usize> Default for WakerSet<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn cell_with_mutates_and_returns() {
        let cell = CriticalSectionCell::new(40_u32);
        let doubled = cell.with(|v| {
            *v += 1;
            *v * 2
        });
        assert_eq!(doubled, 82);
        assert_eq!(cell.with_ref(|v| *v), 41);
    }

    #[test]
    fn cell_try_with_detects_reentry() {
        let cell = CriticalSectionCell::new(0_u32);
        let nested = cell.with(|_| cell.try_with(|v| *v));
        assert_eq!(nested, None);
        assert_eq!(cell.try_with(|v| *v), Some(0));
    }

    #[test]
    fn cell_replace_returns_old_value() {
        let cell = CriticalSectionCell::new(1_u8);
        assert_eq!(cell.replace(2), 1);
        assert_eq!(cell.with_ref(|v| *v), 2);
    }

    #[test]
    fn cell_in_static() {
        static CELL: CriticalSectionCell<u32> = CriticalSectionCell::new(0);
        CELL.with(|v| *v = 100);
        assert_eq!(CELL.with_ref(|v| *v), 100);
    }

    #[cfg(feature = "async")]
    mod waker {
        use super::*;
        use crate::testing::WakeCounter;

        #[test]
        fn wake_runs_registered_waker_once() {
            let slot = AtomicWaker::new();
            let counter = WakeCounter::new();
            slot.register(&counter.waker());
            assert!(slot.is_registered());

            slot.wake();
            slot.wake();
            assert_eq!(counter.count(), 1);
            assert!(!slot.is_registered());
        }

        #[test]
        fn register_replaces_other_waker() {
            let slot = AtomicWaker::default();
            let first = WakeCounter::new();
            let second = WakeCounter::new();

            slot.register(&first.waker());
            slot.register(&second.waker());
            slot.wake();

            assert_eq!(first.count(), 0);
            assert_eq!(second.count(), 1);
        }

        #[test]
        fn wake_without_waker_is_noop() {
            let slot = AtomicWaker::new();
            slot.wake();
            assert!(!slot.is_registered());
        }

        #[test]
        fn waker_set_wakes_everyone() {
            let set: WakerSet<2> = WakerSet::new();
            let a = WakeCounter::new();
            let b = WakeCounter::new();
            set.register(&a.waker());
            set.register(&a.waker());
            set.register(&b.waker());
            assert_eq!(set.len(), 2);

            set.wake_all();
            assert_eq!((a.count(), b.count()), (1, 1));
            assert!(set.is_empty());
        }

        #[test]
        fn waker_set_overflow_wakes_evicted() {
            let set: WakerSet<1> = WakerSet::new();
            let a = WakeCounter::new();
            let b = WakeCounter::new();
            set.register(&a.waker());
            set.register(&b.waker());
            assert_eq!(a.count(), 1);
            assert_eq!(set.len(), 1);

            set.wake_all();
            assert_eq!(b.count(), 1);
        }
    }
}
