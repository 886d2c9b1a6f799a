//! Async worker/client split.
//!
//! One task owns the engine and runs [`Tc6Runner::run`]; every other task
//! talks to it through a [`Tc6Client`]. The two meet in a [`Tc6Channel`]:
//!
//! - a single mailbox slot for control transactions, so register accesses
//!   are served one at a time and never interleave
//! - a bounded transmit queue and a bounded receive queue
//! - an interrupt flag set from the IRQn handler
//! - wakers for the runner and for waiting clients
//!
//! All SPI traffic happens on the runner.
//!
//! # Example
//!
//! ```ignore
//! static CHANNEL: Tc6Channel = Tc6Channel::new();
//!
//! #[embassy_executor::task]
//! async fn tc6_task(mut runner: Tc6Runner<'static, MySpi>) {
//!     loop {
//!         let error = runner.run().await;
//!         log::error!("tc6 halted: {}", error);
//!         runner.tc6_mut().resync(&mut delay).ok();
//!     }
//! }
//!
//! #[interrupt]
//! fn EXTI0() {
//!     CHANNEL.on_interrupt();
//! }
//!
//! spawner.spawn(tc6_task(Tc6Runner::new(tc6, &CHANNEL)))?;
//! let client = CHANNEL.client();
//! let id = client.read_register(Mms::STANDARD, 0x0001).await?;
//! ```

use core::future::{Future, poll_fn};
use core::task::Poll;

use embedded_hal::spi::SpiDevice;

use super::primitives::{AtomicWaker, CriticalSectionCell, WakerSet};
use crate::codec::Mms;
use crate::driver::control::{ControlRequest, ControlResponse};
use crate::driver::engine::{Activity, Shutdown, Tc6};
use crate::driver::error::{ControlError, Error, IoError, Result};
use crate::driver::queue::{FrameBuf, FrameQueue};
use crate::internal::constants::{DEFAULT_RX_FRAMES, DEFAULT_TX_FRAMES, MAX_CONTROL_REGS};
use crate::internal::log::{info, warn};

/// Client tasks that can wait on one event without eviction
const WAITERS: usize = 4;

// =============================================================================
// Channel
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mailbox {
    Empty,
    /// Waiting for the runner to pick it up
    Request(ControlRequest),
    /// Handed to the engine
    InFlight,
    /// The caller went away; discard the result
    Abandoned,
    Done(Result<ControlResponse>),
}

struct ChannelState<const TXQ: usize, const RXQ: usize> {
    tx: FrameQueue<TXQ>,
    rx: FrameQueue<RXQ>,
    mailbox: Mailbox,
    irq: bool,
    halted: Option<Error>,
}

/// Meeting point between the runner and its clients
///
/// Const-constructible so it can live in a `static`.
pub struct Tc6Channel<const TXQ: usize = DEFAULT_TX_FRAMES, const RXQ: usize = DEFAULT_RX_FRAMES> {
    state: CriticalSectionCell<ChannelState<TXQ, RXQ>>,
    runner: AtomicWaker,
    control: WakerSet<WAITERS>,
    tx_space: WakerSet<WAITERS>,
    rx_ready: WakerSet<WAITERS>,
}

impl<const TXQ: usize, const RXQ: usize> Tc6Channel<TXQ, RXQ> {
    /// Create an empty channel
    pub const fn new() -> Self {
        Self {
            state: CriticalSectionCell::new(ChannelState {
                tx: FrameQueue::new(),
                rx: FrameQueue::new(),
                mailbox: Mailbox::Empty,
                irq: false,
                halted: None,
            }),
            runner: AtomicWaker::new(),
            control: WakerSet::new(),
            tx_space: WakerSet::new(),
            rx_ready: WakerSet::new(),
        }
    }

    /// Record an IRQn assertion and wake the runner. ISR-safe.
    #[inline]
    pub fn on_interrupt(&self) {
        self.state.with(|s| s.irq = true);
        self.runner.wake();
    }

    /// A handle for client tasks
    pub const fn client(&self) -> Tc6Client<'_, TXQ, RXQ> {
        Tc6Client { channel: self }
    }

    /// The error that stopped the runner, if it is stopped
    pub fn halted(&self) -> Option<Error> {
        self.state.with_ref(|s| s.halted)
    }

    /// Fail everything waiting with `error` until the runner starts again.
    fn halt(&self, error: Error) {
        self.state.with(|s| {
            s.halted = Some(error);
            s.mailbox = match s.mailbox {
                Mailbox::Request(_) | Mailbox::InFlight => Mailbox::Done(Err(error)),
                Mailbox::Abandoned => Mailbox::Empty,
                other => other,
            };
        });
        self.control.wake_all();
        self.tx_space.wake_all();
        self.rx_ready.wake_all();
    }

    /// Take the frames clients queued that the runner never picked up.
    ///
    /// Meant for after [`Tc6Runner::shutdown`]; while a runner is active
    /// this races with it.
    pub fn take_unsent(&self) -> FrameQueue<TXQ> {
        let unsent = self.state.with(|s| core::mem::replace(&mut s.tx, FrameQueue::new()));
        self.tx_space.wake_all();
        unsent
    }

    fn reopen(&self) {
        self.state.with(|s| s.halted = None);
    }

    fn release_mailbox(&self, finished: bool) {
        if !finished {
            self.state.with(|s| {
                s.mailbox = match s.mailbox {
                    Mailbox::InFlight => Mailbox::Abandoned,
                    _ => Mailbox::Empty,
                };
            });
            self.runner.wake();
        }
        self.control.wake_all();
    }
}

impl<const TXQ: usize, const RXQ: usize> Default for Tc6Channel<TXQ, RXQ> {
    fn default() -> Self {
        Self::new()
    }
}

/// Ownership of the mailbox; gives it back if the caller is dropped
/// mid-transaction.
struct MailboxClaim<'a, const TXQ: usize, const RXQ: usize> {
    channel: &'a Tc6Channel<TXQ, RXQ>,
    finished: bool,
}

impl<const TXQ: usize, const RXQ: usize> Drop for MailboxClaim<'_, TXQ, RXQ> {
    fn drop(&mut self) {
        self.channel.release_mailbox(self.finished);
    }
}

// =============================================================================
// Client
// =============================================================================

/// Handle used by application tasks
#[derive(Clone, Copy)]
pub struct Tc6Client<'a, const TXQ: usize = DEFAULT_TX_FRAMES, const RXQ: usize = DEFAULT_RX_FRAMES>
{
    channel: &'a Tc6Channel<TXQ, RXQ>,
}

impl<const TXQ: usize, const RXQ: usize> Tc6Client<'_, TXQ, RXQ> {
    /// Queue a frame without waiting
    ///
    /// # Errors
    /// - `Busy` - transmit queue full
    /// - `FrameTooLarge` / `InvalidLength` - frame size out of range
    /// - the runner's error while it is halted
    pub fn try_transmit(&self, frame: &[u8]) -> Result<()> {
        self.channel.state.with(|s| match s.halted {
            Some(error) => Err(error),
            None => s.tx.push(frame).map_err(Error::from),
        })?;
        self.channel.runner.wake();
        Ok(())
    }

    /// Queue a frame, waiting for space
    pub async fn transmit(&self, frame: &[u8]) -> Result<()> {
        poll_fn(|cx| match self.try_transmit(frame) {
            Err(Error::Io(IoError::Busy)) => {
                self.channel.tx_space.register(cx.waker());
                match self.try_transmit(frame) {
                    Err(Error::Io(IoError::Busy)) => Poll::Pending,
                    other => Poll::Ready(other),
                }
            }
            other => Poll::Ready(other),
        })
        .await
    }

    /// Take a received frame without waiting
    pub fn try_receive_frame(&self) -> Result<Option<FrameBuf>> {
        let frame = self.channel.state.with(|s| match s.rx.pop() {
            Some(frame) => Ok(Some(frame)),
            None => s.halted.map_or(Ok(None), Err),
        })?;
        if frame.is_some() {
            self.channel.runner.wake();
        }
        Ok(frame)
    }

    /// Wait for the next received frame, with its timestamp
    ///
    /// Frames already queued are still delivered after the runner halts.
    pub async fn receive_frame(&self) -> Result<FrameBuf> {
        poll_fn(|cx| {
            if let Some(frame) = self.try_receive_frame().transpose() {
                return Poll::Ready(frame);
            }
            self.channel.rx_ready.register(cx.waker());
            match self.try_receive_frame().transpose() {
                Some(frame) => Poll::Ready(frame),
                None => Poll::Pending,
            }
        })
        .await
    }

    /// Wait for the next received frame and copy it into `buf`
    ///
    /// # Errors
    /// - `BufferTooSmall` - the frame stays queued
    pub async fn receive(&self, buf: &mut [u8]) -> Result<usize> {
        let len = poll_fn(|cx| {
            let attempt = |buf: &mut [u8]| {
                self.channel.state.with(|s| match s.rx.pop_into(buf) {
                    Ok(Some((len, _))) => Some(Ok(len)),
                    Ok(None) => s.halted.map(Err),
                    Err(e) => Some(Err(e.into())),
                })
            };
            if let Some(result) = attempt(&mut *buf) {
                return Poll::Ready(result);
            }
            self.channel.rx_ready.register(cx.waker());
            attempt(&mut *buf).map_or(Poll::Pending, Poll::Ready)
        })
        .await?;
        self.channel.runner.wake();
        Ok(len)
    }

    /// Run one control transaction on the runner
    ///
    /// Waits for the mailbox, then for the result. Dropping the future
    /// frees the mailbox; a transaction already on the wire still
    /// completes but its result is discarded.
    pub async fn control(&self, request: ControlRequest) -> Result<ControlResponse> {
        let channel = self.channel;
        poll_fn(|cx| {
            let claim = || {
                channel.state.with(|s| {
                    if let Some(error) = s.halted {
                        return Some(Err(error));
                    }
                    if !matches!(s.mailbox, Mailbox::Empty) {
                        return None;
                    }
                    s.mailbox = Mailbox::Request(request);
                    Some(Ok(()))
                })
            };
            if let Some(claimed) = claim() {
                return Poll::Ready(claimed);
            }
            channel.control.register(cx.waker());
            claim().map_or(Poll::Pending, Poll::Ready)
        })
        .await?;

        let mut guard = MailboxClaim {
            channel,
            finished: false,
        };
        channel.runner.wake();

        let result = poll_fn(|cx| {
            let take = || {
                channel.state.with(|s| match s.mailbox {
                    Mailbox::Done(result) => {
                        s.mailbox = Mailbox::Empty;
                        Some(result)
                    }
                    _ => None,
                })
            };
            if let Some(result) = take() {
                return Poll::Ready(result);
            }
            channel.control.register(cx.waker());
            take().map_or(Poll::Pending, Poll::Ready)
        })
        .await;

        guard.finished = true;
        result
    }

    /// Read one register
    pub async fn read_register(&self, mms: Mms, addr: u16) -> Result<u32> {
        let response = self.control(ControlRequest::read(mms, addr, 1)?).await?;
        Ok(response.first())
    }

    /// Write one register
    pub async fn write_register(&self, mms: Mms, addr: u16, value: u32) -> Result<()> {
        self.control(ControlRequest::write(mms, addr, &[value])?).await?;
        Ok(())
    }

    /// Read consecutive registers, split into as many transactions as needed
    pub async fn read_registers(&self, mms: Mms, addr: u16, values: &mut [u32]) -> Result<()> {
        if values.is_empty() {
            return Err(ControlError::InvalidLength.into());
        }
        let mut addr = addr;
        for chunk in values.chunks_mut(MAX_CONTROL_REGS) {
            let response = self
                .control(ControlRequest::read(mms, addr, chunk.len())?)
                .await?;
            chunk.copy_from_slice(response.values());
            addr = addr.wrapping_add(chunk.len() as u16);
        }
        Ok(())
    }

    /// Write consecutive registers, split into as many transactions as needed
    pub async fn write_registers(&self, mms: Mms, addr: u16, values: &[u32]) -> Result<()> {
        if values.is_empty() {
            return Err(ControlError::InvalidLength.into());
        }
        let mut addr = addr;
        for chunk in values.chunks(MAX_CONTROL_REGS) {
            self.control(ControlRequest::write(mms, addr, chunk)?).await?;
            addr = addr.wrapping_add(chunk.len() as u16);
        }
        Ok(())
    }

    /// Frames waiting to be picked up by the runner
    pub fn tx_pending(&self) -> usize {
        self.channel.state.with_ref(|s| s.tx.len())
    }

    /// Received frames waiting for a client
    pub fn rx_pending(&self) -> usize {
        self.channel.state.with_ref(|s| s.rx.len())
    }
}

// =============================================================================
// Runner
// =============================================================================

/// The task that owns the engine and performs all SPI traffic
pub struct Tc6Runner<'a, SPI, const TXQ: usize = DEFAULT_TX_FRAMES, const RXQ: usize = DEFAULT_RX_FRAMES>
{
    tc6: Tc6<SPI, TXQ, RXQ>,
    channel: &'a Tc6Channel<TXQ, RXQ>,
}

impl<'a, SPI, const TXQ: usize, const RXQ: usize> Tc6Runner<'a, SPI, TXQ, RXQ>
where
    SPI: SpiDevice,
{
    /// Pair an initialized engine with a channel.
    pub fn new(tc6: Tc6<SPI, TXQ, RXQ>, channel: &'a Tc6Channel<TXQ, RXQ>) -> Self {
        Self { tc6, channel }
    }

    /// The engine, for recovery between [`run`](Self::run) calls
    pub fn tc6_mut(&mut self) -> &mut Tc6<SPI, TXQ, RXQ> {
        &mut self.tc6
    }

    /// Give back the engine
    pub fn into_inner(self) -> Tc6<SPI, TXQ, RXQ> {
        self.tc6
    }

    /// Stop the engine and release the SPI device.
    ///
    /// Waiting and later client calls fail with `Shutdown`. Frames still in
    /// the channel stay there; collect them with
    /// [`Tc6Channel::take_unsent`].
    pub fn shutdown(self) -> Shutdown<SPI, TXQ, RXQ> {
        self.channel.halt(IoError::Shutdown.into());
        self.tc6.shutdown()
    }

    /// Service the channel until the engine hits a device-fatal error
    /// (or stops running), and return that error.
    ///
    /// While stopped, client calls fail with the returned error. Recover
    /// through [`tc6_mut`](Self::tc6_mut) and call `run` again.
    pub async fn run(&mut self) -> Error {
        self.channel.reopen();
        info!("tc6: runner started");
        loop {
            match self.step() {
                Ok(Activity::Exchanged) => yield_now().await,
                Ok(Activity::Idle) => self.wait_for_work().await,
                Err(error) if self.channel.halted().is_some() => return error,
                Err(error) => warn!("tc6: runner continuing after {}", error),
            }
        }
    }

    /// One pass: take client work into the engine, run one transfer-loop
    /// iteration, hand results back.
    ///
    /// Device-fatal errors halt the channel before being returned.
    pub fn step(&mut self) -> Result<Activity> {
        self.intake();
        let activity = match self.tc6.poll() {
            Ok(activity) => activity,
            Err(error) => {
                if error.is_device_fatal() || !self.tc6.state().is_running() {
                    warn!("tc6: runner halted: {}", error);
                    self.channel.halt(error);
                }
                return Err(error);
            }
        };
        self.outtake();
        Ok(activity)
    }

    fn intake(&mut self) {
        let tc6 = &mut self.tc6;
        let (moved, refused) = self.channel.state.with(|s| {
            if core::mem::take(&mut s.irq) {
                tc6.signal_interrupt();
            }
            let mut moved = false;
            while tc6.can_transmit()
                && let Some(frame) = s.tx.front()
            {
                if tc6.transmit(frame.as_slice()).is_err() {
                    break;
                }
                s.tx.discard_front();
                moved = true;
            }
            let mut refused = false;
            if let Mailbox::Request(request) = s.mailbox {
                s.mailbox = match tc6.submit_control(request) {
                    Ok(()) => Mailbox::InFlight,
                    Err(error) => {
                        refused = true;
                        Mailbox::Done(Err(error))
                    }
                };
            }
            (moved, refused)
        });
        if moved {
            self.channel.tx_space.wake_all();
        }
        if refused {
            self.channel.control.wake_all();
        }
    }

    fn outtake(&mut self) {
        let tc6 = &mut self.tc6;
        let (answered, delivered) = self.channel.state.with(|s| {
            let mut answered = false;
            if let Some(result) = tc6.take_control_result() {
                s.mailbox = match s.mailbox {
                    Mailbox::Abandoned => Mailbox::Empty,
                    _ => Mailbox::Done(result),
                };
                answered = true;
            }
            let mut delivered = false;
            while !s.rx.is_full()
                && let Some(frame) = tc6.receive_frame()
            {
                delivered |= s.rx.push_buf(&frame).is_ok();
            }
            (answered, delivered)
        });
        if answered {
            self.channel.control.wake_all();
        }
        if delivered {
            self.channel.rx_ready.wake_all();
        }
    }

    fn has_work(&self) -> bool {
        self.tc6.has_work()
            || self.channel.state.with_ref(|s| {
                s.irq
                    || matches!(s.mailbox, Mailbox::Request(_))
                    || (!s.tx.is_empty() && self.tc6.can_transmit())
                    || (self.tc6.rx_available() && !s.rx.is_full())
            })
    }

    async fn wait_for_work(&self) {
        poll_fn(|cx| {
            if self.has_work() {
                return Poll::Ready(());
            }
            self.channel.runner.register(cx.waker());
            if self.has_work() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await;
    }
}

/// Let other tasks run once.
fn yield_now() -> impl Future<Output = ()> {
    let mut yielded = false;
    poll_fn(move |cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;
    use std::sync::Arc;
    use std::task::{Context, Waker};
    use std::vec::Vec;

    use core::pin::pin;

    use super::*;
    use crate::driver::config::Tc6Config;
    use crate::testing::{Fault, MockDelay, MockMacPhy, WakeCounter};

    type Runner<'a> = Tc6Runner<'a, MockMacPhy>;

    fn runner(channel: &Tc6Channel) -> (MockMacPhy, Runner<'_>) {
        let phy = MockMacPhy::new();
        let mut tc6: Tc6<MockMacPhy> = Tc6::new(phy.clone());
        tc6.init(Tc6Config::new(), &mut MockDelay::new()).unwrap();
        (phy, Tc6Runner::new(tc6, channel))
    }

    fn settle(runner: &mut Runner<'_>) {
        for _ in 0..200 {
            if runner.step().unwrap() == Activity::Idle {
                return;
            }
        }
        panic!("runner did not settle");
    }

    fn poll_now<F: Future>(fut: core::pin::Pin<&mut F>, waker: &Waker) -> Poll<F::Output> {
        fut.poll(&mut Context::from_waker(waker))
    }

    fn counter() -> (Arc<WakeCounter>, Waker) {
        let counter = WakeCounter::new();
        let waker = counter.waker();
        (counter, waker)
    }

    // =========================================================================
    // Frames
    // =========================================================================

    #[test]
    fn transmit_goes_through_runner() {
        let channel = Tc6Channel::new();
        let (phy, mut runner) = runner(&channel);
        let client = channel.client();
        let frame: Vec<u8> = (0..100u8).collect();

        client.try_transmit(&frame).unwrap();
        assert_eq!(client.tx_pending(), 1);
        settle(&mut runner);

        assert_eq!(client.tx_pending(), 0);
        assert_eq!(phy.transmitted(), [frame]);
    }

    #[test]
    fn transmit_waits_for_space() {
        let channel: Tc6Channel<1, 1> = Tc6Channel::new();
        let phy = MockMacPhy::new();
        let mut tc6: Tc6<MockMacPhy, 1, 1> = Tc6::new(phy.clone());
        tc6.init(Tc6Config::new(), &mut MockDelay::new()).unwrap();
        let mut runner = Tc6Runner::new(tc6, &channel);
        let client = channel.client();
        let (wakes, waker) = counter();

        client.try_transmit(&[1; 60]).unwrap();
        assert_eq!(client.try_transmit(&[2; 60]), Err(Error::Io(IoError::Busy)));

        let mut send = pin!(client.transmit(&[2; 60]));
        assert!(poll_now(send.as_mut(), &waker).is_pending());

        runner.step().unwrap();
        assert_eq!(wakes.count(), 1);
        assert_eq!(poll_now(send.as_mut(), &waker), Poll::Ready(Ok(())));
    }

    #[test]
    fn receive_delivers_frames_in_order() {
        let channel = Tc6Channel::new();
        let (phy, mut runner) = runner(&channel);
        let client = channel.client();
        let (wakes, waker) = counter();
        settle(&mut runner);

        let mut buf = [0u8; 1600];
        {
            let mut first = pin!(client.receive(&mut buf));
            assert!(poll_now(first.as_mut(), &waker).is_pending());

            phy.queue_rx_frame(&[0xA1; 80]);
            phy.queue_rx_frame(&[0xB2; 200]);
            channel.on_interrupt();
            settle(&mut runner);

            assert_eq!(wakes.count(), 1);
            assert_eq!(poll_now(first.as_mut(), &waker), Poll::Ready(Ok(80)));
        }
        assert_eq!(buf[..80], [0xA1; 80]);

        let second = client.try_receive_frame().unwrap().unwrap();
        assert_eq!(second.as_slice(), [0xB2; 200]);
        assert!(matches!(client.try_receive_frame(), Ok(None)));
    }

    // =========================================================================
    // Control Mailbox
    // =========================================================================

    #[test]
    fn register_read_through_mailbox() {
        let channel = Tc6Channel::new();
        let (phy, mut runner) = runner(&channel);
        phy.set_register(Mms::MAC, 0x0022, 0xCAFE_F00D);
        let client = channel.client();
        let (_, waker) = counter();

        let mut read = pin!(client.read_register(Mms::MAC, 0x0022));
        assert!(poll_now(read.as_mut(), &waker).is_pending());

        assert_eq!(runner.step(), Ok(Activity::Exchanged));
        assert_eq!(poll_now(read.as_mut(), &waker), Poll::Ready(Ok(0xCAFE_F00D)));
    }

    #[test]
    fn register_calls_are_serialized() {
        let channel = Tc6Channel::new();
        let (phy, mut runner) = runner(&channel);
        phy.set_register(Mms::MAC, 0x0022, 1);
        phy.set_register(Mms::MAC, 0x0023, 2);
        let client = channel.client();
        let (second_wakes, second_waker) = counter();
        let (_, first_waker) = counter();

        let mut first = pin!(client.read_register(Mms::MAC, 0x0022));
        let mut second = pin!(client.read_register(Mms::MAC, 0x0023));
        assert!(poll_now(first.as_mut(), &first_waker).is_pending());
        assert!(poll_now(second.as_mut(), &second_waker).is_pending());

        // Only the first request is on the wire
        runner.step().unwrap();
        assert_eq!(poll_now(first.as_mut(), &first_waker), Poll::Ready(Ok(1)));
        assert!(second_wakes.count() >= 1);

        assert!(poll_now(second.as_mut(), &second_waker).is_pending());
        runner.step().unwrap();
        assert_eq!(poll_now(second.as_mut(), &second_waker), Poll::Ready(Ok(2)));
    }

    #[test]
    fn dropped_call_frees_mailbox() {
        let channel = Tc6Channel::new();
        let (phy, mut runner) = runner(&channel);
        phy.set_register(Mms::MAC, 0x0022, 7);
        let client = channel.client();
        let (_, waker) = counter();

        {
            let mut abandoned = pin!(client.write_register(Mms::MAC, 0x0022, 9));
            assert!(poll_now(abandoned.as_mut(), &waker).is_pending());
        }
        settle(&mut runner);
        assert_eq!(phy.register(Mms::MAC, 0x0022), 7);

        let mut read = pin!(client.read_register(Mms::MAC, 0x0022));
        assert!(poll_now(read.as_mut(), &waker).is_pending());
        runner.step().unwrap();
        assert_eq!(poll_now(read.as_mut(), &waker), Poll::Ready(Ok(7)));
    }

    #[test]
    fn result_of_abandoned_inflight_call_is_discarded() {
        let channel = Tc6Channel::new();
        let (phy, mut runner) = runner(&channel);
        let client = channel.client();
        let (_, waker) = counter();

        {
            let mut write = pin!(client.write_register(Mms::MAC, 0x0022, 9));
            assert!(poll_now(write.as_mut(), &waker).is_pending());
            runner.intake();
        }
        settle(&mut runner);
        assert_eq!(phy.register(Mms::MAC, 0x0022), 9);
        assert_eq!(channel.state.with_ref(|s| s.mailbox), Mailbox::Empty);
    }

    // =========================================================================
    // Runner Lifecycle
    // =========================================================================

    #[test]
    fn interrupt_wakes_idle_runner() {
        let channel = Tc6Channel::new();
        let (phy, mut runner) = runner(&channel);
        let (wakes, waker) = counter();
        settle(&mut runner);
        let before = phy.transfers().len();

        let mut run = pin!(runner.run());
        assert!(poll_now(run.as_mut(), &waker).is_pending());
        assert_eq!(wakes.count(), 0);

        channel.on_interrupt();
        assert_eq!(wakes.count(), 1);
        assert!(poll_now(run.as_mut(), &waker).is_pending());
        assert!(phy.transfers().len() > before);
    }

    #[test]
    fn fatal_error_halts_clients() {
        let channel = Tc6Channel::new();
        let (phy, mut runner) = runner(&channel);
        let client = channel.client();
        let (wakes, waker) = counter();
        settle(&mut runner);

        let mut read = pin!(client.read_register(Mms::STANDARD, 0x0001));
        assert!(poll_now(read.as_mut(), &waker).is_pending());

        phy.inject(Fault::Bus);
        let error = runner.step().unwrap_err();
        assert!(error.is_device_fatal());
        assert_eq!(channel.halted(), Some(error));
        assert!(wakes.count() >= 1);

        assert_eq!(poll_now(read.as_mut(), &waker), Poll::Ready(Err(error)));
        assert_eq!(client.try_transmit(&[0; 60]), Err(error));
        assert!(matches!(client.try_receive_frame(), Err(e) if e == error));
    }

    #[test]
    fn shutdown_fails_waiting_clients() {
        let channel = Tc6Channel::new();
        let (_, mut runner) = runner(&channel);
        let client = channel.client();
        let (_, waker) = counter();
        settle(&mut runner);

        let mut read = pin!(client.read_register(Mms::STANDARD, 0x0001));
        assert!(poll_now(read.as_mut(), &waker).is_pending());
        client.try_transmit(&[3; 60]).unwrap();

        let parts = runner.shutdown();
        assert!(parts.undelivered.is_empty());

        let shutdown = Error::Io(IoError::Shutdown);
        assert_eq!(poll_now(read.as_mut(), &waker), Poll::Ready(Err(shutdown)));
        assert_eq!(client.try_transmit(&[4; 60]), Err(shutdown));

        let unsent = channel.take_unsent();
        assert_eq!(unsent.len(), 1);
        assert_eq!(unsent.front().unwrap().as_slice(), [3; 60]);
        assert_eq!(client.tx_pending(), 0);
    }
}
