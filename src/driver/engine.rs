//! TC6 transfer engine.
//!
//! This module contains the main [`Tc6`] structure:
//!
//! - Initialization (software reset, capability discovery, CONFIG0)
//! - Register access through control transactions
//! - Frame transmission and reception through data chunks
//! - The transfer loop ([`Tc6::poll`]) that interleaves both
//! - Fault handling, resynchronization and shutdown
//!
//! All SPI traffic happens inside methods taking `&mut self`, so exactly
//! one exchange is ever in flight.

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;

use super::config::{State, Tc6Config};
use super::control::{ControlEngine, ControlProgress, ControlRequest, ControlResponse};
use super::credit::CreditTracker;
use super::error::{ConfigError, ControlError, Error, IoError, LinkError, Result};
use super::framer::{RxFramer, TxFramer};
use super::queue::{FrameBuf, FrameQueue};
use super::status::{Capabilities, ExtendedStatus, Tc6Stats, parse_bufsts};
use crate::codec::{DataHeader, Mms, decode_footer};
use crate::hal::registers::RegisterAccess;
use crate::internal::constants::{
    DEFAULT_RX_FRAMES, DEFAULT_TX_FRAMES, MAX_CONTROL_REGS, RESET_POLL_INTERVAL_MS,
    SPI_BUFFER_SIZE, WORD_SIZE,
};
use crate::internal::log::{debug, info, trace, warn};
use crate::internal::tc6_regs::{config0, reg, reset, status0};

// =============================================================================
// Helper Types
// =============================================================================

/// Result of one [`Tc6::poll`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Activity {
    /// Nothing to exchange; wait for an interrupt or new work
    Idle,
    /// One SPI transfer was performed; poll again
    Exchanged,
}

/// What [`Tc6::shutdown`] hands back
pub struct Shutdown<SPI, const TXQ: usize, const RXQ: usize> {
    /// The SPI device, released
    pub spi: SPI,
    /// Transmit frames that never fully reached the MAC-PHY
    pub undelivered: FrameQueue<TXQ>,
    /// Received frames nobody collected
    pub received: FrameQueue<RXQ>,
}

// =============================================================================
// TC6 Engine
// =============================================================================

/// OPEN Alliance TC6 MAC-PHY engine
///
/// Owns the SPI device, the credit tracker, the control slot, both framers
/// and the frame queues.
///
/// # Type Parameters
/// * `SPI` - SPI device implementing `embedded_hal::spi::SpiDevice`
/// * `TXQ` - Number of queued transmit frames
/// * `RXQ` - Number of queued receive frames
///
/// # Example
/// ```ignore
/// let mut tc6: Tc6<_> = Tc6::new(spi);
/// tc6.init(Tc6Config::lan865x_default(), &mut delay)?;
///
/// tc6.transmit(&frame)?;
/// while tc6.poll()? == Activity::Exchanged {}
///
/// tc6.drain_received(|frame| stack.input(frame.as_slice()));
/// ```
pub struct Tc6<SPI, const TXQ: usize = DEFAULT_TX_FRAMES, const RXQ: usize = DEFAULT_RX_FRAMES> {
    spi: SPI,
    config: Tc6Config,
    state: State,
    caps: Capabilities,
    credit: CreditTracker,
    control: ControlEngine,
    tx_queue: FrameQueue<TXQ>,
    rx_queue: FrameQueue<RXQ>,
    tx_framer: TxFramer,
    rx_framer: RxFramer,
    stats: Tc6Stats,
    /// IRQn was asserted; the MAC-PHY wants an exchange
    irq_pending: bool,
    /// Credit counts are stale and must be refreshed
    refresh_pending: bool,
    /// A frame was queued since the last exchange; worth one credit poll
    tx_poll_pending: bool,
    /// A footer carried EXST; STATUS0 must be read
    status_pending: bool,
    timestamping: bool,
    tx_buf: [u8; SPI_BUFFER_SIZE],
    rx_buf: [u8; SPI_BUFFER_SIZE],
}

impl<SPI, const TXQ: usize, const RXQ: usize> Tc6<SPI, TXQ, RXQ>
where
    SPI: SpiDevice,
{
    /// Create an engine in the `Uninitialized` state.
    pub fn new(spi: SPI) -> Self {
        let config = Tc6Config::new();
        Self {
            spi,
            config,
            state: State::Uninitialized,
            caps: Capabilities::default(),
            credit: CreditTracker::new(config.credit_poll_limit),
            control: ControlEngine::new(config.control_attempts),
            tx_queue: FrameQueue::new(),
            rx_queue: FrameQueue::new(),
            tx_framer: TxFramer::new(),
            rx_framer: RxFramer::new(config.zero_align_rx, config.timestamp_format.bytes()),
            stats: Tc6Stats::default(),
            irq_pending: false,
            refresh_pending: false,
            tx_poll_pending: false,
            status_pending: false,
            timestamping: false,
            tx_buf: [0; SPI_BUFFER_SIZE],
            rx_buf: [0; SPI_BUFFER_SIZE],
        }
    }

    // =========================================================================
    // State Accessors
    // =========================================================================

    /// Get the current state
    #[inline(always)]
    pub fn state(&self) -> State {
        self.state
    }

    /// Active configuration
    #[inline(always)]
    pub fn config(&self) -> &Tc6Config {
        &self.config
    }

    /// Capabilities read from STDCAP during initialization
    #[inline(always)]
    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Driver statistics
    #[inline(always)]
    pub fn stats(&self) -> &Tc6Stats {
        &self.stats
    }

    /// Transmit credit last reported by the MAC-PHY
    pub fn tx_credits(&self) -> u8 {
        self.credit.available_tx_credit()
    }

    /// Receive chunks last reported as waiting in the MAC-PHY
    pub fn remote_rx_chunks(&self) -> u8 {
        self.credit.remote_rx_available()
    }

    /// Whether receive timestamps are enabled
    pub fn timestamping_enabled(&self) -> bool {
        self.timestamping
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize the MAC-PHY with the given configuration
    ///
    /// This performs the full initialization sequence:
    /// 1. Software reset and wait for RESETC
    /// 2. Read STDCAP and check the chunk size is supported
    /// 3. Unmask the protocol error interrupts
    /// 4. Program CONFIG0 (chunk size, receive alignment, SYNC)
    /// 5. Seed credits from BUFSTS
    ///
    /// An empty chunk is scheduled so the first [`poll`](Self::poll)
    /// deasserts IRQn.
    ///
    /// # Errors
    /// - `AlreadyInitialized` - engine was already initialized
    /// - `InvalidConfig` - configuration failed validation
    /// - `ResetFailed` - RESETC did not appear within the timeout
    /// - `Unsupported` - the chunk payload is below the device minimum
    pub fn init<D: DelayNs>(&mut self, config: Tc6Config, delay: &mut D) -> Result<()> {
        if self.state != State::Uninitialized {
            return Err(ConfigError::AlreadyInitialized.into());
        }
        config.validate()?;

        self.config = config;
        self.credit = CreditTracker::new(config.credit_poll_limit);
        self.control = ControlEngine::new(config.control_attempts);
        self.rx_framer = RxFramer::new(config.zero_align_rx, config.timestamp_format.bytes());

        self.bring_up(delay)?;
        self.state = State::Idle;
        info!("tc6: initialized, {} byte chunks", self.config.payload_bytes());
        Ok(())
    }

    fn bring_up<D: DelayNs>(&mut self, delay: &mut D) -> Result<()> {
        self.write_reg(Mms::STANDARD, reg::RESET, reset::SWRESET)?;
        self.wait_reset_complete(delay)?;
        self.write_reg(Mms::STANDARD, reg::STATUS0, status0::RESETC)?;

        let idver = self.read_reg(Mms::STANDARD, reg::IDVER)?;
        debug!("tc6: IDVER {:#x}", idver);

        let stdcap = self.read_reg(Mms::STANDARD, reg::STDCAP)?;
        let caps = Capabilities::from_raw(stdcap);
        debug!("tc6: STDCAP {:#x}", stdcap);
        if !caps.supports_payload(self.config.chunk_payload) {
            warn!("tc6: chunk payload below device minimum");
            return Err(ConfigError::Unsupported.into());
        }
        if self.timestamping && !caps.frame_timestamps {
            self.timestamping = false;
        }
        self.caps = caps;

        let mask = self.read_reg(Mms::STANDARD, reg::INT_MASK0)?;
        self.write_reg(Mms::STANDARD, reg::INT_MASK0, mask & !status0::UNMASKED_ERRORS)?;

        let current = self.read_reg(Mms::STANDARD, reg::CONFIG0)?;
        let value = self.config0_value(current);
        self.write_reg(Mms::STANDARD, reg::CONFIG0, value)?;

        let (tx_credits, rx_available) = parse_bufsts(self.read_reg(Mms::STANDARD, reg::BUFSTS)?);
        self.credit.seed(tx_credits, rx_available);
        debug!("tc6: {} tx credits, {} rx chunks", tx_credits, rx_available);

        self.irq_pending = true;
        self.refresh_pending = true;
        self.status_pending = false;
        Ok(())
    }

    fn config0_value(&self, current: u32) -> u32 {
        let keep = current
            & !(config0::CPS_MASK | config0::RFA_MASK | config0::FTSE | config0::FTSS);
        let mut value = keep | self.config.chunk_payload.to_cps() | config0::SYNC;
        if self.config.zero_align_rx {
            value |= config0::RFA_ZARFE;
        }
        if self.timestamping {
            value |= config0::FTSE | self.config.timestamp_format.config0_bits();
        }
        value
    }

    fn wait_reset_complete<D: DelayNs>(&mut self, delay: &mut D) -> Result<()> {
        let mut elapsed = 0u32;
        loop {
            match self.read_reg(Mms::STANDARD, reg::STATUS0) {
                Ok(status) if status & status0::RESETC != 0 => {
                    debug!("tc6: reset complete after {} ms", elapsed);
                    return Ok(());
                }
                // The MAC-PHY may not answer while it is resetting
                Ok(_) | Err(Error::Control(_)) => {}
                Err(e) => return Err(e),
            }
            if elapsed >= self.config.reset_timeout_ms {
                warn!("tc6: reset timed out");
                return Err(ConfigError::ResetFailed.into());
            }
            delay.delay_ms(RESET_POLL_INTERVAL_MS);
            elapsed += RESET_POLL_INTERVAL_MS;
        }
    }

    // =========================================================================
    // Register Access
    // =========================================================================

    /// Read one register
    ///
    /// # Errors
    /// - `InvalidState` - engine not initialized or faulted
    /// - `Busy` - a control transaction is already in the slot
    /// - Control errors from the transaction itself
    pub fn read_register(&mut self, mms: Mms, addr: u16) -> Result<u32> {
        self.ensure_running()?;
        self.read_reg(mms, addr)
    }

    /// Write one register
    pub fn write_register(&mut self, mms: Mms, addr: u16, value: u32) -> Result<()> {
        self.ensure_running()?;
        self.write_reg(mms, addr, value)
    }

    /// Read consecutive registers into `values`
    ///
    /// Ranges longer than one control transaction are split.
    pub fn read_registers(&mut self, mms: Mms, addr: u16, values: &mut [u32]) -> Result<()> {
        self.ensure_running()?;
        if values.is_empty() {
            return Err(ControlError::InvalidLength.into());
        }
        let mut addr = addr;
        for chunk in values.chunks_mut(MAX_CONTROL_REGS) {
            let response = self.transact(ControlRequest::read(mms, addr, chunk.len())?)?;
            chunk.copy_from_slice(response.values());
            addr = addr.wrapping_add(chunk.len() as u16);
        }
        Ok(())
    }

    /// Write consecutive registers from `values`
    pub fn write_registers(&mut self, mms: Mms, addr: u16, values: &[u32]) -> Result<()> {
        self.ensure_running()?;
        if values.is_empty() {
            return Err(ControlError::InvalidLength.into());
        }
        let mut addr = addr;
        for chunk in values.chunks(MAX_CONTROL_REGS) {
            self.transact(ControlRequest::write(mms, addr, chunk)?)?;
            addr = addr.wrapping_add(chunk.len() as u16);
        }
        Ok(())
    }

    fn read_reg(&mut self, mms: Mms, addr: u16) -> Result<u32> {
        let response = self.transact(ControlRequest::read(mms, addr, 1)?)?;
        Ok(response.first())
    }

    fn write_reg(&mut self, mms: Mms, addr: u16, value: u32) -> Result<()> {
        self.transact(ControlRequest::write(mms, addr, &[value])?)?;
        Ok(())
    }

    /// Run one control transaction to completion.
    fn transact(&mut self, request: ControlRequest) -> Result<ControlResponse> {
        self.control.submit(request)?;
        loop {
            self.service_control()?;
            if let Some(result) = self.control.take_completion() {
                return result.map_err(Error::from);
            }
        }
    }

    /// Perform one exchange for the pending control transaction.
    fn service_control(&mut self) -> Result<()> {
        let len = self
            .control
            .prepare(&mut self.tx_buf)
            .ok_or(IoError::InvalidState)?;
        if let Err(e) = self.exchange(len) {
            self.control.abandon();
            return Err(self.fault(e));
        }
        if self.control.complete(&self.rx_buf[..len]) == ControlProgress::Retry {
            Tc6Stats::bump(&mut self.stats.control_retries);
        }
        Ok(())
    }

    /// Queue a control transaction for the transfer loop.
    ///
    /// Used by worker tasks that drive [`poll`](Self::poll); collect the
    /// result with [`take_control_result`](Self::take_control_result).
    pub fn submit_control(&mut self, request: ControlRequest) -> Result<()> {
        self.ensure_running()?;
        self.control.submit(request)?;
        Ok(())
    }

    /// Collect a finished control transaction queued by
    /// [`submit_control`](Self::submit_control).
    pub fn take_control_result(&mut self) -> Option<Result<ControlResponse>> {
        self.control
            .take_completion()
            .map(|result| result.map_err(Error::from))
    }

    // =========================================================================
    // Frame Transmission and Reception
    // =========================================================================

    /// Queue a frame for transmission
    ///
    /// The frame is copied; it goes out over the following
    /// [`poll`](Self::poll) calls as credit allows.
    ///
    /// # Errors
    /// - `Busy` - transmit queue full, retry after polling
    /// - `FrameTooLarge` / `InvalidLength` - frame size out of range
    /// - `InvalidState` - engine not running
    pub fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        self.ensure_running()?;
        self.tx_queue.push(frame)?;
        self.tx_poll_pending = true;
        trace!("tc6: queued {} byte frame", frame.len());
        Ok(())
    }

    /// Whether another frame can be queued
    pub fn can_transmit(&self) -> bool {
        self.state.is_running() && !self.tx_queue.is_full()
    }

    /// Frames waiting to be transmitted, including one partly sent
    pub fn tx_pending(&self) -> usize {
        self.tx_queue.len()
    }

    /// Number of received frames waiting
    pub fn rx_pending(&self) -> usize {
        self.rx_queue.len()
    }

    /// Whether a received frame is waiting
    pub fn rx_available(&self) -> bool {
        !self.rx_queue.is_empty()
    }

    /// Length of the next received frame
    pub fn peek_rx_length(&self) -> Option<usize> {
        self.rx_queue.front().map(FrameBuf::len)
    }

    /// Copy the next received frame into `buf`
    ///
    /// Returns `Ok(None)` when nothing is waiting.
    ///
    /// # Errors
    /// - `BufferTooSmall` - the frame stays queued
    pub fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        Ok(self.rx_queue.pop_into(buf)?.map(|(len, _)| len))
    }

    /// Take the next received frame with its timestamp.
    pub fn receive_frame(&mut self) -> Option<FrameBuf> {
        self.rx_queue.pop()
    }

    /// Hand every received frame to `deliver`, oldest first.
    ///
    /// Returns the number of frames delivered.
    pub fn drain_received<F: FnMut(&FrameBuf)>(&mut self, mut deliver: F) -> usize {
        let mut count = 0;
        while let Some(frame) = self.rx_queue.front() {
            deliver(frame);
            self.rx_queue.discard_front();
            count += 1;
        }
        count
    }

    // =========================================================================
    // Transfer Loop
    // =========================================================================

    /// Note that the MAC-PHY asserted IRQn.
    ///
    /// Call from the interrupt handler (or when the pin is seen low); the
    /// next [`poll`](Self::poll) exchanges at least one chunk.
    pub fn signal_interrupt(&mut self) {
        self.irq_pending = true;
    }

    /// Whether [`poll`](Self::poll) has anything to do
    pub fn has_work(&self) -> bool {
        if !self.state.is_running() {
            return false;
        }
        self.control.is_pending()
            || (self.status_pending && self.control.is_idle())
            || self.irq_pending
            || self.refresh_pending
            || (!self.tx_queue.is_empty()
                && (self.tx_poll_pending || self.credit.available_tx_credit() > 0))
            || (self.credit.remote_rx_available() > 0 && !self.rx_blocked())
    }

    fn rx_blocked(&self) -> bool {
        self.config.rx_backpressure && self.rx_queue.is_full()
    }

    /// Run one iteration of the transfer loop
    ///
    /// A pending control transaction goes first. Otherwise one SPI transfer
    /// carries as many data chunks as credit and configuration allow, padded
    /// with empty chunks to collect waiting receive data. If there is neither
    /// but the MAC-PHY raised IRQn, credit must be refreshed, or a frame was
    /// queued since the last exchange, a single empty chunk is sent. With no
    /// credit the loop then stays idle until the next IRQn.
    ///
    /// Returns [`Activity::Idle`] when nothing was exchanged.
    ///
    /// # Errors
    /// - `Link` errors and SPI errors fault the engine
    /// - Control errors while reading STATUS0 are returned as is
    pub fn poll(&mut self) -> Result<Activity> {
        self.ensure_running()?;

        if self.control.is_pending() {
            self.service_control()?;
            return Ok(Activity::Exchanged);
        }
        if self.status_pending && self.control.is_idle() {
            self.status_pending = false;
            self.service_status()?;
            return Ok(Activity::Exchanged);
        }

        let payload = self.config.payload_bytes();
        let chunk = self.config.chunk_bytes();
        let max_chunks = self.config.chunks_per_transfer;
        let no_rx = self.rx_blocked();

        // Data chunks, bounded by credit
        let credit = usize::from(self.credit.available_tx_credit());
        let mut cursor = self.tx_framer.cursor();
        let mut data_chunks = 0;
        while data_chunks < max_chunks.min(credit) {
            let Some(frame) = self.tx_queue.iter().nth(cursor.frame) else {
                break;
            };
            let base = data_chunks * chunk;
            let (header_bytes, payload_bytes) = self.tx_buf[base..base + chunk].split_at_mut(WORD_SIZE);
            let header = DataHeader {
                no_rx,
                ..TxFramer::fill_chunk(&mut cursor, frame.as_slice(), payload_bytes)
            };
            header_bytes.copy_from_slice(&header.to_bytes());
            data_chunks += 1;
        }

        // Empty chunks to pull receive data, or one to poll
        let mut chunks = data_chunks;
        if !no_rx {
            chunks = chunks.max(usize::from(self.credit.remote_rx_available()).min(max_chunks));
        }
        let woken = self.irq_pending || self.refresh_pending || self.tx_poll_pending;
        let credit_poll = chunks == 0 && woken && !self.tx_queue.is_empty();
        if chunks == 0 && woken {
            chunks = 1;
        }
        if chunks == 0 {
            return Ok(Activity::Idle);
        }
        if data_chunks == 0 {
            Tc6Stats::bump(&mut self.stats.credit_polls);
        }

        let empty = DataHeader {
            no_rx,
            ..DataHeader::EMPTY
        };
        for i in data_chunks..chunks {
            let base = i * chunk;
            self.tx_buf[base..base + WORD_SIZE].copy_from_slice(&empty.to_bytes());
            self.tx_buf[base + WORD_SIZE..base + chunk].fill(0);
        }

        self.irq_pending = false;
        self.refresh_pending = false;
        self.tx_poll_pending = false;
        self.state = State::Exchanging;
        let exchanged = self.exchange(chunks * chunk);
        self.state = State::Idle;
        if let Err(e) = exchanged {
            return Err(self.fault(e));
        }
        Tc6Stats::bump(&mut self.stats.transfers);

        // The data is on the wire: retire finished frames
        self.credit.consume(data_chunks as u8);
        for _ in 0..self.tx_framer.commit(cursor) {
            if let Some(frame) = self.tx_queue.front() {
                Tc6Stats::bump(&mut self.stats.tx_frames);
                Tc6Stats::add(&mut self.stats.tx_bytes, frame.len());
            }
            self.tx_queue.discard_front();
        }

        for i in 0..chunks {
            let base = i * chunk;
            let footer = match decode_footer(&self.rx_buf[base + payload..base + chunk]) {
                Ok(footer) => footer,
                Err(_) => {
                    debug!("tc6: footer parity error in chunk {}", i);
                    Tc6Stats::bump(&mut self.stats.footer_parity_errors);
                    self.credit.invalidate();
                    if self.rx_framer.abort() {
                        Tc6Stats::bump(&mut self.stats.rx_aborted);
                    }
                    self.refresh_pending = true;
                    continue;
                }
            };

            if footer.header_bad {
                Tc6Stats::bump(&mut self.stats.header_bad);
                return Err(self.fault(LinkError::HeaderBad.into()));
            }
            if !footer.sync {
                return Err(self.fault(LinkError::ConfigUnsync.into()));
            }
            self.credit.observe(&footer);
            if footer.extended_status {
                self.status_pending = true;
            }
            self.rx_framer.feed(
                &footer,
                &self.rx_buf[base..base + payload],
                &mut self.rx_queue,
                &mut self.stats,
            );
        }

        if let Err(e) = self.credit.check_stall(!self.tx_queue.is_empty(), credit_poll) {
            return Err(self.fault(e.into()));
        }
        Ok(Activity::Exchanged)
    }

    /// Read and acknowledge STATUS0 after a footer reported EXST.
    fn service_status(&mut self) -> Result<()> {
        let raw = self.read_reg(Mms::STANDARD, reg::STATUS0)?;
        let status = ExtendedStatus::from_raw(raw);
        debug!("tc6: STATUS0 {:#x}", raw);
        if status.any() {
            self.write_reg(Mms::STANDARD, reg::STATUS0, status.to_raw())?;
        }

        if status.rx_overflow {
            warn!("tc6: receive buffer overflow");
            Tc6Stats::bump(&mut self.stats.rx_overflows);
            if self.rx_framer.abort() {
                Tc6Stats::bump(&mut self.stats.rx_aborted);
            }
        }
        if let Some(err) = status.fatal_error() {
            return Err(self.fault(err.into()));
        }
        if status.reset_complete {
            // The MAC-PHY reset itself and lost its configuration
            return Err(self.fault(LinkError::ConfigUnsync.into()));
        }
        Ok(())
    }

    fn exchange(&mut self, len: usize) -> Result<()> {
        self.spi
            .transfer(&mut self.rx_buf[..len], &self.tx_buf[..len])
            .map_err(|e| Error::spi(&e))
    }

    /// Enter `Faulted` after a device-fatal error and hand the error back.
    fn fault(&mut self, error: Error) -> Error {
        if error.is_device_fatal() && self.state != State::Uninitialized {
            warn!("tc6: faulted: {}", error);
            self.state = State::Faulted;
            self.control.abandon();
            if self.rx_framer.abort() {
                Tc6Stats::bump(&mut self.stats.rx_aborted);
            }
        }
        error
    }

    fn ensure_running(&self) -> Result<()> {
        match self.state {
            State::Idle | State::Exchanging => Ok(()),
            State::Draining | State::Stopped => Err(IoError::Shutdown.into()),
            State::Uninitialized | State::Faulted => Err(IoError::InvalidState.into()),
        }
    }

    // =========================================================================
    // Timestamping
    // =========================================================================

    /// Enable receive frame timestamps
    ///
    /// Frames matched by the MAC-PHY's pattern filters then arrive with a
    /// timestamp, see [`FrameBuf::timestamp`].
    ///
    /// # Errors
    /// - `Unsupported` - STDCAP does not advertise frame timestamps
    pub fn enable_timestamping(&mut self) -> Result<()> {
        self.ensure_running()?;
        if !self.caps.frame_timestamps {
            return Err(ConfigError::Unsupported.into());
        }
        let set = config0::FTSE | self.config.timestamp_format.config0_bits();
        self.modify_reg(reg::CONFIG0, config0::FTSS, set)?;
        self.rx_framer
            .set_timestamp_len(self.config.timestamp_format.bytes());
        self.timestamping = true;
        info!("tc6: timestamping enabled");
        Ok(())
    }

    /// Disable receive frame timestamps
    pub fn disable_timestamping(&mut self) -> Result<()> {
        self.ensure_running()?;
        self.modify_reg(reg::CONFIG0, config0::FTSE | config0::FTSS, 0)?;
        self.timestamping = false;
        info!("tc6: timestamping disabled");
        Ok(())
    }

    fn modify_reg(&mut self, addr: u16, clear: u32, set: u32) -> Result<()> {
        let value = (self.read_reg(Mms::STANDARD, addr)? & !clear) | set;
        self.write_reg(Mms::STANDARD, addr, value)
    }

    // =========================================================================
    // Resync and Shutdown
    // =========================================================================

    /// Recover from a fault or a lost configuration
    ///
    /// Drops the partially received frame and any control transaction,
    /// restarts the partly sent transmit frame from its first byte, and
    /// runs the initialization sequence again. Queued frames are kept.
    ///
    /// # Errors
    /// - `InvalidState` - engine never initialized, or shut down
    /// - Initialization errors; the engine stays `Faulted`
    pub fn resync<D: DelayNs>(&mut self, delay: &mut D) -> Result<()> {
        match self.state {
            State::Idle | State::Exchanging | State::Faulted => {}
            State::Draining | State::Stopped => return Err(IoError::Shutdown.into()),
            State::Uninitialized => return Err(IoError::InvalidState.into()),
        }
        info!("tc6: resynchronizing");

        self.control.abandon();
        if self.rx_framer.abort() {
            Tc6Stats::bump(&mut self.stats.rx_aborted);
        }
        self.tx_framer.rewind();
        self.credit.reset();

        match self.bring_up(delay) {
            Ok(()) => {
                self.state = State::Idle;
                Ok(())
            }
            Err(e) => {
                self.state = State::Faulted;
                Err(e)
            }
        }
    }

    /// Stop the engine and release the SPI device.
    ///
    /// Any control transaction in the slot is abandoned, the partial receive
    /// frame is dropped, and queued transmit frames come back undelivered.
    pub fn shutdown(mut self) -> Shutdown<SPI, TXQ, RXQ> {
        self.state = State::Draining;
        if self.control.abandon() {
            debug!("tc6: control transaction abandoned by shutdown");
        }
        self.rx_framer.abort();
        self.tx_framer.rewind();
        self.state = State::Stopped;
        info!("tc6: shut down, {} frames undelivered", self.tx_queue.len());

        Shutdown {
            spi: self.spi,
            undelivered: self.tx_queue,
            received: self.rx_queue,
        }
    }
}

impl<SPI, const TXQ: usize, const RXQ: usize> RegisterAccess for Tc6<SPI, TXQ, RXQ>
where
    SPI: SpiDevice,
{
    fn read_register(&mut self, mms: Mms, addr: u16) -> Result<u32> {
        Tc6::read_register(self, mms, addr)
    }

    fn write_register(&mut self, mms: Mms, addr: u16, value: u32) -> Result<()> {
        Tc6::write_register(self, mms, addr, value)
    }

    fn read_registers(&mut self, mms: Mms, addr: u16, values: &mut [u32]) -> Result<()> {
        Tc6::read_registers(self, mms, addr, values)
    }

    fn write_registers(&mut self, mms: Mms, addr: u16, values: &[u32]) -> Result<()> {
        Tc6::write_registers(self, mms, addr, values)
    }
}

impl<SPI, const TXQ: usize, const RXQ: usize> core::fmt::Debug for Tc6<SPI, TXQ, RXQ> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tc6")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("credit", &self.credit)
            .field("tx_queue", &self.tx_queue)
            .field("rx_queue", &self.rx_queue)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::*;
    use crate::driver::config::{ChunkPayload, TimestampFormat};
    use crate::internal::tc6_regs::stdcap;
    use crate::testing::{Fault, MockDelay, MockMacPhy};
    use embedded_hal::spi::ErrorKind;

    fn started<const TXQ: usize, const RXQ: usize>(
        config: Tc6Config,
    ) -> (MockMacPhy, Tc6<MockMacPhy, TXQ, RXQ>) {
        let phy = MockMacPhy::new();
        let mut tc6 = Tc6::new(phy.clone());
        tc6.init(config, &mut MockDelay::new()).unwrap();
        (phy, tc6)
    }

    fn start() -> (MockMacPhy, Tc6<MockMacPhy>) {
        started(Tc6Config::new())
    }

    /// Poll until the engine reports nothing left to do.
    fn settle<const TXQ: usize, const RXQ: usize>(tc6: &mut Tc6<MockMacPhy, TXQ, RXQ>) {
        for _ in 0..200 {
            if tc6.poll().unwrap() == Activity::Idle {
                return;
            }
        }
        panic!("transfer loop did not settle");
    }

    fn frame(len: usize, seed: u8) -> Vec<u8> {
        (0..len)
            .map(|i| (i as u8).wrapping_mul(7).wrapping_add(seed))
            .collect()
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    #[test]
    fn init_programs_device() {
        let phy = MockMacPhy::new();
        let mut delay = MockDelay::new();
        let mut tc6: Tc6<MockMacPhy> = Tc6::new(phy.clone());
        assert_eq!(tc6.state(), State::Uninitialized);

        tc6.init(Tc6Config::new(), &mut delay).unwrap();
        assert_eq!(tc6.state(), State::Idle);
        assert_eq!(phy.resets(), 1);
        assert_eq!(delay.total_ms(), 1);

        let config0 = phy.register(Mms::STANDARD, reg::CONFIG0);
        assert_eq!(config0 & config0::CPS_MASK, 6);
        assert_ne!(config0 & config0::SYNC, 0);
        assert_eq!(config0 & config0::RFA_MASK, config0::RFA_ZARFE);
        assert_eq!(config0 & config0::FTSE, 0);

        let mask = phy.register(Mms::STANDARD, reg::INT_MASK0);
        assert_eq!(mask & status0::UNMASKED_ERRORS, 0);
        assert_eq!(phy.status0() & status0::RESETC, 0);

        assert_eq!(tc6.tx_credits(), 16);
        assert!(tc6.capabilities().frame_timestamps);
        assert_eq!(tc6.capabilities().min_chunk_payload, Some(ChunkPayload::Bytes8));
    }

    #[test]
    fn init_twice_is_rejected() {
        let (_phy, mut tc6) = start();
        assert_eq!(
            tc6.init(Tc6Config::new(), &mut MockDelay::new()),
            Err(Error::Config(ConfigError::AlreadyInitialized))
        );
    }

    #[test]
    fn init_rejects_invalid_config() {
        let mut tc6: Tc6<MockMacPhy> = Tc6::new(MockMacPhy::new());
        let config = Tc6Config::new().with_chunks_per_transfer(0);
        assert_eq!(
            tc6.init(config, &mut MockDelay::new()),
            Err(Error::Config(ConfigError::InvalidConfig))
        );
        assert_eq!(tc6.state(), State::Uninitialized);
    }

    #[test]
    fn init_reset_timeout() {
        let phy = MockMacPhy::new();
        phy.set_reset_polls(u32::MAX);
        let mut delay = MockDelay::new();
        let mut tc6: Tc6<MockMacPhy> = Tc6::new(phy);
        let config = Tc6Config::new().with_reset_timeout_ms(5);
        assert_eq!(
            tc6.init(config, &mut delay),
            Err(Error::Config(ConfigError::ResetFailed))
        );
        assert_eq!(delay.total_ms(), 5);
        assert_eq!(tc6.state(), State::Uninitialized);
    }

    #[test]
    fn init_rejects_chunk_below_device_minimum() {
        let phy = MockMacPhy::new();
        phy.set_stdcap(stdcap::FTSC | 0x5);
        let mut tc6: Tc6<MockMacPhy> = Tc6::new(phy);
        let config = Tc6Config::new().with_chunk_payload(ChunkPayload::Bytes16);
        assert_eq!(
            tc6.init(config, &mut MockDelay::new()),
            Err(Error::Config(ConfigError::Unsupported))
        );
    }

    #[test]
    fn operations_require_init() {
        let mut tc6: Tc6<MockMacPhy> = Tc6::new(MockMacPhy::new());
        assert_eq!(tc6.transmit(&[1; 60]), Err(Error::Io(IoError::InvalidState)));
        assert_eq!(tc6.poll(), Err(Error::Io(IoError::InvalidState)));
        assert_eq!(
            tc6.read_register(Mms::STANDARD, reg::IDVER),
            Err(Error::Io(IoError::InvalidState))
        );
    }

    // =========================================================================
    // Polling and Credit
    // =========================================================================

    #[test]
    fn zero_credit_polls_once_then_idles() {
        let phy = MockMacPhy::new();
        phy.set_credits(0, false);
        let mut tc6: Tc6<MockMacPhy> = Tc6::new(phy.clone());
        tc6.init(Tc6Config::new(), &mut MockDelay::new()).unwrap();
        let before = phy.transfers().len();

        assert_eq!(tc6.poll(), Ok(Activity::Exchanged));
        assert_eq!(tc6.poll(), Ok(Activity::Idle));
        assert_eq!(tc6.poll(), Ok(Activity::Idle));

        let transfers = phy.transfers();
        assert_eq!(transfers.len(), before + 1);
        assert_eq!(transfers.last(), Some(&68));
        assert_eq!(tc6.stats().credit_polls, 1);
    }

    #[test]
    fn interrupt_schedules_one_exchange() {
        let (phy, mut tc6) = start();
        settle(&mut tc6);
        assert!(!tc6.has_work());

        tc6.signal_interrupt();
        assert!(tc6.has_work());
        assert_eq!(tc6.poll(), Ok(Activity::Exchanged));
        assert_eq!(tc6.poll(), Ok(Activity::Idle));
        assert!(phy.data_headers().iter().all(|h| !h.data_valid));
    }

    #[test]
    fn zero_credit_transmit_waits_for_interrupt() {
        let phy = MockMacPhy::new();
        phy.set_credits(0, false);
        let mut tc6: Tc6<MockMacPhy> = Tc6::new(phy.clone());
        tc6.init(Tc6Config::new(), &mut MockDelay::new()).unwrap();
        settle(&mut tc6);
        let before = phy.transfers().len();

        let data = frame(60, 4);
        tc6.transmit(&data).unwrap();
        assert!(tc6.has_work());
        assert_eq!(tc6.poll(), Ok(Activity::Exchanged));
        for _ in 0..100 {
            assert!(!tc6.has_work());
            assert_eq!(tc6.poll(), Ok(Activity::Idle));
        }
        assert_eq!(phy.transfers().len(), before + 1);
        assert_eq!(tc6.state(), State::Idle);
        assert_eq!(tc6.tx_pending(), 1);

        // Credit arrives with the next IRQn
        phy.set_credits(4, false);
        tc6.signal_interrupt();
        settle(&mut tc6);
        assert_eq!(phy.transmitted(), [data]);
        assert_eq!(phy.credit_violations(), 0);
    }

    #[test]
    fn credit_limits_chunks_and_stall_faults() {
        let phy = MockMacPhy::new();
        phy.set_credits(2, false);
        let mut tc6: Tc6<MockMacPhy> = Tc6::new(phy.clone());
        let config = Tc6Config::new().with_credit_poll_limit(3);
        tc6.init(config, &mut MockDelay::new()).unwrap();

        tc6.transmit(&frame(1514, 1)).unwrap();
        settle(&mut tc6);
        let sent = phy.data_headers().iter().filter(|h| h.data_valid).count();
        assert_eq!(sent, 2);
        assert_eq!(tc6.poll(), Ok(Activity::Idle));

        // Each IRQn buys one credit poll; the streak only grows on those
        let mut wakes = 0;
        let mut result = Ok(Activity::Idle);
        for _ in 0..10 {
            tc6.signal_interrupt();
            wakes += 1;
            result = tc6.poll();
            if result.is_err() {
                break;
            }
            assert_eq!(result, Ok(Activity::Exchanged));
            assert_eq!(tc6.poll(), Ok(Activity::Idle));
        }

        assert_eq!(result, Err(Error::Link(LinkError::LinkStalled)));
        assert_eq!(wakes, 4);
        assert_eq!(tc6.state(), State::Faulted);
        assert_eq!(phy.credit_violations(), 0);
        let sent = phy.data_headers().iter().filter(|h| h.data_valid).count();
        assert_eq!(sent, 2);
        assert_eq!(tc6.transmit(&[0; 60]), Err(Error::Io(IoError::InvalidState)));
    }

    // =========================================================================
    // Transmit
    // =========================================================================

    #[test]
    fn transmit_single_frame() {
        let (phy, mut tc6) = start();
        let data = frame(60, 3);
        tc6.transmit(&data).unwrap();
        settle(&mut tc6);

        assert_eq!(phy.transmitted(), [data]);
        assert_eq!(tc6.stats().tx_frames, 1);
        assert_eq!(tc6.stats().tx_bytes, 60);
        assert_eq!(tc6.tx_pending(), 0);
    }

    #[test]
    fn transmit_frames_across_transfers() {
        let config = Tc6Config::new()
            .with_chunk_payload(ChunkPayload::Bytes32)
            .with_chunks_per_transfer(4);
        let (phy, mut tc6) = started::<4, 4>(config);
        let frames = [frame(1514, 1), frame(64, 2), frame(97, 3), frame(1522, 4)];
        for f in &frames {
            tc6.transmit(f).unwrap();
        }
        assert!(!tc6.can_transmit());
        assert_eq!(tc6.transmit(&[0; 60]), Err(Error::Io(IoError::Busy)));

        settle(&mut tc6);

        assert_eq!(phy.transmitted(), frames);
        assert_eq!(phy.tx_aborted(), 0);
        assert!(phy.transfers().iter().all(|&len| len <= 4 * 36));
        assert_eq!(tc6.stats().tx_frames, 4);
    }

    #[test]
    fn transmit_rejects_bad_lengths() {
        let (_phy, mut tc6) = start();
        assert_eq!(tc6.transmit(&[]), Err(Error::Io(IoError::InvalidLength)));
        assert_eq!(
            tc6.transmit(&[0; 1523]),
            Err(Error::Io(IoError::FrameTooLarge))
        );
    }

    // =========================================================================
    // Receive
    // =========================================================================

    #[test]
    fn receive_reassembles_frame() {
        let (phy, mut tc6) = start();
        settle(&mut tc6);

        let data = frame(1514, 9);
        phy.queue_rx_frame(&data);
        tc6.signal_interrupt();
        settle(&mut tc6);

        assert_eq!(tc6.peek_rx_length(), Some(1514));
        let mut buf = [0u8; 1522];
        assert_eq!(tc6.receive(&mut buf), Ok(Some(1514)));
        assert_eq!(&buf[..1514], data.as_slice());
        assert_eq!(tc6.receive(&mut buf), Ok(None));
        assert_eq!(tc6.stats().rx_frames, 1);
    }

    #[test]
    fn receive_and_transmit_share_transfers() {
        let (phy, mut tc6) = start();
        settle(&mut tc6);

        let incoming = frame(300, 5);
        let outgoing = frame(200, 6);
        phy.queue_rx_frame(&incoming);
        tc6.signal_interrupt();
        tc6.transmit(&outgoing).unwrap();
        settle(&mut tc6);

        assert_eq!(phy.transmitted(), [outgoing]);
        assert_eq!(tc6.receive_frame().unwrap().as_slice(), incoming.as_slice());
    }

    #[test]
    fn backpressure_holds_frames_in_device() {
        let (phy, mut tc6) = started::<4, 1>(Tc6Config::new());
        settle(&mut tc6);

        phy.queue_rx_frame(&frame(60, 1));
        phy.queue_rx_frame(&frame(60, 2));
        tc6.signal_interrupt();
        settle(&mut tc6);

        assert_eq!(tc6.rx_pending(), 1);
        assert_eq!(phy.rx_chunks_pending(), 1);
        assert!(phy.data_headers().last().unwrap().no_rx || tc6.remote_rx_chunks() > 0);
        assert_eq!(tc6.stats().rx_queue_full, 0);

        assert_eq!(tc6.receive_frame().unwrap().as_slice(), frame(60, 1).as_slice());
        settle(&mut tc6);
        assert_eq!(tc6.receive_frame().unwrap().as_slice(), frame(60, 2).as_slice());
        assert_eq!(phy.rx_chunks_pending(), 0);
    }

    #[test]
    fn dropped_frame_is_counted_not_delivered() {
        let (phy, mut tc6) = start();
        settle(&mut tc6);

        phy.queue_rx_dropped_frame(&frame(200, 1));
        phy.queue_rx_frame(&frame(70, 2));
        tc6.signal_interrupt();
        settle(&mut tc6);

        assert_eq!(tc6.stats().rx_dropped, 1);
        let mut lens = Vec::new();
        assert_eq!(tc6.drain_received(|f| lens.push(f.len())), 1);
        assert_eq!(lens, [70]);
    }

    #[test]
    fn receive_timestamp_attached() {
        let (phy, mut tc6) = start();
        settle(&mut tc6);
        tc6.enable_timestamping().unwrap();
        assert!(tc6.timestamping_enabled());

        let config0 = phy.register(Mms::STANDARD, reg::CONFIG0);
        assert_ne!(config0 & config0::FTSE, 0);
        assert_ne!(config0 & config0::FTSS, 0);
        assert_ne!(config0 & config0::SYNC, 0);

        let ts = [0, 0, 0, 1, 0x12, 0x34, 0x56, 0x78];
        let data = frame(100, 4);
        phy.queue_rx_frame_with_timestamp(&data, &ts);
        tc6.signal_interrupt();
        settle(&mut tc6);

        let received = tc6.receive_frame().unwrap();
        assert_eq!(received.as_slice(), data.as_slice());
        assert_eq!(received.timestamp(), Some(0x0000_0001_1234_5678));

        tc6.disable_timestamping().unwrap();
        let config0 = phy.register(Mms::STANDARD, reg::CONFIG0);
        assert_eq!(config0 & (config0::FTSE | config0::FTSS), 0);
    }

    #[test]
    fn timestamping_needs_capability() {
        let phy = MockMacPhy::new();
        phy.set_stdcap(0x3);
        let mut tc6: Tc6<MockMacPhy> = Tc6::new(phy);
        let config = Tc6Config::new().with_timestamp_format(TimestampFormat::Bits32);
        tc6.init(config, &mut MockDelay::new()).unwrap();
        assert_eq!(
            tc6.enable_timestamping(),
            Err(Error::Config(ConfigError::Unsupported))
        );
    }

    // =========================================================================
    // Register Access
    // =========================================================================

    #[test]
    fn register_read_write() {
        let (phy, mut tc6) = start();
        assert_eq!(tc6.read_register(Mms::STANDARD, reg::IDVER), Ok(0x11));
        tc6.write_register(Mms::MAC, 0x0022, 0xDDCC_BBAA).unwrap();
        assert_eq!(phy.register(Mms::MAC, 0x0022), 0xDDCC_BBAA);
    }

    #[test]
    fn batch_access_splits_long_ranges() {
        let (phy, mut tc6) = start();
        phy.set_register(Mms::PHY_VENDOR, 129, 7);
        phy.clear_writes();

        let mut values = [0u32; 130];
        tc6.read_registers(Mms::PHY_VENDOR, 0, &mut values).unwrap();
        assert_eq!(values[129], 7);

        tc6.write_registers(Mms::MAC, 0x0020, &[1, 2]).unwrap();
        assert_eq!(phy.writes(), [(1, 0x0020, 1), (1, 0x0021, 2)]);

        assert_eq!(
            tc6.read_registers(Mms::MAC, 0, &mut []),
            Err(Error::Control(ControlError::InvalidLength))
        );
    }

    #[test]
    fn corrupt_echo_is_retried() {
        let (phy, mut tc6) = start();
        let retries = tc6.stats().control_retries;
        phy.inject(Fault::CorruptEcho);
        assert_eq!(tc6.read_register(Mms::STANDARD, reg::IDVER), Ok(0x11));
        assert_eq!(tc6.stats().control_retries, retries + 1);
    }

    #[test]
    fn silent_device_is_unreachable() {
        let (phy, mut tc6) = start();
        for _ in 0..3 {
            phy.inject(Fault::SilentReply);
        }
        assert_eq!(
            tc6.read_register(Mms::STANDARD, reg::IDVER),
            Err(Error::Control(ControlError::DeviceUnreachable))
        );
        // Transaction-fatal only
        assert_eq!(tc6.state(), State::Idle);
        assert_eq!(tc6.read_register(Mms::STANDARD, reg::IDVER), Ok(0x11));
    }

    #[test]
    fn mismatched_echo_fails_at_once() {
        let (phy, mut tc6) = start();
        phy.inject(Fault::WrongEcho);
        let retries = tc6.stats().control_retries;
        assert_eq!(
            tc6.read_register(Mms::STANDARD, reg::IDVER),
            Err(Error::Control(ControlError::ReplyMismatch))
        );
        assert_eq!(tc6.stats().control_retries, retries);
    }

    #[test]
    fn queued_control_runs_before_data() {
        let (phy, mut tc6) = start();
        settle(&mut tc6);
        tc6.transmit(&frame(60, 1)).unwrap();
        tc6.submit_control(ControlRequest::read(Mms::STANDARD, reg::IDVER, 1).unwrap())
            .unwrap();

        let before = phy.data_headers().len();
        assert_eq!(tc6.poll(), Ok(Activity::Exchanged));
        assert_eq!(phy.data_headers().len(), before);
        assert_eq!(tc6.take_control_result().unwrap().unwrap().first(), 0x11);

        settle(&mut tc6);
        assert_eq!(phy.transmitted().len(), 1);
    }

    // =========================================================================
    // Faults and Recovery
    // =========================================================================

    #[test]
    fn footer_parity_refreshes_credit() {
        let (phy, mut tc6) = start();
        settle(&mut tc6);

        phy.inject(Fault::FooterParity);
        tc6.signal_interrupt();
        assert_eq!(tc6.poll(), Ok(Activity::Exchanged));
        assert_eq!(tc6.stats().footer_parity_errors, 1);
        assert_eq!(tc6.tx_credits(), 0);

        assert_eq!(tc6.poll(), Ok(Activity::Exchanged));
        assert_eq!(tc6.tx_credits(), 16);
        assert_eq!(tc6.state(), State::Idle);
    }

    #[test]
    fn header_bad_footer_faults() {
        let (phy, mut tc6) = start();
        phy.inject(Fault::FooterHeaderBad);
        assert_eq!(tc6.poll(), Err(Error::Link(LinkError::HeaderBad)));
        assert_eq!(tc6.state(), State::Faulted);
        assert_eq!(tc6.stats().header_bad, 1);
        assert_eq!(tc6.poll(), Err(Error::Io(IoError::InvalidState)));
    }

    #[test]
    fn spi_failure_faults() {
        let (phy, mut tc6) = start();
        phy.inject(Fault::Bus);
        assert_eq!(tc6.poll(), Err(Error::Spi(ErrorKind::Other)));
        assert_eq!(tc6.state(), State::Faulted);
    }

    #[test]
    fn unsync_resync_keeps_queued_frame() {
        let config = Tc6Config::new().with_chunks_per_transfer(1);
        let (phy, mut tc6) = started::<4, 4>(config);
        settle(&mut tc6);

        let data = frame(200, 8);
        tc6.transmit(&data).unwrap();
        phy.inject(Fault::FooterUnsync);
        assert_eq!(tc6.poll(), Err(Error::Link(LinkError::ConfigUnsync)));
        assert_eq!(tc6.state(), State::Faulted);
        assert_eq!(tc6.tx_pending(), 1);

        tc6.resync(&mut MockDelay::new()).unwrap();
        assert_eq!(tc6.state(), State::Idle);
        assert_eq!(phy.resets(), 2);

        settle(&mut tc6);
        assert_eq!(phy.transmitted(), [data]);
    }

    #[test]
    fn rx_overflow_status_is_cleared() {
        let (phy, mut tc6) = start();
        settle(&mut tc6);

        phy.raise_status(status0::RXBOE);
        tc6.signal_interrupt();
        settle(&mut tc6);

        assert_eq!(tc6.stats().rx_overflows, 1);
        assert_eq!(phy.status0(), 0);
        assert_eq!(tc6.state(), State::Idle);
    }

    #[test]
    fn loss_of_frame_status_faults() {
        let (phy, mut tc6) = start();
        settle(&mut tc6);

        phy.raise_status(status0::LOFE);
        tc6.signal_interrupt();
        assert_eq!(tc6.poll(), Ok(Activity::Exchanged));
        assert_eq!(tc6.poll(), Err(Error::Link(LinkError::LossOfFrame)));
        assert_eq!(tc6.state(), State::Faulted);
    }

    #[test]
    fn shutdown_returns_undelivered_frames() {
        let (phy, mut tc6) = start();
        tc6.transmit(&frame(60, 1)).unwrap();
        tc6.transmit(&frame(61, 2)).unwrap();

        let parts = tc6.shutdown();
        assert_eq!(parts.undelivered.len(), 2);
        assert!(parts.received.is_empty());
        assert!(phy.transmitted().is_empty());
    }
}
