//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for testing the TC6 engine and
//! the register-level helpers on the host without hardware access.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Wake, Waker};
use std::vec::Vec;

use embedded_hal::spi::{ErrorKind, ErrorType, Operation, SpiDevice};

use crate::codec::{ControlHeader, DataFooter, DataHeader, Mms, with_parity};
use crate::driver::error::{ControlError, Error, Result};
use crate::hal::registers::RegisterAccess;
use crate::internal::constants::{MAX_CHUNK_PAYLOAD, WORD_SIZE};
use crate::internal::tc6_regs::{config0, ctrl, data_hdr, reg, reset, stdcap, status0};

// =============================================================================
// Mock SPI Error
// =============================================================================

/// Error returned by [`MockMacPhy`] when a bus failure is injected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSpiError;

impl embedded_hal::spi::Error for MockSpiError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

// =============================================================================
// Fault Injection
// =============================================================================

/// One-shot fault applied to the next matching exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Control reply left all zeros
    SilentReply,
    /// Echoed control header has a flipped bit
    CorruptEcho,
    /// Echoed control header carries HDRB
    HeaderBadReply,
    /// Echoed control header names another address
    WrongEcho,
    /// First data footer has a flipped bit
    FooterParity,
    /// First data footer carries HDRB
    FooterHeaderBad,
    /// Data footers report SYNC = 0
    FooterUnsync,
    /// The SPI transfer itself fails
    Bus,
}

impl Fault {
    fn is_control(self) -> bool {
        matches!(
            self,
            Fault::SilentReply | Fault::CorruptEcho | Fault::HeaderBadReply | Fault::WrongEcho
        )
    }

    fn is_data(self) -> bool {
        matches!(
            self,
            Fault::FooterParity | Fault::FooterHeaderBad | Fault::FooterUnsync
        )
    }
}

// =============================================================================
// Mock MAC-PHY
// =============================================================================

/// A scripted receive chunk: payload plus the footer fields that go with it
#[derive(Debug, Clone)]
pub struct RxChunk {
    pub payload: Vec<u8>,
    pub footer: DataFooter,
}

#[derive(Debug)]
struct MockState {
    regs: HashMap<(u8, u16), u32>,
    write_log: Vec<(u8, u16, u32)>,
    status0: u32,
    reset_polls: u32,
    reset_countdown: u32,
    resets: u32,
    stdcap: u32,
    sync: bool,
    payload: usize,

    tx_credits: u8,
    auto_refill: bool,
    credit_violations: u32,
    tx_current: Vec<u8>,
    tx_in_frame: bool,
    tx_frames: Vec<Vec<u8>>,
    tx_aborted: u32,
    headers: Vec<DataHeader>,

    rx_chunks: VecDeque<RxChunk>,
    faults: VecDeque<Fault>,
    transfers: Vec<usize>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            regs: HashMap::new(),
            write_log: Vec::new(),
            status0: 0,
            reset_polls: 2,
            reset_countdown: 0,
            resets: 0,
            stdcap: stdcap::DPRAC | stdcap::FTSC | stdcap::AIDC | 0x3,
            sync: false,
            payload: MAX_CHUNK_PAYLOAD,
            tx_credits: 16,
            auto_refill: true,
            credit_violations: 0,
            tx_current: Vec::new(),
            tx_in_frame: false,
            tx_frames: Vec::new(),
            tx_aborted: 0,
            headers: Vec::new(),
            rx_chunks: VecDeque::new(),
            faults: VecDeque::new(),
            transfers: Vec::new(),
        }
    }
}

/// Simulated TC6 MAC-PHY behind an `SpiDevice`
///
/// Handles are cheap clones sharing one device, so a test can hand one to
/// the engine and keep another for scripting and inspection.
///
/// The simulation covers what the engine relies on: control transactions
/// against a register map (with SWRESET, RESETC, W1C STATUS0, CONFIG0 and
/// BUFSTS behavior), transmit chunk reassembly with credit accounting, and
/// scripted receive chunks with computed footers.
///
/// # Example
///
/// ```ignore
/// let phy = MockMacPhy::new();
/// let mut tc6: Tc6<_> = Tc6::new(phy.clone());
/// tc6.init(Tc6Config::new(), &mut MockDelay::new()).unwrap();
///
/// phy.queue_rx_frame(&[0xAA; 60]);
/// tc6.poll().unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockMacPhy {
    state: Arc<Mutex<MockState>>,
}

impl MockMacPhy {
    /// Create a new mock MAC-PHY
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Set a register value
    pub fn set_register(&self, mms: Mms, addr: u16, value: u32) {
        self.lock().regs.insert((mms.value(), addr), value);
    }

    /// Get the current value of a register
    pub fn register(&self, mms: Mms, addr: u16) -> u32 {
        self.lock().read_plain(mms.value(), addr)
    }

    /// STDCAP value reported after reset
    pub fn set_stdcap(&self, value: u32) {
        self.lock().stdcap = value;
    }

    /// STATUS0 reads without RESETC after a software reset
    pub fn set_reset_polls(&self, polls: u32) {
        self.lock().reset_polls = polls;
    }

    /// Raise STATUS0 bits (reported through EXST)
    pub fn raise_status(&self, bits: u32) {
        self.lock().status0 |= bits;
    }

    /// Current STATUS0
    pub fn status0(&self) -> u32 {
        self.lock().status0
    }

    /// Set transmit credits; with `auto_refill` the count never drops
    pub fn set_credits(&self, credits: u8, auto_refill: bool) {
        let mut state = self.lock();
        state.tx_credits = credits;
        state.auto_refill = auto_refill;
    }

    /// Inject a one-shot fault
    pub fn inject(&self, fault: Fault) {
        self.lock().faults.push_back(fault);
    }

    // =========================================================================
    // Receive Scripting
    // =========================================================================

    /// Queue one raw receive chunk
    pub fn queue_rx_chunk(&self, chunk: RxChunk) {
        self.lock().rx_chunks.push_back(chunk);
    }

    /// Queue a frame split into zero-aligned chunks of the configured size
    pub fn queue_rx_frame(&self, frame: &[u8]) {
        self.queue_rx_data(frame, None);
    }

    /// Queue a frame preceded by a receive timestamp
    pub fn queue_rx_frame_with_timestamp(&self, frame: &[u8], timestamp: &[u8]) {
        let mut data = timestamp.to_vec();
        data.extend_from_slice(frame);
        let ones: u32 = timestamp.iter().map(|b| b.count_ones()).sum();
        self.queue_rx_data(&data, Some(ones % 2 == 0));
    }

    /// Queue a frame the MAC-PHY then drops (FD on its last chunk)
    pub fn queue_rx_dropped_frame(&self, frame: &[u8]) {
        self.queue_rx_frame(frame);
        let mut state = self.lock();
        if let Some(last) = state.rx_chunks.back_mut() {
            last.footer.frame_drop = true;
        }
    }

    fn queue_rx_data(&self, data: &[u8], timestamp_parity: Option<bool>) {
        let mut state = self.lock();
        let width = state.payload;
        let count = data.len().div_ceil(width);
        for (i, piece) in data.chunks(width).enumerate() {
            let last = i + 1 == count;
            let footer = DataFooter {
                data_valid: true,
                start_valid: i == 0,
                end_valid: last,
                end_byte_offset: if last { (piece.len() - 1) as u8 } else { 0 },
                rx_timestamp_added: i == 0 && timestamp_parity.is_some(),
                rx_timestamp_parity: i == 0 && timestamp_parity == Some(true),
                ..DataFooter::default()
            };
            state.rx_chunks.push_back(RxChunk {
                payload: piece.to_vec(),
                footer,
            });
        }
    }

    /// Receive chunks not yet exchanged
    pub fn rx_chunks_pending(&self) -> usize {
        self.lock().rx_chunks.len()
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// All register writes: (mms, addr, value)
    pub fn writes(&self) -> Vec<(u8, u16, u32)> {
        self.lock().write_log.clone()
    }

    /// Clear the write log
    pub fn clear_writes(&self) {
        self.lock().write_log.clear();
    }

    /// Frames reassembled from transmit chunks
    pub fn transmitted(&self) -> Vec<Vec<u8>> {
        self.lock().tx_frames.clone()
    }

    /// Every data header received
    pub fn data_headers(&self) -> Vec<DataHeader> {
        self.lock().headers.clone()
    }

    /// Length of every SPI transfer so far
    pub fn transfers(&self) -> Vec<usize> {
        self.lock().transfers.clone()
    }

    /// Software resets performed
    pub fn resets(&self) -> u32 {
        self.lock().resets
    }

    /// Data chunks sent without credit
    pub fn credit_violations(&self) -> u32 {
        self.lock().credit_violations
    }

    /// Transmit frames restarted before their end
    pub fn tx_aborted(&self) -> u32 {
        self.lock().tx_aborted
    }

    /// Configured chunk payload in bytes
    pub fn payload(&self) -> usize {
        self.lock().payload
    }
}

impl MockState {
    fn read_plain(&self, mms: u8, addr: u16) -> u32 {
        self.regs.get(&(mms, addr)).copied().unwrap_or(0)
    }

    fn take_fault(&mut self, pick: fn(Fault) -> bool) -> Option<Fault> {
        let index = self.faults.iter().position(|&f| pick(f))?;
        self.faults.remove(index)
    }

    fn software_reset(&mut self) {
        self.regs.clear();
        self.status0 = 0;
        self.reset_countdown = self.reset_polls;
        self.resets += 1;
        self.sync = false;
        self.payload = MAX_CHUNK_PAYLOAD;
        self.tx_current.clear();
        self.tx_in_frame = false;
        self.regs.insert((0, reg::INT_MASK0), 0x1FFF);
        self.regs.insert((0, reg::CONFIG0), 0x0006);
    }

    fn read_register(&mut self, mms: u8, addr: u16) -> u32 {
        match (mms, addr) {
            (0, reg::IDVER) => 0x11,
            (0, reg::STDCAP) => self.stdcap,
            (0, reg::STATUS0) => {
                if self.reset_countdown > 0 {
                    self.reset_countdown -= 1;
                    if self.reset_countdown == 0 {
                        self.status0 |= status0::RESETC;
                    }
                }
                self.status0
            }
            (0, reg::BUFSTS) => {
                let rca = self.rx_chunks.len().min(31) as u32;
                (u32::from(self.tx_credits) << 8) | rca
            }
            _ => self.read_plain(mms, addr),
        }
    }

    fn write_register(&mut self, mms: u8, addr: u16, value: u32) {
        self.write_log.push((mms, addr, value));
        match (mms, addr) {
            (0, reg::RESET) if value & reset::SWRESET != 0 => self.software_reset(),
            (0, reg::STATUS0) => self.status0 &= !value,
            (0, reg::CONFIG0) => {
                self.regs.insert((mms, addr), value);
                let cps = value & config0::CPS_MASK;
                self.payload = if (3..=6).contains(&cps) {
                    1 << cps
                } else {
                    MAX_CHUNK_PAYLOAD
                };
                self.sync = value & config0::SYNC != 0;
            }
            _ => {
                self.regs.insert((mms, addr), value);
            }
        }
    }

    fn control(&mut self, tx: &[u8], rx: &mut [u8]) {
        let fault = self.take_fault(Fault::is_control);
        if fault == Some(Fault::SilentReply) {
            return;
        }
        let raw = u32::from_be_bytes([tx[0], tx[1], tx[2], tx[3]]);
        let Ok(header) = ControlHeader::decode_bytes(&tx[..WORD_SIZE]) else {
            let echo = with_parity(raw | ctrl::HDRB);
            rx[WORD_SIZE..2 * WORD_SIZE].copy_from_slice(&echo.to_be_bytes());
            return;
        };

        let echo = match fault {
            Some(Fault::HeaderBadReply) => with_parity(raw | ctrl::HDRB),
            Some(Fault::WrongEcho) => with_parity(raw ^ (1 << ctrl::ADDR_SHIFT)),
            _ => raw,
        };
        rx[WORD_SIZE..2 * WORD_SIZE].copy_from_slice(&echo.to_be_bytes());
        if fault == Some(Fault::CorruptEcho) {
            rx[WORD_SIZE + 1] ^= 0x01;
        }
        if fault == Some(Fault::HeaderBadReply) {
            return;
        }

        let mms = header.mms.value();
        for i in 0..header.word_count() {
            let addr = if header.no_increment {
                header.addr
            } else {
                header.addr.wrapping_add(i as u16)
            };
            let slot = (i + 2) * WORD_SIZE;
            let value = if header.write {
                let at = (i + 1) * WORD_SIZE;
                let value = u32::from_be_bytes([tx[at], tx[at + 1], tx[at + 2], tx[at + 3]]);
                self.write_register(mms, addr, value);
                value
            } else {
                self.read_register(mms, addr)
            };
            rx[slot..slot + WORD_SIZE].copy_from_slice(&value.to_be_bytes());
        }
    }

    fn accept_tx(&mut self, header: &DataHeader, payload: &[u8]) {
        if !header.data_valid {
            return;
        }
        if self.tx_credits == 0 {
            self.credit_violations += 1;
            self.status0 |= status0::TXBOE;
        } else if !self.auto_refill {
            self.tx_credits -= 1;
        }

        let end = if header.end_valid {
            usize::from(header.end_byte_offset) + 1
        } else {
            payload.len()
        };
        if header.start_valid {
            if self.tx_in_frame {
                self.tx_aborted += 1;
            }
            self.tx_current.clear();
            self.tx_in_frame = true;
            let start = usize::from(header.start_word_offset) * WORD_SIZE;
            self.tx_current.extend_from_slice(&payload[start..end]);
        } else if self.tx_in_frame {
            self.tx_current.extend_from_slice(&payload[..end]);
        }
        if header.end_valid && self.tx_in_frame {
            self.tx_frames.push(core::mem::take(&mut self.tx_current));
            self.tx_in_frame = false;
        }
    }

    fn data(&mut self, tx: &[u8], rx: &mut [u8]) {
        let width = self.payload;
        let chunk = width + WORD_SIZE;
        let mut first = true;
        for (out, inp) in tx.chunks(chunk).zip(rx.chunks_mut(chunk)) {
            if out.len() < chunk {
                break;
            }
            let mut footer = DataFooter::default();
            match DataHeader::decode_bytes(&out[..WORD_SIZE]) {
                Ok(header) => {
                    self.headers.push(header);
                    self.accept_tx(&header, &out[WORD_SIZE..]);
                    if !header.no_rx
                        && self.sync
                        && let Some(rx_chunk) = self.rx_chunks.pop_front()
                    {
                        inp[..rx_chunk.payload.len()].copy_from_slice(&rx_chunk.payload);
                        footer = rx_chunk.footer;
                    }
                }
                Err(_) => footer.header_bad = true,
            }

            let mask = self.read_plain(0, reg::INT_MASK0);
            footer.sync = self.sync;
            footer.tx_credits = self.tx_credits.min(31);
            footer.rx_chunks_available = self.rx_chunks.len().min(31) as u8;
            footer.extended_status = self.status0 & !mask & 0x1FFF != 0;

            let mut corrupt = false;
            if first {
                match self.take_fault(Fault::is_data) {
                    Some(Fault::FooterParity) => corrupt = true,
                    Some(Fault::FooterHeaderBad) => footer.header_bad = true,
                    Some(Fault::FooterUnsync) => footer.sync = false,
                    _ => {}
                }
                first = false;
            }
            let mut bytes = footer.to_bytes();
            if corrupt {
                bytes[3] ^= 0x02;
            }
            inp[width..].copy_from_slice(&bytes);
        }
    }

    fn exchange(&mut self, tx: &[u8], rx: &mut [u8]) -> core::result::Result<(), MockSpiError> {
        if self.take_fault(|f| f == Fault::Bus).is_some() {
            return Err(MockSpiError);
        }
        self.transfers.push(tx.len());
        rx.fill(0);
        if tx.len() < WORD_SIZE {
            return Ok(());
        }
        let first = u32::from_be_bytes([tx[0], tx[1], tx[2], tx[3]]);
        if first & data_hdr::DNC == 0 {
            self.control(tx, rx);
        } else {
            self.data(tx, rx);
        }
        Ok(())
    }
}

impl ErrorType for MockMacPhy {
    type Error = MockSpiError;
}

impl SpiDevice for MockMacPhy {
    fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> core::result::Result<(), MockSpiError> {
        let mut state = self.lock();
        for op in operations.iter_mut() {
            match op {
                Operation::Transfer(read, write) => {
                    let len = read.len().min(write.len());
                    state.exchange(&write[..len], &mut read[..len])?;
                }
                Operation::TransferInPlace(buf) => {
                    let tx = buf.to_vec();
                    state.exchange(&tx, buf)?;
                }
                Operation::Write(_) | Operation::Read(_) | Operation::DelayNs(_) => {}
            }
        }
        Ok(())
    }
}

// =============================================================================
// Mock Register Map
// =============================================================================

/// Plain register map for testing helpers built on [`RegisterAccess`]
///
/// Reads of unset registers return 0. Individual registers can be made to
/// fail, and scripted read sequences override the stored value.
#[derive(Debug, Default)]
pub struct MockRegisters {
    regs: HashMap<(u8, u16), u32>,
    reads: RefCell<Vec<(u8, u16)>>,
    writes: Vec<(u8, u16, u32)>,
    scripted: HashMap<(u8, u16), VecDeque<u32>>,
    fail_writes: Vec<(u8, u16)>,
}

impl MockRegisters {
    /// Create an empty register map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a register value
    pub fn set(&mut self, mms: Mms, addr: u16, value: u32) {
        self.regs.insert((mms.value(), addr), value);
    }

    /// Current register value
    pub fn get(&self, mms: Mms, addr: u16) -> u32 {
        self.regs.get(&(mms.value(), addr)).copied().unwrap_or(0)
    }

    /// Values returned by the next reads of one register, in order
    pub fn script_reads(&mut self, mms: Mms, addr: u16, values: &[u32]) {
        self.scripted
            .entry((mms.value(), addr))
            .or_default()
            .extend(values.iter().copied());
    }

    /// Make every write to one register fail
    pub fn fail_writes_to(&mut self, mms: Mms, addr: u16) {
        self.fail_writes.push((mms.value(), addr));
    }

    /// All successful writes: (mms, addr, value)
    pub fn writes(&self) -> &[(u8, u16, u32)] {
        &self.writes
    }

    /// All reads: (mms, addr)
    pub fn reads(&self) -> Vec<(u8, u16)> {
        self.reads.borrow().clone()
    }
}

impl RegisterAccess for MockRegisters {
    fn read_register(&mut self, mms: Mms, addr: u16) -> Result<u32> {
        let key = (mms.value(), addr);
        self.reads.borrow_mut().push(key);
        if let Some(value) = self.scripted.get_mut(&key).and_then(VecDeque::pop_front) {
            return Ok(value);
        }
        Ok(self.regs.get(&key).copied().unwrap_or(0))
    }

    fn write_register(&mut self, mms: Mms, addr: u16, value: u32) -> Result<()> {
        let key = (mms.value(), addr);
        if self.fail_writes.contains(&key) {
            return Err(Error::Control(ControlError::DeviceUnreachable));
        }
        self.writes.push((key.0, key.1, value));
        self.regs.insert(key, value);
        Ok(())
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay for testing without actual timing
///
/// Records delays for verification without actually waiting.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Total nanoseconds delayed
    total_ns: RefCell<u64>,
}

impl MockDelay {
    /// Create a new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        *self.total_ns.borrow()
    }

    /// Get total milliseconds that were "delayed"
    pub fn total_ms(&self) -> u64 {
        self.total_ns() / 1_000_000
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.total_ns.borrow_mut() += u64::from(ns);
    }
}

// =============================================================================
// Wake Counter
// =============================================================================

/// Waker that counts how often it was woken
#[derive(Debug, Default)]
pub struct WakeCounter {
    count: AtomicUsize,
}

impl WakeCounter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn waker(self: &Arc<Self>) -> Waker {
        Waker::from(Arc::clone(self))
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Wake for WakeCounter {
    fn wake(self: Arc<Self>) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_hal::delay::DelayNs;

    use super::*;

    fn control_read(phy: &mut MockMacPhy, addr: u16) -> [u8; 12] {
        let mut tx = [0u8; 12];
        tx[..4].copy_from_slice(&ControlHeader::read(Mms::STANDARD, addr, 1).to_bytes());
        let mut rx = [0u8; 12];
        phy.transfer(&mut rx, &tx).unwrap();
        rx
    }

    #[test]
    fn mock_control_read_echoes_header() {
        let mut phy = MockMacPhy::new();
        phy.set_register(Mms::STANDARD, 0x0010, 0x1234_5678);
        let rx = control_read(&mut phy, 0x0010);
        let echo = ControlHeader::decode_bytes(&rx[4..8]).unwrap();
        assert_eq!(echo.addr, 0x0010);
        assert_eq!(&rx[8..12], &0x1234_5678u32.to_be_bytes());
    }

    #[test]
    fn mock_reset_sets_resetc_after_polls() {
        let phy = MockMacPhy::new();
        phy.set_reset_polls(2);
        phy.lock().write_register(0, reg::RESET, reset::SWRESET);
        assert_eq!(phy.lock().read_register(0, reg::STATUS0) & status0::RESETC, 0);
        assert_ne!(phy.lock().read_register(0, reg::STATUS0) & status0::RESETC, 0);
        assert_eq!(phy.resets(), 1);
    }

    #[test]
    fn mock_bus_fault_fails_transfer() {
        let mut phy = MockMacPhy::new();
        phy.inject(Fault::Bus);
        let mut rx = [0u8; 12];
        assert_eq!(phy.transfer(&mut rx, &[0u8; 12]), Err(MockSpiError));
        assert!(phy.transfers().is_empty());
    }

    #[test]
    fn mock_registers_fail_and_script() {
        let mut regs = MockRegisters::new();
        regs.script_reads(Mms::MAC, 1, &[5, 6]);
        regs.set(Mms::MAC, 1, 7);
        assert_eq!(regs.read_register(Mms::MAC, 1), Ok(5));
        assert_eq!(regs.read_register(Mms::MAC, 1), Ok(6));
        assert_eq!(regs.read_register(Mms::MAC, 1), Ok(7));

        regs.fail_writes_to(Mms::MAC, 2);
        assert!(regs.write_register(Mms::MAC, 2, 1).is_err());
        assert!(regs.writes().is_empty());
    }

    #[test]
    fn mock_delay_tracking() {
        let mut delay = MockDelay::new();
        delay.delay_ms(5);
        delay.delay_us(500);
        assert_eq!(delay.total_ms(), 5);
        assert_eq!(delay.total_ns(), 5_500_000);
    }
}
