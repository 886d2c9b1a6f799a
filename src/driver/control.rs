//! Control-transaction engine.
//!
//! Holds the single in-flight register access. Replies carry no
//! transaction ID and are matched by content, so a second request is
//! refused until the first has completed and been collected.
//!
//! The engine does no I/O itself: the transfer loop asks it to
//! [`prepare`](ControlEngine::prepare) the outgoing bytes, performs the
//! exchange, and hands the received bytes to
//! [`complete`](ControlEngine::complete).

use super::error::{ControlError, ControlResult, IoError, IoResult};
use crate::codec::{ControlHeader, DecodeError, Mms, decode_control_reply};
use crate::internal::constants::{MAX_CONTROL_REGS, WORD_SIZE, control_transfer_size};
use crate::internal::log::{debug, warn};

// =============================================================================
// Request and Response
// =============================================================================

/// One register read or write over a contiguous address range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRequest {
    header: ControlHeader,
    values: [u32; MAX_CONTROL_REGS],
}

impl ControlRequest {
    /// Read `count` registers starting at `addr`.
    pub fn read(mms: Mms, addr: u16, count: usize) -> ControlResult<Self> {
        let count = Self::check_range(addr, count)?;
        Ok(Self {
            header: ControlHeader::read(mms, addr, count),
            values: [0; MAX_CONTROL_REGS],
        })
    }

    /// Write `values` to consecutive registers starting at `addr`.
    pub fn write(mms: Mms, addr: u16, values: &[u32]) -> ControlResult<Self> {
        let count = Self::check_range(addr, values.len())?;
        let mut request = Self {
            header: ControlHeader::write(mms, addr, count),
            values: [0; MAX_CONTROL_REGS],
        };
        request.values[..values.len()].copy_from_slice(values);
        Ok(request)
    }

    fn check_range(addr: u16, count: usize) -> ControlResult<u8> {
        if count == 0 || count > MAX_CONTROL_REGS {
            return Err(ControlError::InvalidLength);
        }
        if usize::from(addr) + count - 1 > usize::from(u16::MAX) {
            return Err(ControlError::InvalidAddress);
        }
        u8::try_from(count).map_err(|_| ControlError::InvalidLength)
    }

    /// Header sent for this request
    pub const fn header(&self) -> &ControlHeader {
        &self.header
    }

    /// Values to be written (empty slice contents for a read)
    pub fn values(&self) -> &[u32] {
        &self.values[..self.header.word_count()]
    }

    /// Bytes exchanged in each direction
    pub const fn transfer_len(&self) -> usize {
        control_transfer_size(self.header.word_count())
    }
}

/// Register values returned by a completed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlResponse {
    count: usize,
    values: [u32; MAX_CONTROL_REGS],
}

impl ControlResponse {
    /// Values read (or echoed, for a write)
    pub fn values(&self) -> &[u32] {
        &self.values[..self.count]
    }

    /// First value, the common single-register case
    pub fn first(&self) -> u32 {
        self.values[0]
    }
}

// =============================================================================
// Engine
// =============================================================================

/// What one control exchange achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlProgress {
    /// Transaction finished (successfully or not); collect it
    Finished,
    /// Reply unusable but retriable; exchange again
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Empty,
    Pending { request: ControlRequest, attempts: u8 },
    Done(ControlResult<ControlResponse>),
}

/// Single-slot control transaction engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEngine {
    slot: Slot,
    max_attempts: u8,
}

impl ControlEngine {
    /// Create an engine allowing `max_attempts` exchanges per transaction.
    pub const fn new(max_attempts: u8) -> Self {
        Self {
            slot: Slot::Empty,
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
        }
    }

    /// Accept a request into the slot.
    ///
    /// Returns [`IoError::Busy`] while a previous transaction is pending or
    /// its result has not been collected.
    pub fn submit(&mut self, request: ControlRequest) -> IoResult<()> {
        if !matches!(self.slot, Slot::Empty) {
            return Err(IoError::Busy);
        }
        self.slot = Slot::Pending {
            request,
            attempts: 0,
        };
        Ok(())
    }

    /// Whether a transaction is waiting for an exchange
    pub fn is_pending(&self) -> bool {
        matches!(self.slot, Slot::Pending { .. })
    }

    /// Whether the slot holds nothing at all
    pub fn is_idle(&self) -> bool {
        matches!(self.slot, Slot::Empty)
    }

    /// Fill `tx` with the pending request and return its length.
    ///
    /// Returns `None` when nothing is pending or `tx` is too short.
    pub fn prepare(&self, tx: &mut [u8]) -> Option<usize> {
        let Slot::Pending { request, .. } = &self.slot else {
            return None;
        };
        let len = request.transfer_len();
        let out = tx.get_mut(..len)?;
        out.fill(0);
        out[..WORD_SIZE].copy_from_slice(&request.header.to_bytes());
        if request.header.write {
            for (chunk, value) in out[WORD_SIZE..len - WORD_SIZE]
                .chunks_exact_mut(WORD_SIZE)
                .zip(request.values())
            {
                chunk.copy_from_slice(&value.to_be_bytes());
            }
        }
        Some(len)
    }

    /// Process the bytes received for the pending request.
    ///
    /// Parity failures, on either side, and silent replies are retried up
    /// to the attempt budget. A reply for a different request, or write data
    /// that does not echo, fails at once.
    pub fn complete(&mut self, rx: &[u8]) -> ControlProgress {
        let Slot::Pending { request, attempts } = self.slot else {
            return ControlProgress::Finished;
        };
        let attempts = attempts.saturating_add(1);

        let outcome = Self::check_reply(&request, rx);
        match outcome {
            Err(Retriable::Silent) if attempts < self.max_attempts => {
                debug!("control: no reply to {:#x}, retrying", request.header.addr);
                self.slot = Slot::Pending { request, attempts };
                ControlProgress::Retry
            }
            Err(Retriable::Parity) if attempts < self.max_attempts => {
                debug!("control: parity failure on {:#x}, retrying", request.header.addr);
                self.slot = Slot::Pending { request, attempts };
                ControlProgress::Retry
            }
            Err(Retriable::Silent) => {
                warn!("control: device unreachable");
                self.slot = Slot::Done(Err(ControlError::DeviceUnreachable));
                ControlProgress::Finished
            }
            Err(Retriable::Parity) => {
                warn!("control: parity error persisted after {} attempts", attempts);
                self.slot = Slot::Done(Err(ControlError::ParityError));
                ControlProgress::Finished
            }
            Err(Retriable::Fatal(err)) => {
                warn!("control: {}", err.as_str());
                self.slot = Slot::Done(Err(err));
                ControlProgress::Finished
            }
            Ok(response) => {
                self.slot = Slot::Done(Ok(response));
                ControlProgress::Finished
            }
        }
    }

    /// Collect a finished transaction, emptying the slot.
    pub fn take_completion(&mut self) -> Option<ControlResult<ControlResponse>> {
        match self.slot {
            Slot::Done(result) => {
                self.slot = Slot::Empty;
                Some(result)
            }
            _ => None,
        }
    }

    /// Drop whatever the slot holds.
    ///
    /// Returns `true` if a transaction was waiting for an exchange.
    pub fn abandon(&mut self) -> bool {
        let was_pending = self.is_pending();
        self.slot = Slot::Empty;
        was_pending
    }

    fn check_reply(
        request: &ControlRequest,
        rx: &[u8],
    ) -> Result<ControlResponse, Retriable> {
        let rx = rx
            .get(..request.transfer_len())
            .ok_or(Retriable::Fatal(ControlError::ReplyMismatch))?;

        let echo_bytes = &rx[WORD_SIZE..2 * WORD_SIZE];
        if echo_bytes.iter().all(|&b| b == 0x00) || echo_bytes.iter().all(|&b| b == 0xFF) {
            return Err(Retriable::Silent);
        }

        let reply = match decode_control_reply(rx) {
            Ok(reply) => reply,
            Err(DecodeError::Parity) => return Err(Retriable::Parity),
            Err(DecodeError::Malformed) => {
                return Err(Retriable::Fatal(ControlError::ReplyMismatch));
            }
        };
        if reply.header.header_bad {
            return Err(Retriable::Parity);
        }
        if !request.header.same_request(&reply.header) {
            return Err(Retriable::Fatal(ControlError::ReplyMismatch));
        }

        let mut response = ControlResponse {
            count: request.header.word_count(),
            values: [0; MAX_CONTROL_REGS],
        };
        for (slot, value) in response.values.iter_mut().zip(reply.values()) {
            *slot = value;
        }

        if request.header.write && response.values() != request.values() {
            return Err(Retriable::Fatal(ControlError::ReplyMismatch));
        }
        Ok(response)
    }
}

enum Retriable {
    Silent,
    Parity,
    Fatal(ControlError),
}

// =============================================================================
// Unit Tests
// =============================================================================
