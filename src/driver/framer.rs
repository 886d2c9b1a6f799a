//! Data-plane segmentation and reassembly.
//!
//! [`TxFramer`] cuts queued frames into chunk payloads. Every frame starts
//! at word 0 of a fresh chunk, so a chunk never carries bytes of two
//! transmit frames. Progress is tracked with a [`TxCursor`] that is only
//! committed once the SPI transfer carrying the chunks has completed;
//! an aborted transfer leaves the transmit queue exactly as it was.
//!
//! [`RxFramer`] rebuilds frames from received chunk payloads and their
//! footers. The MAC-PHY sends one logical stream, so at most one frame is
//! being reassembled at any time.

use super::queue::{FrameBuf, FrameQueue};
use super::status::Tc6Stats;
use crate::codec::{DataFooter, DataHeader};
use crate::internal::log::{debug, trace};

// =============================================================================
// Transmit
// =============================================================================

/// Position in the transmit queue while a transfer is being assembled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxCursor {
    /// Queue index of the frame being cut, relative to the front
    pub frame: usize,
    /// Bytes of that frame already placed in chunks
    pub offset: usize,
}

/// Transmit segmentation state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxFramer {
    offset: usize,
}

impl TxFramer {
    /// A framer positioned at the start of the front frame
    pub const fn new() -> Self {
        Self { offset: 0 }
    }

    /// Cursor at the committed position
    pub const fn cursor(&self) -> TxCursor {
        TxCursor {
            frame: 0,
            offset: self.offset,
        }
    }

    /// Whether part of the front frame has already been sent
    pub const fn in_progress(&self) -> bool {
        self.offset != 0
    }

    /// Data chunks needed to send everything in `queue` from the committed
    /// position, given `payload` bytes per chunk.
    pub fn chunks_pending<const N: usize>(&self, queue: &FrameQueue<N>, payload: usize) -> usize {
        queue
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                let remaining = if i == 0 {
                    frame.len().saturating_sub(self.offset)
                } else {
                    frame.len()
                };
                remaining.div_ceil(payload)
            })
            .sum()
    }

    /// Copy the next slice of `frame` into `payload` and build its header.
    ///
    /// The whole payload is written; bytes past the frame end are zero.
    /// `cursor` advances to the next frame when this chunk ends the frame.
    pub fn fill_chunk(cursor: &mut TxCursor, frame: &[u8], payload: &mut [u8]) -> DataHeader {
        let width = payload.len();
        let remaining = frame.len().saturating_sub(cursor.offset);
        let take = remaining.min(width);
        let start = cursor.offset == 0;
        let end = take == remaining;

        payload[..take].copy_from_slice(&frame[cursor.offset..cursor.offset + take]);
        payload[take..].fill(0);

        let header = DataHeader {
            data_valid: true,
            start_valid: start,
            start_word_offset: 0,
            end_valid: end,
            // Index of the last valid byte: `take` bytes are valid
            end_byte_offset: if end { take.saturating_sub(1) as u8 } else { 0 },
            ..DataHeader::EMPTY
        };

        if end {
            cursor.frame += 1;
            cursor.offset = 0;
        } else {
            cursor.offset += take;
        }
        header
    }

    /// Accept the position reached by a completed transfer.
    ///
    /// Returns the number of frames that were finished and can be removed
    /// from the front of the queue.
    pub fn commit(&mut self, cursor: TxCursor) -> usize {
        self.offset = cursor.offset;
        cursor.frame
    }

    /// Restart the front frame from its first byte.
    pub fn rewind(&mut self) {
        self.offset = 0;
    }
}

// =============================================================================
// Receive
// =============================================================================

/// Receive reassembly state
pub struct RxFramer {
    frame: FrameBuf,
    collecting: bool,
    zero_align: bool,
    timestamp_len: usize,
    timestamp: [u8; 8],
    timestamp_pending: usize,
    timestamp_parity: Option<bool>,
}

impl RxFramer {
    /// A framer waiting for the first start-of-frame.
    ///
    /// With `zero_align`, frames that do not start at payload word 0 are
    /// skipped. `timestamp_len` is the size of the timestamp the MAC-PHY
    /// prepends to frames flagged with RTSA.
    pub const fn new(zero_align: bool, timestamp_len: usize) -> Self {
        Self {
            frame: FrameBuf::new(),
            collecting: false,
            zero_align,
            timestamp_len: if timestamp_len > 8 { 8 } else { timestamp_len },
            timestamp: [0; 8],
            timestamp_pending: 0,
            timestamp_parity: None,
        }
    }

    /// Whether a frame is partially assembled
    pub const fn in_progress(&self) -> bool {
        self.collecting
    }

    /// Change the receive timestamp size.
    pub fn set_timestamp_len(&mut self, len: usize) {
        self.timestamp_len = len.min(self.timestamp.len());
    }

    /// Drop any partial frame and wait for the next start-of-frame.
    ///
    /// Returns `true` if a partial frame was discarded.
    pub fn abort(&mut self) -> bool {
        let was_collecting = self.collecting;
        self.collecting = false;
        self.frame.clear();
        self.timestamp_pending = 0;
        self.timestamp_parity = None;
        was_collecting
    }

    /// Consume one received chunk.
    ///
    /// Completed frames are pushed to `queue`; every discard is counted in
    /// `stats`.
    pub fn feed<const N: usize>(
        &mut self,
        footer: &DataFooter,
        payload: &[u8],
        queue: &mut FrameQueue<N>,
        stats: &mut Tc6Stats,
    ) {
        if !footer.data_valid {
            return;
        }

        let start = footer.start_byte();
        let end = footer.end_byte();
        if (footer.start_valid && start >= payload.len())
            || (footer.end_valid && end >= payload.len())
        {
            debug!("rx: chunk offsets outside payload");
            if self.abort() {
                Tc6Stats::bump(&mut stats.rx_aborted);
            }
            return;
        }

        match (footer.start_valid, footer.end_valid) {
            (false, false) => {
                if footer.frame_drop {
                    self.drop_frame(stats);
                } else {
                    self.append(payload, stats);
                }
            }
            (true, false) => {
                if footer.frame_drop {
                    self.drop_frame(stats);
                }
                self.begin(footer, &payload[start..], stats);
            }
            (false, true) => {
                self.append(&payload[..=end], stats);
                self.finish(footer.frame_drop, queue, stats);
            }
            (true, true) if start <= end => {
                self.begin(footer, &payload[start..=end], stats);
                self.finish(footer.frame_drop, queue, stats);
            }
            (true, true) => {
                // Previous frame ends before the next one starts
                self.append(&payload[..=end], stats);
                self.finish(footer.frame_drop, queue, stats);
                self.begin(footer, &payload[start..], stats);
            }
        }
    }

    fn drop_frame(&mut self, stats: &mut Tc6Stats) {
        if self.abort() {
            trace!("rx: frame dropped by device");
            Tc6Stats::bump(&mut stats.rx_dropped);
        }
    }

    fn begin(&mut self, footer: &DataFooter, bytes: &[u8], stats: &mut Tc6Stats) {
        if self.abort() {
            debug!("rx: start of frame while previous frame incomplete");
            Tc6Stats::bump(&mut stats.rx_aborted);
        }
        if self.zero_align && footer.start_word_offset != 0 {
            debug!("rx: frame at word {} ignored", footer.start_word_offset);
            Tc6Stats::bump(&mut stats.rx_misaligned);
            return;
        }
        self.collecting = true;
        if footer.rx_timestamp_added && self.timestamp_len > 0 {
            self.timestamp_pending = self.timestamp_len;
            self.timestamp_parity = Some(footer.rx_timestamp_parity);
        }
        self.append(bytes, stats);
    }

    fn append(&mut self, mut bytes: &[u8], stats: &mut Tc6Stats) {
        if !self.collecting {
            return;
        }
        if self.timestamp_pending > 0 {
            let take = self.timestamp_pending.min(bytes.len());
            let at = self.timestamp_len - self.timestamp_pending;
            self.timestamp[at..at + take].copy_from_slice(&bytes[..take]);
            self.timestamp_pending -= take;
            bytes = &bytes[take..];
        }
        if self.frame.extend(bytes).is_err() {
            debug!("rx: frame exceeds buffer");
            self.abort();
            Tc6Stats::bump(&mut stats.rx_aborted);
        }
    }

    fn finish<const N: usize>(
        &mut self,
        frame_drop: bool,
        queue: &mut FrameQueue<N>,
        stats: &mut Tc6Stats,
    ) {
        if !self.collecting {
            return;
        }
        if frame_drop {
            self.drop_frame(stats);
            return;
        }
        if self.timestamp_pending > 0 || self.frame.is_empty() {
            self.abort();
            Tc6Stats::bump(&mut stats.rx_aborted);
            return;
        }

        let timestamp = self.take_timestamp(stats);
        self.frame.set_timestamp(timestamp);
        if queue.push_buf(&self.frame).is_ok() {
            Tc6Stats::bump(&mut stats.rx_frames);
            Tc6Stats::add(&mut stats.rx_bytes, self.frame.len());
        } else {
            debug!("rx: queue full, frame dropped");
            Tc6Stats::bump(&mut stats.rx_queue_full);
        }
        self.collecting = false;
        self.frame.clear();
    }

    fn take_timestamp(&mut self, stats: &mut Tc6Stats) -> Option<u64> {
        let parity = self.timestamp_parity.take()?;
        let bytes = &self.timestamp[..self.timestamp_len];
        let ones: u32 = bytes.iter().map(|b| b.count_ones()).sum::<u32>() + u32::from(parity);
        if ones % 2 == 0 {
            debug!("rx: timestamp parity error");
            Tc6Stats::bump(&mut stats.rx_timestamp_errors);
            return None;
        }
        Some(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }
}

impl core::fmt::Debug for RxFramer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RxFramer")
            .field("collecting", &self.collecting)
            .field("len", &self.frame.len())
            .field("zero_align", &self.zero_align)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
