//! Fixed-capacity frame storage.
//!
//! Frames live in inline buffers of [`MAX_FRAME_SIZE`] bytes; a queue is a
//! ring of `N` such buffers. Nothing allocates.

use super::error::{IoError, IoResult};
use crate::internal::constants::MAX_FRAME_SIZE;

// =============================================================================
// Frame Buffer
// =============================================================================

/// One Ethernet frame plus its optional receive timestamp
#[derive(Clone)]
pub struct FrameBuf {
    data: [u8; MAX_FRAME_SIZE],
    len: usize,
    timestamp: Option<u64>,
}

impl FrameBuf {
    /// An empty buffer
    pub const fn new() -> Self {
        Self {
            data: [0; MAX_FRAME_SIZE],
            len: 0,
            timestamp: None,
        }
    }

    /// Frame bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Frame length in bytes
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no bytes
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Receive timestamp captured by the MAC-PHY, if any
    pub const fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }

    /// Replace the contents with `frame`.
    pub fn set(&mut self, frame: &[u8]) -> IoResult<()> {
        if frame.len() > MAX_FRAME_SIZE {
            return Err(IoError::FrameTooLarge);
        }
        self.data[..frame.len()].copy_from_slice(frame);
        self.len = frame.len();
        self.timestamp = None;
        Ok(())
    }

    /// Append bytes, failing without change if they do not fit.
    pub fn extend(&mut self, bytes: &[u8]) -> IoResult<()> {
        let end = self
            .len
            .checked_add(bytes.len())
            .filter(|&end| end <= MAX_FRAME_SIZE)
            .ok_or(IoError::FrameTooLarge)?;
        self.data[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    pub(crate) fn set_timestamp(&mut self, timestamp: Option<u64>) {
        self.timestamp = timestamp;
    }

    /// Empty the buffer.
    pub fn clear(&mut self) {
        self.len = 0;
        self.timestamp = None;
    }
}

impl Default for FrameBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for FrameBuf {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameBuf")
            .field("len", &self.len)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

// =============================================================================
// Frame Queue
// =============================================================================

/// Bounded FIFO of frames
pub struct FrameQueue<const N: usize> {
    slots: [FrameBuf; N],
    head: usize,
    len: usize,
}

impl<const N: usize> FrameQueue<N> {
    /// An empty queue
    pub const fn new() -> Self {
        Self {
            slots: [const { FrameBuf::new() }; N],
            head: 0,
            len: 0,
        }
    }

    /// Number of queued frames
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no frames are queued
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether another push would fail
    pub const fn is_full(&self) -> bool {
        self.len >= N
    }

    /// Queue capacity
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Copy `frame` to the back of the queue.
    pub fn push(&mut self, frame: &[u8]) -> IoResult<()> {
        if frame.is_empty() {
            return Err(IoError::InvalidLength);
        }
        if frame.len() > MAX_FRAME_SIZE {
            return Err(IoError::FrameTooLarge);
        }
        let slot = self.back_slot().ok_or(IoError::Busy)?;
        slot.set(frame)?;
        self.len += 1;
        Ok(())
    }

    /// Move a finished buffer to the back of the queue.
    pub fn push_buf(&mut self, frame: &FrameBuf) -> IoResult<()> {
        let slot = self.back_slot().ok_or(IoError::Busy)?;
        slot.clone_from(frame);
        self.len += 1;
        Ok(())
    }

    fn back_slot(&mut self) -> Option<&mut FrameBuf> {
        if N == 0 || self.is_full() {
            return None;
        }
        let index = (self.head + self.len) % N;
        Some(&mut self.slots[index])
    }

    /// Oldest frame, left in place
    pub fn front(&self) -> Option<&FrameBuf> {
        if self.is_empty() {
            None
        } else {
            Some(&self.slots[self.head])
        }
    }

    /// Remove and return the oldest frame.
    pub fn pop(&mut self) -> Option<FrameBuf> {
        if self.is_empty() {
            return None;
        }
        let frame = core::mem::take(&mut self.slots[self.head]);
        self.advance();
        Some(frame)
    }

    /// Copy the oldest frame into `buf` and remove it.
    ///
    /// On [`IoError::BufferTooSmall`] the frame stays queued.
    pub fn pop_into(&mut self, buf: &mut [u8]) -> IoResult<Option<(usize, Option<u64>)>> {
        let Some(frame) = self.front() else {
            return Ok(None);
        };
        let len = frame.len();
        let out = buf.get_mut(..len).ok_or(IoError::BufferTooSmall)?;
        out.copy_from_slice(frame.as_slice());
        let timestamp = frame.timestamp();
        self.discard_front();
        Ok(Some((len, timestamp)))
    }

    /// Drop the oldest frame without copying it.
    pub fn discard_front(&mut self) {
        if !self.is_empty() {
            self.slots[self.head].clear();
            self.advance();
        }
    }

    fn advance(&mut self) {
        self.head = (self.head + 1) % N;
        self.len -= 1;
    }

    /// Iterate queued frames oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &FrameBuf> + '_ {
        (0..self.len).map(move |i| &self.slots[(self.head + i) % N])
    }

    /// Drop every frame.
    pub fn clear(&mut self) {
        while !self.is_empty() {
            self.discard_front();
        }
        self.head = 0;
    }
}

impl<const N: usize> Default for FrameQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::fmt::Debug for FrameQueue<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameQueue")
            .field("len", &self.len)
            .field("capacity", &N)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
