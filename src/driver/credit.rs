//! Transmit credit and receive availability tracking.
//!
//! Every valid footer reports how many transmit chunks the MAC-PHY can
//! accept (TXC) and how many receive chunks it holds (RCA). The engine
//! never sends more data chunks than the last reported credit, and
//! declares the link stalled when too many consecutive credit polls come
//! back empty while transmit data waits.

use super::error::LinkError;
use crate::codec::DataFooter;

/// Credit bookkeeping for one MAC-PHY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CreditTracker {
    tx_credits: u8,
    rx_available: u8,
    zero_streak: u16,
    stall_limit: u16,
}

impl CreditTracker {
    /// Create a tracker with no credit, stalling after `stall_limit`
    /// consecutive zero-credit polls.
    pub const fn new(stall_limit: u16) -> Self {
        Self {
            tx_credits: 0,
            rx_available: 0,
            zero_streak: 0,
            stall_limit,
        }
    }

    /// Seed from BUFSTS after initialization.
    ///
    /// BUFSTS fields are eight bits wide while the footer carries five;
    /// the seed is clamped to what a footer could report.
    pub fn seed(&mut self, tx_credits: u8, rx_available: u8) {
        self.tx_credits = tx_credits.min(31);
        self.rx_available = rx_available.min(31);
        self.zero_streak = 0;
    }

    /// Take the counts reported by a valid footer.
    pub fn observe(&mut self, footer: &DataFooter) {
        self.tx_credits = footer.tx_credits;
        self.rx_available = footer.rx_chunks_available;
    }

    /// Forget the current counts after an untrustworthy footer.
    pub fn invalidate(&mut self) {
        self.tx_credits = 0;
        self.rx_available = 0;
    }

    /// Transmit chunks the MAC-PHY can accept
    pub const fn available_tx_credit(&self) -> u8 {
        self.tx_credits
    }

    /// Receive chunks held by the MAC-PHY
    pub const fn remote_rx_available(&self) -> u8 {
        self.rx_available
    }

    /// Account for `chunks` data chunks about to be sent.
    pub fn consume(&mut self, chunks: u8) {
        self.tx_credits = self.tx_credits.saturating_sub(chunks);
    }

    /// Record the outcome of one exchange.
    ///
    /// `credit_poll` marks an exchange sent only to learn the credit for
    /// waiting transmit data, once per wake event. Each such poll answered
    /// with zero credit extends the streak, and [`LinkError::LinkStalled`]
    /// is returned once it passes the configured limit. Any credit, or an
    /// empty transmit queue, clears the streak; other exchanges leave it.
    pub fn check_stall(&mut self, tx_waiting: bool, credit_poll: bool) -> Result<(), LinkError> {
        if !tx_waiting || self.tx_credits > 0 {
            self.zero_streak = 0;
            return Ok(());
        }
        if !credit_poll {
            return Ok(());
        }
        self.zero_streak = self.zero_streak.saturating_add(1);
        if self.zero_streak > self.stall_limit {
            return Err(LinkError::LinkStalled);
        }
        Ok(())
    }

    /// Clear everything, as after a software reset.
    pub fn reset(&mut self) {
        *self = Self::new(self.stall_limit);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
