//! Engine event records
//!
//! Every state-changing operation appends a record to the in-memory event
//! log and emits a structured trace line. The log is the queryable audit
//! trail callers aggregate over; nothing in the engine reads it back.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use transport_core::{Address, Amount, Asset, TokenId};
use uuid::Uuid;

/// Event emitted by a state-changing operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A fee update entered the timelock
    FeeUpdateProposed {
        /// Proposed rate
        new_fee_bps: u16,
        /// Proposed recipient
        new_fee_recipient: Address,
        /// Earliest finalization time
        eta: DateTime<Utc>,
    },
    /// A fee update was finalized
    FeeConfigChanged {
        /// Rate now in effect
        fee_bps: u16,
        /// Recipient now in effect
        fee_recipient: Address,
    },
    /// The per-call recipient cap changed
    LimitsChanged {
        /// New cap
        max_recipients: usize,
    },
    /// A token's fee-on-transfer flag changed
    FeeOnTransferFlagSet {
        /// Token concerned
        token: TokenId,
        /// New flag value
        flagged: bool,
    },
    /// Settlement entry points paused
    Paused,
    /// Settlement entry points unpaused
    Unpaused,
    /// An atomic batch settled in full
    BatchSettled {
        /// Settlement identifier
        settlement_id: Uuid,
        /// Asset distributed
        asset: Asset,
        /// Number of recipients
        recipient_count: usize,
        /// Sum of distributed amounts
        total: Amount,
        /// Fee collected
        fee: Amount,
    },
    /// A best-effort batch completed
    BatchSettledPartial {
        /// Settlement identifier
        settlement_id: Uuid,
        /// Token distributed
        token: TokenId,
        /// Recipients requested
        requested: usize,
        /// Recipients paid
        sent: usize,
        /// Sum of amounts actually sent
        sent_total: Amount,
        /// Fee charged on the sent total
        fee: Amount,
        /// Amount returned to the caller
        refund: Amount,
    },
    /// One recipient's transfer failed in best-effort mode
    TransferFailed {
        /// Settlement identifier
        settlement_id: Uuid,
        /// Recipient whose transfer failed
        recipient: Address,
        /// Amount that was not delivered
        amount: Amount,
    },
    /// Residual balance swept by the owner
    EmergencySweep {
        /// Asset swept
        asset: Asset,
        /// Destination
        to: Address,
        /// Amount swept
        amount: Amount,
    },
}

/// Timestamped, sequenced event record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Monotonic sequence number
    pub seq: u64,
    /// Emission time
    pub at: DateTime<Utc>,
    /// The event
    pub event: EngineEvent,
}

/// Append-only in-memory event log
#[derive(Debug, Default)]
pub struct EventLog {
    inner: Mutex<LogInner>,
}

/// The sequence counter lives beside the records so draining never resets it
#[derive(Debug, Default)]
struct LogInner {
    next_seq: u64,
    records: Vec<EventRecord>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event
    pub fn record(&self, at: DateTime<Utc>, event: EngineEvent) {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.records.push(EventRecord { seq, at, event });
    }

    /// Copy of all records so far
    pub fn snapshot(&self) -> Vec<EventRecord> {
        self.inner.lock().records.clone()
    }

    /// Remove and return all records
    pub fn drain(&self) -> Vec<EventRecord> {
        std::mem::take(&mut self.inner.lock().records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_sequences_records() {
        let log = EventLog::new();
        let now = Utc::now();
        log.record(now, EngineEvent::Paused);
        log.record(now, EngineEvent::Unpaused);

        let records = log.snapshot();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].seq, 0);
        assert_eq!(records[1].seq, 1);
        assert_eq!(records[1].event, EngineEvent::Unpaused);

        assert_eq!(log.drain().len(), 2);
        assert!(log.snapshot().is_empty());
    }

    #[test]
    fn test_seq_monotonic_across_drain() {
        let log = EventLog::new();
        let now = Utc::now();
        log.record(now, EngineEvent::Paused);
        log.record(now, EngineEvent::Unpaused);
        log.drain();

        log.record(now, EngineEvent::Paused);
        assert_eq!(log.snapshot()[0].seq, 2);
    }
}
