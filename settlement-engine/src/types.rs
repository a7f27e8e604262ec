//! Settlement result types

use serde::{Deserialize, Serialize};
use transport_core::{Address, Amount, Asset, TokenId};
use uuid::Uuid;

/// Aggregate result of an atomic settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Settlement identifier
    pub settlement_id: Uuid,
    /// Asset distributed
    pub asset: Asset,
    /// Number of recipients paid
    pub recipient_count: usize,
    /// Sum of distributed amounts
    pub total: Amount,
    /// Fee collected
    pub fee: Amount,
}

/// Per-recipient outcome produced in best-effort mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    /// Intended recipient
    pub recipient: Address,
    /// Amount attempted
    pub amount: Amount,
    /// Whether the transfer went through
    pub succeeded: bool,
}

/// Aggregate result of a best-effort settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialReceipt {
    /// Settlement identifier
    pub settlement_id: Uuid,
    /// Token distributed
    pub token: TokenId,
    /// Per-recipient outcomes in batch order
    pub outcomes: Vec<TransferOutcome>,
    /// Recipients paid
    pub sent_count: usize,
    /// Sum of amounts actually sent
    pub sent_total: Amount,
    /// Sum of amounts that failed to send
    pub failed_total: Amount,
    /// Fee charged on the sent total
    pub fee: Amount,
    /// Amount returned to the caller
    pub refund: Amount,
}
