//! Error types for the transport layer

use crate::types::{Address, Amount, Asset, TokenId};
use thiserror::Error;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, Error>;

/// Transport errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Holder does not have enough balance to cover the debit
    #[error("insufficient funds: {holder} holds {available} of {asset}, needs {needed}")]
    InsufficientFunds {
        /// Account being debited
        holder: Address,
        /// Asset being moved
        asset: Asset,
        /// Amount requested
        needed: Amount,
        /// Amount actually held
        available: Amount,
    },

    /// The value movement completed the call but did not succeed
    /// (recipient rejected the credit, or the token reported failure)
    #[error("transfer to {to} rejected")]
    TransferRejected {
        /// Intended recipient
        to: Address,
    },

    /// Token has no registered behavior in the ledger
    #[error("unknown token: {0}")]
    UnknownToken(TokenId),

    /// Crediting would overflow the recipient's balance
    #[error("balance overflow crediting {to}")]
    BalanceOverflow {
        /// Account being credited
        to: Address,
    },
}
