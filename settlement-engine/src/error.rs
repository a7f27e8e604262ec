//! Error types for the settlement engine
//!
//! Every rejection surfaces a distinguishable kind so callers can branch on
//! cause: validation, arithmetic, funding, transfer, access, state, config.

use chrono::{DateTime, Utc};
use thiserror::Error;
use transport_core::{Address, Amount};

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Settlement errors
#[derive(Error, Debug)]
pub enum Error {
    /// Batch failed pre-distribution validation
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Amount arithmetic overflowed
    #[error("arithmetic overflow summing batch amounts")]
    Arithmetic,

    /// Supplied or pulled funds do not match the required amount,
    /// including fee-on-transfer shortfalls
    #[error("funding mismatch: required {required}, supplied {supplied}")]
    FundingMismatch {
        /// Exact funding the call requires
        required: Amount,
        /// Funding actually supplied or received
        supplied: Amount,
    },

    /// An individual value movement failed (atomic mode, after rollback)
    #[error("transfer to {recipient} failed")]
    Transfer {
        /// Recipient whose transfer failed
        recipient: Address,
    },

    /// Caller is not authorized for this operation
    #[error("access denied for {caller}")]
    Access {
        /// Unauthorized caller
        caller: Address,
    },

    /// Operation is invalid in the engine's current state
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// Configuration value out of range
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Transport layer error
    #[error("transport error: {0}")]
    Transport(#[from] transport_core::Error),
}

/// Batch validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Recipient and amount lists differ in length
    #[error("recipient/amount length mismatch: {recipients} vs {amounts}")]
    LengthMismatch {
        /// Number of recipients
        recipients: usize,
        /// Number of amounts
        amounts: usize,
    },

    /// Batch contains no entries
    #[error("empty batch")]
    EmptyBatch,

    /// Batch exceeds the configured recipient cap
    #[error("batch of {len} exceeds recipient cap {max}")]
    TooManyRecipients {
        /// Batch length
        len: usize,
        /// Configured cap
        max: usize,
    },

    /// A recipient is the null address
    #[error("null recipient at index {index}")]
    ZeroAddressRecipient {
        /// Position of the offending entry
        index: usize,
    },

    /// Sweep destination is the null address
    #[error("null sweep destination")]
    ZeroDestination,
}

/// Guard and lifecycle failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Settlement entry points reject while paused
    #[error("engine is paused")]
    Paused,

    /// A guarded entry point was re-entered while already executing
    #[error("reentrant call rejected")]
    ReentrantCall,

    /// Finalize called with no proposal in flight
    #[error("no pending fee proposal")]
    NoPendingProposal,

    /// Finalize called before the proposal's eta
    #[error("timelock not elapsed: eta {eta}, now {now}")]
    TimelockNotElapsed {
        /// Earliest time the proposal can be finalized
        eta: DateTime<Utc>,
        /// Time of the attempt
        now: DateTime<Utc>,
    },
}

/// Out-of-range configuration values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Fee rate above the hard cap
    #[error("fee {bps} bps exceeds cap {max} bps")]
    FeeTooHigh {
        /// Proposed rate
        bps: u16,
        /// Hard cap
        max: u16,
    },

    /// Recipient limit outside (0, hard cap]
    #[error("recipient limit {limit} outside (0, {max}]")]
    RecipientLimitOutOfRange {
        /// Proposed limit
        limit: usize,
        /// Hard ceiling
        max: usize,
    },

    /// Fee timelock delay outside its allowed window
    #[error("fee delay {secs}s outside allowed window")]
    DelayOutOfRange {
        /// Proposed delay in seconds
        secs: i64,
    },

    /// Fee recipient is the null address
    #[error("fee recipient cannot be the null address")]
    ZeroFeeRecipient,

    /// Owner or engine account is the null address
    #[error("engine accounts cannot be the null address")]
    ZeroAccount,

    /// Failed to parse a configuration file or environment value
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
