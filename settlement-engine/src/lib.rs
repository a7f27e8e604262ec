//! Batch Settlement Engine
//!
//! Given a single funding source and an ordered list of (recipient, amount)
//! pairs, distributes funds while deducting a proportional service fee,
//! guaranteeing exact conservation of value.
//!
//! # Architecture
//!
//! 1. **Fee calculator**: pure ceiling-rounded basis-point fee
//! 2. **Governance**: pause, recipient cap, fee-on-transfer registry, and
//!    timelocked two-phase fee updates
//! 3. **Atomic settlement**: all-or-nothing distribution for native
//!    currency and tokens, rolled back via balance checkpoints
//! 4. **Partial settlement**: best-effort token distribution with
//!    per-recipient outcomes and exact refund
//! 5. **Emergency recovery**: owner-only residual sweeps
//!
//! Every fund-moving entry point runs under a reentrancy guard; execution
//! is synchronous and serialized per engine instance.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use settlement_engine::{Config, SettlementEngine, SystemClock};
//! use transport_core::{Address, Asset, AssetLedger};
//!
//! # fn main() -> settlement_engine::Result<()> {
//! let ledger = Arc::new(AssetLedger::new());
//! let config = Config::default();
//! let engine = SettlementEngine::new(
//!     ledger.clone(),
//!     config.engine_address(),
//!     config.owner_address(),
//!     config.governance_params(),
//!     Arc::new(SystemClock),
//! )?;
//!
//! let alice = Address::new("alice");
//! ledger.mint(&Asset::Native, &alice, 1_000_000).unwrap();
//! let recipients = vec![Address::new("bob"), Address::new("carol")];
//! let amounts = vec![300u128, 200u128];
//! let fee = engine.quote_fee(500)?;
//! let receipt = engine.settle_native(&alice, &recipients, &amounts, 500 + fee)?;
//! assert_eq!(receipt.total, 500);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations, unused_qualifications)]

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod fee;
pub mod governance;
pub mod guard;
pub mod types;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use engine::SettlementEngine;
pub use error::{ConfigError, Error, Result, StateError, ValidationError};
pub use events::{EngineEvent, EventRecord};
pub use fee::quote_fee;
pub use types::{PartialReceipt, SettlementReceipt, TransferOutcome};
