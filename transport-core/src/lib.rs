//! Value transport layer
//!
//! Holds the balance book and the transport abstraction used by the
//! settlement engine to move value:
//!
//! 1. **Types**: addresses, token identifiers, assets, amounts
//! 2. **Ledger**: in-memory balance book with checkpoint/restore
//! 3. **Transport**: uniform success contract over native currency and
//!    tokens with non-conforming return conventions
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use transport_core::{Address, Asset, AssetLedger, NativeTransport, Transport};
//!
//! let ledger = Arc::new(AssetLedger::new());
//! let alice = Address::new("alice");
//! let bob = Address::new("bob");
//! ledger.mint(&Asset::Native, &alice, 1_000).unwrap();
//!
//! let transport = NativeTransport::new(ledger.clone(), alice.clone());
//! transport.transfer(&bob, 250).unwrap();
//! assert_eq!(ledger.balance_of(&Asset::Native, &bob), 250);
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod error;
pub mod ledger;
pub mod transport;
pub mod types;

// Re-exports
pub use error::{Error, Result};
pub use ledger::{AssetLedger, BalanceCheckpoint, TokenBehavior};
pub use transport::{NativeTransport, TokenTransport, Transport};
pub use types::{Address, Amount, Asset, TokenId};
