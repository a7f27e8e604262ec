//! Value transport abstraction
//!
//! A `Transport` moves one asset on behalf of a holding account and exposes
//! a uniform success contract:
//!
//! - native currency: success = the value movement did not fail
//! - tokens: success = the call completed AND, if the token returned data,
//!   that data decodes to `true` (tokens returning no data are tolerated)
//!
//! All decode tolerance lives here; callers never see a token's return
//! convention.

use crate::error::{Error, Result};
use crate::ledger::{AssetLedger, TransferReport};
use crate::types::{Address, Amount, Asset, TokenId};
use std::sync::Arc;

/// Capability set for moving one asset
pub trait Transport: Send + Sync {
    /// Asset this transport moves
    fn asset(&self) -> Asset;

    /// Move `amount` from the holding account to `to`; must succeed
    fn transfer(&self, to: &Address, amount: Amount) -> Result<()>;

    /// Move `amount` from the holding account to `to`, reporting the
    /// outcome instead of failing the caller
    fn try_transfer(&self, to: &Address, amount: Amount) -> bool {
        self.transfer(to, amount).is_ok()
    }

    /// Move `amount` from an arbitrary holder to `to`; must succeed
    fn transfer_from(&self, from: &Address, to: &Address, amount: Amount) -> Result<()>;

    /// Current balance of `holder` in this transport's asset
    fn balance_of(&self, holder: &Address) -> Amount;
}

/// Transport for the native currency
pub struct NativeTransport {
    ledger: Arc<AssetLedger>,
    holder: Address,
}

impl NativeTransport {
    /// Create a native transport executing from `holder`
    pub fn new(ledger: Arc<AssetLedger>, holder: Address) -> Self {
        Self { ledger, holder }
    }
}

impl Transport for NativeTransport {
    fn asset(&self) -> Asset {
        Asset::Native
    }

    fn transfer(&self, to: &Address, amount: Amount) -> Result<()> {
        self.ledger
            .transfer(&Asset::Native, &self.holder, to, amount)
            .map(|_| ())
    }

    fn transfer_from(&self, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        self.ledger
            .transfer(&Asset::Native, from, to, amount)
            .map(|_| ())
    }

    fn balance_of(&self, holder: &Address) -> Amount {
        self.ledger.balance_of(&Asset::Native, holder)
    }
}

/// Transport for a token, tolerant of non-conforming return conventions
pub struct TokenTransport {
    ledger: Arc<AssetLedger>,
    holder: Address,
    asset: Asset,
}

impl TokenTransport {
    /// Create a token transport executing from `holder`
    pub fn new(ledger: Arc<AssetLedger>, holder: Address, token: TokenId) -> Self {
        Self {
            ledger,
            holder,
            asset: Asset::Token(token),
        }
    }

    /// Success iff the call completed and any returned data decodes to true
    fn decode(report: TransferReport, to: &Address) -> Result<()> {
        match report.reported {
            Some(false) => Err(Error::TransferRejected { to: to.clone() }),
            // No return data at all is accepted as success.
            Some(true) | None => Ok(()),
        }
    }
}

impl Transport for TokenTransport {
    fn asset(&self) -> Asset {
        self.asset.clone()
    }

    fn transfer(&self, to: &Address, amount: Amount) -> Result<()> {
        let report = self.ledger.transfer(&self.asset, &self.holder, to, amount)?;
        Self::decode(report, to)
    }

    fn transfer_from(&self, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        let report = self.ledger.transfer(&self.asset, from, to, amount)?;
        Self::decode(report, to)
    }

    fn balance_of(&self, holder: &Address) -> Amount {
        self.ledger.balance_of(&self.asset, holder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TokenBehavior;

    fn setup(behavior: TokenBehavior) -> (Arc<AssetLedger>, TokenTransport, Address, Address) {
        let ledger = Arc::new(AssetLedger::new());
        let tok = TokenId::new("tok");
        ledger.register_token(tok.clone(), behavior);
        let engine = Address::new("engine");
        let bob = Address::new("bob");
        ledger
            .mint(&Asset::Token(tok.clone()), &engine, 1_000)
            .unwrap();
        let transport = TokenTransport::new(ledger.clone(), engine.clone(), tok);
        (ledger, transport, engine, bob)
    }

    #[test]
    fn test_standard_token_success() {
        let (_, transport, _, bob) = setup(TokenBehavior::Standard);
        transport.transfer(&bob, 100).unwrap();
        assert_eq!(transport.balance_of(&bob), 100);
    }

    #[test]
    fn test_no_return_data_tolerated() {
        let (_, transport, _, bob) = setup(TokenBehavior::NoReturnData);
        transport.transfer(&bob, 100).unwrap();
        assert_eq!(transport.balance_of(&bob), 100);
    }

    #[test]
    fn test_returns_false_is_failure() {
        let (_, transport, engine, bob) = setup(TokenBehavior::ReturnsFalse);
        let err = transport.transfer(&bob, 100).unwrap_err();
        assert!(matches!(err, Error::TransferRejected { .. }));
        // And no balances moved.
        assert_eq!(transport.balance_of(&engine), 1_000);
        assert!(!transport.try_transfer(&bob, 100));
    }

    #[test]
    fn test_try_transfer_reports_blocked_recipient() {
        let (ledger, transport, _, bob) = setup(TokenBehavior::Standard);
        ledger.set_blocked(&transport.asset(), &bob, true);
        assert!(!transport.try_transfer(&bob, 100));
        assert_eq!(transport.balance_of(&bob), 0);
    }

    #[test]
    fn test_native_transfer_from() {
        let ledger = Arc::new(AssetLedger::new());
        let engine = Address::new("engine");
        let alice = Address::new("alice");
        ledger.mint(&Asset::Native, &alice, 500).unwrap();

        let transport = NativeTransport::new(ledger.clone(), engine.clone());
        transport.transfer_from(&alice, &engine, 500).unwrap();
        assert_eq!(transport.balance_of(&engine), 500);
        assert_eq!(transport.balance_of(&alice), 0);
    }
}
