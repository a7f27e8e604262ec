//! In-memory asset ledger
//!
//! The balance book the transports execute against. Besides plain balance
//! accounting it models the hostile parts of the external world the engine
//! has to survive:
//!
//! - per-token transfer behaviors (non-conforming return conventions,
//!   fee-on-transfer skims)
//! - blocked recipients whose credits fail
//! - receive hooks that hand control to untrusted code after a credit
//!
//! Checkpoint/restore over a single asset's balances is the transactional
//! primitive the engine uses for all-or-nothing settlement.

use crate::error::{Error, Result};
use crate::types::{Address, Amount, Asset, TokenId};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Transfer mechanics of a registered token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenBehavior {
    /// Conforming token: moves balances and reports success
    Standard,
    /// Non-conforming token: moves balances but returns no data at all
    NoReturnData,
    /// Non-conforming token: moves nothing and reports `false` instead of
    /// failing the call
    ReturnsFalse,
    /// Token whose own transfer mechanism skims a cut from every credit
    FeeOnTransfer {
        /// Skim in basis points of the transferred amount
        cut_bps: u16,
    },
}

/// What a single value movement reported back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReport {
    /// Amount actually credited to the recipient
    pub credited: Amount,
    /// Decoded return data: `Some(bool)` for tokens that report a result,
    /// `None` for tokens that return no data
    pub reported: Option<bool>,
}

/// Snapshot of one asset's balances, used for transactional rollback
#[derive(Debug, Clone)]
pub struct BalanceCheckpoint {
    asset: Asset,
    balances: HashMap<Address, Amount>,
}

type ReceiveHook = Arc<dyn Fn(&Asset, Amount) + Send + Sync>;

/// In-memory balance book
pub struct AssetLedger {
    /// Balances per asset per holder
    balances: RwLock<HashMap<Asset, HashMap<Address, Amount>>>,

    /// Registered token behaviors
    behaviors: RwLock<HashMap<TokenId, TokenBehavior>>,

    /// Recipients whose credits fail, per asset
    blocked: RwLock<HashMap<Asset, HashSet<Address>>>,

    /// Callbacks fired after an address is credited
    hooks: RwLock<HashMap<Address, ReceiveHook>>,
}

impl Default for AssetLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            balances: RwLock::new(HashMap::new()),
            behaviors: RwLock::new(HashMap::new()),
            blocked: RwLock::new(HashMap::new()),
            hooks: RwLock::new(HashMap::new()),
        }
    }

    /// Register a token and its transfer behavior
    pub fn register_token(&self, token: TokenId, behavior: TokenBehavior) {
        tracing::debug!(%token, ?behavior, "registering token");
        self.behaviors.write().insert(token, behavior);
    }

    /// Look up a token's behavior
    pub fn token_behavior(&self, token: &TokenId) -> Result<TokenBehavior> {
        self.behaviors
            .read()
            .get(token)
            .copied()
            .ok_or_else(|| Error::UnknownToken(token.clone()))
    }

    /// Credit new units into existence (seeding for demos and tests)
    pub fn mint(&self, asset: &Asset, holder: &Address, amount: Amount) -> Result<()> {
        let mut balances = self.balances.write();
        let entry = balances
            .entry(asset.clone())
            .or_default()
            .entry(holder.clone())
            .or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| Error::BalanceOverflow { to: holder.clone() })?;
        Ok(())
    }

    /// Current balance of a holder in an asset
    pub fn balance_of(&self, asset: &Asset, holder: &Address) -> Amount {
        self.balances
            .read()
            .get(asset)
            .and_then(|book| book.get(holder))
            .copied()
            .unwrap_or(0)
    }

    /// Mark or unmark a recipient as rejecting credits of an asset
    pub fn set_blocked(&self, asset: &Asset, holder: &Address, blocked: bool) {
        let mut map = self.blocked.write();
        let set = map.entry(asset.clone()).or_default();
        if blocked {
            set.insert(holder.clone());
        } else {
            set.remove(holder);
        }
    }

    /// Install a callback fired after `holder` is credited
    ///
    /// Models a receipt hook handing control to untrusted code mid-transfer.
    pub fn set_receive_hook(&self, holder: &Address, hook: ReceiveHook) {
        self.hooks.write().insert(holder.clone(), hook);
    }

    /// Remove a previously installed receive hook
    pub fn clear_receive_hook(&self, holder: &Address) {
        self.hooks.write().remove(holder);
    }

    /// Move `amount` of `asset` from `from` to `to`
    ///
    /// Validates and mutates under a single lock so a movement either fully
    /// applies or leaves no trace. The receive hook (if any) fires after the
    /// lock is released.
    pub fn transfer(
        &self,
        asset: &Asset,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<TransferReport> {
        let behavior = match asset {
            Asset::Native => None,
            Asset::Token(id) => Some(self.token_behavior(id)?),
        };

        // A returns-false token completes the call without moving anything.
        if behavior == Some(TokenBehavior::ReturnsFalse) {
            return Ok(TransferReport {
                credited: 0,
                reported: Some(false),
            });
        }

        if self.is_blocked(asset, to) {
            return Err(Error::TransferRejected { to: to.clone() });
        }

        let credited = {
            let mut balances = self.balances.write();
            let book = balances.entry(asset.clone()).or_default();

            let available = book.get(from).copied().unwrap_or(0);
            if available < amount {
                return Err(Error::InsufficientFunds {
                    holder: from.clone(),
                    asset: asset.clone(),
                    needed: amount,
                    available,
                });
            }
            // Checked cut arithmetic: a fully funded holder can still ask
            // for an amount whose scaled cut overflows u128.
            let credited = match behavior {
                Some(TokenBehavior::FeeOnTransfer { cut_bps }) => {
                    let scaled = amount
                        .checked_mul(u128::from(cut_bps))
                        .ok_or_else(|| Error::BalanceOverflow { to: to.clone() })?;
                    // A cut of 100% or more credits nothing.
                    amount.saturating_sub(scaled / 10_000)
                }
                _ => amount,
            };
            // Credit is computed against the post-debit balance so a
            // self-transfer nets out instead of inflating the holder.
            let to_balance = if from == to {
                available - amount
            } else {
                book.get(to).copied().unwrap_or(0)
            };
            let new_to = to_balance
                .checked_add(credited)
                .ok_or_else(|| Error::BalanceOverflow { to: to.clone() })?;

            book.insert(from.clone(), available - amount);
            book.insert(to.clone(), new_to);
            credited
        };

        // Hand control to the recipient's hook with no locks held.
        let hook = self.hooks.read().get(to).cloned();
        if let Some(hook) = hook {
            hook(asset, credited);
        }

        let reported = match behavior {
            Some(TokenBehavior::NoReturnData) => None,
            _ => Some(true),
        };

        Ok(TransferReport { credited, reported })
    }

    /// Snapshot one asset's balances
    pub fn checkpoint(&self, asset: &Asset) -> BalanceCheckpoint {
        let balances = self
            .balances
            .read()
            .get(asset)
            .cloned()
            .unwrap_or_default();
        BalanceCheckpoint {
            asset: asset.clone(),
            balances,
        }
    }

    /// Restore an asset's balances to a previously taken checkpoint
    pub fn restore(&self, checkpoint: BalanceCheckpoint) {
        tracing::debug!(asset = %checkpoint.asset, "restoring balance checkpoint");
        self.balances
            .write()
            .insert(checkpoint.asset, checkpoint.balances);
    }

    fn is_blocked(&self, asset: &Asset, holder: &Address) -> bool {
        self.blocked
            .read()
            .get(asset)
            .map(|set| set.contains(holder))
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for AssetLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLedger").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn token(id: &str) -> Asset {
        Asset::Token(TokenId::new(id))
    }

    #[test]
    fn test_mint_and_transfer() {
        let ledger = AssetLedger::new();
        let alice = Address::new("alice");
        let bob = Address::new("bob");

        ledger.mint(&Asset::Native, &alice, 1_000).unwrap();
        let report = ledger.transfer(&Asset::Native, &alice, &bob, 400).unwrap();

        assert_eq!(report.credited, 400);
        assert_eq!(report.reported, Some(true));
        assert_eq!(ledger.balance_of(&Asset::Native, &alice), 600);
        assert_eq!(ledger.balance_of(&Asset::Native, &bob), 400);
    }

    #[test]
    fn test_insufficient_funds_leaves_no_trace() {
        let ledger = AssetLedger::new();
        let alice = Address::new("alice");
        let bob = Address::new("bob");
        ledger.mint(&Asset::Native, &alice, 100).unwrap();

        let err = ledger
            .transfer(&Asset::Native, &alice, &bob, 101)
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { needed: 101, .. }));
        assert_eq!(ledger.balance_of(&Asset::Native, &alice), 100);
        assert_eq!(ledger.balance_of(&Asset::Native, &bob), 0);
    }

    #[test]
    fn test_blocked_recipient_rejects_credit() {
        let ledger = AssetLedger::new();
        let alice = Address::new("alice");
        let bob = Address::new("bob");
        ledger.mint(&Asset::Native, &alice, 100).unwrap();
        ledger.set_blocked(&Asset::Native, &bob, true);

        let err = ledger
            .transfer(&Asset::Native, &alice, &bob, 50)
            .unwrap_err();
        assert!(matches!(err, Error::TransferRejected { .. }));
        assert_eq!(ledger.balance_of(&Asset::Native, &alice), 100);
    }

    #[test]
    fn test_unknown_token() {
        let ledger = AssetLedger::new();
        let alice = Address::new("alice");
        let bob = Address::new("bob");

        let err = ledger.transfer(&token("ghost"), &alice, &bob, 1).unwrap_err();
        assert!(matches!(err, Error::UnknownToken(_)));
    }

    #[test]
    fn test_fee_on_transfer_skims_cut() {
        let ledger = AssetLedger::new();
        let usdx = TokenId::new("usdx");
        ledger.register_token(usdx.clone(), TokenBehavior::FeeOnTransfer { cut_bps: 200 });

        let alice = Address::new("alice");
        let bob = Address::new("bob");
        let asset = Asset::Token(usdx);
        ledger.mint(&asset, &alice, 10_000).unwrap();

        let report = ledger.transfer(&asset, &alice, &bob, 10_000).unwrap();
        assert_eq!(report.credited, 9_800); // 2% skimmed
        assert_eq!(ledger.balance_of(&asset, &alice), 0);
        assert_eq!(ledger.balance_of(&asset, &bob), 9_800);
    }

    #[test]
    fn test_fee_on_transfer_unfunded_huge_amount_is_insufficient() {
        let ledger = AssetLedger::new();
        let usdx = TokenId::new("usdx");
        ledger.register_token(usdx.clone(), TokenBehavior::FeeOnTransfer { cut_bps: 200 });

        let alice = Address::new("alice");
        let bob = Address::new("bob");
        let asset = Asset::Token(usdx);

        // The funds check must run before any cut arithmetic.
        let err = ledger.transfer(&asset, &alice, &bob, u128::MAX).unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { available: 0, .. }));
    }

    #[test]
    fn test_fee_on_transfer_cut_overflow_is_error() {
        let ledger = AssetLedger::new();
        let usdx = TokenId::new("usdx");
        ledger.register_token(usdx.clone(), TokenBehavior::FeeOnTransfer { cut_bps: 200 });

        let alice = Address::new("alice");
        let bob = Address::new("bob");
        let asset = Asset::Token(usdx);
        ledger.mint(&asset, &alice, u128::MAX).unwrap();

        // Funded, but amount * cut_bps does not fit in u128.
        let err = ledger.transfer(&asset, &alice, &bob, u128::MAX).unwrap_err();
        assert!(matches!(err, Error::BalanceOverflow { .. }));
        assert_eq!(ledger.balance_of(&asset, &alice), u128::MAX);
        assert_eq!(ledger.balance_of(&asset, &bob), 0);
    }

    #[test]
    fn test_no_return_data_token_moves_balances() {
        let ledger = AssetLedger::new();
        let tok = TokenId::new("legacy");
        ledger.register_token(tok.clone(), TokenBehavior::NoReturnData);

        let alice = Address::new("alice");
        let bob = Address::new("bob");
        let asset = Asset::Token(tok);
        ledger.mint(&asset, &alice, 500).unwrap();

        let report = ledger.transfer(&asset, &alice, &bob, 500).unwrap();
        assert_eq!(report.reported, None);
        assert_eq!(ledger.balance_of(&asset, &bob), 500);
    }

    #[test]
    fn test_returns_false_token_moves_nothing() {
        let ledger = AssetLedger::new();
        let tok = TokenId::new("liar");
        ledger.register_token(tok.clone(), TokenBehavior::ReturnsFalse);

        let alice = Address::new("alice");
        let bob = Address::new("bob");
        let asset = Asset::Token(tok);
        ledger.mint(&asset, &alice, 500).unwrap();

        let report = ledger.transfer(&asset, &alice, &bob, 500).unwrap();
        assert_eq!(report.reported, Some(false));
        assert_eq!(report.credited, 0);
        assert_eq!(ledger.balance_of(&asset, &alice), 500);
        assert_eq!(ledger.balance_of(&asset, &bob), 0);
    }

    #[test]
    fn test_self_transfer_nets_out() {
        let ledger = AssetLedger::new();
        let alice = Address::new("alice");
        ledger.mint(&Asset::Native, &alice, 1_000).unwrap();

        ledger.transfer(&Asset::Native, &alice, &alice, 400).unwrap();
        assert_eq!(ledger.balance_of(&Asset::Native, &alice), 1_000);
    }

    #[test]
    fn test_checkpoint_restore() {
        let ledger = AssetLedger::new();
        let alice = Address::new("alice");
        let bob = Address::new("bob");
        ledger.mint(&Asset::Native, &alice, 1_000).unwrap();

        let cp = ledger.checkpoint(&Asset::Native);
        ledger.transfer(&Asset::Native, &alice, &bob, 999).unwrap();
        assert_eq!(ledger.balance_of(&Asset::Native, &bob), 999);

        ledger.restore(cp);
        assert_eq!(ledger.balance_of(&Asset::Native, &alice), 1_000);
        assert_eq!(ledger.balance_of(&Asset::Native, &bob), 0);
    }

    #[test]
    fn test_receive_hook_fires_after_credit() {
        let ledger = Arc::new(AssetLedger::new());
        let alice = Address::new("alice");
        let bob = Address::new("bob");
        ledger.mint(&Asset::Native, &alice, 100).unwrap();

        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = fired.clone();
        ledger.set_receive_hook(
            &bob,
            Arc::new(move |_asset, amount| {
                assert_eq!(amount, 100);
                fired_clone.store(true, Ordering::SeqCst);
            }),
        );

        ledger.transfer(&Asset::Native, &alice, &bob, 100).unwrap();
        assert!(fired.load(Ordering::SeqCst));
    }
}
