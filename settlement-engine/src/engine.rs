//! Batch settlement engine
//!
//! Distributes funds from a single funding source to an ordered recipient
//! list, deducting a ceiling-rounded service fee, with exact conservation of
//! value. Two modes:
//!
//! - **atomic**: every distribution succeeds or the entire call rolls back
//!   to the pre-call balances
//! - **best-effort** (tokens only): per-recipient failures are recorded and
//!   refunded, never aborting the call
//!
//! Both run under the pause check and the reentrancy guard; administration
//! (pause, limits, fee-on-transfer registry, timelocked fee updates,
//! emergency sweeps) is owner-only.

use crate::clock::Clock;
use crate::error::{Error, Result, StateError, ValidationError};
use crate::events::{EngineEvent, EventLog, EventRecord};
use crate::fee::quote_fee;
use crate::governance::{GovernanceParams, GovernanceState, PendingFeeUpdate};
use crate::guard::ReentrancyGuard;
use crate::types::{PartialReceipt, SettlementReceipt, TransferOutcome};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use transport_core::{
    Address, Amount, Asset, AssetLedger, NativeTransport, TokenId, TokenTransport, Transport,
};
use uuid::Uuid;

/// Batch settlement engine
pub struct SettlementEngine {
    /// Balance book and transfer substrate
    ledger: Arc<AssetLedger>,

    /// Holding account the engine settles through
    account: Address,

    /// Account authorized for admin and recovery operations
    owner: Address,

    /// Mutable governance configuration
    governance: RwLock<GovernanceState>,

    /// Tokens whose transfer mechanism may short the pulled amount
    fee_on_transfer: DashMap<TokenId, bool>,

    /// Execution lock over fund-moving entry points
    guard: ReentrancyGuard,

    /// Time source for the fee timelock and event timestamps
    clock: Arc<dyn Clock>,

    /// Audit trail of state-changing operations
    events: EventLog,
}

impl SettlementEngine {
    /// Create a new engine with validated governance parameters
    pub fn new(
        ledger: Arc<AssetLedger>,
        account: Address,
        owner: Address,
        params: GovernanceParams,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if account.is_zero() || owner.is_zero() {
            return Err(crate::error::ConfigError::ZeroAccount.into());
        }
        let governance = GovernanceState::new(params)?;
        tracing::info!(
            account = %account,
            owner = %owner,
            fee_bps = governance.fee_bps,
            max_recipients = governance.max_recipients,
            "settlement engine initialized"
        );

        Ok(Self {
            ledger,
            account,
            owner,
            governance: RwLock::new(governance),
            fee_on_transfer: DashMap::new(),
            guard: ReentrancyGuard::new(),
            clock,
            events: EventLog::new(),
        })
    }

    /// Engine holding account
    pub fn account(&self) -> &Address {
        &self.account
    }

    /// Quote the fee for a batch total at the current rate; read-only
    pub fn quote_fee(&self, total: Amount) -> Result<Amount> {
        quote_fee(total, self.governance.read().fee_bps)
    }

    /// Snapshot of the current governance state
    pub fn governance(&self) -> GovernanceState {
        self.governance.read().clone()
    }

    /// Pending fee proposal, if any
    pub fn pending_fee_update(&self) -> Option<PendingFeeUpdate> {
        self.governance.read().pending.clone()
    }

    /// Copy of the event log
    pub fn events(&self) -> Vec<EventRecord> {
        self.events.snapshot()
    }

    /// Remove and return all event records
    pub fn drain_events(&self) -> Vec<EventRecord> {
        self.events.drain()
    }

    // ---------------------------------------------------------------------
    // Settlement entry points
    // ---------------------------------------------------------------------

    /// Atomically distribute native currency to every recipient
    ///
    /// The caller supplies `value` as inbound funding; it must equal
    /// `total + fee` exactly. Any failure leaves balances untouched.
    pub fn settle_native(
        &self,
        caller: &Address,
        recipients: &[Address],
        amounts: &[Amount],
        value: Amount,
    ) -> Result<SettlementReceipt> {
        let _lock = self.guard.enter()?;
        self.ensure_not_paused()?;

        let total = self.validate_batch(recipients, amounts)?;
        let (fee_bps, fee_recipient) = self.fee_snapshot();
        let fee = quote_fee(total, fee_bps)?;
        let required = total.checked_add(fee).ok_or(Error::Arithmetic)?;
        if value != required {
            return Err(Error::FundingMismatch {
                required,
                supplied: value,
            });
        }

        let transport = NativeTransport::new(self.ledger.clone(), self.account.clone());
        let checkpoint = self.ledger.checkpoint(&Asset::Native);
        if let Err(e) = self.apply_atomic(
            &transport,
            caller,
            recipients,
            amounts,
            required,
            fee,
            &fee_recipient,
            false,
        ) {
            self.ledger.restore(checkpoint);
            return Err(e);
        }

        Ok(self.finish_atomic(Asset::Native, recipients.len(), total, fee))
    }

    /// Atomically distribute a token to every recipient
    ///
    /// Pulls `total + fee` from the caller; for tokens flagged
    /// fee-on-transfer the engine's balance delta must cover the pull.
    pub fn settle_token(
        &self,
        caller: &Address,
        token: &TokenId,
        recipients: &[Address],
        amounts: &[Amount],
    ) -> Result<SettlementReceipt> {
        let _lock = self.guard.enter()?;
        self.ensure_not_paused()?;

        let total = self.validate_batch(recipients, amounts)?;
        let (fee_bps, fee_recipient) = self.fee_snapshot();
        let fee = quote_fee(total, fee_bps)?;
        let required = total.checked_add(fee).ok_or(Error::Arithmetic)?;

        let asset = Asset::Token(token.clone());
        let transport =
            TokenTransport::new(self.ledger.clone(), self.account.clone(), token.clone());
        let checkpoint = self.ledger.checkpoint(&asset);
        if let Err(e) = self.apply_atomic(
            &transport,
            caller,
            recipients,
            amounts,
            required,
            fee,
            &fee_recipient,
            self.is_fee_on_transfer(token),
        ) {
            self.ledger.restore(checkpoint);
            return Err(e);
        }

        Ok(self.finish_atomic(asset, recipients.len(), total, fee))
    }

    /// Best-effort token distribution with per-recipient outcome tracking
    ///
    /// Funding is pulled for the ceiling fee bound; the distribution loop
    /// never aborts on an individual failure. The unsent amounts plus the
    /// fee headroom are refunded to the caller.
    pub fn settle_token_best_effort(
        &self,
        caller: &Address,
        token: &TokenId,
        recipients: &[Address],
        amounts: &[Amount],
    ) -> Result<PartialReceipt> {
        let _lock = self.guard.enter()?;
        self.ensure_not_paused()?;

        let total = self.validate_batch(recipients, amounts)?;
        let (fee_bps, fee_recipient) = self.fee_snapshot();
        let fee_max = quote_fee(total, fee_bps)?;
        let required = total.checked_add(fee_max).ok_or(Error::Arithmetic)?;

        let asset = Asset::Token(token.clone());
        let transport =
            TokenTransport::new(self.ledger.clone(), self.account.clone(), token.clone());
        let checkpoint = self.ledger.checkpoint(&asset);

        if let Err(e) = self.pull_funding(
            &transport,
            caller,
            required,
            self.is_fee_on_transfer(token),
        ) {
            self.ledger.restore(checkpoint);
            return Err(e);
        }

        let settlement_id = Uuid::now_v7();
        let mut outcomes = Vec::with_capacity(recipients.len());
        let mut failed_events = Vec::new();
        let mut sent_total: Amount = 0;
        let mut failed_total: Amount = 0;
        let mut sent_count = 0usize;

        for (recipient, &amount) in recipients.iter().zip(amounts) {
            let succeeded = transport.try_transfer(recipient, amount);
            if succeeded {
                sent_total += amount;
                sent_count += 1;
            } else {
                failed_total += amount;
                tracing::warn!(%settlement_id, recipient = %recipient, amount, "transfer failed, continuing");
                failed_events.push(EngineEvent::TransferFailed {
                    settlement_id,
                    recipient: recipient.clone(),
                    amount,
                });
            }
            outcomes.push(TransferOutcome {
                recipient: recipient.clone(),
                amount,
                succeeded,
            });
        }

        // Fee is charged on what was actually sent; the headroom between
        // the ceiling bound and the actual fee goes back to the caller.
        let fee_actual = quote_fee(sent_total, fee_bps)?;
        let refund = required - sent_total - fee_actual;
        debug_assert_eq!(refund, failed_total + (fee_max - fee_actual));

        let finish = (|| -> Result<()> {
            if fee_actual > 0 {
                transport
                    .transfer(&fee_recipient, fee_actual)
                    .map_err(|_| Error::Transfer {
                        recipient: fee_recipient.clone(),
                    })?;
            }
            if refund > 0 {
                transport.transfer(caller, refund).map_err(|_| Error::Transfer {
                    recipient: caller.clone(),
                })?;
            }
            Ok(())
        })();
        if let Err(e) = finish {
            self.ledger.restore(checkpoint);
            return Err(e);
        }

        for event in failed_events {
            self.record(event);
        }
        self.record(EngineEvent::BatchSettledPartial {
            settlement_id,
            token: token.clone(),
            requested: recipients.len(),
            sent: sent_count,
            sent_total,
            fee: fee_actual,
            refund,
        });
        tracing::info!(
            %settlement_id,
            token = %token,
            requested = recipients.len(),
            sent = sent_count,
            sent_total,
            fee = fee_actual,
            refund,
            "best-effort batch settled"
        );

        Ok(PartialReceipt {
            settlement_id,
            token: token.clone(),
            outcomes,
            sent_count,
            sent_total,
            failed_total,
            fee: fee_actual,
            refund,
        })
    }

    // ---------------------------------------------------------------------
    // Admin surface
    // ---------------------------------------------------------------------

    /// Pause settlement entry points; immediate and idempotent-safe
    pub fn pause(&self, caller: &Address) -> Result<()> {
        self.ensure_owner(caller)?;
        let mut governance = self.governance.write();
        if !governance.paused {
            governance.paused = true;
            drop(governance);
            tracing::warn!("engine paused");
            self.record(EngineEvent::Paused);
        }
        Ok(())
    }

    /// Unpause settlement entry points; immediate and idempotent-safe
    pub fn unpause(&self, caller: &Address) -> Result<()> {
        self.ensure_owner(caller)?;
        let mut governance = self.governance.write();
        if governance.paused {
            governance.paused = false;
            drop(governance);
            tracing::info!("engine unpaused");
            self.record(EngineEvent::Unpaused);
        }
        Ok(())
    }

    /// Change the per-call recipient cap
    pub fn set_max_recipients(&self, caller: &Address, limit: usize) -> Result<()> {
        self.ensure_owner(caller)?;
        self.governance.write().set_max_recipients(limit)?;
        tracing::info!(limit, "recipient cap changed");
        self.record(EngineEvent::LimitsChanged {
            max_recipients: limit,
        });
        Ok(())
    }

    /// Flag or unflag a token whose transfers may short the pulled amount
    pub fn set_fee_on_transfer_flag(
        &self,
        caller: &Address,
        token: &TokenId,
        flagged: bool,
    ) -> Result<()> {
        self.ensure_owner(caller)?;
        self.fee_on_transfer.insert(token.clone(), flagged);
        tracing::info!(token = %token, flagged, "fee-on-transfer flag set");
        self.record(EngineEvent::FeeOnTransferFlagSet {
            token: token.clone(),
            flagged,
        });
        Ok(())
    }

    /// Propose a fee update, overwriting any pending proposal
    ///
    /// Returns the eta at which the proposal becomes finalizable.
    pub fn propose_fee_update(
        &self,
        caller: &Address,
        new_fee_bps: u16,
        new_fee_recipient: &Address,
    ) -> Result<DateTime<Utc>> {
        self.ensure_owner(caller)?;
        let now = self.clock.now();
        let eta = self
            .governance
            .write()
            .propose_fee_update(new_fee_bps, new_fee_recipient.clone(), now)?
            .eta;
        tracing::info!(new_fee_bps, recipient = %new_fee_recipient, %eta, "fee update proposed");
        self.record(EngineEvent::FeeUpdateProposed {
            new_fee_bps,
            new_fee_recipient: new_fee_recipient.clone(),
            eta,
        });
        Ok(eta)
    }

    /// Finalize the pending fee update once its eta has passed
    pub fn finalize_fee_update(&self, caller: &Address) -> Result<()> {
        self.ensure_owner(caller)?;
        let now = self.clock.now();
        let (fee_bps, fee_recipient) = self.governance.write().finalize_fee_update(now)?;
        tracing::info!(fee_bps, recipient = %fee_recipient, "fee update finalized");
        self.record(EngineEvent::FeeConfigChanged {
            fee_bps,
            fee_recipient,
        });
        Ok(())
    }

    /// Sweep the engine's entire residual token balance to `to`
    ///
    /// Recovery path: available regardless of pause.
    pub fn sweep_token(&self, caller: &Address, token: &TokenId, to: &Address) -> Result<Amount> {
        self.ensure_owner(caller)?;
        let transport =
            TokenTransport::new(self.ledger.clone(), self.account.clone(), token.clone());
        self.sweep(&transport, to)
    }

    /// Sweep the engine's entire residual native balance to `to`
    ///
    /// Recovery path: available regardless of pause.
    pub fn sweep_native(&self, caller: &Address, to: &Address) -> Result<Amount> {
        self.ensure_owner(caller)?;
        let transport = NativeTransport::new(self.ledger.clone(), self.account.clone());
        self.sweep(&transport, to)
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    /// Pre-distribution validation: lengths, cap, null recipients, checked
    /// total. Pure; touches no balances.
    fn validate_batch(&self, recipients: &[Address], amounts: &[Amount]) -> Result<Amount> {
        if recipients.len() != amounts.len() {
            return Err(ValidationError::LengthMismatch {
                recipients: recipients.len(),
                amounts: amounts.len(),
            }
            .into());
        }
        if recipients.is_empty() {
            return Err(ValidationError::EmptyBatch.into());
        }
        let max = self.governance.read().max_recipients;
        if recipients.len() > max {
            return Err(ValidationError::TooManyRecipients {
                len: recipients.len(),
                max,
            }
            .into());
        }
        if let Some(index) = recipients.iter().position(Address::is_zero) {
            return Err(ValidationError::ZeroAddressRecipient { index }.into());
        }

        let mut total: Amount = 0;
        for &amount in amounts {
            total = total.checked_add(amount).ok_or(Error::Arithmetic)?;
        }
        Ok(total)
    }

    /// Apply phase of an atomic settlement; caller restores the checkpoint
    /// on any error.
    #[allow(clippy::too_many_arguments)]
    fn apply_atomic(
        &self,
        transport: &dyn Transport,
        caller: &Address,
        recipients: &[Address],
        amounts: &[Amount],
        required: Amount,
        fee: Amount,
        fee_recipient: &Address,
        delta_check: bool,
    ) -> Result<()> {
        self.pull_funding(transport, caller, required, delta_check)?;

        if fee > 0 {
            transport
                .transfer(fee_recipient, fee)
                .map_err(|_| Error::Transfer {
                    recipient: fee_recipient.clone(),
                })?;
        }
        for (recipient, &amount) in recipients.iter().zip(amounts) {
            transport.transfer(recipient, amount).map_err(|_| Error::Transfer {
                recipient: recipient.clone(),
            })?;
        }
        Ok(())
    }

    /// Pull `required` inbound funding from the caller
    ///
    /// With `delta_check`, the engine's balance is read immediately before
    /// and after the pull; a delta short of `required` fails the call
    /// rather than silently continuing with a short balance.
    fn pull_funding(
        &self,
        transport: &dyn Transport,
        caller: &Address,
        required: Amount,
        delta_check: bool,
    ) -> Result<()> {
        let before = transport.balance_of(&self.account);
        transport.transfer_from(caller, &self.account, required)?;
        if delta_check {
            let received = transport.balance_of(&self.account).saturating_sub(before);
            if received < required {
                return Err(Error::FundingMismatch {
                    required,
                    supplied: received,
                });
            }
        }
        Ok(())
    }

    fn finish_atomic(
        &self,
        asset: Asset,
        recipient_count: usize,
        total: Amount,
        fee: Amount,
    ) -> SettlementReceipt {
        let settlement_id = Uuid::now_v7();
        tracing::info!(
            %settlement_id,
            asset = %asset,
            recipient_count,
            total,
            fee,
            "batch settled"
        );
        self.record(EngineEvent::BatchSettled {
            settlement_id,
            asset: asset.clone(),
            recipient_count,
            total,
            fee,
        });
        SettlementReceipt {
            settlement_id,
            asset,
            recipient_count,
            total,
            fee,
        }
    }

    fn sweep(&self, transport: &dyn Transport, to: &Address) -> Result<Amount> {
        if to.is_zero() {
            return Err(ValidationError::ZeroDestination.into());
        }
        let _lock = self.guard.enter()?;

        let amount = transport.balance_of(&self.account);
        if amount > 0 {
            transport.transfer(to, amount).map_err(|_| Error::Transfer {
                recipient: to.clone(),
            })?;
        }
        tracing::warn!(asset = %transport.asset(), to = %to, amount, "emergency sweep");
        self.record(EngineEvent::EmergencySweep {
            asset: transport.asset(),
            to: to.clone(),
            amount,
        });
        Ok(amount)
    }

    fn fee_snapshot(&self) -> (u16, Address) {
        let governance = self.governance.read();
        (governance.fee_bps, governance.fee_recipient.clone())
    }

    fn is_fee_on_transfer(&self, token: &TokenId) -> bool {
        self.fee_on_transfer.get(token).map(|v| *v).unwrap_or(false)
    }

    fn ensure_owner(&self, caller: &Address) -> Result<()> {
        if caller != &self.owner {
            return Err(Error::Access {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    fn ensure_not_paused(&self) -> Result<()> {
        if self.governance.read().paused {
            return Err(StateError::Paused.into());
        }
        Ok(())
    }

    fn record(&self, event: EngineEvent) {
        self.events.record(self.clock.now(), event);
    }
}

impl std::fmt::Debug for SettlementEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementEngine")
            .field("account", &self.account)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}
