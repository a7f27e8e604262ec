//! Governance state
//!
//! Mutable engine configuration: fee rate, fee recipient, recipient cap,
//! pause flag, and the two-phase timelocked fee update. The pending slot is
//! an explicit state machine: `None` (no proposal) or exactly one in-flight
//! `PendingFeeUpdate`; `propose` overwrites either state, `finalize` applies
//! only once the eta has passed.

use crate::error::{ConfigError, Result, StateError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use transport_core::Address;

/// Hard cap on the fee rate: 10%
pub const MAX_FEE_BPS: u16 = 1_000;

/// Hard ceiling on the per-call recipient cap
pub const MAX_RECIPIENTS_HARD_CAP: usize = 1_000;

/// Default per-call recipient cap
pub const DEFAULT_MAX_RECIPIENTS: usize = 400;

/// Shortest allowed fee timelock
pub const MIN_FEE_DELAY_FLOOR: Duration = Duration::hours(1);

/// Longest allowed fee timelock
pub const MIN_FEE_DELAY_CEILING: Duration = Duration::days(30);

/// Validated initial governance parameters
#[derive(Debug, Clone)]
pub struct GovernanceParams {
    /// Service fee in basis points
    pub fee_bps: u16,
    /// Account receiving fees
    pub fee_recipient: Address,
    /// Per-call recipient cap
    pub max_recipients: usize,
    /// Mandatory delay between proposing and finalizing a fee change
    pub min_fee_delay: Duration,
}

/// In-flight fee proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFeeUpdate {
    /// Proposed fee rate
    pub new_fee_bps: u16,
    /// Proposed fee recipient
    pub new_fee_recipient: Address,
    /// Earliest finalization time: proposal time + min delay
    pub eta: DateTime<Utc>,
}

/// Current governance state
#[derive(Debug, Clone)]
pub struct GovernanceState {
    /// Current fee rate in basis points
    pub fee_bps: u16,
    /// Current fee recipient
    pub fee_recipient: Address,
    /// Per-call recipient cap
    pub max_recipients: usize,
    /// Whether settlement entry points are paused
    pub paused: bool,
    /// Timelock delay for fee changes
    pub min_fee_delay: Duration,
    /// Pending fee proposal, if any
    pub pending: Option<PendingFeeUpdate>,
}

impl GovernanceState {
    /// Create validated governance state
    pub fn new(params: GovernanceParams) -> Result<Self> {
        validate_fee_bps(params.fee_bps)?;
        validate_fee_recipient(&params.fee_recipient)?;
        validate_max_recipients(params.max_recipients)?;
        validate_delay(params.min_fee_delay)?;

        Ok(Self {
            fee_bps: params.fee_bps,
            fee_recipient: params.fee_recipient,
            max_recipients: params.max_recipients,
            paused: false,
            min_fee_delay: params.min_fee_delay,
            pending: None,
        })
    }

    /// Change the per-call recipient cap, same bounds as at initialization
    pub fn set_max_recipients(&mut self, limit: usize) -> Result<()> {
        validate_max_recipients(limit)?;
        self.max_recipients = limit;
        Ok(())
    }

    /// Record a fee update proposal, overwriting any pending one
    ///
    /// Overwriting is deliberate: there is no requirement that a prior
    /// proposal expire or be finalized first.
    pub fn propose_fee_update(
        &mut self,
        new_fee_bps: u16,
        new_fee_recipient: Address,
        now: DateTime<Utc>,
    ) -> Result<PendingFeeUpdate> {
        validate_fee_bps(new_fee_bps)?;
        validate_fee_recipient(&new_fee_recipient)?;

        let pending = PendingFeeUpdate {
            new_fee_bps,
            new_fee_recipient,
            eta: now + self.min_fee_delay,
        };
        self.pending = Some(pending.clone());
        Ok(pending)
    }

    /// Apply the pending proposal if its eta has passed, clearing the slot
    pub fn finalize_fee_update(&mut self, now: DateTime<Utc>) -> Result<(u16, Address)> {
        let pending = match self.pending.take() {
            None => return Err(StateError::NoPendingProposal.into()),
            Some(pending) if now < pending.eta => {
                let eta = pending.eta;
                // Early finalize leaves the proposal in place.
                self.pending = Some(pending);
                return Err(StateError::TimelockNotElapsed { eta, now }.into());
            }
            Some(pending) => pending,
        };

        self.fee_bps = pending.new_fee_bps;
        self.fee_recipient = pending.new_fee_recipient.clone();
        Ok((pending.new_fee_bps, pending.new_fee_recipient))
    }
}

fn validate_fee_bps(bps: u16) -> Result<()> {
    if bps > MAX_FEE_BPS {
        return Err(ConfigError::FeeTooHigh {
            bps,
            max: MAX_FEE_BPS,
        }
        .into());
    }
    Ok(())
}

fn validate_fee_recipient(recipient: &Address) -> Result<()> {
    if recipient.is_zero() {
        return Err(ConfigError::ZeroFeeRecipient.into());
    }
    Ok(())
}

fn validate_max_recipients(limit: usize) -> Result<()> {
    if limit == 0 || limit > MAX_RECIPIENTS_HARD_CAP {
        return Err(ConfigError::RecipientLimitOutOfRange {
            limit,
            max: MAX_RECIPIENTS_HARD_CAP,
        }
        .into());
    }
    Ok(())
}

fn validate_delay(delay: Duration) -> Result<()> {
    if delay < MIN_FEE_DELAY_FLOOR || delay > MIN_FEE_DELAY_CEILING {
        return Err(ConfigError::DelayOutOfRange {
            secs: delay.num_seconds(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn params() -> GovernanceParams {
        GovernanceParams {
            fee_bps: 10,
            fee_recipient: Address::new("treasury"),
            max_recipients: DEFAULT_MAX_RECIPIENTS,
            min_fee_delay: Duration::hours(1),
        }
    }

    #[test]
    fn test_new_validates_bounds() {
        assert!(GovernanceState::new(params()).is_ok());

        let mut p = params();
        p.fee_bps = MAX_FEE_BPS + 1;
        assert!(matches!(
            GovernanceState::new(p),
            Err(Error::Config(ConfigError::FeeTooHigh { .. }))
        ));

        let mut p = params();
        p.fee_recipient = Address::zero();
        assert!(matches!(
            GovernanceState::new(p),
            Err(Error::Config(ConfigError::ZeroFeeRecipient))
        ));

        let mut p = params();
        p.max_recipients = 0;
        assert!(GovernanceState::new(p).is_err());

        let mut p = params();
        p.max_recipients = MAX_RECIPIENTS_HARD_CAP + 1;
        assert!(GovernanceState::new(p).is_err());

        let mut p = params();
        p.min_fee_delay = Duration::minutes(5);
        assert!(matches!(
            GovernanceState::new(p),
            Err(Error::Config(ConfigError::DelayOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_finalize_before_eta_fails() {
        let mut state = GovernanceState::new(params()).unwrap();
        let t0 = Utc::now();
        state
            .propose_fee_update(20, Address::new("treasury2"), t0)
            .unwrap();

        let err = state
            .finalize_fee_update(t0 + Duration::minutes(30))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::State(StateError::TimelockNotElapsed { .. })
        ));
        // Proposal still pending.
        assert!(state.pending.is_some());
    }

    #[test]
    fn test_finalize_applies_and_clears() {
        let mut state = GovernanceState::new(params()).unwrap();
        let t0 = Utc::now();
        state
            .propose_fee_update(20, Address::new("treasury2"), t0)
            .unwrap();

        let (bps, recipient) = state.finalize_fee_update(t0 + Duration::hours(1)).unwrap();
        assert_eq!(bps, 20);
        assert_eq!(recipient, Address::new("treasury2"));
        assert_eq!(state.fee_bps, 20);
        assert_eq!(state.fee_recipient, Address::new("treasury2"));
        assert!(state.pending.is_none());

        let err = state.finalize_fee_update(t0 + Duration::hours(2)).unwrap_err();
        assert!(matches!(err, Error::State(StateError::NoPendingProposal)));
    }

    #[test]
    fn test_propose_overwrites_pending() {
        let mut state = GovernanceState::new(params()).unwrap();
        let t0 = Utc::now();
        state
            .propose_fee_update(20, Address::new("a"), t0)
            .unwrap();
        let eta2 = state
            .propose_fee_update(30, Address::new("b"), t0 + Duration::minutes(30))
            .unwrap()
            .eta;

        // Fresh eta from the second proposal time.
        assert_eq!(eta2, t0 + Duration::minutes(30) + Duration::hours(1));
        let pending = state.pending.as_ref().unwrap();
        assert_eq!(pending.new_fee_bps, 30);
        assert_eq!(pending.new_fee_recipient, Address::new("b"));
    }

    #[test]
    fn test_propose_rejects_out_of_range_fee() {
        let mut state = GovernanceState::new(params()).unwrap();
        let err = state
            .propose_fee_update(MAX_FEE_BPS + 1, Address::new("a"), Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::FeeTooHigh { .. })));
        assert!(state.pending.is_none());
    }
}
