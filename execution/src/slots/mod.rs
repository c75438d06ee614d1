//! Slot engine implementations.
//!
//! Two independent engines live here: `line` (5×3, fixed paylines, sticky
//! wilds) and `cascade` (7×7, cluster pays, persistent cell multipliers).
//! They share only the sampling primitives, the payout cap and the error
//! vocabulary; their boards, symbols and evaluation rules have nothing in
//! common by design.

pub mod cascade;
pub mod cascade_config;
pub mod line;
pub mod line_config;
pub mod rng;

use reelhouse_types::slots::MAX_PAYOUT_MULTIPLIER;
use reelhouse_types::Amount;

use crate::state::StoreError;

/// Error during spin execution. Callers distinguish variants, not messages.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpinError {
    /// Bet is zero, negative or odd.
    #[error("bet must be positive and even")]
    InvalidBet,
    /// Deposit or bonus-buy amount is not positive.
    #[error("amount must be positive")]
    InvalidAmount,
    /// Paid spin with a wallet balance below the bet.
    #[error("not enough balance")]
    InsufficientFunds,
    /// Line bonus buy while a free-spin session is still running.
    #[error("free spins already active")]
    FreeSpinsPresent,
    /// A preset's probability table does not sum to the required total.
    #[error("invalid preset configuration: {0}")]
    ConfigInvalid(String),
    /// Transactional I/O failure; the spin was rolled back.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// An engine invariant failed mid-spin; the spin was rolled back.
    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),
}

/// Clamp a spin's total payout to [`MAX_PAYOUT_MULTIPLIER`] times the bet.
/// Idempotent: `cap(cap(x)) == cap(x)`.
pub fn apply_max_payout(amount: Amount, bet: Amount) -> Amount {
    amount.min(MAX_PAYOUT_MULTIPLIER.saturating_mul(bet))
}
