use serde::{Deserialize, Serialize};

use crate::Amount;

/// Wallet row for a player. Created lazily on first access; every mutation
/// happens inside a store transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub balance: Amount,
}

impl Player {
    pub fn new(balance: Amount) -> Self {
        Self { balance }
    }

    /// Debit `amount` from the balance. Returns `false` (and leaves the
    /// balance untouched) if funds are insufficient.
    pub fn try_debit(&mut self, amount: Amount) -> bool {
        if amount < 0 || self.balance < amount {
            return false;
        }
        self.balance -= amount;
        true
    }

    pub fn credit(&mut self, amount: Amount) {
        self.balance = self.balance.saturating_add(amount);
    }
}
