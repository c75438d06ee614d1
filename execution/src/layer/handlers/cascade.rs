use super::super::*;

use reelhouse_types::slots::CASCADE_BONUS_FREE_SPINS;

use crate::slots::cascade;

impl<'a, S: State> Layer<'a, S> {
    // === Cascade Handler Methods ===

    pub(in crate::layer) async fn handle_cascade_spin<R: Rng>(
        &mut self,
        user: UserId,
        bet: Amount,
        config: &CascadeConfig,
        preset_index: usize,
        rng: &mut R,
    ) -> Result<CascadeSpinResponse, SpinError> {
        if bet <= 0 || bet % 2 != 0 {
            return Err(SpinError::InvalidBet);
        }

        let mut player = self.player(user).await?;
        let mut cascade_state = self.cascade_state(user).await?;

        let in_free_spin = cascade_state.free_spins > 0;
        if in_free_spin {
            cascade_state.free_spins -= 1;
            // Multipliers and hits carry over within the bonus session.
        } else {
            if !player.try_debit(bet) {
                return Err(SpinError::InsufficientFunds);
            }
            cascade_state.reset_multipliers();
        }

        let outcome = cascade::spin(config, preset_index, bet, &mut cascade_state, rng)?;

        player.credit(outcome.total_payout);
        cascade_state.free_spins += outcome.awarded_free_spins;

        self.stage(Key::Player(user), Value::Player(player.clone()));
        self.stage(
            Key::CascadeState(user),
            Value::CascadeState(cascade_state.clone()),
        );

        Ok(CascadeSpinResponse {
            initial_board: outcome.initial_board,
            board: outcome.board,
            cascades: outcome.cascades,
            scatter_count: outcome.scatter_count,
            awarded_free_spins: outcome.awarded_free_spins,
            total_payout: outcome.total_payout,
            balance: player.balance,
            free_spin_count: cascade_state.free_spins,
            in_free_spin,
        })
    }

    /// Purchase the bonus: the request amount is the total cost; the session
    /// is seeded with a fixed free-spin count and fresh multipliers, without
    /// spinning a board. Unlike the Line slot, an already-running session
    /// does not block the purchase.
    pub(in crate::layer) async fn handle_cascade_buy_bonus(
        &mut self,
        user: UserId,
        amount: Amount,
    ) -> Result<CascadeBonusResponse, SpinError> {
        if amount <= 0 {
            return Err(SpinError::InvalidAmount);
        }

        let mut player = self.player(user).await?;
        if !player.try_debit(amount) {
            return Err(SpinError::InsufficientFunds);
        }

        let mut cascade_state = self.cascade_state(user).await?;
        cascade_state.reset_multipliers();
        cascade_state.free_spins = CASCADE_BONUS_FREE_SPINS;

        self.stage(Key::Player(user), Value::Player(player.clone()));
        self.stage(
            Key::CascadeState(user),
            Value::CascadeState(cascade_state.clone()),
        );

        Ok(CascadeBonusResponse {
            balance: player.balance,
            free_spin_count: cascade_state.free_spins,
        })
    }
}
