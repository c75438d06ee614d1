use super::super::*;

use reelhouse_types::slots::LINE_BONUS_COST_MULTIPLIER;

use crate::slots::line;

impl<'a, S: State> Layer<'a, S> {
    // === Line Handler Methods ===

    pub(in crate::layer) async fn handle_line_spin<R: Rng>(
        &mut self,
        user: UserId,
        bet: Amount,
        config: &LineConfig,
        preset_index: usize,
        rng: &mut R,
    ) -> Result<LineSpinResponse, SpinError> {
        if bet <= 0 || bet % 2 != 0 {
            return Err(SpinError::InvalidBet);
        }

        let mut player = self.player(user).await?;
        let mut line_state = self.line_state(user).await?;

        let in_free_spin = line_state.free_spins > 0;
        let outcome = if in_free_spin {
            line_state.free_spins -= 1;
            line::free_spin(config, preset_index, bet, &mut line_state, rng)?
        } else {
            if !player.try_debit(bet) {
                return Err(SpinError::InsufficientFunds);
            }
            // A paid spin starts outside any bonus session; stale stickies
            // from the previous session go.
            line_state.sticky_wilds.clear();
            line::base_spin(config, preset_index, bet, rng)?
        };

        player.credit(outcome.total_payout);
        line_state.free_spins += outcome.awarded_free_spins;

        self.stage(Key::Player(user), Value::Player(player.clone()));
        self.stage(Key::LineState(user), Value::LineState(line_state.clone()));

        Ok(LineSpinResponse {
            board: outcome.board,
            line_wins: outcome.line_wins,
            scatter_count: outcome.scatter_count,
            awarded_free_spins: outcome.awarded_free_spins,
            total_payout: outcome.total_payout,
            balance: player.balance,
            free_spin_count: line_state.free_spins,
            in_free_spin,
        })
    }

    /// Purchase the bonus: price is a fixed multiple of the base bet, the
    /// synthetic scatter board plays once, and its scatter award seeds the
    /// free-spin session.
    pub(in crate::layer) async fn handle_line_buy_bonus<R: Rng>(
        &mut self,
        user: UserId,
        bet: Amount,
        config: &LineConfig,
        preset_index: usize,
        rng: &mut R,
    ) -> Result<LineSpinResponse, SpinError> {
        if bet <= 0 || bet % 2 != 0 {
            return Err(SpinError::InvalidBet);
        }

        let mut line_state = self.line_state(user).await?;
        if line_state.free_spins > 0 {
            return Err(SpinError::FreeSpinsPresent);
        }

        let mut player = self.player(user).await?;
        let price = bet.saturating_mul(LINE_BONUS_COST_MULTIPLIER);
        if !player.try_debit(price) {
            return Err(SpinError::InsufficientFunds);
        }

        let outcome = line::bonus_spin(config, preset_index, bet, rng)?;
        player.credit(outcome.total_payout);
        line_state.free_spins = outcome.awarded_free_spins;
        line_state.sticky_wilds.clear();

        self.stage(Key::Player(user), Value::Player(player.clone()));
        self.stage(Key::LineState(user), Value::LineState(line_state.clone()));

        Ok(LineSpinResponse {
            board: outcome.board,
            line_wins: outcome.line_wins,
            scatter_count: outcome.scatter_count,
            awarded_free_spins: outcome.awarded_free_spins,
            total_payout: outcome.total_payout,
            balance: player.balance,
            free_spin_count: line_state.free_spins,
            in_free_spin: false,
        })
    }
}
