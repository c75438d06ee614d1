//! Spin-batch simulation against the in-memory store.
//!
//! The simulator stands in for the HTTP layer: it registers players by
//! depositing into their wallets, then drives the Line and Cascade services
//! spin by spin, topping wallets up when they run dry. Its report shows how
//! the RTP controller steered the preset ladder over the batch.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use reelhouse_execution::slots::SpinError;
use reelhouse_execution::{deposit, CascadeService, LineService, Memory};
use reelhouse_types::{Amount, UserId};

#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub spins: u64,
    pub players: u64,
    pub bet: Amount,
    pub seed: u64,
    /// Wallet top-up granted whenever a player cannot cover the bet.
    pub top_up: Amount,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            spins: 10_000,
            players: 8,
            bet: 10,
            seed: 0,
            top_up: 1_000_000,
        }
    }
}

/// Aggregate results of one simulated batch.
#[derive(Clone, Debug, Default)]
pub struct GameReport {
    pub spins: u64,
    pub paid_spins: u64,
    pub free_spins: u64,
    pub total_bet: Amount,
    pub total_payout: Amount,
    pub scatter_triggers: u64,
    pub top_ups: u64,
    pub final_preset: usize,
    pub controller_rtp: f64,
    pub adjustments: usize,
}

impl GameReport {
    /// RTP over paid stakes, as a percentage.
    pub fn realized_rtp(&self) -> f64 {
        if self.total_bet > 0 {
            self.total_payout as f64 / self.total_bet as f64 * 100.0
        } else {
            0.0
        }
    }
}

pub struct Simulator {
    config: SimulationConfig,
    line: LineService,
    cascade: CascadeService,
    rng: ChaCha8Rng,
}

impl Simulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            line: LineService::standard(),
            cascade: CascadeService::standard(),
        }
    }

    async fn fund_players(&self, state: &mut Memory) -> anyhow::Result<()> {
        for player in 0..self.config.players {
            deposit(state, player as UserId, self.config.top_up).await?;
        }
        Ok(())
    }

    /// Run the Line batch on a fresh store.
    pub async fn run_line(&mut self) -> anyhow::Result<GameReport> {
        let mut state = Memory::default();
        self.fund_players(&mut state).await?;

        let mut report = GameReport::default();
        for spin in 0..self.config.spins {
            let user = (spin % self.config.players) as UserId;
            let response = loop {
                match self
                    .line
                    .spin(&mut state, user, self.config.bet, &mut self.rng)
                    .await
                {
                    Ok(response) => break response,
                    Err(SpinError::InsufficientFunds) => {
                        report.top_ups += 1;
                        deposit(&mut state, user, self.config.top_up).await?;
                    }
                    Err(err) => return Err(err.into()),
                }
            };

            report.spins += 1;
            if response.in_free_spin {
                report.free_spins += 1;
            } else {
                report.paid_spins += 1;
                report.total_bet += self.config.bet;
            }
            report.total_payout += response.total_payout;
            if response.awarded_free_spins > 0 {
                report.scatter_triggers += 1;
                debug!(
                    user,
                    scatters = response.scatter_count,
                    awarded = response.awarded_free_spins,
                    "free spins triggered"
                );
            }
        }

        let snapshot = self.line.controller().snapshot();
        report.final_preset = snapshot.preset_index;
        report.controller_rtp = snapshot.current_rtp;
        report.adjustments = self.line.controller().adjustments().len();
        Ok(report)
    }

    /// Run the Cascade batch on a fresh store.
    pub async fn run_cascade(&mut self) -> anyhow::Result<GameReport> {
        let mut state = Memory::default();
        self.fund_players(&mut state).await?;

        let mut report = GameReport::default();
        for spin in 0..self.config.spins {
            let user = (spin % self.config.players) as UserId;
            let response = loop {
                match self
                    .cascade
                    .spin(&mut state, user, self.config.bet, &mut self.rng)
                    .await
                {
                    Ok(response) => break response,
                    Err(SpinError::InsufficientFunds) => {
                        report.top_ups += 1;
                        deposit(&mut state, user, self.config.top_up).await?;
                    }
                    Err(err) => return Err(err.into()),
                }
            };

            report.spins += 1;
            if response.in_free_spin {
                report.free_spins += 1;
            } else {
                report.paid_spins += 1;
                report.total_bet += self.config.bet;
            }
            report.total_payout += response.total_payout;
            if response.awarded_free_spins > 0 {
                report.scatter_triggers += 1;
            }
        }

        let snapshot = self.cascade.controller().snapshot();
        report.final_preset = snapshot.preset_index;
        report.controller_rtp = snapshot.current_rtp;
        report.adjustments = self.cascade.controller().adjustments().len();
        Ok(report)
    }
}

pub fn log_report(game: &str, report: &GameReport) {
    info!(
        game,
        spins = report.spins,
        paid = report.paid_spins,
        free = report.free_spins,
        total_bet = report.total_bet,
        total_payout = report.total_payout,
        realized_rtp = report.realized_rtp(),
        controller_rtp = report.controller_rtp,
        final_preset = report.final_preset,
        adjustments = report.adjustments,
        scatter_triggers = report.scatter_triggers,
        "batch complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            spins: 500,
            players: 4,
            bet: 10,
            seed: 42,
            top_up: 100_000,
        }
    }

    #[tokio::test]
    async fn test_line_batch_accounting() {
        let mut simulator = Simulator::new(small_config());
        let report = simulator.run_line().await.unwrap();

        assert_eq!(report.spins, 500);
        assert_eq!(report.paid_spins + report.free_spins, 500);
        assert_eq!(report.total_bet as u64, report.paid_spins * 10);
        assert!(report.total_payout >= 0);
        assert!(report.final_preset < 6);
    }

    #[tokio::test]
    async fn test_cascade_batch_accounting() {
        let mut simulator = Simulator::new(small_config());
        let report = simulator.run_cascade().await.unwrap();

        assert_eq!(report.spins, 500);
        assert_eq!(report.total_bet as u64, report.paid_spins * 10);
        assert!(report.final_preset < 6);
    }

    #[tokio::test]
    async fn test_batches_are_reproducible() {
        let report_a = Simulator::new(small_config()).run_line().await.unwrap();
        let report_b = Simulator::new(small_config()).run_line().await.unwrap();
        assert_eq!(report_a.total_payout, report_b.total_payout);
        assert_eq!(report_a.free_spins, report_b.free_spins);
        assert_eq!(report_a.final_preset, report_b.final_preset);
    }
}
