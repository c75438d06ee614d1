//! Line engine: 5×3 reels, 20 fixed paylines, wilds, scatters and
//! sticky-wild free spins.
//!
//! The engine is pure with respect to the store: it receives the persisted
//! [`LineGameState`] from the transaction layer, mutates the sticky-wild
//! list in place during free spins, and returns an outcome for the layer to
//! settle against the wallet.

use rand::Rng;

use reelhouse_types::slots::{
    LineBoard, LineGameState, LineSpinOutcome, LineSymbol, LineWin, StickyWild, LINE_REELS,
    LINE_ROWS,
};
use reelhouse_types::Amount;

use super::line_config::LineConfig;
use super::rng::{uniform_int, weighted_pick, weighted_pick_where};
use super::{apply_max_payout, SpinError};

/// Reels that can turn fully wild when their first sample is `W`.
fn is_middle_reel(reel: usize) -> bool {
    (1..=3).contains(&reel)
}

fn sticky_symbol(multiplier: u8) -> LineSymbol {
    match multiplier {
        2 => LineSymbol::Wild2,
        3 => LineSymbol::Wild3,
        4 => LineSymbol::Wild4,
        5 => LineSymbol::Wild5,
        _ => LineSymbol::Wild,
    }
}

/// One base-game spin.
pub fn base_spin<R: Rng>(
    config: &LineConfig,
    preset_index: usize,
    bet: Amount,
    rng: &mut R,
) -> Result<LineSpinOutcome, SpinError> {
    config.validate_preset(preset_index)?;
    let board = generate_board(&config.preset(preset_index).base_reels, rng)?;
    Ok(settle(config, board, bet, false))
}

/// One free spin. Persisted sticky wilds are written onto the board before
/// sampling; sticky variants drawn this spin are appended to `state`.
pub fn free_spin<R: Rng>(
    config: &LineConfig,
    preset_index: usize,
    bet: Amount,
    state: &mut LineGameState,
    rng: &mut R,
) -> Result<LineSpinOutcome, SpinError> {
    config.validate_preset(preset_index)?;
    let board = generate_free_spin_board(config, preset_index, state, rng)?;
    Ok(settle(config, board, bet, true))
}

/// The purchased-bonus spin: a board with exactly three pre-seeded scatters
/// on distinct reels, generated with the base rules otherwise.
pub fn bonus_spin<R: Rng>(
    config: &LineConfig,
    preset_index: usize,
    bet: Amount,
    rng: &mut R,
) -> Result<LineSpinOutcome, SpinError> {
    config.validate_preset(preset_index)?;
    let board = generate_bonus_board(&config.preset(preset_index).base_reels, rng)?;
    Ok(settle(config, board, bet, false))
}

/// Score a generated board: payline wins, whole-board scatters, free-spin
/// awards and the payout cap.
fn settle(config: &LineConfig, board: LineBoard, bet: Amount, free_spin: bool) -> LineSpinOutcome {
    let line_wins = evaluate_lines(config, &board, bet, free_spin);
    let line_total = line_wins
        .iter()
        .fold(0 as Amount, |acc, w| acc.saturating_add(w.payout));
    let scatter_count = count_scatters(&board);
    LineSpinOutcome {
        board,
        line_wins,
        scatter_count,
        awarded_free_spins: config.free_spins_for_scatters(scatter_count),
        total_payout: apply_max_payout(line_total, bet),
    }
}

fn sample_cell<R: Rng>(
    weights: &[(LineSymbol, u32)],
    has_scatter: bool,
    rng: &mut R,
) -> Result<LineSymbol, SpinError> {
    let mut symbol = weighted_pick(rng, weights)
        .ok_or(SpinError::InvariantViolation("empty reel weight table"))?;
    if symbol.is_scatter() && has_scatter {
        // One scatter per reel: re-roll once, then exclude outright.
        symbol = weighted_pick(rng, weights)
            .ok_or(SpinError::InvariantViolation("empty reel weight table"))?;
        if symbol.is_scatter() {
            symbol = weighted_pick_where(rng, weights, |s| !s.is_scatter())
                .ok_or(SpinError::InvariantViolation("reel weights contain only scatters"))?;
        }
    }
    Ok(symbol)
}

fn generate_board<R: Rng>(
    reels: &[Vec<(LineSymbol, u32)>; LINE_REELS],
    rng: &mut R,
) -> Result<LineBoard, SpinError> {
    let mut board = [[LineSymbol::S1; LINE_ROWS]; LINE_REELS];
    for (reel, weights) in reels.iter().enumerate() {
        let mut has_scatter = false;
        for row in 0..LINE_ROWS {
            let symbol = sample_cell(weights, has_scatter, rng)?;
            if row == 0 && is_middle_reel(reel) && symbol == LineSymbol::Wild {
                board[reel] = [LineSymbol::Wild; LINE_ROWS];
                break;
            }
            if symbol.is_scatter() {
                has_scatter = true;
            }
            board[reel][row] = symbol;
        }
    }
    Ok(board)
}

fn generate_free_spin_board<R: Rng>(
    config: &LineConfig,
    preset_index: usize,
    state: &mut LineGameState,
    rng: &mut R,
) -> Result<LineBoard, SpinError> {
    let mut board = [[LineSymbol::S1; LINE_ROWS]; LINE_REELS];
    for reel in 0..LINE_REELS {
        let mut has_scatter = false;
        for row in 0..LINE_ROWS {
            // Sticky cells keep their wild; they are never resampled.
            if let Some(wild) = state.sticky_wild_at(reel, row).copied() {
                board[reel][row] = sticky_symbol(wild.multiplier);
                continue;
            }
            let weights = &config.preset(preset_index).bonus_reels[reel];
            let symbol = sample_cell(weights, has_scatter, rng)?;
            if symbol.is_scatter() {
                has_scatter = true;
            }
            if let Some(multiplier) = config.wild_multiplier(symbol) {
                state.add_sticky_wild(StickyWild {
                    reel: reel as u8,
                    row: row as u8,
                    multiplier,
                });
            }
            board[reel][row] = symbol;
        }
    }
    Ok(board)
}

fn generate_bonus_board<R: Rng>(
    reels: &[Vec<(LineSymbol, u32)>; LINE_REELS],
    rng: &mut R,
) -> Result<LineBoard, SpinError> {
    // Exactly three distinct reels get one pre-seeded scatter each, at a
    // random row.
    let mut bonus_rows: [Option<usize>; LINE_REELS] = [None; LINE_REELS];
    for reel in rand::seq::index::sample(rng, LINE_REELS, 3).iter() {
        bonus_rows[reel] = Some(uniform_int(rng, LINE_ROWS));
    }

    let mut board = [[LineSymbol::S1; LINE_ROWS]; LINE_REELS];
    for (reel, weights) in reels.iter().enumerate() {
        let seeded_row = bonus_rows[reel];
        let mut has_scatter = seeded_row.is_some();
        let mut first_sample = true;
        for row in 0..LINE_ROWS {
            if seeded_row == Some(row) {
                board[reel][row] = LineSymbol::Scatter;
                continue;
            }
            let symbol = sample_cell(weights, has_scatter, rng)?;
            // The full-reel wild rule skips reels holding a pre-seeded
            // scatter.
            if first_sample
                && seeded_row.is_none()
                && is_middle_reel(reel)
                && symbol == LineSymbol::Wild
            {
                board[reel] = [LineSymbol::Wild; LINE_ROWS];
                break;
            }
            first_sample = false;
            if symbol.is_scatter() {
                has_scatter = true;
            }
            board[reel][row] = symbol;
        }
    }
    Ok(board)
}

/// Evaluate all 20 paylines against the board.
///
/// For each line: the base symbol is the first non-wild, non-scatter symbol;
/// the matched prefix from reel 0 accepts the base symbol and any wild. In
/// free spins a prefix containing sticky multipliers switches to the
/// multiplier payout formula.
pub fn evaluate_lines(
    config: &LineConfig,
    board: &LineBoard,
    bet: Amount,
    free_spin: bool,
) -> Vec<LineWin> {
    let mut wins = Vec::new();
    for (index, line) in config.paylines().iter().enumerate() {
        let symbols: [LineSymbol; LINE_REELS] = std::array::from_fn(|r| board[r][line[r]]);

        let Some(base) = symbols.iter().copied().find(|s| s.is_regular()) else {
            continue;
        };

        let mut count = 0usize;
        let mut wild_count: i64 = 0;
        let mut wild_mult_sum: i64 = 0;
        for symbol in &symbols {
            if *symbol == base {
                count += 1;
            } else if symbol.is_wild() {
                count += 1;
                wild_count += 1;
                wild_mult_sum += symbol.wild_multiplier().unwrap_or(1) as i64;
            } else {
                break;
            }
        }

        let Some(min_count) = config.min_count(base) else {
            continue;
        };
        if (count as u8) < min_count {
            continue;
        }
        let Some(coeff) = config.payout_coeff(base, count as u8) else {
            continue;
        };

        let payout = if free_spin && wild_mult_sum > wild_count {
            wild_multiplier_payout(bet, coeff, count, wild_count, wild_mult_sum)
        } else {
            coeff.saturating_mul(bet) / 100
        };

        wins.push(LineWin {
            line: (index + 1) as u32,
            symbol: base,
            count: count as u8,
            payout,
        });
    }
    wins
}

/// Payout of a free-spin line whose prefix holds sticky multipliers:
/// `⌊bet · (pt − base_coeff·c + base_coeff·S)⌋` with `pt = coeff/100` and
/// `base_coeff = k/pt`. Equals the base pay when every wild multiplies by 1
/// and scales linearly with the accumulated multipliers. Evaluated in `f64`,
/// floored once at the end.
fn wild_multiplier_payout(
    bet: Amount,
    coeff: Amount,
    count: usize,
    wild_count: i64,
    wild_mult_sum: i64,
) -> Amount {
    let pt = coeff as f64 / 100.0;
    let base_coeff = count as f64 / pt;
    let value = bet as f64 * (pt - base_coeff * wild_count as f64 + base_coeff * wild_mult_sum as f64);
    value.floor() as Amount
}

pub fn count_scatters(board: &LineBoard) -> u32 {
    board
        .iter()
        .flatten()
        .filter(|s| s.is_scatter())
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::seeded_rng;

    fn board_from_rows(rows: [[LineSymbol; LINE_REELS]; LINE_ROWS]) -> LineBoard {
        // Test fixtures read naturally as rows; the engine stores reel-major.
        std::array::from_fn(|reel| std::array::from_fn(|row| rows[row][reel]))
    }

    fn no_win_board() -> LineBoard {
        use LineSymbol::*;
        // Columns alternate symbol groups so no line can match 2+ from reel 0.
        board_from_rows([
            [S1, S3, S5, S7, S1],
            [S2, S4, S6, S1, S2],
            [S3, S5, S7, S2, S4],
        ])
    }

    #[test]
    fn test_no_win_board_pays_nothing() {
        let config = LineConfig::standard();
        let board = no_win_board();
        let wins = evaluate_lines(&config, &board, 10, false);
        assert!(wins.is_empty());
        assert_eq!(count_scatters(&board), 0);
    }

    #[test]
    fn test_straight_line_win() {
        use LineSymbol::*;
        let config = LineConfig::standard();
        // Middle row carries four S4s; the break reel holds a scatter, which
        // must not extend the prefix.
        let board = board_from_rows([
            [S1, S3, S5, S7, S1],
            [S4, S4, S4, S4, Scatter],
            [S3, S5, S7, S2, S4],
        ]);
        let wins = evaluate_lines(&config, &board, 100, false);
        assert_eq!(wins.len(), 1);
        let win = &wins[0];
        assert_eq!(win.line, 1);
        assert_eq!(win.symbol, S4);
        assert_eq!(win.count, 4);
        // coeff 200 → 200·100/100
        assert_eq!(win.payout, 200);
    }

    #[test]
    fn test_wilds_extend_prefix() {
        use LineSymbol::*;
        let config = LineConfig::standard();
        // W S3 W S3 S7 on the middle row: base is S3, prefix length 4.
        let board = board_from_rows([
            [S1, S5, S5, S7, S1],
            [Wild, S3, Wild, S3, S7],
            [S6, S5, S7, S2, S4],
        ]);
        let wins = evaluate_lines(&config, &board, 100, false);
        let win = wins.iter().find(|w| w.line == 1).unwrap();
        assert_eq!(win.symbol, S3);
        assert_eq!(win.count, 4);
        assert_eq!(win.payout, 250);
    }

    #[test]
    fn test_scatter_on_first_reel_blocks_line() {
        use LineSymbol::*;
        let config = LineConfig::standard();
        // The prefix breaks immediately on the scatter even though four S2s
        // follow.
        let board = board_from_rows([
            [S1, S5, S6, S7, S1],
            [Scatter, S2, S2, S2, S2],
            [S6, S5, S7, S3, S4],
        ]);
        let wins = evaluate_lines(&config, &board, 100, false);
        assert!(wins.iter().all(|w| w.line != 1));
    }

    #[test]
    fn test_s8_pays_from_two() {
        use LineSymbol::*;
        let config = LineConfig::standard();
        let board = board_from_rows([
            [S1, S5, S6, S7, S1],
            [S8, S8, S1, S2, S3],
            [S6, S5, S7, S3, S4],
        ]);
        let wins = evaluate_lines(&config, &board, 100, false);
        let win = wins.iter().find(|w| w.line == 1).unwrap();
        assert_eq!(win.symbol, S8);
        assert_eq!(win.count, 2);
        assert_eq!(win.payout, 10);
    }

    #[test]
    fn test_two_of_a_kind_not_paid_for_other_symbols() {
        use LineSymbol::*;
        let config = LineConfig::standard();
        let board = board_from_rows([
            [S1, S5, S6, S7, S1],
            [S2, S2, S1, S8, S3],
            [S6, S5, S7, S3, S4],
        ]);
        let wins = evaluate_lines(&config, &board, 100, false);
        assert!(wins.iter().all(|w| w.line != 1));
    }

    #[test]
    fn test_wild_multiplier_formula_reduces_to_base_pay() {
        use LineSymbol::*;
        let config = LineConfig::standard();
        // Prefix W S5 S5 with a plain wild (multiplier 1): free-spin payout
        // must equal the base-game payout.
        let board = board_from_rows([
            [S1, S7, S6, S7, S1],
            [Wild, S5, S5, S8, S3],
            [S6, S5, S7, S3, S4],
        ]);
        let base = evaluate_lines(&config, &board, 100, false);
        let free = evaluate_lines(&config, &board, 100, true);
        assert_eq!(base, free);
    }

    #[test]
    fn test_wild_multiplier_formula_scales_with_sticky_sum() {
        use LineSymbol::*;
        let config = LineConfig::standard();
        // Prefix W3 S5 S5: k = 3, coeff 60 → pt = 0.6, base_coeff = 5,
        // c = 1, S = 3 → bet·(0.6 + 5·2) = 100·10.6 = 1060.
        let board = board_from_rows([
            [S1, S7, S6, S7, S1],
            [Wild3, S5, S5, S8, S3],
            [S6, S5, S7, S3, S4],
        ]);
        let wins = evaluate_lines(&config, &board, 100, true);
        let win = wins.iter().find(|w| w.line == 1).unwrap();
        assert_eq!(win.payout, 1_060);
    }

    #[test]
    fn test_scatter_awards_free_spins() {
        use LineSymbol::*;
        let config = LineConfig::standard();
        let board = board_from_rows([
            [Scatter, S5, Scatter, S7, Scatter],
            [S2, S4, S6, S1, S2],
            [S3, S5, S7, S2, S4],
        ]);
        assert_eq!(count_scatters(&board), 3);
        assert_eq!(config.free_spins_for_scatters(count_scatters(&board)), 15);
    }

    #[test]
    fn test_generated_boards_hold_at_most_one_scatter_per_reel() {
        let config = LineConfig::standard();
        let mut rng = seeded_rng(1234);
        for _ in 0..500 {
            let board = generate_board(&config.preset(2).base_reels, &mut rng).unwrap();
            for reel in &board {
                let scatters = reel.iter().filter(|s| s.is_scatter()).count();
                assert!(scatters <= 1);
            }
        }
    }

    #[test]
    fn test_bonus_board_preseeds_three_scatters() {
        let config = LineConfig::standard();
        let mut rng = seeded_rng(99);
        for _ in 0..200 {
            let board = generate_bonus_board(&config.preset(0).base_reels, &mut rng).unwrap();
            let reels_with_scatter = board
                .iter()
                .filter(|reel| reel.iter().any(|s| s.is_scatter()))
                .count();
            assert!(reels_with_scatter >= 3, "board lost a pre-seeded scatter");
            for reel in &board {
                assert!(reel.iter().filter(|s| s.is_scatter()).count() <= 1);
            }
            assert!(count_scatters(&board) >= 3);
        }
    }

    #[test]
    fn test_free_spin_board_keeps_sticky_cells() {
        let config = LineConfig::standard();
        let mut rng = seeded_rng(7);
        let mut state = LineGameState {
            free_spins: 5,
            sticky_wilds: vec![
                StickyWild {
                    reel: 0,
                    row: 0,
                    multiplier: 4,
                },
                StickyWild {
                    reel: 4,
                    row: 2,
                    multiplier: 2,
                },
            ],
        };
        for _ in 0..50 {
            let board = generate_free_spin_board(&config, 2, &mut state, &mut rng).unwrap();
            assert_eq!(board[0][0], LineSymbol::Wild4);
            assert_eq!(board[4][2], LineSymbol::Wild2);
            // Every sticky recorded in state matches its board cell.
            for wild in &state.sticky_wilds {
                assert_eq!(
                    board[wild.reel as usize][wild.row as usize],
                    sticky_symbol(wild.multiplier)
                );
            }
        }
    }

    #[test]
    fn test_free_spin_records_new_wilds() {
        let config = LineConfig::standard();
        let mut rng = seeded_rng(21);
        let mut state = LineGameState {
            free_spins: 10,
            sticky_wilds: Vec::new(),
        };
        // With the 4:3:2:1 wild split at weight 50/1000 per reel, 200 spins
        // draw a sticky wild with near certainty.
        for _ in 0..200 {
            generate_free_spin_board(&config, 2, &mut state, &mut rng).unwrap();
        }
        assert!(!state.sticky_wilds.is_empty());
        for wild in &state.sticky_wilds {
            assert!((2..=5).contains(&wild.multiplier));
            assert!((wild.reel as usize) < LINE_REELS);
            assert!((wild.row as usize) < LINE_ROWS);
        }
    }

    #[test]
    fn test_spin_total_respects_cap() {
        let config = LineConfig::standard();
        let mut rng = seeded_rng(5);
        for _ in 0..300 {
            let outcome = base_spin(&config, 2, 10, &mut rng).unwrap();
            assert!(outcome.total_payout <= 10 * 10_000);
            assert!(outcome.total_payout >= 0);
        }
    }

    #[test]
    fn test_invalid_preset_fails_closed() {
        use std::collections::BTreeMap;

        let bad = crate::slots::line_config::RtpPreset {
            name: "bad",
            base_reels: std::array::from_fn(|_| vec![(LineSymbol::S1, 37)]),
            bonus_reels: std::array::from_fn(|_| vec![(LineSymbol::S1, 37)]),
        };
        let config = LineConfig::with_presets(vec![bad], BTreeMap::new(), BTreeMap::new());
        let mut rng = seeded_rng(0);
        assert!(matches!(
            base_spin(&config, 0, 10, &mut rng),
            Err(SpinError::ConfigInvalid(_))
        ));
    }
}
