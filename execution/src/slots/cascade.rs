//! Cascade engine: 7×7 cluster pays with symbol removal, gravity, refill
//! and persistent per-cell win multipliers.
//!
//! The engine receives the persisted [`CascadeGameState`] from the
//! transaction layer (already reset if this is a paid spin), mutates the
//! multiplier and hit grids as clusters clear, and returns an outcome for
//! the layer to settle against the wallet.

use rand::Rng;

use reelhouse_types::slots::{
    CascadeBoard, CascadeGameState, CascadeSpinOutcome, CascadeStep, CellPosition, ClusterInfo,
    RefillCell, BONUS_SYMBOL, CASCADE_SIZE, EMPTY_CELL, MAX_CASCADE_ITERATIONS, MIN_CLUSTER_SIZE,
};
use reelhouse_types::Amount;

use super::cascade_config::CascadeConfig;
use super::rng::{chance, weighted_pick};
use super::{apply_max_payout, SpinError};

struct Cluster {
    symbol: i8,
    cells: Vec<(usize, usize)>,
}

/// One Cascade spin: fill, then resolve clusters until the board settles or
/// the iteration bound trips.
pub fn spin<R: Rng>(
    config: &CascadeConfig,
    preset_index: usize,
    bet: Amount,
    state: &mut CascadeGameState,
    rng: &mut R,
) -> Result<CascadeSpinOutcome, SpinError> {
    config.validate_preset(preset_index)?;
    let weights = &config.preset(preset_index).weights;

    let mut board = fill_board(weights, config.bonus_probability(), rng)?;
    let initial_board = board;

    let mut cascades = Vec::new();
    let mut total_win: Amount = 0;

    // Refill keeps injecting fresh symbols, so termination is probabilistic;
    // the bound makes it certain.
    for _ in 0..MAX_CASCADE_ITERATIONS {
        let Some((clusters, step_win)) = settle_clusters(config, &mut board, state, bet)? else {
            break;
        };
        total_win = total_win.saturating_add(step_win);

        collapse(&mut board);
        let new_symbols = refill(&mut board, weights, config.bonus_probability(), rng)?;
        cascades.push(CascadeStep {
            clusters,
            new_symbols,
        });
    }

    let scatter_count = count_bonus_symbols(&board);
    Ok(CascadeSpinOutcome {
        initial_board,
        board,
        cascades,
        scatter_count,
        awarded_free_spins: config.free_spins_for_bonuses(scatter_count),
        total_payout: apply_max_payout(total_win, bet),
    })
}

fn fill_cell<R: Rng>(
    weights: &[(i8, u32)],
    bonus_probability: f64,
    rng: &mut R,
) -> Result<i8, SpinError> {
    if chance(rng, bonus_probability) {
        return Ok(BONUS_SYMBOL);
    }
    weighted_pick(rng, weights).ok_or(SpinError::InvariantViolation("empty symbol weight table"))
}

fn fill_board<R: Rng>(
    weights: &[(i8, u32)],
    bonus_probability: f64,
    rng: &mut R,
) -> Result<CascadeBoard, SpinError> {
    let mut board = [[EMPTY_CELL; CASCADE_SIZE]; CASCADE_SIZE];
    for row in board.iter_mut() {
        for cell in row.iter_mut() {
            *cell = fill_cell(weights, bonus_probability, rng)?;
        }
    }
    Ok(board)
}

/// Score and clear every paying cluster on the board. Returns `None` when no
/// cluster of [`MIN_CLUSTER_SIZE`] exists.
fn settle_clusters(
    config: &CascadeConfig,
    board: &mut CascadeBoard,
    state: &mut CascadeGameState,
    bet: Amount,
) -> Result<Option<(Vec<ClusterInfo>, Amount)>, SpinError> {
    let clusters = find_clusters(board);
    if clusters.is_empty() {
        return Ok(None);
    }

    let mut infos = Vec::with_capacity(clusters.len());
    let mut step_win: Amount = 0;
    for cluster in clusters {
        let size = cluster.cells.len();
        if size < MIN_CLUSTER_SIZE {
            return Err(SpinError::InvariantViolation("cluster below minimum size"));
        }

        let base = config.payout_base(cluster.symbol);
        let base_win = base.saturating_mul(size as Amount);
        let mult_sum: u64 = cluster
            .cells
            .iter()
            .map(|&(r, c)| state.multipliers[r][c] as u64)
            .sum();
        let avg_mult = ((mult_sum / size as u64) as u32).max(1);
        let payout = base_win
            .saturating_mul(avg_mult as Amount)
            .saturating_mul(bet);
        step_win = step_win.saturating_add(payout);

        for &(r, c) in &cluster.cells {
            state.record_hit(r, c);
            board[r][c] = EMPTY_CELL;
        }

        infos.push(ClusterInfo {
            symbol: cluster.symbol,
            cells: cluster
                .cells
                .iter()
                .map(|&(r, c)| CellPosition {
                    row: r as u8,
                    col: c as u8,
                })
                .collect(),
            count: size as u32,
            multiplier: avg_mult,
            payout,
        });
    }
    Ok(Some((infos, step_win)))
}

/// 4-connected components of identical regular symbols with at least
/// [`MIN_CLUSTER_SIZE`] cells. The bonus symbol never clusters.
fn find_clusters(board: &CascadeBoard) -> Vec<Cluster> {
    let mut visited = [[false; CASCADE_SIZE]; CASCADE_SIZE];
    let mut clusters = Vec::new();

    for row in 0..CASCADE_SIZE {
        for col in 0..CASCADE_SIZE {
            if visited[row][col] {
                continue;
            }
            let symbol = board[row][col];
            if symbol == EMPTY_CELL || symbol == BONUS_SYMBOL {
                continue;
            }

            let mut component = Vec::new();
            let mut queue = vec![(row, col)];
            visited[row][col] = true;
            while let Some((r, c)) = queue.pop() {
                component.push((r, c));
                let mut push = |nr: usize, nc: usize| {
                    if !visited[nr][nc] && board[nr][nc] == symbol {
                        visited[nr][nc] = true;
                        queue.push((nr, nc));
                    }
                };
                if r > 0 {
                    push(r - 1, c);
                }
                if r + 1 < CASCADE_SIZE {
                    push(r + 1, c);
                }
                if c > 0 {
                    push(r, c - 1);
                }
                if c + 1 < CASCADE_SIZE {
                    push(r, c + 1);
                }
            }

            if component.len() >= MIN_CLUSTER_SIZE {
                clusters.push(Cluster {
                    symbol,
                    cells: component,
                });
            }
        }
    }
    clusters
}

/// Compact every column toward the bottom, preserving relative order; the
/// vacated top cells become empty.
fn collapse(board: &mut CascadeBoard) {
    for col in 0..CASCADE_SIZE {
        let stack: Vec<i8> = (0..CASCADE_SIZE)
            .map(|row| board[row][col])
            .filter(|&s| s != EMPTY_CELL)
            .collect();
        for row in 0..CASCADE_SIZE {
            board[row][col] = EMPTY_CELL;
        }
        let offset = CASCADE_SIZE - stack.len();
        for (i, symbol) in stack.into_iter().enumerate() {
            board[offset + i][col] = symbol;
        }
    }
}

/// Fill every empty cell with a fresh symbol, using the same rule as the
/// initial fill, and report what dropped in.
fn refill<R: Rng>(
    board: &mut CascadeBoard,
    weights: &[(i8, u32)],
    bonus_probability: f64,
    rng: &mut R,
) -> Result<Vec<RefillCell>, SpinError> {
    let mut new_symbols = Vec::new();
    for row in 0..CASCADE_SIZE {
        for col in 0..CASCADE_SIZE {
            if board[row][col] == EMPTY_CELL {
                let symbol = fill_cell(weights, bonus_probability, rng)?;
                board[row][col] = symbol;
                new_symbols.push(RefillCell {
                    row: row as u8,
                    col: col as u8,
                    symbol,
                });
            }
        }
    }
    Ok(new_symbols)
}

pub fn count_bonus_symbols(board: &CascadeBoard) -> u32 {
    board
        .iter()
        .flatten()
        .filter(|&&s| s == BONUS_SYMBOL)
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::seeded_rng;
    use reelhouse_types::slots::CELL_MULTIPLIER_CAP;
    use std::collections::BTreeMap;

    /// A board with no cluster: symbols cycle with period 3 along each
    /// diagonal stripe, so no two orthogonal neighbours match.
    fn quiet_board() -> CascadeBoard {
        let mut board = [[EMPTY_CELL; CASCADE_SIZE]; CASCADE_SIZE];
        for (r, row) in board.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = ((r + 2 * c) % 3) as i8;
            }
        }
        board
    }

    /// The quiet board with one plus-shaped cluster of `symbol` stamped in.
    fn board_with_plus_cluster(symbol: i8) -> CascadeBoard {
        let mut board = quiet_board();
        for &(r, c) in &[(3, 3), (2, 3), (4, 3), (3, 2), (3, 4), (3, 5)] {
            board[r][c] = symbol;
        }
        board
    }

    #[test]
    fn test_quiet_board_has_no_clusters() {
        assert!(find_clusters(&quiet_board()).is_empty());
    }

    #[test]
    fn test_find_cluster_of_six() {
        let board = board_with_plus_cluster(5);
        let clusters = find_clusters(&board);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].symbol, 5);
        assert_eq!(clusters[0].cells.len(), 6);
    }

    #[test]
    fn test_four_cells_do_not_cluster() {
        let mut board = quiet_board();
        for &(r, c) in &[(0, 0), (0, 1), (1, 0), (1, 1)] {
            board[r][c] = 6;
        }
        assert!(find_clusters(&board).is_empty());
    }

    #[test]
    fn test_diagonals_are_not_connected() {
        let mut board = quiet_board();
        // Five cells of symbol 4 touching only diagonally.
        for i in 0..5 {
            board[i][i] = 4;
        }
        assert!(find_clusters(&board).is_empty());
    }

    #[test]
    fn test_bonus_symbols_never_cluster() {
        let mut board = quiet_board();
        for c in 0..CASCADE_SIZE {
            board[0][c] = BONUS_SYMBOL;
        }
        assert!(find_clusters(&board).is_empty());
        assert_eq!(count_bonus_symbols(&board), CASCADE_SIZE as u32);
    }

    #[test]
    fn test_collapse_gravity_preserves_order() {
        let mut board = quiet_board();
        board[1][0] = EMPTY_CELL;
        board[4][0] = EMPTY_CELL;
        let kept: Vec<i8> = (0..CASCADE_SIZE)
            .map(|r| board[r][0])
            .filter(|&s| s != EMPTY_CELL)
            .collect();

        collapse(&mut board);

        assert_eq!(board[0][0], EMPTY_CELL);
        assert_eq!(board[1][0], EMPTY_CELL);
        let settled: Vec<i8> = (2..CASCADE_SIZE).map(|r| board[r][0]).collect();
        assert_eq!(settled, kept);
    }

    #[test]
    fn test_collapse_is_idempotent() {
        let mut board = quiet_board();
        board[0][2] = EMPTY_CELL;
        board[3][2] = EMPTY_CELL;
        board[6][5] = EMPTY_CELL;

        let mut once = board;
        collapse(&mut once);
        let mut twice = once;
        collapse(&mut twice);
        assert_eq!(once, twice);
    }

    fn single_cluster_config() -> CascadeConfig {
        CascadeConfig::with_parts(
            vec![crate::slots::cascade_config::CascadePreset {
                name: "test",
                weights: (0..7).map(|s| (s as i8, 10)).collect(),
            }],
            0.04,
            BTreeMap::from([(3, 10)]),
            BTreeMap::from([(3, 10)]),
        )
    }

    #[test]
    fn test_single_cluster_payout() {
        // Cluster of six symbol-3 cells, paytable[3] = 10, bet 2, all
        // multipliers 1: the step pays 10·6·1·2 = 120 and each cell records
        // one hit.
        let config = single_cluster_config();
        let mut board = board_with_plus_cluster(3);
        let mut state = CascadeGameState::default();

        let (clusters, step_win) = settle_clusters(&config, &mut board, &mut state, 2)
            .unwrap()
            .unwrap();
        assert_eq!(step_win, 120);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count, 6);
        assert_eq!(clusters[0].multiplier, 1);
        assert_eq!(clusters[0].payout, 120);

        for cell in &clusters[0].cells {
            let (r, c) = (cell.row as usize, cell.col as usize);
            assert_eq!(board[r][c], EMPTY_CELL);
            assert_eq!(state.hits[r][c], 1);
            assert_eq!(state.multipliers[r][c], 1);
        }
        // Untouched cells keep zero hits.
        assert_eq!(state.hits[0][0], 0);
    }

    #[test]
    fn test_cluster_average_multiplier_floors() {
        let config = single_cluster_config();
        let mut board = board_with_plus_cluster(3);
        let mut state = CascadeGameState::default();
        // Two cells at ×4, the remaining four at ×1: avg = ⌊12/6⌋ = 2.
        state.multipliers[3][3] = 4;
        state.multipliers[3][4] = 4;

        let (clusters, step_win) = settle_clusters(&config, &mut board, &mut state, 2)
            .unwrap()
            .unwrap();
        assert_eq!(clusters[0].multiplier, 2);
        assert_eq!(step_win, 10 * 6 * 2 * 2);
    }

    #[test]
    fn test_repeated_clearing_doubles_multipliers() {
        let config = single_cluster_config();
        let mut state = CascadeGameState::default();

        for expected_mult in [1u32, 2, 4, 8] {
            let mut board = board_with_plus_cluster(3);
            let (clusters, _) = settle_clusters(&config, &mut board, &mut state, 2)
                .unwrap()
                .unwrap();
            assert_eq!(clusters[0].multiplier, expected_mult);
        }
        // After four clearings every cluster cell sits at ×8.
        assert_eq!(state.multipliers[3][3], 8);
        assert_eq!(state.hits[3][3], 4);
    }

    #[test]
    fn test_full_spin_invariants() {
        let config = CascadeConfig::standard();
        let mut rng = seeded_rng(2024);
        for spin_index in 0..200 {
            let mut state = CascadeGameState::default();
            let bet = 10;
            let outcome = spin(&config, 2, bet, &mut state, &mut rng).unwrap();

            assert!(outcome.total_payout >= 0, "spin {spin_index}");
            assert!(outcome.total_payout <= bet * 10_000);
            assert!(outcome.cascades.len() <= MAX_CASCADE_ITERATIONS);
            for step in &outcome.cascades {
                for cluster in &step.clusters {
                    assert!(cluster.count as usize >= MIN_CLUSTER_SIZE);
                    assert_eq!(cluster.cells.len(), cluster.count as usize);
                    assert!(cluster.multiplier >= 1);
                }
            }
            // The persisted grids respect the doubling invariant.
            for r in 0..CASCADE_SIZE {
                for c in 0..CASCADE_SIZE {
                    let expected = match state.hits[r][c] {
                        0 | 1 => 1,
                        h => (1u32 << (h - 1).min(31)).min(CELL_MULTIPLIER_CAP),
                    };
                    assert_eq!(state.multipliers[r][c], expected);
                }
            }
            // Final board has no empty cells.
            assert!(outcome.board.iter().flatten().all(|&s| s != EMPTY_CELL));
            assert_eq!(
                outcome.scatter_count,
                count_bonus_symbols(&outcome.board)
            );
        }
    }

    #[test]
    fn test_spin_is_deterministic_per_seed() {
        let config = CascadeConfig::standard();
        let mut rng1 = seeded_rng(77);
        let mut rng2 = seeded_rng(77);
        let mut state1 = CascadeGameState::default();
        let mut state2 = CascadeGameState::default();

        let out1 = spin(&config, 3, 20, &mut state1, &mut rng1).unwrap();
        let out2 = spin(&config, 3, 20, &mut state2, &mut rng2).unwrap();
        assert_eq!(out1, out2);
        assert_eq!(state1, state2);
    }

    #[test]
    fn test_invalid_preset_fails_closed() {
        let config = CascadeConfig::with_parts(
            vec![crate::slots::cascade_config::CascadePreset {
                name: "empty",
                weights: vec![(0, 0)],
            }],
            0.04,
            BTreeMap::new(),
            BTreeMap::new(),
        );
        let mut rng = seeded_rng(0);
        let mut state = CascadeGameState::default();
        assert!(matches!(
            spin(&config, 0, 10, &mut state, &mut rng),
            Err(SpinError::ConfigInvalid(_))
        ));
    }
}
