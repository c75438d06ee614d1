/// Reels (columns) on the Line board
pub const LINE_REELS: usize = 5;

/// Visible rows per reel on the Line board
pub const LINE_ROWS: usize = 3;

/// Fixed paylines evaluated per Line spin
pub const PAYLINE_COUNT: usize = 20;

/// Side length of the square Cascade board
pub const CASCADE_SIZE: usize = 7;

/// Sentinel for an empty Cascade cell (after cluster removal, before refill)
pub const EMPTY_CELL: i8 = -1;

/// Cascade bonus/scatter symbol; never forms clusters
pub const BONUS_SYMBOL: i8 = 7;

/// Regular Cascade symbols are `0..CASCADE_SYMBOL_COUNT`, ascending in value
pub const CASCADE_SYMBOL_COUNT: usize = 7;

/// Minimum connected-component size that pays as a cluster
pub const MIN_CLUSTER_SIZE: usize = 5;

/// Cap on total per-spin payout, as a multiple of the bet
pub const MAX_PAYOUT_MULTIPLIER: i64 = 10_000;

/// Line bonus-buy price, as a multiple of the base bet
pub const LINE_BONUS_COST_MULTIPLIER: i64 = 100;

/// Free spins granted by a Cascade bonus buy
pub const CASCADE_BONUS_FREE_SPINS: u32 = 10;

/// Upper bound on persisted sticky wilds per player
pub const MAX_STICKY_WILDS: usize = 15;

/// Per-cell win multiplier cap on the Cascade board
pub const CELL_MULTIPLIER_CAP: u32 = 128;

/// Resolution bound for a single Cascade spin. Termination of the
/// collapse/refill loop is probabilistic, so it has to be forced.
pub const MAX_CASCADE_ITERATIONS: usize = 100;

/// Expected per-reel probability sum for base-game Line presets
pub const BASE_PRESET_WEIGHT_SUM: u32 = 100;

/// Expected per-reel probability sum for bonus-game Line presets
pub const BONUS_PRESET_WEIGHT_SUM: u32 = 1_000;
