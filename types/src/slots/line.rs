use serde::{Deserialize, Serialize};

use super::{LINE_REELS, LINE_ROWS, MAX_STICKY_WILDS};
use crate::Amount;

/// Symbols on the Line board.
///
/// `S1..S8` are regular symbols in descending value. `W` substitutes for any
/// regular symbol in a line; `W2..W5` are the sticky variants drawn during
/// free spins, carrying their declared multiplier. `B` is the scatter,
/// counted across the whole board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LineSymbol {
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    S8,
    #[serde(rename = "W")]
    Wild,
    #[serde(rename = "W2")]
    Wild2,
    #[serde(rename = "W3")]
    Wild3,
    #[serde(rename = "W4")]
    Wild4,
    #[serde(rename = "W5")]
    Wild5,
    #[serde(rename = "B")]
    Scatter,
}

impl LineSymbol {
    pub const REGULAR: [LineSymbol; 8] = [
        LineSymbol::S1,
        LineSymbol::S2,
        LineSymbol::S3,
        LineSymbol::S4,
        LineSymbol::S5,
        LineSymbol::S6,
        LineSymbol::S7,
        LineSymbol::S8,
    ];

    /// True for `W` and every sticky variant.
    pub fn is_wild(&self) -> bool {
        matches!(
            self,
            LineSymbol::Wild
                | LineSymbol::Wild2
                | LineSymbol::Wild3
                | LineSymbol::Wild4
                | LineSymbol::Wild5
        )
    }

    pub fn is_scatter(&self) -> bool {
        matches!(self, LineSymbol::Scatter)
    }

    pub fn is_regular(&self) -> bool {
        !self.is_wild() && !self.is_scatter()
    }

    /// Declared multiplier of a sticky wild variant; plain `W` counts as 1.
    pub fn wild_multiplier(&self) -> Option<u32> {
        match self {
            LineSymbol::Wild => Some(1),
            LineSymbol::Wild2 => Some(2),
            LineSymbol::Wild3 => Some(3),
            LineSymbol::Wild4 => Some(4),
            LineSymbol::Wild5 => Some(5),
            _ => None,
        }
    }
}

/// 5×3 board, reel-major: `board[reel][row]`.
pub type LineBoard = [[LineSymbol; LINE_ROWS]; LINE_REELS];

/// A wild that stays on the board for the remainder of a free-spin session.
/// Persists as a `[reel, row, multiplier]` triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u8, u8, u8)", into = "(u8, u8, u8)")]
pub struct StickyWild {
    pub reel: u8,
    pub row: u8,
    pub multiplier: u8,
}

impl From<(u8, u8, u8)> for StickyWild {
    fn from((reel, row, multiplier): (u8, u8, u8)) -> Self {
        Self {
            reel,
            row,
            multiplier,
        }
    }
}

impl From<StickyWild> for (u8, u8, u8) {
    fn from(wild: StickyWild) -> Self {
        (wild.reel, wild.row, wild.multiplier)
    }
}

/// Per-player persistent state for the Line game.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineGameState {
    pub free_spins: u32,
    pub sticky_wilds: Vec<StickyWild>,
}

impl LineGameState {
    /// Append a sticky wild, keeping at most one entry per `(reel, row)` and
    /// at most [`MAX_STICKY_WILDS`] entries overall. Returns whether the wild
    /// was recorded.
    pub fn add_sticky_wild(&mut self, wild: StickyWild) -> bool {
        if self.sticky_wilds.len() >= MAX_STICKY_WILDS {
            return false;
        }
        if self
            .sticky_wilds
            .iter()
            .any(|w| w.reel == wild.reel && w.row == wild.row)
        {
            return false;
        }
        self.sticky_wilds.push(wild);
        true
    }

    pub fn sticky_wild_at(&self, reel: usize, row: usize) -> Option<&StickyWild> {
        self.sticky_wilds
            .iter()
            .find(|w| w.reel as usize == reel && w.row as usize == row)
    }
}

/// A single winning payline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineWin {
    /// 1-indexed payline number
    pub line: u32,
    pub symbol: LineSymbol,
    /// Length of the matched prefix from reel 0
    pub count: u8,
    pub payout: Amount,
}

/// Result of one Line spin, before wallet settlement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpinOutcome {
    pub board: LineBoard,
    pub line_wins: Vec<LineWin>,
    pub scatter_count: u32,
    pub awarded_free_spins: u32,
    pub total_payout: Amount,
}
