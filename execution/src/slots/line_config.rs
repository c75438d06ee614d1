//! Line engine configuration: presets, paylines, paytable and award tables.
//!
//! Presets are ranked least→most generous; the RTP controller only ever
//! hands the engine an index into this ladder. Base-game reels must sum to
//! exactly 100 per reel and bonus-game reels to exactly 1000 per reel; the
//! engine refuses to spin on a preset that violates either sum.

use std::collections::BTreeMap;

use reelhouse_types::slots::{
    LineSymbol, BASE_PRESET_WEIGHT_SUM, BONUS_PRESET_WEIGHT_SUM, LINE_REELS, PAYLINE_COUNT,
};
use reelhouse_types::Amount;

use super::SpinError;

/// Per-reel symbol weights for one generosity level.
#[derive(Clone, Debug)]
pub struct RtpPreset {
    pub name: &'static str,
    /// Base-game weights, one table per reel, each summing to 100.
    pub base_reels: [Vec<(LineSymbol, u32)>; LINE_REELS],
    /// Bonus-game weights, one table per reel, each summing to 1000. These
    /// draw the sticky variants `W2..W5` instead of plain `W`.
    pub bonus_reels: [Vec<(LineSymbol, u32)>; LINE_REELS],
}

#[derive(Clone, Debug)]
pub struct LineConfig {
    presets: Vec<RtpPreset>,
    paylines: [[usize; LINE_REELS]; PAYLINE_COUNT],
    paytable: BTreeMap<LineSymbol, BTreeMap<u8, Amount>>,
    free_spins_by_scatter: BTreeMap<u32, u32>,
    wild_multipliers: BTreeMap<LineSymbol, u8>,
}

/// The 20 fixed paylines, as row indices per reel.
const PAYLINES: [[usize; LINE_REELS]; PAYLINE_COUNT] = [
    [1, 1, 1, 1, 1],
    [0, 0, 0, 0, 0],
    [2, 2, 2, 2, 2],
    [0, 1, 2, 1, 0],
    [2, 1, 0, 1, 2],
    [0, 0, 1, 0, 0],
    [2, 2, 1, 2, 2],
    [1, 0, 0, 0, 1],
    [1, 2, 2, 2, 1],
    [1, 0, 1, 0, 1],
    [1, 2, 1, 2, 1],
    [0, 1, 0, 1, 0],
    [2, 1, 2, 1, 2],
    [1, 1, 0, 1, 1],
    [1, 1, 2, 1, 1],
    [0, 1, 1, 1, 2],
    [2, 1, 1, 1, 0],
    [0, 0, 1, 2, 2],
    [2, 2, 1, 0, 0],
    [1, 0, 2, 0, 1],
];

/// Build identical weight tables for all five reels from one mapping.
fn reels_from(weights: &[(LineSymbol, u32)]) -> [Vec<(LineSymbol, u32)>; LINE_REELS] {
    std::array::from_fn(|_| weights.to_vec())
}

/// Derive the bonus table from a base table: every weight is scaled by 10,
/// and the plain wild's share is split 4:3:2:1 across `W2..W5`. A base table
/// summing to 100 therefore yields a bonus table summing to exactly 1000.
fn bonus_from(base: &[(LineSymbol, u32)]) -> Vec<(LineSymbol, u32)> {
    let mut bonus = Vec::with_capacity(base.len() + 3);
    for (symbol, weight) in base {
        if *symbol == LineSymbol::Wild {
            bonus.push((LineSymbol::Wild2, 4 * weight));
            bonus.push((LineSymbol::Wild3, 3 * weight));
            bonus.push((LineSymbol::Wild4, 2 * weight));
            bonus.push((LineSymbol::Wild5, *weight));
        } else {
            bonus.push((*symbol, 10 * weight));
        }
    }
    bonus
}

fn preset(name: &'static str, base: &[(LineSymbol, u32)]) -> RtpPreset {
    let bonus = bonus_from(base);
    RtpPreset {
        name,
        base_reels: reels_from(base),
        bonus_reels: reels_from(&bonus),
    }
}

impl LineConfig {
    /// The production ladder: six presets, least generous first.
    pub fn standard() -> Self {
        use LineSymbol::*;

        let presets = vec![
            preset(
                "cold",
                &[
                    (S1, 2),
                    (S2, 4),
                    (S3, 6),
                    (S4, 10),
                    (S5, 14),
                    (S6, 18),
                    (S7, 22),
                    (S8, 18),
                    (Wild, 2),
                    (Scatter, 4),
                ],
            ),
            preset(
                "cool",
                &[
                    (S1, 3),
                    (S2, 5),
                    (S3, 7),
                    (S4, 10),
                    (S5, 14),
                    (S6, 17),
                    (S7, 20),
                    (S8, 16),
                    (Wild, 3),
                    (Scatter, 5),
                ],
            ),
            preset(
                "balanced",
                &[
                    (S1, 4),
                    (S2, 6),
                    (S3, 8),
                    (S4, 11),
                    (S5, 13),
                    (S6, 16),
                    (S7, 17),
                    (S8, 14),
                    (Wild, 5),
                    (Scatter, 6),
                ],
            ),
            preset(
                "warm",
                &[
                    (S1, 5),
                    (S2, 7),
                    (S3, 9),
                    (S4, 12),
                    (S5, 13),
                    (S6, 14),
                    (S7, 15),
                    (S8, 12),
                    (Wild, 6),
                    (Scatter, 7),
                ],
            ),
            preset(
                "hot",
                &[
                    (S1, 6),
                    (S2, 8),
                    (S3, 10),
                    (S4, 12),
                    (S5, 13),
                    (S6, 13),
                    (S7, 14),
                    (S8, 10),
                    (Wild, 7),
                    (Scatter, 7),
                ],
            ),
            preset(
                "scorching",
                &[
                    (S1, 8),
                    (S2, 9),
                    (S3, 11),
                    (S4, 12),
                    (S5, 12),
                    (S6, 12),
                    (S7, 12),
                    (S8, 9),
                    (Wild, 8),
                    (Scatter, 7),
                ],
            ),
        ];

        let mut paytable: BTreeMap<LineSymbol, BTreeMap<u8, Amount>> = BTreeMap::new();
        paytable.insert(S1, BTreeMap::from([(3, 150), (4, 400), (5, 1_500)]));
        paytable.insert(S2, BTreeMap::from([(3, 120), (4, 300), (5, 1_000)]));
        paytable.insert(S3, BTreeMap::from([(3, 100), (4, 250), (5, 750)]));
        paytable.insert(S4, BTreeMap::from([(3, 80), (4, 200), (5, 500)]));
        paytable.insert(S5, BTreeMap::from([(3, 60), (4, 150), (5, 400)]));
        paytable.insert(S6, BTreeMap::from([(3, 40), (4, 100), (5, 250)]));
        paytable.insert(S7, BTreeMap::from([(3, 30), (4, 80), (5, 200)]));
        // S8 is the only symbol that already pays from two of a kind.
        paytable.insert(S8, BTreeMap::from([(2, 10), (3, 25), (4, 60), (5, 150)]));

        Self {
            presets,
            paylines: PAYLINES,
            paytable,
            free_spins_by_scatter: BTreeMap::from([(3, 15), (4, 20), (5, 25)]),
            wild_multipliers: BTreeMap::from([
                (Wild2, 2),
                (Wild3, 3),
                (Wild4, 4),
                (Wild5, 5),
            ]),
        }
    }

    /// Test constructor with explicit parts.
    pub fn with_presets(
        presets: Vec<RtpPreset>,
        paytable: BTreeMap<LineSymbol, BTreeMap<u8, Amount>>,
        free_spins_by_scatter: BTreeMap<u32, u32>,
    ) -> Self {
        use LineSymbol::*;
        Self {
            presets,
            paylines: PAYLINES,
            paytable,
            free_spins_by_scatter,
            wild_multipliers: BTreeMap::from([
                (Wild2, 2),
                (Wild3, 3),
                (Wild4, 4),
                (Wild5, 5),
            ]),
        }
    }

    pub fn preset_count(&self) -> usize {
        self.presets.len()
    }

    pub fn preset_names(&self) -> Vec<&'static str> {
        self.presets.iter().map(|p| p.name).collect()
    }

    /// Resolve a preset by controller index. An out-of-range index falls back
    /// to the least generous preset; the controller must never block a spin.
    pub fn preset(&self, index: usize) -> &RtpPreset {
        match self.presets.get(index) {
            Some(preset) => preset,
            None => {
                tracing::warn!(index, count = self.presets.len(), "preset index out of range, falling back to 0");
                &self.presets[0]
            }
        }
    }

    /// Fail closed if the preset's reels do not sum to the expected totals.
    pub fn validate_preset(&self, index: usize) -> Result<(), SpinError> {
        let preset = self.preset(index);
        for (reel, weights) in preset.base_reels.iter().enumerate() {
            let sum: u32 = weights.iter().map(|(_, w)| w).sum();
            if sum != BASE_PRESET_WEIGHT_SUM {
                return Err(SpinError::ConfigInvalid(format!(
                    "preset {} base reel {reel} sums to {sum}, expected {BASE_PRESET_WEIGHT_SUM}",
                    preset.name
                )));
            }
        }
        for (reel, weights) in preset.bonus_reels.iter().enumerate() {
            let sum: u32 = weights.iter().map(|(_, w)| w).sum();
            if sum != BONUS_PRESET_WEIGHT_SUM {
                return Err(SpinError::ConfigInvalid(format!(
                    "preset {} bonus reel {reel} sums to {sum}, expected {BONUS_PRESET_WEIGHT_SUM}",
                    preset.name
                )));
            }
        }
        Ok(())
    }

    pub fn paylines(&self) -> &[[usize; LINE_REELS]; PAYLINE_COUNT] {
        &self.paylines
    }

    /// Paytable coefficient for `count` matched symbols, as a percent-of-bet
    /// numerator (`payout = coeff · bet / 100`).
    pub fn payout_coeff(&self, symbol: LineSymbol, count: u8) -> Option<Amount> {
        self.paytable.get(&symbol)?.get(&count).copied()
    }

    /// Smallest paying match length for the symbol.
    pub fn min_count(&self, symbol: LineSymbol) -> Option<u8> {
        self.paytable.get(&symbol)?.keys().next().copied()
    }

    pub fn free_spins_for_scatters(&self, count: u32) -> u32 {
        if count < 3 {
            return 0;
        }
        // Boards can show more scatters than the table's top entry; the top
        // award applies from there on.
        let max_key = self.free_spins_by_scatter.keys().max().copied().unwrap_or(0);
        let key = count.min(max_key);
        self.free_spins_by_scatter.get(&key).copied().unwrap_or(0)
    }

    /// Declared multiplier of a sticky wild variant.
    pub fn wild_multiplier(&self, symbol: LineSymbol) -> Option<u8> {
        self.wild_multipliers.get(&symbol).copied()
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self::standard()
    }
}
