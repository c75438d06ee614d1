//! Cascade engine configuration: symbol-weight presets, bonus probability,
//! paytable and free-spin awards.

use std::collections::BTreeMap;

use reelhouse_types::slots::CASCADE_SYMBOL_COUNT;
use reelhouse_types::Amount;

use super::SpinError;

/// Regular-symbol weights for one generosity level. More concentrated
/// distributions cluster more often and therefore pay more.
#[derive(Clone, Debug)]
pub struct CascadePreset {
    pub name: &'static str,
    pub weights: Vec<(i8, u32)>,
}

#[derive(Clone, Debug)]
pub struct CascadeConfig {
    presets: Vec<CascadePreset>,
    /// Probability that any filled cell becomes the bonus symbol.
    bonus_probability: f64,
    paytable: BTreeMap<i8, Amount>,
    bonus_awards: BTreeMap<u32, u32>,
}

fn preset(name: &'static str, weights: [u32; CASCADE_SYMBOL_COUNT]) -> CascadePreset {
    CascadePreset {
        name,
        weights: weights
            .iter()
            .enumerate()
            .map(|(symbol, weight)| (symbol as i8, *weight))
            .collect(),
    }
}

impl CascadeConfig {
    pub fn standard() -> Self {
        Self {
            presets: vec![
                preset("cold", [20, 19, 17, 15, 12, 10, 7]),
                preset("cool", [22, 20, 17, 14, 12, 9, 6]),
                preset("balanced", [24, 21, 17, 14, 11, 8, 5]),
                preset("warm", [26, 22, 18, 13, 10, 7, 4]),
                preset("hot", [28, 24, 18, 12, 9, 6, 3]),
                preset("scorching", [30, 26, 18, 12, 8, 4, 2]),
            ],
            bonus_probability: 0.04,
            paytable: BTreeMap::from([
                (0, 1),
                (1, 2),
                (2, 3),
                (3, 5),
                (4, 8),
                (5, 15),
                (6, 30),
            ]),
            bonus_awards: BTreeMap::from([(3, 10), (4, 15), (5, 20), (6, 25), (7, 30)]),
        }
    }

    /// Test constructor with explicit parts.
    pub fn with_parts(
        presets: Vec<CascadePreset>,
        bonus_probability: f64,
        paytable: BTreeMap<i8, Amount>,
        bonus_awards: BTreeMap<u32, u32>,
    ) -> Self {
        Self {
            presets,
            bonus_probability,
            paytable,
            bonus_awards,
        }
    }

    pub fn preset_count(&self) -> usize {
        self.presets.len()
    }

    pub fn preset_names(&self) -> Vec<&'static str> {
        self.presets.iter().map(|p| p.name).collect()
    }

    /// Resolve a preset by controller index, falling back to the least
    /// generous preset on an out-of-range index.
    pub fn preset(&self, index: usize) -> &CascadePreset {
        match self.presets.get(index) {
            Some(preset) => preset,
            None => {
                tracing::warn!(index, count = self.presets.len(), "preset index out of range, falling back to 0");
                &self.presets[0]
            }
        }
    }

    /// Fail closed on an unusable preset or bonus probability.
    pub fn validate_preset(&self, index: usize) -> Result<(), SpinError> {
        let preset = self.preset(index);
        let sum: u64 = preset.weights.iter().map(|(_, w)| *w as u64).sum();
        if sum == 0 {
            return Err(SpinError::ConfigInvalid(format!(
                "preset {} has no positive symbol weights",
                preset.name
            )));
        }
        if !(0.0..1.0).contains(&self.bonus_probability) {
            return Err(SpinError::ConfigInvalid(format!(
                "bonus probability {} outside [0, 1)",
                self.bonus_probability
            )));
        }
        Ok(())
    }

    pub fn bonus_probability(&self) -> f64 {
        self.bonus_probability
    }

    /// Per-symbol base pay; missing symbols pay nothing.
    pub fn payout_base(&self, symbol: i8) -> Amount {
        self.paytable.get(&symbol).copied().unwrap_or(0)
    }

    pub fn free_spins_for_bonuses(&self, count: u32) -> u32 {
        if count < 3 {
            return 0;
        }
        let max_key = self.bonus_awards.keys().max().copied().unwrap_or(0);
        let key = count.min(max_key);
        self.bonus_awards.get(&key).copied().unwrap_or(0)
    }
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_validates() {
        let config = CascadeConfig::standard();
        for index in 0..config.preset_count() {
            config.validate_preset(index).unwrap();
        }
    }

    #[test]
    fn test_zero_weights_rejected() {
        let config = CascadeConfig::with_parts(
            vec![CascadePreset {
                name: "empty",
                weights: vec![(0, 0), (1, 0)],
            }],
            0.04,
            BTreeMap::new(),
            BTreeMap::new(),
        );
        assert!(matches!(
            config.validate_preset(0),
            Err(SpinError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_bonus_awards() {
        let config = CascadeConfig::standard();
        assert_eq!(config.free_spins_for_bonuses(2), 0);
        assert_eq!(config.free_spins_for_bonuses(3), 10);
        assert_eq!(config.free_spins_for_bonuses(7), 30);
        // A 7×7 board can exceed the table's top entry after a lucky refill
        assert_eq!(config.free_spins_for_bonuses(12), 30);
    }

    #[test]
    fn test_missing_paytable_symbol_pays_zero() {
        let config = CascadeConfig::standard();
        assert_eq!(config.payout_base(6), 30);
        assert_eq!(config.payout_base(42), 0);
    }
}
