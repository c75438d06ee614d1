//! Closed-loop RTP regulation.
//!
//! One controller instance exists per engine type for the process lifetime.
//! It observes the `(bet, payout)` stream of completed spins through a
//! bounded sliding window and steps the active preset index up or down the
//! generosity ladder to steer the windowed RTP toward the target. A large
//! deviation flips it into emergency mode, which keeps stepping every period
//! until the deviation falls back under the normal threshold.
//!
//! All state sits behind a single readers/writer lock; mutating paths take
//! the write lock, spin-path readers take one read-locked snapshot. Nothing
//! awaits while a lock is held.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;

#[derive(Clone, Debug)]
pub struct RtpConfig {
    pub target_rtp: f64,
    /// Sliding-window capacity in spins.
    pub window_size: usize,
    /// Adjustments are considered every `period` spins.
    pub period: u64,
    /// No adjustment before this many total spins.
    pub min_spins: u64,
    /// Window deviation that enters emergency mode.
    pub critical_deviation: f64,
    /// Window deviation that leaves emergency mode.
    pub normal_deviation: f64,
    /// Window deviation that triggers a standard one-step adjustment.
    pub max_deviation: f64,
    pub initial_preset: usize,
    /// Preset names, least generous first; the ladder the controller walks.
    pub preset_names: Vec<&'static str>,
}

impl RtpConfig {
    pub fn standard(preset_names: Vec<&'static str>) -> Self {
        Self {
            target_rtp: 95.0,
            window_size: 500,
            period: 25,
            min_spins: 1,
            critical_deviation: 10.0,
            normal_deviation: 5.0,
            max_deviation: 5.0,
            initial_preset: 2,
            preset_names,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmergencyDirection {
    None,
    /// Window RTP far above target; stepping down the ladder.
    High,
    /// Window RTP far below target; stepping up the ladder.
    Low,
}

#[derive(Clone, Copy, Debug)]
struct SpinSample {
    bet: f64,
    payout: f64,
}

/// Audit-log entry for one applied preset change.
#[derive(Clone, Debug)]
pub struct AdjustmentLog {
    pub timestamp_ms: u64,
    pub new_preset: &'static str,
    pub reason: &'static str,
    pub window_rtp: f64,
    /// House profit at the time of the change.
    pub profit: f64,
}

/// Immutable copy of the fields an engine needs for one spin.
#[derive(Clone, Copy, Debug)]
pub struct RtpSnapshot {
    pub preset_index: usize,
    pub total_spins: u64,
    pub current_rtp: f64,
    pub window_rtp: f64,
    pub emergency_mode: bool,
}

#[derive(Debug)]
struct ControllerState {
    total_spins: u64,
    total_bet: f64,
    total_payout: f64,
    current_rtp: f64,
    preset_index: usize,
    window: VecDeque<SpinSample>,
    window_rtp: f64,
    emergency_mode: bool,
    emergency_direction: EmergencyDirection,
    adjustments: Vec<AdjustmentLog>,
}

pub struct RtpController {
    config: RtpConfig,
    state: RwLock<ControllerState>,
}

impl RtpController {
    pub fn new(config: RtpConfig) -> Self {
        let preset_count = config.preset_names.len().max(1);
        let state = ControllerState {
            total_spins: 0,
            total_bet: 0.0,
            total_payout: 0.0,
            current_rtp: config.target_rtp,
            preset_index: config.initial_preset.min(preset_count - 1),
            window: VecDeque::with_capacity(config.window_size),
            window_rtp: 0.0,
            emergency_mode: false,
            emergency_direction: EmergencyDirection::None,
            adjustments: Vec::new(),
        };
        Self {
            config,
            state: RwLock::new(state),
        }
    }

    /// Ingest one completed spin: append to the window, drop the oldest
    /// sample past capacity, refresh the cumulative and windowed RTP.
    pub fn record_spin(&self, bet: f64, payout: f64) {
        let mut state = self.state.write();

        state.total_spins += 1;
        state.total_bet += bet;
        state.total_payout += payout;
        if state.total_bet > 0.0 {
            state.current_rtp = state.total_payout / state.total_bet * 100.0;
        }

        state.window.push_back(SpinSample { bet, payout });
        if state.window.len() > self.config.window_size {
            state.window.pop_front();
        }

        let window_bet: f64 = state.window.iter().map(|s| s.bet).sum();
        let window_payout: f64 = state.window.iter().map(|s| s.payout).sum();
        state.window_rtp = if window_bet > 0.0 {
            window_payout / window_bet * 100.0
        } else {
            0.0
        };
    }

    /// Consider a preset adjustment. Acts only on period boundaries past the
    /// warm-up spin count; returns whether a change was applied.
    pub fn auto_adjust(&self) -> bool {
        let mut state = self.state.write();

        if state.total_spins % self.config.period != 0
            || state.total_spins <= self.config.min_spins
        {
            return false;
        }

        let deviation = (state.window_rtp - self.config.target_rtp).abs();
        if deviation > self.config.critical_deviation {
            state.emergency_mode = true;
            state.emergency_direction = if state.window_rtp > self.config.target_rtp {
                EmergencyDirection::High
            } else {
                EmergencyDirection::Low
            };
        } else if state.emergency_mode && deviation < self.config.normal_deviation {
            state.emergency_mode = false;
            state.emergency_direction = EmergencyDirection::None;
        }

        if state.emergency_mode {
            self.apply_emergency_adjustment(&mut state)
        } else {
            self.apply_standard_adjustment(&mut state)
        }
    }

    fn apply_emergency_adjustment(&self, state: &mut ControllerState) -> bool {
        let new_index = match state.emergency_direction {
            EmergencyDirection::High => match state.preset_index.checked_sub(1) {
                Some(index) => index,
                None => return false,
            },
            EmergencyDirection::Low => {
                if state.preset_index + 1 >= self.config.preset_names.len() {
                    return false;
                }
                state.preset_index + 1
            }
            EmergencyDirection::None => return false,
        };
        self.apply_adjustment(state, new_index, "emergency adjustment")
    }

    fn apply_standard_adjustment(&self, state: &mut ControllerState) -> bool {
        let deviation = state.window_rtp - self.config.target_rtp;
        let new_index = if deviation > self.config.max_deviation {
            match state.preset_index.checked_sub(1) {
                Some(index) => index,
                None => return false,
            }
        } else if deviation < -self.config.max_deviation {
            if state.preset_index + 1 >= self.config.preset_names.len() {
                return false;
            }
            state.preset_index + 1
        } else {
            return false;
        };
        self.apply_adjustment(state, new_index, "standard adjustment")
    }

    fn apply_adjustment(
        &self,
        state: &mut ControllerState,
        new_index: usize,
        reason: &'static str,
    ) -> bool {
        if new_index == state.preset_index || new_index >= self.config.preset_names.len() {
            return false;
        }
        let new_preset = self.config.preset_names[new_index];
        tracing::info!(
            old = self.config.preset_names[state.preset_index],
            new = new_preset,
            window_rtp = state.window_rtp,
            reason,
            "preset adjusted"
        );
        state.adjustments.push(AdjustmentLog {
            timestamp_ms: unix_millis(),
            new_preset,
            reason,
            window_rtp: state.window_rtp,
            profit: state.total_bet - state.total_payout,
        });
        state.preset_index = new_index;
        true
    }

    /// Read-locked snapshot for the spin path.
    pub fn snapshot(&self) -> RtpSnapshot {
        let state = self.state.read();
        RtpSnapshot {
            preset_index: state.preset_index,
            total_spins: state.total_spins,
            current_rtp: state.current_rtp,
            window_rtp: state.window_rtp,
            emergency_mode: state.emergency_mode,
        }
    }

    /// Copy of the append-only adjustment audit log.
    pub fn adjustments(&self) -> Vec<AdjustmentLog> {
        self.state.read().adjustments.clone()
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
