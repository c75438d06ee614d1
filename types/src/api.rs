//! Caller-facing response records.
//!
//! These are the shapes the HTTP layer serialises back to clients; the
//! orchestrator assembles them from an engine outcome plus the post-commit
//! wallet and free-spin state.

use serde::{Deserialize, Serialize};

use crate::slots::{CascadeBoard, CascadeStep, LineBoard, LineWin};
use crate::Amount;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpinResponse {
    pub board: LineBoard,
    pub line_wins: Vec<LineWin>,
    pub scatter_count: u32,
    pub awarded_free_spins: u32,
    pub total_payout: Amount,
    pub balance: Amount,
    pub free_spin_count: u32,
    pub in_free_spin: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeSpinResponse {
    pub initial_board: CascadeBoard,
    pub board: CascadeBoard,
    pub cascades: Vec<CascadeStep>,
    pub scatter_count: u32,
    pub awarded_free_spins: u32,
    pub total_payout: Amount,
    pub balance: Amount,
    pub free_spin_count: u32,
    pub in_free_spin: bool,
}

/// Response to a Cascade bonus buy, which seeds the session without spinning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeBonusResponse {
    pub balance: Amount,
    pub free_spin_count: u32,
}

/// Balance plus free-spin count, as returned by the check-data query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerData {
    pub balance: Amount,
    pub free_spin_count: u32,
}
