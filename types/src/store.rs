//! Key/value vocabulary of the player state store.
//!
//! The store maps one key per player per concern; engines never touch the
//! store directly, they go through the transaction layer in the execution
//! crate.

use serde::{Deserialize, Serialize};

use crate::slots::{CascadeGameState, LineGameState, Player};
use crate::UserId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    Player(UserId),
    LineState(UserId),
    CascadeState(UserId),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Player(Player),
    LineState(LineGameState),
    CascadeState(CascadeGameState),
}
