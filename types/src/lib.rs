//! Shared types for the reelhouse slots backend.
//!
//! Everything that crosses a crate boundary lives here: wallet and per-game
//! player state, spin outcomes, caller-facing response records, and the
//! key/value vocabulary of the player state store.

pub mod api;
pub mod slots;
pub mod store;

/// Identifier of an authenticated player, extracted from the request context
/// by the caller.
pub type UserId = u64;

/// Monetary amount in minor currency units (signed; negative values only ever
/// appear as intermediate deltas, never as a persisted balance).
pub type Amount = i64;
