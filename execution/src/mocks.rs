//! Test fixtures shared by unit and integration tests (and available to
//! downstream crates through the `mocks` feature).

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use reelhouse_types::slots::Player;
use reelhouse_types::store::{Key, Value};
use reelhouse_types::{Amount, UserId};

use crate::state::{Memory, State, Status, StoreError};

/// Deterministic generator for reproducible spins.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// In-memory store holding one funded wallet.
pub async fn funded_state(user: UserId, balance: Amount) -> Memory {
    let mut state = Memory::default();
    state
        .insert(Key::Player(user), Value::Player(Player::new(balance)))
        .await
        .expect("memory store never fails");
    state
}

/// Store wrapper that fails every write, for rollback tests. Reads pass
/// through to the wrapped store, whose contents therefore never change.
pub struct FailingState {
    pub inner: Memory,
}

impl FailingState {
    pub fn new(inner: Memory) -> Self {
        Self { inner }
    }
}

impl State for FailingState {
    async fn get(&self, key: &Key) -> Result<Option<Value>, StoreError> {
        self.inner.get(key).await
    }

    async fn insert(&mut self, _key: Key, _value: Value) -> Result<(), StoreError> {
        Err(StoreError("write refused".into()))
    }

    async fn delete(&mut self, _key: &Key) -> Result<(), StoreError> {
        Err(StoreError("write refused".into()))
    }

    async fn apply(&mut self, _changes: Vec<(Key, Status)>) -> Result<(), StoreError> {
        Err(StoreError("write refused".into()))
    }
}

/// Balance as the store sees it, for post-rollback assertions.
pub async fn stored_balance<S: State>(state: &S, user: UserId) -> Amount {
    match state.get(&Key::Player(user)).await {
        Ok(Some(Value::Player(player))) => player.balance,
        _ => 0,
    }
}
