use std::{collections::HashMap, future::Future};

use reelhouse_types::store::{Key, Value};

/// Failure of the backing store. The transaction layer aborts on the first
/// store error; callers decide whether to retry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("store error: {0}")]
pub struct StoreError(pub String);

/// Player state store. Implementations must be transactional at row
/// granularity; the [`Layer`](crate::Layer) overlay provides all-or-nothing
/// visibility for the writes of one spin.
pub trait State {
    fn get(&self, key: &Key) -> impl Future<Output = Result<Option<Value>, StoreError>>;
    fn insert(&mut self, key: Key, value: Value) -> impl Future<Output = Result<(), StoreError>>;
    fn delete(&mut self, key: &Key) -> impl Future<Output = Result<(), StoreError>>;

    /// Apply a committed change set. A store error part-way through must
    /// leave the store in the caller-visible state it chooses to guarantee;
    /// the in-memory store applies change sets atomically.
    fn apply(
        &mut self,
        changes: Vec<(Key, Status)>,
    ) -> impl Future<Output = Result<(), StoreError>> {
        async {
            for (key, status) in changes {
                match status {
                    Status::Update(value) => self.insert(key, value).await?,
                    Status::Delete => self.delete(&key).await?,
                }
            }
            Ok(())
        }
    }
}

/// Pending write recorded by a transaction overlay.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Status {
    Update(Value),
    Delete,
}

/// In-memory store, used by tests and the simulator.
#[derive(Default)]
pub struct Memory {
    state: HashMap<Key, Value>,
}

impl State for Memory {
    async fn get(&self, key: &Key) -> Result<Option<Value>, StoreError> {
        Ok(self.state.get(key).cloned())
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<(), StoreError> {
        self.state.insert(key, value);
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<(), StoreError> {
        self.state.remove(key);
        Ok(())
    }
}
