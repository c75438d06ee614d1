pub mod rtp;
pub mod slots;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

mod layer;

mod state;

pub use layer::{deposit, CascadeService, Layer, LineService};
pub use state::{Memory, State, Status, StoreError};
