//! Pure state of the local mirror: load lifecycle and pending mutation
//! markers. The container that owns these lives in `sa-app`.

mod load_state;
mod pending;

pub use load_state::LoadState;
pub use pending::{MutationKind, PendingMutation};
