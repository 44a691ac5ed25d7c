//! Storefront admin application layer
//!
//! Use cases implementing optimistic CRUD synchronization over the ports
//! defined in `sa-core`: the local mirror, its transactions, the optimistic
//! mutator, cross-component invalidation and the background pollers.

pub mod badge_poller;
pub mod beacon;
pub mod invalidation;
pub mod mirror_store;
pub mod mutator;
pub mod page;
mod timeout;
pub mod transaction;
pub mod usecases;

pub use badge_poller::{BadgePoller, BadgePollerDeps};
pub use beacon::{BeaconPolicy, TrackingBeacon};
pub use invalidation::{InvalidationRegistry, Registration};
pub use mirror_store::{MirrorMutation, MirrorStore};
pub use mutator::OptimisticMutator;
pub use page::{AdminPage, Notice, NoticeKind, PageForm};
pub use transaction::Transaction;
