//! Storefront admin
//!
//! Bootstrap for the admin synchronization stack: configuration loading,
//! tracing setup and the wiring of `sa-infra` adapters into `sa-app`
//! services. The heavy lifting lives in the workspace crates:
//!
//! - `sa-core`: entities, ports, derived view, state machines
//! - `sa-app`: mirror store, optimistic mutator, invalidation, pollers
//! - `sa-infra`: HTTP and in-memory adapters

pub mod bootstrap;

pub use bootstrap::{init_tracing_subscriber, load_config, AdminRuntime};
