//! # sa-core
//!
//! Core domain models and business rules for the storefront admin.
//!
//! This crate contains the entity catalog, the error taxonomy, the port
//! traits implemented by infrastructure, and the pure pieces of the
//! synchronization pattern (derived view, load and page state machines).
//! Nothing in here performs I/O.

pub mod catalog;
pub mod config;
pub mod entity;
pub mod error;
pub mod ids;
pub mod mirror;
pub mod page;
pub mod policy;
pub mod ports;
pub mod view;

// Re-export commonly used types at the crate root
pub use config::AppConfig;
pub use entity::{Entity, SortValue};
pub use error::{FetchError, MutationError, ValidationError};
pub use ids::{RecordId, UserId};
pub use mirror::{LoadState, MutationKind, PendingMutation};
pub use page::{PageAction, PageEvent, PageMode, PageState, PageStateMachine};
pub use policy::DeleteProtection;
pub use view::{derive_view, paginate, FilterSortDescriptor, Page, SortDirection};
