//! Port interfaces for the application layer
//!
//! Ports define the contract between the use cases in `sa-app` and the
//! adapters in `sa-infra`. Every remote collaborator (persistence, uploads,
//! badge counts, tracking) is reached through one of these traits, so the
//! synchronization logic never depends on a concrete transport.

pub mod auth;
pub mod badge;
pub mod beacon;
mod clock;
pub mod errors;
pub mod gateway;
pub mod upload;

pub use auth::{AuthContextPort, AuthStatus};
pub use badge::{BadgeCountPort, SectionCounts};
pub use beacon::{BeaconEvent, BeaconPort};
pub use clock::ClockPort;
pub use errors::GatewayError;
pub use gateway::{ListQuery, ListResponse, Pagination, RemoteGatewayPort};
pub use upload::{FileUpload, UploadPort, UploadedFile};
