//! Adapters for the ports declared in `sa-core`.
//!
//! - [`http`]: the REST backend (collections, uploads, badge counts, beacon)
//! - [`memory`]: an in-process gateway used by demos and tests
//! - [`auth`]: auth context holders
//! - [`time`]: wall clock

pub mod auth;
pub mod http;
pub mod memory;
pub mod time;

pub use auth::{StaticAuthContext, WatchAuthContext};
pub use http::{HttpBadgeCounts, HttpBeacon, HttpClient, HttpGateway, HttpUploader};
pub use memory::{GatewayOp, InMemoryGateway};
pub use time::SystemClock;
