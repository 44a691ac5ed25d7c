//! In-process gateway.

mod gateway;

pub use gateway::{GatewayOp, InMemoryGateway};
