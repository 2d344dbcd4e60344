//! Downstream execution gateway: request types, client trait and wire protocol.
//!
//! The scheduler issues a [`GatewayRequest`] through a [`GatewayClient`] and
//! then waits for a [`GatewayReply`] on a separate reply channel, so the
//! transport decides how replies are read without owning the scheduler.

mod mock;
pub mod protocol;
mod request;
mod traits;

pub use mock::MockGatewayClient;
pub use request::*;
pub use traits::*;
