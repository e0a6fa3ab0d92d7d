//! HTTP and WebSocket gateway: PDF upload, listing, health, and the QA channel.

mod error;
mod handlers;
mod rate_limit;
mod router;
mod server;
mod ws;

pub use error::GatewayError;
pub use rate_limit::{RateDecision, RateLimiter};
pub use server::GatewayServer;
