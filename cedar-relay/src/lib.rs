//! Cedar Relay Library
//!
//! This library provides load-balanced request dispatch for the Cedar system including:
//! - The dispatcher resolving logical service names to concrete instances
//! - Request rewriting
//! - The HTTP transport delegate

pub mod relay;

// Re-export commonly used types
pub use relay::client::{ReqwestTransport, Transport, TransportError};
pub use relay::dispatch::{DispatchError, Dispatcher, RewriteError};
