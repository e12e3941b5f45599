//! Cedar Core Library
//!
//! This library provides core functionality for the Cedar dispatch system including:
//! - Configuration management
//! - HTTP request/response value types
//! - Service instance model
//! - Named client contexts

pub mod config;
pub mod context;
pub mod http;
pub mod instance;

// Re-export commonly used types
pub use config::model::{
    Config, InstanceDefinition, LoadBalanceStrategy, LoadBalancerSettings, ServiceDefinition,
    TransportSettings,
};
pub use context::NamedContexts;
pub use http::{Request, RequestBuilder, RequestOptions, RequestTemplate, Response};
pub use instance::ServiceInstance;
