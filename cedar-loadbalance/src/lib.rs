//! Cedar Load Balance Library
//!
//! This library provides instance selection for the Cedar dispatch system including:
//! - Selection strategies (round robin, random, weighted, custom)
//! - An in-memory service registry
//! - Hint based instance filtering
//! - Lifecycle hooks observed around each dispatch

pub mod lifecycle;
pub mod loadbalance;

// Re-export commonly used types
pub use lifecycle::{
    CompletionContext, CompletionStatus, ContextKind, LifecyclePipeline, LifecycleShape,
    LoadBalancerLifecycle, RequestData, ResponseData, SelectionRequest, SelectionResponse,
};
pub use loadbalance::{
    InstanceSelector, LoadBalancerClient, PickStrategy, RoundRobin, ServiceRegistry,
    StaticServiceRegistry, StatsLifecycle, StatsSnapshot, Strategy,
};
