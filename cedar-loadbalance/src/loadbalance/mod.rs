pub mod client;
pub mod registry;
pub mod selector;
pub mod stats;
pub mod supplier;
pub mod traits;


pub use client::LoadBalancerClient;
pub use registry::StaticServiceRegistry;
pub use selector::{RoundRobin, Strategy};
pub use stats::{StatsLifecycle, StatsSnapshot};
pub use traits::{InstanceSelector, PickStrategy, ServiceRegistry};
