//! 负载均衡生命周期钩子
//!
//! 观察者在一次分发的三个时刻收到通知：
//!
//! - `on_start`: 开始选择实例之前
//! - `on_start_request`: 选中实例、即将调用传输层时
//! - `on_complete`: 分发结束，状态为 [`CompletionStatus::Discard`]、
//!   [`CompletionStatus::Failed`] 或 [`CompletionStatus::Success`] 之一
//!
//! 每个观察者通过 [`LifecycleShape`] 声明它能处理的上下文形状，
//! 只有形状一致的观察者会被 [`LifecyclePipeline`] 调用。

pub mod pipeline;
pub mod traits;
pub mod types;

pub use pipeline::LifecyclePipeline;
pub use traits::LoadBalancerLifecycle;
pub use types::{
    CompletionContext, CompletionStatus, ContextKind, LifecycleShape, RequestData, ResponseData,
    SelectionRequest, SelectionResponse,
};
