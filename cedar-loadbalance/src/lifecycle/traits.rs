use cedar_core::ServiceInstance;

use super::types::{CompletionContext, LifecycleShape, SelectionRequest};

/// 负载均衡生命周期观察者
///
/// 用于指标、追踪等旁路逻辑，不应改变分发结果。
/// 所有回调都在分发所在的任务中同步执行
pub trait LoadBalancerLifecycle: Send + Sync {
    /// 观察者支持的上下文形状
    fn shape(&self) -> LifecycleShape {
        LifecycleShape::HTTP
    }

    /// 选择实例之前调用
    fn on_start(&self, request: &SelectionRequest);

    /// 选中实例后、调用传输层之前调用
    fn on_start_request(&self, _request: &SelectionRequest, _instance: &ServiceInstance) {}

    /// 分发结束时调用，每次分发恰好一次
    fn on_complete(&self, context: &CompletionContext<'_>);
}
