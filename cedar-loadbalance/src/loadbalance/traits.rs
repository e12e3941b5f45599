use cedar_core::ServiceInstance;

use crate::lifecycle::SelectionRequest;

/// 实例选择器接口
///
/// 找不到实例时返回 `None` 而不是错误：没有容量是正常的业务结果，
/// 由分发器转换为 503 响应
pub trait InstanceSelector: Send + Sync {
    /// 为逻辑服务选择一个实例
    fn choose(&self, service_id: &str, request: &SelectionRequest) -> Option<ServiceInstance>;
}

impl<F> InstanceSelector for F
where
    F: Fn(&str, &SelectionRequest) -> Option<ServiceInstance> + Send + Sync,
{
    fn choose(&self, service_id: &str, request: &SelectionRequest) -> Option<ServiceInstance> {
        self(service_id, request)
    }
}

/// 自定义的选择策略
pub trait PickStrategy: Send + Sync {
    /// 从候选实例中挑一个，`instances` 不为空
    fn pick(
        &self,
        service_id: &str,
        instances: &[ServiceInstance],
        request: &SelectionRequest,
    ) -> Option<ServiceInstance>;
}

/// 服务注册表接口，返回某个服务当前的全部实例
pub trait ServiceRegistry: Send + Sync {
    fn instances(&self, service_id: &str) -> Vec<ServiceInstance>;
}
