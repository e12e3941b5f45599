use cedar_core::{Config, ServiceInstance};
use std::collections::HashMap;
use std::sync::Arc;

use super::registry::StaticServiceRegistry;
use super::selector::Strategy;
use super::supplier::{effective_hint, filter_by_hint};
use super::traits::{InstanceSelector, ServiceRegistry};
use crate::lifecycle::SelectionRequest;

/// 基于服务注册表的实例选择器
///
/// 选择过程：从注册表取出候选实例，按提示过滤，再交给服务对应的策略
pub struct LoadBalancerClient {
    registry: Arc<dyn ServiceRegistry>,
    default_strategy: Strategy,
    service_strategies: HashMap<String, Strategy>,
    hint_header_name: String,
}

impl LoadBalancerClient {
    pub fn new(registry: Arc<dyn ServiceRegistry>, strategy: Strategy) -> Self {
        Self {
            registry,
            default_strategy: strategy,
            service_strategies: HashMap::new(),
            hint_header_name: cedar_core::LoadBalancerSettings::default().hint_header_name,
        }
    }

    /// 根据配置创建选择器，注册表使用配置中声明的静态实例
    pub fn from_config(config: &Config) -> (Self, Arc<StaticServiceRegistry>) {
        let registry = Arc::new(StaticServiceRegistry::from_config(config));
        let mut client = Self::new(
            registry.clone(),
            Strategy::from_config(config.loadbalancer.strategy),
        )
        .with_hint_header_name(config.loadbalancer.hint_header_name.clone());

        for (service_id, service) in &config.services {
            if let Some(strategy) = service.strategy {
                client = client.with_service_strategy(service_id, Strategy::from_config(strategy));
            }
        }

        (client, registry)
    }

    /// 为单个服务指定策略
    pub fn with_service_strategy(mut self, service_id: &str, strategy: Strategy) -> Self {
        self.service_strategies.insert(service_id.to_string(), strategy);
        self
    }

    pub fn with_hint_header_name(mut self, hint_header_name: impl Into<String>) -> Self {
        self.hint_header_name = hint_header_name.into();
        self
    }

    pub fn strategy_for(&self, service_id: &str) -> &Strategy {
        self.service_strategies
            .get(service_id)
            .unwrap_or(&self.default_strategy)
    }

    pub fn registry(&self) -> &Arc<dyn ServiceRegistry> {
        &self.registry
    }
}

impl InstanceSelector for LoadBalancerClient {
    fn choose(&self, service_id: &str, request: &SelectionRequest) -> Option<ServiceInstance> {
        let instances = self.registry.instances(service_id);
        if instances.is_empty() {
            tracing::debug!("No instances registered for service '{}'", service_id);
            return None;
        }

        let hint = effective_hint(request, &self.hint_header_name);
        let candidates = filter_by_hint(instances, hint);
        let strategy = self.strategy_for(service_id);
        let selected = strategy.pick(service_id, &candidates, request);

        match &selected {
            Some(instance) => tracing::debug!(
                "Selected instance {} for service '{}' (strategy={}, hint={}, candidates={})",
                instance.instance_id,
                service_id,
                strategy.name(),
                hint,
                candidates.len()
            ),
            None => tracing::debug!(
                "Strategy {} returned no instance for service '{}' ({} candidates)",
                strategy.name(),
                service_id,
                candidates.len()
            ),
        }

        selected
    }
}
