use cedar_core::{Config, ServiceInstance};
use parking_lot::RwLock;
use std::collections::HashMap;

use super::traits::ServiceRegistry;

/// 内存中的服务注册表
///
/// 初始内容来自配置，运行时可以增删实例
#[derive(Default)]
pub struct StaticServiceRegistry {
    services: RwLock<HashMap<String, Vec<ServiceInstance>>>,
}

impl StaticServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        let registry = Self::new();
        for (service_id, service) in &config.services {
            for definition in &service.instances {
                registry.register(definition.to_service_instance(service_id));
            }
        }
        registry
    }

    /// 注册实例，相同实例ID会被替换
    pub fn register(&self, instance: ServiceInstance) {
        tracing::debug!("Registering instance {}", instance.key());
        let mut services = self.services.write();
        let instances = services.entry(instance.service_id.clone()).or_default();
        match instances
            .iter_mut()
            .find(|existing| existing.instance_id == instance.instance_id)
        {
            Some(existing) => *existing = instance,
            None => instances.push(instance),
        }
    }

    /// 注销实例，返回实例是否存在
    pub fn deregister(&self, service_id: &str, instance_id: &str) -> bool {
        let mut services = self.services.write();
        let Some(instances) = services.get_mut(service_id) else {
            return false;
        };
        let before = instances.len();
        instances.retain(|instance| instance.instance_id != instance_id);
        let removed = instances.len() != before;
        if removed {
            tracing::debug!("Deregistered instance {}:{}", service_id, instance_id);
        }
        removed
    }

    pub fn service_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.services.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl ServiceRegistry for StaticServiceRegistry {
    fn instances(&self, service_id: &str) -> Vec<ServiceInstance> {
        self.services
            .read()
            .get(service_id)
            .cloned()
            .unwrap_or_default()
    }
}
