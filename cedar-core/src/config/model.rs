use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::instance::ServiceInstance;

/// 未配置任何提示时使用的字面量
pub const DEFAULT_HINT: &str = "default";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub loadbalancer: LoadBalancerSettings,
    #[serde(default)]
    pub transport: TransportSettings,
    #[serde(default)]
    pub services: HashMap<String, ServiceDefinition>,
}

/// 负载均衡相关配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoadBalancerSettings {
    /// 全局默认策略，可被单个服务覆盖
    #[serde(default)]
    pub strategy: LoadBalanceStrategy,
    /// 服务名 -> 提示，键 `default` 作为通用兜底
    #[serde(default)]
    pub hint: HashMap<String, String>,
    /// 携带提示的请求头名称，优先级高于配置的提示
    #[serde(default = "default_hint_header_name")]
    pub hint_header_name: String,
    /// 为 true 时单个生命周期观察者的 panic 不会中断分发
    #[serde(default)]
    pub isolate_lifecycle_failures: bool,
}

impl Default for LoadBalancerSettings {
    fn default() -> Self {
        Self {
            strategy: LoadBalanceStrategy::default(),
            hint: HashMap::new(),
            hint_header_name: default_hint_header_name(),
            isolate_lifecycle_failures: false,
        }
    }
}

impl LoadBalancerSettings {
    /// 解析服务的路由提示
    ///
    /// 精确匹配服务名，其次是映射中的 `default` 项，最后是字面量 `"default"`
    pub fn hint_for(&self, service_id: &str) -> String {
        self.hint
            .get(service_id)
            .or_else(|| self.hint.get(DEFAULT_HINT))
            .cloned()
            .unwrap_or_else(|| DEFAULT_HINT.to_string())
    }
}

/// 传输层配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TransportSettings {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: default_connect_timeout(),
            read_timeout_seconds: default_read_timeout(),
            follow_redirects: true,
        }
    }
}

impl TransportSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_seconds)
    }
}

/// 单个逻辑服务的静态定义
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ServiceDefinition {
    /// 覆盖全局策略
    #[serde(default)]
    pub strategy: Option<LoadBalanceStrategy>,
    #[serde(default)]
    pub instances: Vec<InstanceDefinition>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct InstanceDefinition {
    #[serde(default)]
    pub instance_id: Option<String>,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub scheme: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl InstanceDefinition {
    /// 缺省的实例ID为 `host:port`
    pub fn instance_id(&self) -> String {
        self.instance_id
            .clone()
            .unwrap_or_else(|| format!("{}:{}", self.host, self.port))
    }

    pub fn to_service_instance(&self, service_id: &str) -> ServiceInstance {
        let mut instance = ServiceInstance::new(service_id, self.host.clone(), self.port)
            .with_instance_id(self.instance_id())
            .with_secure(self.secure)
            .with_metadata(self.metadata.clone());
        if let Some(scheme) = &self.scheme {
            instance = instance.with_scheme(scheme.clone());
        }
        instance
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalanceStrategy {
    /// 轮询
    #[default]
    RoundRobin,
    /// 随机
    Random,
    /// 按实例元数据 `weight` 加权随机
    Weighted,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_hint_header_name() -> String {
    "X-LB-Hint".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    60
}

impl Config {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        self.validate_transport_config()?;

        if self.loadbalancer.hint_header_name.trim().is_empty() {
            anyhow::bail!("loadbalancer.hint_header_name cannot be empty");
        }

        for (service_id, service) in &self.services {
            self.validate_service_config(service_id, service)?;
        }

        Ok(())
    }

    fn validate_transport_config(&self) -> Result<()> {
        let transport = &self.transport;
        if transport.connect_timeout_seconds == 0 {
            anyhow::bail!("transport.connect_timeout_seconds cannot be 0");
        }
        if transport.read_timeout_seconds == 0 {
            anyhow::bail!("transport.read_timeout_seconds cannot be 0");
        }
        if transport.connect_timeout_seconds > 300 || transport.read_timeout_seconds > 300 {
            anyhow::bail!("transport timeouts too large (maximum 300 seconds)");
        }
        Ok(())
    }

    /// 验证单个服务配置的有效性
    fn validate_service_config(&self, service_id: &str, service: &ServiceDefinition) -> Result<()> {
        if service_id.is_empty() {
            anyhow::bail!("Service name cannot be empty");
        }

        if service_id.chars().any(char::is_whitespace) {
            anyhow::bail!(
                "Service '{}' has invalid name format (cannot contain whitespace)",
                service_id
            );
        }

        let mut seen_ids = HashSet::new();
        for instance in &service.instances {
            if instance.host.trim().is_empty() {
                anyhow::bail!("Service '{}' has an instance with empty host", service_id);
            }

            if instance.port == 0 {
                anyhow::bail!(
                    "Service '{}' instance '{}' has invalid port 0",
                    service_id,
                    instance.host
                );
            }

            let instance_id = instance.instance_id();
            if !seen_ids.insert(instance_id.clone()) {
                anyhow::bail!(
                    "Service '{}' has duplicate instance id '{}'",
                    service_id,
                    instance_id
                );
            }

            if let Some(weight) = instance.metadata.get(ServiceInstance::WEIGHT_METADATA_KEY) {
                match weight.parse::<f64>() {
                    Ok(w) if w >= 0.0 && w.is_finite() => {}
                    _ => anyhow::bail!(
                        "Service '{}' instance '{}' has invalid weight '{}'",
                        service_id,
                        instance_id,
                        weight
                    ),
                }
            }
        }

        Ok(())
    }

    pub fn get_service(&self, service_id: &str) -> Option<&ServiceDefinition> {
        self.services.get(service_id)
    }

    /// 服务的有效策略：服务级覆盖优先，否则使用全局策略
    pub fn strategy_for(&self, service_id: &str) -> LoadBalanceStrategy {
        self.services
            .get(service_id)
            .and_then(|s| s.strategy)
            .unwrap_or(self.loadbalancer.strategy)
    }
}
