use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 一个具体可达的服务实例
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub service_id: String,
    pub instance_id: String,
    pub host: String,
    pub port: u16,
    pub secure: bool,
    /// 显式指定的 scheme，为空时沿用原始请求的 scheme
    pub scheme: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl ServiceInstance {
    /// 加权策略读取的元数据键
    pub const WEIGHT_METADATA_KEY: &'static str = "weight";
    /// 提示过滤读取的元数据键
    pub const HINT_METADATA_KEY: &'static str = "hint";

    pub fn new(service_id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            service_id: service_id.into(),
            instance_id: format!("{host}:{port}"),
            host,
            port,
            secure: false,
            scheme: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = instance_id.into();
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// 实例的权重，缺失或无法解析时为 1.0
    pub fn weight(&self) -> f64 {
        self.metadata
            .get(Self::WEIGHT_METADATA_KEY)
            .and_then(|w| w.parse::<f64>().ok())
            .unwrap_or(1.0)
    }

    pub fn hint(&self) -> Option<&str> {
        self.metadata.get(Self::HINT_METADATA_KEY).map(String::as_str)
    }

    /// 用于日志和统计的唯一键
    pub fn key(&self) -> String {
        format!("{}:{}", self.service_id, self.instance_id)
    }

    /// `scheme://host:port`
    pub fn base_url(&self) -> String {
        let scheme = self
            .scheme
            .clone()
            .unwrap_or_else(|| if self.secure { "https" } else { "http" }.to_string());
        format!("{}://{}:{}", scheme, self.authority_host(), self.port)
    }

    /// IPv6 地址需要方括号
    pub fn authority_host(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }
}
