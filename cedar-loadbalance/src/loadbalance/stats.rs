use cedar_core::ServiceInstance;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::lifecycle::{CompletionContext, CompletionStatus, LoadBalancerLifecycle, SelectionRequest};

/// 统计分发结果的生命周期观察者
///
/// 记录每个实例的在途请求数和成功/失败次数，以及全局的丢弃次数
#[derive(Default)]
pub struct StatsLifecycle {
    started: AtomicU64,
    discarded: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    active_requests: RwLock<HashMap<String, u64>>,
    success_counts: RwLock<HashMap<String, u64>>,
    failure_counts: RwLock<HashMap<String, u64>>,
}

/// 统计快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub started: u64,
    pub discarded: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub active_requests: HashMap<String, u64>,
    pub success_counts: HashMap<String, u64>,
    pub failure_counts: HashMap<String, u64>,
}

impl StatsLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取实例的在途请求数
    pub fn active_requests(&self, instance: &ServiceInstance) -> u64 {
        self.active_requests
            .read()
            .get(&instance.key())
            .copied()
            .unwrap_or(0)
    }

    pub fn get_total_started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    pub fn get_discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    pub fn get_succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn get_failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            started: self.get_total_started(),
            discarded: self.get_discarded(),
            succeeded: self.get_succeeded(),
            failed: self.get_failed(),
            active_requests: self.active_requests.read().clone(),
            success_counts: self.success_counts.read().clone(),
            failure_counts: self.failure_counts.read().clone(),
        }
    }

    /// 在途数归零的实例从表中移除
    fn release(&self, backend_key: &str) {
        let mut active_requests = self.active_requests.write();
        if let Some(active) = active_requests.get_mut(backend_key) {
            *active = active.saturating_sub(1);
            if *active == 0 {
                active_requests.remove(backend_key);
            }
        }
    }
}

impl LoadBalancerLifecycle for StatsLifecycle {
    fn on_start(&self, _request: &SelectionRequest) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    fn on_start_request(&self, _request: &SelectionRequest, instance: &ServiceInstance) {
        *self
            .active_requests
            .write()
            .entry(instance.key())
            .or_insert(0) += 1;
    }

    fn on_complete(&self, context: &CompletionContext<'_>) {
        let server = context.load_balancer_response.server();
        match context.status {
            CompletionStatus::Discard => {
                self.discarded.fetch_add(1, Ordering::Relaxed);
            }
            CompletionStatus::Success => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
                if let Some(instance) = server {
                    let backend_key = instance.key();
                    self.release(&backend_key);
                    *self.success_counts.write().entry(backend_key).or_insert(0) += 1;
                }
            }
            CompletionStatus::Failed => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                if let Some(instance) = server {
                    let backend_key = instance.key();
                    tracing::debug!("Recording failure for instance: {}", backend_key);
                    self.release(&backend_key);
                    *self.failure_counts.write().entry(backend_key).or_insert(0) += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{RequestData, ResponseData, SelectionResponse};
    use cedar_core::{Request, Response};
    use reqwest::StatusCode;

    fn selection_request() -> SelectionRequest {
        let request = Request::get("http://orders/api").build();
        SelectionRequest::new(RequestData::from(&request), "default")
    }

    #[test]
    fn test_success_releases_active_request() {
        let stats = StatsLifecycle::new();
        let instance = ServiceInstance::new("orders", "10.0.0.5", 9001);
        let request = selection_request();
        let response = SelectionResponse::new(Some(instance.clone()));

        stats.on_start(&request);
        stats.on_start_request(&request, &instance);
        assert_eq!(stats.active_requests(&instance), 1);

        let client_response =
            ResponseData::from(&Response::new(StatusCode::OK, "http://10.0.0.5:9001/api"));
        stats.on_complete(&CompletionContext::success(&request, &response, client_response));

        assert_eq!(stats.active_requests(&instance), 0);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.started, 1);
        assert_eq!(snapshot.succeeded, 1);
        assert_eq!(snapshot.success_counts.get(&instance.key()), Some(&1));
    }

    #[test]
    fn test_discard_and_failure_counts() {
        let stats = StatsLifecycle::new();
        let instance = ServiceInstance::new("orders", "10.0.0.5", 9001);
        let request = selection_request();

        let empty = SelectionResponse::new(None);
        stats.on_complete(&CompletionContext::discard(&request, &empty));

        let selected = SelectionResponse::new(Some(instance.clone()));
        stats.on_start_request(&request, &instance);
        stats.on_complete(&CompletionContext::failed(&request, &selected, "connection refused"));

        assert_eq!(stats.get_discarded(), 1);
        assert_eq!(stats.get_failed(), 1);
        assert_eq!(stats.active_requests(&instance), 0);
        assert_eq!(stats.snapshot().failure_counts.get(&instance.key()), Some(&1));
    }

    #[test]
    fn test_failure_without_start_request_does_not_underflow() {
        let stats = StatsLifecycle::new();
        let instance = ServiceInstance::new("orders", "10.0.0.5", 9001);
        let request = selection_request();
        let selected = SelectionResponse::new(Some(instance.clone()));

        stats.on_complete(&CompletionContext::failed(&request, &selected, "bad url"));
        assert_eq!(stats.active_requests(&instance), 0);
    }

    #[test]
    fn test_idle_instances_leave_active_table() {
        let stats = StatsLifecycle::new();
        let request = selection_request();

        for port in 9001..9011 {
            let instance = ServiceInstance::new("orders", "10.0.0.5", port);
            let selected = SelectionResponse::new(Some(instance.clone()));
            stats.on_start_request(&request, &instance);
            stats.on_start_request(&request, &instance);

            stats.on_complete(&CompletionContext::failed(&request, &selected, "reset"));
            assert_eq!(stats.snapshot().active_requests.get(&instance.key()), Some(&1));

            let client_response =
                ResponseData::from(&Response::new(StatusCode::OK, "http://10.0.0.5/api"));
            stats.on_complete(&CompletionContext::success(&request, &selected, client_response));
        }

        assert!(stats.snapshot().active_requests.is_empty());
        assert_eq!(stats.get_failed(), 10);
        assert_eq!(stats.get_succeeded(), 10);
    }
}
