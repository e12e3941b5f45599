use cedar_core::{LoadBalanceStrategy, ServiceInstance};
use parking_lot::RwLock;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::traits::PickStrategy;
use crate::lifecycle::SelectionRequest;

/// 可插拔的选择策略，在构造选择器时确定
#[derive(Clone)]
pub enum Strategy {
    RoundRobin(Arc<RoundRobin>),
    Random,
    /// 按元数据 `weight` 加权随机，权重不大于 0 的实例不参与
    Weighted,
    Custom(Arc<dyn PickStrategy>),
}

impl Strategy {
    pub fn round_robin() -> Self {
        Strategy::RoundRobin(Arc::new(RoundRobin::new()))
    }

    pub fn custom(strategy: impl PickStrategy + 'static) -> Self {
        Strategy::Custom(Arc::new(strategy))
    }

    pub fn from_config(strategy: LoadBalanceStrategy) -> Self {
        match strategy {
            LoadBalanceStrategy::RoundRobin => Self::round_robin(),
            LoadBalanceStrategy::Random => Strategy::Random,
            LoadBalanceStrategy::Weighted => Strategy::Weighted,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::RoundRobin(_) => "round_robin",
            Strategy::Random => "random",
            Strategy::Weighted => "weighted",
            Strategy::Custom(_) => "custom",
        }
    }

    /// 从候选实例中选出一个，没有候选时返回 `None`
    pub fn pick(
        &self,
        service_id: &str,
        instances: &[ServiceInstance],
        request: &SelectionRequest,
    ) -> Option<ServiceInstance> {
        if instances.is_empty() {
            return None;
        }

        match self {
            Strategy::RoundRobin(round_robin) => round_robin.pick(service_id, instances),
            Strategy::Random => select_random(instances),
            Strategy::Weighted => select_weighted_random(service_id, instances),
            Strategy::Custom(custom) => custom.pick(service_id, instances, request),
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Strategy::{}", self.name())
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::round_robin()
    }
}

/// 轮询策略，每个服务独立计数
#[derive(Default)]
pub struct RoundRobin {
    positions: RwLock<HashMap<String, Arc<AtomicUsize>>>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, service_id: &str) -> Arc<AtomicUsize> {
        if let Some(counter) = self.positions.read().get(service_id) {
            return counter.clone();
        }
        self.positions
            .write()
            .entry(service_id.to_string())
            .or_insert_with(|| Arc::new(AtomicUsize::new(0)))
            .clone()
    }

    pub fn pick(&self, service_id: &str, instances: &[ServiceInstance]) -> Option<ServiceInstance> {
        if instances.is_empty() {
            return None;
        }
        let position = self.counter(service_id).fetch_add(1, Ordering::Relaxed);
        instances.get(position % instances.len()).cloned()
    }
}

fn select_random(instances: &[ServiceInstance]) -> Option<ServiceInstance> {
    let index = rand::rng().random_range(0..instances.len());
    instances.get(index).cloned()
}

fn select_weighted_random(service_id: &str, instances: &[ServiceInstance]) -> Option<ServiceInstance> {
    let candidates: Vec<(&ServiceInstance, f64)> = instances
        .iter()
        .map(|instance| (instance, instance.weight()))
        .filter(|(_, weight)| *weight > 0.0 && weight.is_finite())
        .collect();

    if candidates.is_empty() {
        tracing::debug!(
            "No instance with positive weight for service '{}' ({} candidates)",
            service_id,
            instances.len()
        );
        return None;
    }

    let weights: Vec<f64> = candidates.iter().map(|(_, w)| *w).collect();
    match WeightedIndex::new(&weights) {
        Ok(dist) => {
            let index = dist.sample(&mut rand::rng());
            candidates.get(index).map(|(instance, _)| (*instance).clone())
        }
        Err(e) => {
            tracing::warn!(
                "Failed to build weighted distribution for service '{}': {}",
                service_id,
                e
            );
            candidates.first().map(|(instance, _)| (*instance).clone())
        }
    }
}
