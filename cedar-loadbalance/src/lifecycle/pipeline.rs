use cedar_core::ServiceInstance;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::traits::LoadBalancerLifecycle;
use super::types::{CompletionContext, LifecycleShape, SelectionRequest};

/// 一次分发使用的观察者列表
///
/// 只做扇出通知，不含业务逻辑。观察者按注册顺序被调用
pub struct LifecyclePipeline {
    observers: Vec<(String, Arc<dyn LoadBalancerLifecycle>)>,
    isolate_failures: bool,
}

impl LifecyclePipeline {
    /// 从已注册的观察者中挑出形状与 `shape` 一致的部分
    pub fn supported<I>(observers: I, shape: LifecycleShape) -> Self
    where
        I: IntoIterator<Item = (String, Arc<dyn LoadBalancerLifecycle>)>,
    {
        let observers = observers
            .into_iter()
            .filter(|(name, observer)| {
                let supported = observer.shape() == shape;
                if !supported {
                    tracing::trace!("Skipping lifecycle observer '{}': unsupported shape", name);
                }
                supported
            })
            .collect();

        Self {
            observers,
            isolate_failures: false,
        }
    }

    /// 开启后单个观察者的 panic 会被记录并跳过，而不是中断分发
    pub fn isolate_failures(mut self, isolate: bool) -> Self {
        self.isolate_failures = isolate;
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn observer_names(&self) -> Vec<&str> {
        self.observers.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn on_start(&self, request: &SelectionRequest) {
        self.notify("on_start", |observer| observer.on_start(request));
    }

    pub fn on_start_request(&self, request: &SelectionRequest, instance: &ServiceInstance) {
        self.notify("on_start_request", |observer| {
            observer.on_start_request(request, instance)
        });
    }

    pub fn on_complete(&self, context: &CompletionContext<'_>) {
        self.notify("on_complete", |observer| observer.on_complete(context));
    }

    fn notify<F>(&self, hook: &str, f: F)
    where
        F: Fn(&dyn LoadBalancerLifecycle),
    {
        for (name, observer) in &self.observers {
            if !self.isolate_failures {
                f(observer.as_ref());
                continue;
            }

            let result = panic::catch_unwind(AssertUnwindSafe(|| f(observer.as_ref())));
            if let Err(payload) = result {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(
                    "Lifecycle observer '{}' failed in {}: {}",
                    name,
                    hook,
                    reason
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::types::{
        CompletionStatus, ContextKind, RequestData, SelectionResponse,
    };
    use cedar_core::Request;
    use parking_lot::Mutex;

    struct Recorder {
        label: &'static str,
        shape: LifecycleShape,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl LoadBalancerLifecycle for Recorder {
        fn shape(&self) -> LifecycleShape {
            self.shape
        }

        fn on_start(&self, _request: &SelectionRequest) {
            self.log.lock().push(format!("{}:start", self.label));
        }

        fn on_complete(&self, context: &CompletionContext<'_>) {
            self.log
                .lock()
                .push(format!("{}:complete:{}", self.label, context.status));
        }
    }

    struct Exploding;

    impl LoadBalancerLifecycle for Exploding {
        fn on_start(&self, _request: &SelectionRequest) {
            panic!("observer exploded");
        }

        fn on_complete(&self, _context: &CompletionContext<'_>) {}
    }

    fn recorder(
        label: &'static str,
        shape: LifecycleShape,
        log: &Arc<Mutex<Vec<String>>>,
    ) -> (String, Arc<dyn LoadBalancerLifecycle>) {
        (
            label.to_string(),
            Arc::new(Recorder {
                label,
                shape,
                log: log.clone(),
            }),
        )
    }

    fn selection_request() -> SelectionRequest {
        let request = Request::get("http://orders/api/items").build();
        SelectionRequest::new(RequestData::from(&request), "default")
    }

    #[test]
    fn test_filters_by_shape_and_keeps_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let other_shape = LifecycleShape::new(
            ContextKind::Named("grpc"),
            ContextKind::ResponseData,
            ContextKind::ServiceInstance,
        );

        let pipeline = LifecyclePipeline::supported(
            vec![
                recorder("first", LifecycleShape::HTTP, &log),
                recorder("grpc", other_shape, &log),
                recorder("second", LifecycleShape::HTTP, &log),
            ],
            LifecycleShape::HTTP,
        );
        assert_eq!(pipeline.observer_names(), vec!["first", "second"]);

        let request = selection_request();
        let response = SelectionResponse::new(None);
        pipeline.on_start(&request);
        pipeline.on_complete(&CompletionContext::discard(&request, &response));

        assert_eq!(
            *log.lock(),
            vec![
                "first:start",
                "second:start",
                "first:complete:DISCARD",
                "second:complete:DISCARD",
            ]
        );
    }

    #[test]
    fn test_isolated_pipeline_survives_panicking_observer() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = LifecyclePipeline::supported(
            vec![
                ("exploding".to_string(), Arc::new(Exploding) as Arc<dyn LoadBalancerLifecycle>),
                recorder("after", LifecycleShape::HTTP, &log),
            ],
            LifecycleShape::HTTP,
        )
        .isolate_failures(true);

        pipeline.on_start(&selection_request());
        assert_eq!(*log.lock(), vec!["after:start"]);
    }

    #[test]
    #[should_panic(expected = "observer exploded")]
    fn test_panicking_observer_propagates_by_default() {
        let pipeline = LifecyclePipeline::supported(
            vec![("exploding".to_string(), Arc::new(Exploding) as Arc<dyn LoadBalancerLifecycle>)],
            LifecycleShape::HTTP,
        );
        pipeline.on_start(&selection_request());
    }

    #[test]
    fn test_completion_context_constructors() {
        let request = selection_request();
        let response = SelectionResponse::default();

        let failed = CompletionContext::failed(&request, &response, "connection refused");
        assert_eq!(failed.status, CompletionStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("connection refused"));
        assert!(failed.client_response.is_none());
        assert!(!failed.load_balancer_response.has_server());
    }
}
