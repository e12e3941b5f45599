use cedar_core::{Config, LoadBalancerSettings, NamedContexts, Request, RequestOptions, Response, ServiceInstance};
use cedar_loadbalance::{
    CompletionContext, InstanceSelector, LifecyclePipeline, LifecycleShape, LoadBalancerClient,
    LoadBalancerLifecycle, RequestData, ResponseData, SelectionRequest, SelectionResponse,
    StaticServiceRegistry,
};
use reqwest::Url;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::rewrite::{build_request, reconstruct_url};
use super::types::DispatchError;
use crate::relay::client::{ReqwestTransport, Transport, TransportError};

/// 一次分发所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    Start,
    Selecting,
    NoInstance,
    Selected,
    Rewriting,
    Executing,
    Succeeded,
    Failed,
}

impl fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchPhase::Start => "start",
            DispatchPhase::Selecting => "selecting",
            DispatchPhase::NoInstance => "no_instance",
            DispatchPhase::Selected => "selected",
            DispatchPhase::Rewriting => "rewriting",
            DispatchPhase::Executing => "executing",
            DispatchPhase::Succeeded => "succeeded",
            DispatchPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// 负载均衡分发器
///
/// 把URL host 为逻辑服务名的请求改写为指向具体实例的请求并交给传输层执行。
/// 分发器本身不保存跨调用的可变状态，可以在多个任务间共享
#[derive(Clone)]
pub struct Dispatcher {
    delegate: Arc<dyn Transport>,
    selector: Arc<dyn InstanceSelector>,
    settings: LoadBalancerSettings,
    contexts: Arc<NamedContexts>,
}

impl Dispatcher {
    pub fn new(
        delegate: Arc<dyn Transport>,
        selector: Arc<dyn InstanceSelector>,
        settings: LoadBalancerSettings,
        contexts: Arc<NamedContexts>,
    ) -> Self {
        Self {
            delegate,
            selector,
            settings,
            contexts,
        }
    }

    /// 根据配置创建使用 reqwest 和静态注册表的分发器
    pub fn from_config(
        config: &Config,
        contexts: Arc<NamedContexts>,
    ) -> Result<(Self, Arc<StaticServiceRegistry>), TransportError> {
        let transport = ReqwestTransport::from_settings(&config.transport)?;
        let (client, registry) = LoadBalancerClient::from_config(config);
        let dispatcher = Self::new(
            Arc::new(transport),
            Arc::new(client),
            config.loadbalancer.clone(),
            contexts,
        );
        Ok((dispatcher, registry))
    }

    /// 被包装的传输层，供外部埋点使用
    pub fn delegate(&self) -> &Arc<dyn Transport> {
        &self.delegate
    }

    pub fn settings(&self) -> &LoadBalancerSettings {
        &self.settings
    }

    /// 执行一次分发
    ///
    /// 没有可用实例时返回 503 响应而不是错误；传输层错误原样返回
    pub async fn execute(
        &self,
        request: &Request,
        options: &RequestOptions,
    ) -> Result<Response, DispatchError> {
        let (original_url, service_id) = parse_service_url(request)?;
        trace_phase(&service_id, DispatchPhase::Start);

        let hint = self.settings.hint_for(&service_id);
        let lb_request = SelectionRequest::new(RequestData::from(request), hint);

        let lifecycle = self.lifecycle_for(&service_id);
        lifecycle.on_start(&lb_request);

        trace_phase(&service_id, DispatchPhase::Selecting);
        let lb_response = SelectionResponse::new(self.selector.choose(&service_id, &lb_request));

        let Some(instance) = lb_response.server() else {
            trace_phase(&service_id, DispatchPhase::NoInstance);
            let message = format!(
                "Load balancer does not contain an instance for the service {}",
                service_id
            );
            warn!("{}", message);
            lifecycle.on_complete(&CompletionContext::discard(&lb_request, &lb_response));
            return Ok(Response::service_unavailable(request.url(), &message));
        };

        trace_phase(&service_id, DispatchPhase::Selected);
        debug!(
            "Selected instance {} for service '{}' (hint={})",
            instance.instance_id,
            service_id,
            lb_request.hint()
        );

        trace_phase(&service_id, DispatchPhase::Rewriting);
        let reconstructed_url = match reconstruct_url(instance, &original_url) {
            Ok(url) => url,
            Err(e) => {
                trace_phase(&service_id, DispatchPhase::Failed);
                lifecycle.on_complete(&CompletionContext::failed(
                    &lb_request,
                    &lb_response,
                    e.to_string(),
                ));
                return Err(DispatchError::Rewrite {
                    instance: instance.key(),
                    source: e,
                });
            }
        };
        let new_request = build_request(request, &reconstructed_url);

        self.execute_with_lifecycle(
            &service_id,
            &new_request,
            options,
            instance,
            &lb_request,
            &lb_response,
            &lifecycle,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_with_lifecycle(
        &self,
        service_id: &str,
        request: &Request,
        options: &RequestOptions,
        instance: &ServiceInstance,
        lb_request: &SelectionRequest,
        lb_response: &SelectionResponse,
        lifecycle: &LifecyclePipeline,
    ) -> Result<Response, DispatchError> {
        trace_phase(service_id, DispatchPhase::Executing);
        lifecycle.on_start_request(lb_request, instance);

        match self.delegate.execute(request, options).await {
            Ok(response) => {
                trace_phase(service_id, DispatchPhase::Succeeded);
                lifecycle.on_complete(&CompletionContext::success(
                    lb_request,
                    lb_response,
                    ResponseData::from(&response),
                ));
                Ok(response)
            }
            Err(e) => {
                trace_phase(service_id, DispatchPhase::Failed);
                debug!(
                    "Request to instance {} failed for service '{}': {}",
                    instance.instance_id, service_id, e
                );
                lifecycle.on_complete(&CompletionContext::failed(
                    lb_request,
                    lb_response,
                    e.to_string(),
                ));
                Err(DispatchError::Transport(e))
            }
        }
    }

    /// 该服务本次分发适用的观察者
    fn lifecycle_for(&self, service_id: &str) -> LifecyclePipeline {
        let observers = self
            .contexts
            .get_instances::<Arc<dyn LoadBalancerLifecycle>>(service_id);
        LifecyclePipeline::supported(observers, LifecycleShape::HTTP)
            .isolate_failures(self.settings.isolate_lifecycle_failures)
    }
}

/// 解析请求URL并取出服务名
///
/// 服务名取自原始 authority，保留调用方写下的大小写；解析后的 `Url` 只用于改写
fn parse_service_url(request: &Request) -> Result<(Url, String), DispatchError> {
    let invalid = || DispatchError::InvalidServiceName {
        url: request.url().to_string(),
    };

    let url = Url::parse(request.url()).map_err(|_| invalid())?;
    if url.host_str().filter(|host| !host.is_empty()).is_none() {
        return Err(invalid());
    }
    let service_id = raw_host(request.url())
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .ok_or_else(invalid)?;
    Ok((url, service_id))
}

/// 从URL文本中取出 host，不做任何规范化
fn raw_host(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest
        .split(|c| matches!(c, '/' | '?' | '#' | '\\'))
        .next()?;
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);

    if host_port.starts_with('[') {
        let end = host_port.find(']')?;
        return host_port.get(..=end);
    }
    host_port.split(':').next()
}

fn trace_phase(service_id: &str, phase: DispatchPhase) {
    trace!(service = service_id, phase = %phase, "dispatch phase");
}
