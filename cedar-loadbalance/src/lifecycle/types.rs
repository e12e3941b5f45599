use cedar_core::{Request, Response, ServiceInstance};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use std::fmt;

/// 选择实例时可见的请求快照
#[derive(Debug, Clone, PartialEq)]
pub struct RequestData {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
}

impl From<&Request> for RequestData {
    fn from(request: &Request) -> Self {
        Self {
            method: request.method().clone(),
            url: request.url().to_string(),
            headers: request.headers().clone(),
        }
    }
}

/// 传输层响应的元数据，随成功完成事件一起上报
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseData {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub request_url: String,
}

impl From<&Response> for ResponseData {
    fn from(response: &Response) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            request_url: response.request_url.clone(),
        }
    }
}

/// 传给实例选择器和 `on_start` 的选择请求，构造后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRequest {
    context: RequestData,
    hint: String,
}

impl SelectionRequest {
    pub fn new(context: RequestData, hint: impl Into<String>) -> Self {
        Self {
            context,
            hint: hint.into(),
        }
    }

    pub fn request_data(&self) -> &RequestData {
        &self.context
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }
}

/// 选择结果，`None` 表示没有可用实例
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionResponse {
    server: Option<ServiceInstance>,
}

impl SelectionResponse {
    pub fn new(server: Option<ServiceInstance>) -> Self {
        Self { server }
    }

    pub fn has_server(&self) -> bool {
        self.server.is_some()
    }

    pub fn server(&self) -> Option<&ServiceInstance> {
        self.server.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionStatus {
    /// 没有可用实例，请求未发出
    Discard,
    /// 传输失败
    Failed,
    Success,
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionStatus::Discard => write!(f, "DISCARD"),
            CompletionStatus::Failed => write!(f, "FAILED"),
            CompletionStatus::Success => write!(f, "SUCCESS"),
        }
    }
}

/// 分发完成事件
#[derive(Debug, Clone)]
pub struct CompletionContext<'a> {
    pub status: CompletionStatus,
    pub load_balancer_request: &'a SelectionRequest,
    pub load_balancer_response: &'a SelectionResponse,
    /// 仅在 [`CompletionStatus::Success`] 时存在
    pub client_response: Option<ResponseData>,
    /// 仅在 [`CompletionStatus::Failed`] 时存在
    pub error: Option<String>,
}

impl<'a> CompletionContext<'a> {
    pub fn discard(request: &'a SelectionRequest, response: &'a SelectionResponse) -> Self {
        Self {
            status: CompletionStatus::Discard,
            load_balancer_request: request,
            load_balancer_response: response,
            client_response: None,
            error: None,
        }
    }

    pub fn success(
        request: &'a SelectionRequest,
        response: &'a SelectionResponse,
        client_response: ResponseData,
    ) -> Self {
        Self {
            status: CompletionStatus::Success,
            load_balancer_request: request,
            load_balancer_response: response,
            client_response: Some(client_response),
            error: None,
        }
    }

    pub fn failed(
        request: &'a SelectionRequest,
        response: &'a SelectionResponse,
        error: impl Into<String>,
    ) -> Self {
        Self {
            status: CompletionStatus::Failed,
            load_balancer_request: request,
            load_balancer_response: response,
            client_response: None,
            error: Some(error.into()),
        }
    }
}

/// 生命周期上下文中某个位置的类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    RequestData,
    ResponseData,
    ServiceInstance,
    Named(&'static str),
}

/// 观察者声明的 (请求上下文, 响应, 实例) 形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LifecycleShape {
    pub request_context: ContextKind,
    pub response: ContextKind,
    pub server: ContextKind,
}

impl LifecycleShape {
    /// HTTP 分发器使用的形状
    pub const HTTP: LifecycleShape = LifecycleShape {
        request_context: ContextKind::RequestData,
        response: ContextKind::ResponseData,
        server: ContextKind::ServiceInstance,
    };

    pub const fn new(request_context: ContextKind, response: ContextKind, server: ContextKind) -> Self {
        Self {
            request_context,
            response,
            server,
        }
    }
}
