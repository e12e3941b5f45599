use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::borrow::Cow;

/// 传输层返回的响应，也用于分发器合成的“无可用实例”响应
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub charset: Option<String>,
    /// 实际请求的URL
    pub request_url: String,
}

impl Response {
    pub fn new(status: StatusCode, request_url: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            charset: None,
            request_url: request_url.into(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// 503 响应，消息以 UTF-8 写入响应体
    pub fn service_unavailable(request_url: impl Into<String>, message: &str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, request_url)
            .with_body(message.to_string())
            .with_charset("UTF-8")
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
