use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::model::TransportSettings;

/// 构建请求时附带的模板元数据，用于重新签名或链路追踪
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTemplate {
    /// 逻辑客户端名称
    pub client_name: Option<String>,
    /// 发起调用的方法标识，例如 `OrdersClient#get_item`
    pub method_key: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

/// 一次调用的请求
///
/// 调用方构造后不可变；URL 的 host 段可以是逻辑服务名
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Bytes,
    charset: Option<String>,
    template: RequestTemplate,
}

impl Request {
    pub fn builder(method: Method, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            request: Request {
                method,
                url: url.into(),
                headers: HeaderMap::new(),
                body: Bytes::new(),
                charset: None,
                template: RequestTemplate::default(),
            },
        }
    }

    pub fn get(url: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::POST, url)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    pub fn template(&self) -> &RequestTemplate {
        &self.template
    }

    /// 复制当前请求，只替换目标URL
    pub fn with_url(&self, url: impl Into<String>) -> Request {
        Request {
            method: self.method.clone(),
            url: url.into(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            charset: self.charset.clone(),
            template: self.template.clone(),
        }
    }
}

pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// 追加一个请求头，非法的名称或值会被忽略
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(header_name), Ok(header_value)) => {
                self.request.headers.append(header_name, header_value);
            }
            _ => {
                tracing::warn!("Ignoring invalid header '{}: {}'", name, value);
            }
        }
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.request.headers = headers;
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.request.body = body.into();
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.request.charset = Some(charset.into());
        self
    }

    pub fn template(mut self, template: RequestTemplate) -> Self {
        self.request.template = template;
        self
    }

    pub fn build(self) -> Request {
        self.request
    }
}

/// 单次调用的传输选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub follow_redirects: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::from(&TransportSettings::default())
    }
}

impl From<&TransportSettings> for RequestOptions {
    fn from(settings: &TransportSettings) -> Self {
        Self {
            connect_timeout: settings.connect_timeout(),
            read_timeout: settings.read_timeout(),
            follow_redirects: settings.follow_redirects,
        }
    }
}
