use async_trait::async_trait;
use cedar_core::{Request, RequestOptions, Response, TransportSettings};
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{Client, Url};
use std::collections::HashMap;
use std::time::Duration;

use super::traits::Transport;
use super::types::TransportError;

/// 基于 reqwest 的传输层实现
///
/// 连接超时和重定向策略属于客户端级别配置，按选项组合缓存客户端；
/// 读超时作为单次请求的超时
pub struct ReqwestTransport {
    clients: RwLock<HashMap<(Duration, bool), Client>>,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// 按配置预先创建默认客户端
    pub fn from_settings(settings: &TransportSettings) -> Result<Self, TransportError> {
        let transport = Self::new();
        transport.client_for(&RequestOptions::from(settings))?;
        Ok(transport)
    }

    fn client_for(&self, options: &RequestOptions) -> Result<Client, TransportError> {
        let key = (options.connect_timeout, options.follow_redirects);
        if let Some(client) = self.clients.read().get(&key) {
            return Ok(client.clone());
        }

        let policy = if options.follow_redirects {
            Policy::default()
        } else {
            Policy::none()
        };
        let client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .redirect(policy)
            .build()?;

        tracing::debug!(
            "Created HTTP client (connect_timeout={:?}, follow_redirects={})",
            options.connect_timeout,
            options.follow_redirects
        );
        self.clients.write().insert(key, client.clone());
        Ok(client)
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// 从 Content-Type 中取出 charset 参数
fn charset_of(headers: &HeaderMap) -> Option<String> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(
        &self,
        request: &Request,
        options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        let url = Url::parse(request.url()).map_err(|e| {
            TransportError::InvalidRequest(format!("invalid url '{}': {}", request.url(), e))
        })?;
        let client = self.client_for(options)?;

        let mut builder = client
            .request(request.method().clone(), url)
            .headers(request.headers().clone())
            .timeout(options.read_timeout);
        if !request.body().is_empty() {
            builder = builder.body(request.body().clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        tracing::debug!("{} {} -> {}", request.method(), request.url(), status);

        let mut result = Response::new(status, request.url())
            .with_headers(headers)
            .with_body(body);
        result.charset = charset_of(&result.headers);
        Ok(result)
    }
}
