use async_trait::async_trait;
use cedar_core::{Request, RequestOptions, Response};
use std::sync::Arc;

use super::types::TransportError;

/// 传输层接口
///
/// 执行已经指向具体实例的请求。超时等选项只由传输层负责
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        request: &Request,
        options: &RequestOptions,
    ) -> Result<Response, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(
        &self,
        request: &Request,
        options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        (**self).execute(request, options).await
    }
}
