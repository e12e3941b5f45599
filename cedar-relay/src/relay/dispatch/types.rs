use thiserror::Error;

use crate::relay::client::TransportError;

/// 根据实例重建请求地址时的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[error("重建的地址无效 '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// 分发错误
///
/// 没有可用实例不属于错误，分发器会返回 503 响应
#[derive(Error, Debug)]
pub enum DispatchError {
    /// 请求URL中没有可用的服务名，属于调用方违反约定
    #[error("Request URI does not contain a valid hostname: {url}")]
    InvalidServiceName { url: String },
    #[error("无法根据实例 {instance} 重建请求: {source}")]
    Rewrite {
        instance: String,
        #[source]
        source: RewriteError,
    },
    /// 传输层错误，原样透传
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl DispatchError {
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            DispatchError::Transport(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_transport_error(self) -> Option<TransportError> {
        match self {
            DispatchError::Transport(e) => Some(e),
            _ => None,
        }
    }
}
