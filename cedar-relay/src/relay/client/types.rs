use thiserror::Error;

// 定义传输层错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP请求失败: {0}")]
    Request(#[from] reqwest::Error),
    #[error("I/O错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("无效的请求: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// 是否为超时
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Request(e) => e.is_timeout(),
            TransportError::Io(e) => e.kind() == std::io::ErrorKind::TimedOut,
            TransportError::InvalidRequest(_) => false,
        }
    }

    /// 是否为连接失败
    pub fn is_connect(&self) -> bool {
        match self {
            TransportError::Request(e) => e.is_connect(),
            TransportError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
            ),
            TransportError::InvalidRequest(_) => false,
        }
    }
}
