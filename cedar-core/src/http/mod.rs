//! HTTP 请求/响应值类型
//!
//! 分发器只搬运这些值，从不解释请求体

pub mod request;
pub mod response;

pub use request::{Request, RequestBuilder, RequestOptions, RequestTemplate};
pub use response::Response;
