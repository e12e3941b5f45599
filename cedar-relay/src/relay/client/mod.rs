pub mod http;
pub mod traits;
pub mod types;

pub use http::ReqwestTransport;
pub use traits::Transport;
pub use types::TransportError;
