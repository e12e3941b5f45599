pub mod dispatcher;
pub mod rewrite;
pub mod types;


pub use dispatcher::{DispatchPhase, Dispatcher};
pub use rewrite::{build_request, reconstruct_url};
pub use types::{DispatchError, RewriteError};
