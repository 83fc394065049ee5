pub mod error;
pub mod interface;
#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "memcache")]
pub mod memcache;
pub mod proxy;
#[cfg(feature = "redis")]
pub mod redis;

pub use error::BackendError;
pub use interface::Backend;
pub use proxy::{BackendProxy, GLOBAL_BACKEND};
