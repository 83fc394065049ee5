use crate::{backend::error::BackendError, cache::error::CacheConfigError};
use crate::{session::error::SessionError, state::error::StateError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("cache configuration error: {0}")]
    CacheConfig(#[from] CacheConfigError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
