/// Errors raised by `StateManager`, grounded on
/// `original_source/tests/state/test_manager.py`: an unknown or already
/// consumed state token is `Invalid`, a state past its TTL is `Expired`,
/// and a backend record that fails to deserialize is `Data`.
#[derive(thiserror::Error, Debug)]
pub enum StateError {
    #[error("state token is invalid or already consumed")]
    Invalid,

    #[error("state token has expired")]
    Expired,

    #[error("state data could not be decoded: {0}")]
    Data(String),
}
