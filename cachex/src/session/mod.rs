pub mod config;
pub mod error;
pub mod extract;
pub mod manager;
pub mod model;
pub mod token_serializer;

pub use config::{SameSite, SessionConfig, TokenFormat, TokenSource};
pub use error::SessionError;
pub use extract::extract_token;
pub use manager::SessionManager;
pub use model::{FlashMessage, Session, SessionStatus, SessionToken, SessionUser};
pub use token_serializer::{SimpleTokenSerializer, TokenSerializer};
#[cfg(feature = "jwt")]
pub use token_serializer::JwtTokenSerializer;
