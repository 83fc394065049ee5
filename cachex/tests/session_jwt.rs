#![cfg(feature = "jwt")]

use std::sync::Arc;
use std::time::Duration;

use cachex::backend::memory::MemoryBackend;
use cachex::backend::Backend;
use cachex::session::{SessionConfig, SessionManager, SessionUser, TokenFormat};

fn jwt_config(secret: &str) -> SessionConfig {
    let mut config = SessionConfig::new(secret.to_string()).unwrap();
    config.token_format = TokenFormat::Jwt;
    config
}

/// Grounded on `original_source/tests/session/test_jwt.py::test_jwt_create_and_get_session`.
#[tokio::test]
async fn jwt_create_and_get_session_round_trips() {
    let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
    let mut config = jwt_config(&"a".repeat(32));
    config.jwt_issuer = Some("test-iss".to_string());
    config.jwt_audience = Some("test-aud".to_string());
    let manager = SessionManager::new(backend, config).unwrap();

    let user = SessionUser::new("u1", "alice");
    let (created, token) = manager.create_session(Some(user), None, None).await.unwrap();

    let retrieved = manager.get_session(&token, None, None).await.unwrap();
    assert_eq!(retrieved.session_id, created.session_id);
    assert_eq!(retrieved.user.unwrap().user_id, "u1");
}

/// Grounded on `test_jwt_invalid_signature_rejected`.
#[tokio::test]
async fn jwt_tampered_token_is_rejected() {
    let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
    let manager = SessionManager::new(backend, jwt_config(&"a".repeat(32))).unwrap();

    let (_, token) = manager
        .create_session(Some(SessionUser::new("u1", "alice")), None, None)
        .await
        .unwrap();

    let mut bytes: Vec<u8> = token.into_bytes();
    let last = bytes.len() - 2;
    bytes[last] = if bytes[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(bytes).unwrap();

    assert!(manager.get_session(&tampered, None, None).await.is_err());
}

/// Grounded on `test_jwt_wrong_audience_rejected`.
#[tokio::test]
async fn jwt_wrong_audience_is_rejected() {
    let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
    let mut config1 = jwt_config(&"a".repeat(32));
    config1.jwt_audience = Some("aud1".to_string());
    let manager1 = SessionManager::new(backend.clone(), config1).unwrap();
    let (_, token) = manager1
        .create_session(Some(SessionUser::new("u1", "alice")), None, None)
        .await
        .unwrap();

    let mut config2 = jwt_config(&"a".repeat(32));
    config2.jwt_audience = Some("aud2".to_string());
    let manager2 = SessionManager::new(backend, config2).unwrap();

    assert!(manager2.get_session(&token, None, None).await.is_err());
}

/// Grounded on `test_jwt_expiration_enforced`.
#[tokio::test]
async fn jwt_expiration_is_enforced() {
    let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
    let mut config = jwt_config(&"a".repeat(32));
    config.session_ttl = 1;
    let manager = SessionManager::new(backend, config).unwrap();

    let (_, token) = manager
        .create_session(Some(SessionUser::new("u1", "alice")), None, None)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1200)).await;

    assert!(manager.get_session(&token, None, None).await.is_err());
}
