use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    encryption::SessionCipher,
    error::Result,
    store::{self, JsonStore},
};

/// A logged-in user and their API token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub token: String,
}

/// On-disk form; the token is encrypted when a key is configured.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    user_id: Uuid,
    email: String,
    name: Option<String>,
    token: String,
    encrypted: bool,
}

pub struct SessionStore {
    store: JsonStore,
    cipher: Option<SessionCipher>,
}

impl SessionStore {
    pub fn new(store: JsonStore, cipher: Option<SessionCipher>) -> Self {
        Self { store, cipher }
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        let (token, encrypted) = match &self.cipher {
            Some(cipher) => (cipher.encrypt(&session.token)?, true),
            None => (session.token.clone(), false),
        };
        let stored = StoredSession {
            user_id: session.user_id,
            email: session.email.clone(),
            name: session.name.clone(),
            token,
            encrypted,
        };
        self.store.put(store::SESSION, &stored).await
    }

    /// The saved session, or `None` when logged out or the token cannot be read back.
    pub async fn load(&self) -> Result<Option<Session>> {
        let Some(stored) = self
            .store
            .get_or_discard::<StoredSession>(store::SESSION)
            .await?
        else {
            return Ok(None);
        };

        let token = match (stored.encrypted, &self.cipher) {
            (false, _) => stored.token,
            (true, Some(cipher)) => match cipher.decrypt(&stored.token) {
                Ok(token) => token,
                Err(e) => {
                    tracing::warn!("Stored session could not be decrypted: {}", e);
                    return Ok(None);
                }
            },
            (true, None) => {
                tracing::warn!("Stored session is encrypted but no session key is configured");
                return Ok(None);
            }
        };

        Ok(Some(Session {
            user_id: stored.user_id,
            email: stored.email,
            name: stored.name,
            token,
        }))
    }

    pub async fn clear(&self) -> Result<()> {
        if self.store.delete(store::SESSION).await? {
            tracing::info!("Session cleared");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

    fn session() -> Session {
        Session {
            user_id: Uuid::new_v4(),
            email: "player@example.com".into(),
            name: Some("Player".into()),
            token: "jwt-token".into(),
        }
    }

    fn cipher(byte: u8) -> SessionCipher {
        SessionCipher::from_base64_key(&BASE64.encode([byte; 32])).unwrap()
    }

    #[tokio::test]
    async fn test_plain_session_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = SessionStore::new(JsonStore::open(dir.path()).await.unwrap(), None);

        assert_eq!(sessions.load().await.unwrap(), None);
        sessions.save(&session()).await.unwrap();
        assert_eq!(sessions.load().await.unwrap().unwrap().token, "jwt-token");

        sessions.clear().await.unwrap();
        assert_eq!(sessions.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_encrypted_token_not_stored_in_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        let sessions = SessionStore::new(store.clone(), Some(cipher(7)));
        let original = session();
        sessions.save(&original).await.unwrap();

        let raw = tokio::fs::read_to_string(dir.path().join("session.json"))
            .await
            .unwrap();
        assert!(!raw.contains("jwt-token"));
        assert_eq!(sessions.load().await.unwrap(), Some(original));

        // A different key, or no key, reads as logged out
        let other = SessionStore::new(store.clone(), Some(cipher(8)));
        assert_eq!(other.load().await.unwrap(), None);
        let keyless = SessionStore::new(store, None);
        assert_eq!(keyless.load().await.unwrap(), None);
    }
}
