//! Bearer session tokens.
//!
//! Tokens are opaque random strings held in memory with an expiry. Only a
//! SHA-256 digest of each token is kept, so a dump of the store does not
//! yield usable credentials. Tokens stay valid until they expire.

use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Longest token lifetime accepted: one year.
pub const MAX_EXPIRY_MINUTES: u64 = 365 * 24 * 60;

/// Data associated with a token.
#[derive(Debug, Clone)]
pub struct SessionData {
    /// Account the token was issued to.
    pub user_id: String,
    /// When the token was created.
    pub created_at: Instant,
    /// When the token expires.
    pub expires_at: Instant,
}

/// In-memory token store with expiry.
///
/// Thread-safe via internal RwLock.
#[derive(Debug)]
pub struct TokenStore {
    /// Sessions indexed by token digest.
    sessions: RwLock<HashMap<String, SessionData>>,
    /// Default expiry duration.
    default_expiry: Duration,
}

impl TokenStore {
    /// Creates a new token store with the specified default expiry in minutes,
    /// capped at [`MAX_EXPIRY_MINUTES`].
    pub fn new(expiry_minutes: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            default_expiry: Duration::from_secs(expiry_minutes.min(MAX_EXPIRY_MINUTES) * 60),
        }
    }

    /// Issues a new token for `user_id`.
    ///
    /// Returns the token string (32 bytes, base64url encoded).
    pub fn issue(&self, user_id: &str) -> String {
        self.issue_with_expiry(user_id, self.default_expiry)
    }

    /// Issues a new token with a custom expiry duration.
    pub fn issue_with_expiry(&self, user_id: &str, expiry: Duration) -> String {
        let token = generate_token();
        let now = Instant::now();

        let data = SessionData {
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + expiry,
        };

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(digest(&token), data);

        token
    }

    /// Returns the session for a token if it is known and unexpired.
    ///
    /// An expired token is dropped on sight.
    pub fn validate(&self, token: &str) -> Option<SessionData> {
        let key = digest(token);
        let now = Instant::now();

        {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            match sessions.get(&key) {
                Some(data) if data.expires_at > now => return Some(data.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        None
    }

    /// Removes all expired tokens.
    ///
    /// Returns the number of tokens removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        let before = sessions.len();
        sessions.retain(|_, data| data.expires_at > now);
        let after = sessions.len();

        before - after
    }

    /// Returns the number of tokens currently stored.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(30)
    }
}

/// Generates a secure random token.
///
/// Returns 32 random bytes encoded as base64url (no padding).
fn generate_token() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn digest(token: &str) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_issue_returns_unique() {
        let store = TokenStore::new(10);

        let token1 = store.issue("u1");
        let token2 = store.issue("u1");

        assert_ne!(token1, token2);
        assert_eq!(token1.len(), 43); // 32 bytes base64url = 43 chars
    }

    #[test]
    fn test_validate_valid_token() {
        let store = TokenStore::new(10);

        let token = store.issue("u1");
        let data = store.validate(&token).unwrap();

        assert_eq!(data.user_id, "u1");
        assert!(data.expires_at > data.created_at);
    }

    #[test]
    fn test_token_is_reusable_until_expiry() {
        let store = TokenStore::new(10);

        let token = store.issue("u1");

        assert!(store.validate(&token).is_some());
        assert!(store.validate(&token).is_some());
    }

    #[test]
    fn test_validate_unknown_token() {
        let store = TokenStore::new(10);

        assert!(store.validate("nonexistent-token").is_none());
    }

    #[test]
    fn test_validate_expired_token() {
        let store = TokenStore::new(10);

        let token = store.issue_with_expiry("u1", Duration::from_secs(0));

        // Small sleep to ensure expiry
        thread::sleep(Duration::from_millis(10));

        assert!(store.validate(&token).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_raw_token_not_stored() {
        let store = TokenStore::new(10);

        let token = store.issue("u1");
        let sessions = store.sessions.read().unwrap();

        assert!(!sessions.contains_key(&token));
        assert!(sessions.contains_key(&digest(&token)));
    }

    #[test]
    fn test_huge_expiry_is_capped() {
        let store = TokenStore::new(u64::MAX);

        assert_eq!(
            store.default_expiry,
            Duration::from_secs(MAX_EXPIRY_MINUTES * 60)
        );
        let token = store.issue("u1");
        assert!(store.validate(&token).is_some());
    }

    #[test]
    fn test_cleanup_expired() {
        let store = TokenStore::new(10);

        store.issue_with_expiry("a", Duration::from_secs(0));
        store.issue_with_expiry("b", Duration::from_secs(0));
        store.issue("c"); // not expired

        // Wait for expiry
        thread::sleep(Duration::from_millis(10));

        assert_eq!(store.len(), 3);

        let removed = store.cleanup_expired();

        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_generate_token_format() {
        let token = generate_token();

        // Should be base64url, 43 characters (32 bytes)
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
