//! Accounts and bearer sessions.

mod password;
mod tokens;

pub use password::PasswordHasher;
pub use tokens::{SessionData, TokenStore, MAX_EXPIRY_MINUTES};

use std::sync::Arc;

use crate::models::{LoginRequest, NewUser, SessionResponse, SignupRequest, User};
use crate::store::{SharedStore, StoreError};

/// Errors from signup, login and token checks.
#[derive(Debug)]
pub enum AuthError {
    /// An account with this email already exists.
    EmailTaken,
    /// Unknown email or wrong password; deliberately not distinguished.
    InvalidCredentials,
    /// Unknown or expired bearer token, or the account is gone.
    InvalidToken,
    /// Rejected signup input.
    Validation(String),
    /// Password hashing or verification broke.
    Hashing(String),
    Store(StoreError),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::EmailTaken => write!(f, "Este e-mail já existe."),
            AuthError::InvalidCredentials => write!(f, "E-mail e/ou senha incorreta."),
            AuthError::InvalidToken => write!(f, "Could not validate credentials"),
            AuthError::Validation(msg) => write!(f, "{}", msg),
            AuthError::Hashing(e) => write!(f, "Password hashing error: {}", e),
            AuthError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        AuthError::Store(e)
    }
}

/// Lower-cases and trims an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Accepts `local@domain.tld` shapes without whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
            .unwrap_or(false)
}

/// Signup, login and bearer token resolution.
#[derive(Clone)]
pub struct AuthService {
    store: SharedStore,
    hasher: PasswordHasher,
    tokens: Arc<TokenStore>,
}

impl AuthService {
    pub fn new(store: SharedStore, hasher: PasswordHasher, tokens: Arc<TokenStore>) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Registers an account and opens a session for it.
    pub async fn signup(&self, request: SignupRequest) -> Result<SessionResponse, AuthError> {
        let email = normalize_email(&request.email);
        if !is_valid_email(&email) {
            return Err(AuthError::Validation(
                "email is not a valid address".to_string(),
            ));
        }
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(AuthError::Validation("name must not be empty".to_string()));
        }
        if request.password.is_empty() {
            return Err(AuthError::Validation(
                "password must not be empty".to_string(),
            ));
        }

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hash_password(request.password).await?;
        let phone = request
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let user = match self
            .store
            .create_user(NewUser {
                email,
                name,
                phone,
                password_hash,
            })
            .await
        {
            Ok(user) => user,
            Err(StoreError::Conflict(..)) => return Err(AuthError::EmailTaken),
            Err(e) => return Err(e.into()),
        };

        tracing::info!("New account {}", user.id);
        let token = self.tokens.issue(&user.id);
        Ok(SessionResponse::bearer(&user, token))
    }

    /// Checks credentials and opens a session.
    pub async fn login(&self, request: LoginRequest) -> Result<SessionResponse, AuthError> {
        let email = normalize_email(&request.email);
        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self
            .verify_password(request.password, user.password_hash.clone())
            .await?
        {
            tracing::debug!("Rejected password for {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.id);
        Ok(SessionResponse::bearer(&user, token))
    }

    /// Resolves a bearer token to its account.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let session = self.tokens.validate(token).ok_or(AuthError::InvalidToken)?;
        self.store
            .get_user(&session.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    // Hashing runs on the blocking pool.
    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, MemoryStore};

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryStore::new()),
            PasswordHasher::with_params(1024, 1, 1).unwrap(),
            Arc::new(TokenStore::new(30)),
        )
    }

    fn signup_request(email: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            name: "Carla".to_string(),
            phone: None,
            password: "teste123!".to_string(),
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ana@localhost"));
        assert!(!is_valid_email("ana@@example.com"));
        assert!(!is_valid_email("ana @example.com"));
        assert!(!is_valid_email("ana@example."));
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let auth = service();

        let signed_up = auth.signup(signup_request("Carla@Example.com ")).await.unwrap();
        assert_eq!(signed_up.user.email, "carla@example.com");
        assert_eq!(signed_up.token_type, "bearer");

        let logged_in = auth
            .login(LoginRequest {
                email: "carla@example.com".to_string(),
                password: "teste123!".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.user.id, signed_up.user.id);
        assert_ne!(logged_in.access_token, signed_up.access_token);
    }

    #[tokio::test]
    async fn test_duplicate_signup_rejected() {
        let auth = service();
        auth.signup(signup_request("dup@example.com")).await.unwrap();

        let err = auth
            .signup(signup_request("DUP@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
        assert_eq!(err.to_string(), "Este e-mail já existe.");
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let auth = service();

        let mut bad_email = signup_request("not-an-email");
        assert!(matches!(
            auth.signup(bad_email.clone()).await,
            Err(AuthError::Validation(_))
        ));

        bad_email.email = "ok@example.com".to_string();
        bad_email.password = String::new();
        assert!(matches!(
            auth.signup(bad_email).await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_login_failures_look_the_same() {
        let auth = service();
        auth.signup(signup_request("eva@example.com")).await.unwrap();

        let wrong_password = auth
            .login(LoginRequest {
                email: "eva@example.com".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_email = auth
            .login(LoginRequest {
                email: "ghost@example.com".to_string(),
                password: "teste123!".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let auth = service();
        let session = auth.signup(signup_request("fa@example.com")).await.unwrap();

        let user = auth.authenticate(&session.access_token).await.unwrap();
        assert_eq!(user.id, session.user.id);

        assert!(matches!(
            auth.authenticate("garbage").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_token_for_deleted_user_is_invalid() {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(
            store.clone(),
            PasswordHasher::with_params(1024, 1, 1).unwrap(),
            Arc::new(TokenStore::new(30)),
        );
        let session = auth.signup(signup_request("gone@example.com")).await.unwrap();

        store.delete_user(&session.user.id).await.unwrap();

        assert!(matches!(
            auth.authenticate(&session.access_token).await,
            Err(AuthError::InvalidToken)
        ));
    }
}
