use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account as held by the store.
///
/// `password_hash` is a PHC string and never leaves the server.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for a user that does not exist yet. The store assigns id and
/// created_at.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of an account, returned by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            phone: user.phone.clone(),
        }
    }
}

/// Returned by signup and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub user: UserProfile,
    pub access_token: String,
    pub token_type: String,
}

impl SessionResponse {
    pub fn bearer(user: &User, access_token: String) -> Self {
        Self {
            user: UserProfile::from(user),
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_response_is_flat() {
        let user = User {
            id: "u1".to_string(),
            email: "ana@example.com".to_string(),
            name: "Ana".to_string(),
            phone: None,
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(SessionResponse::bearer(&user, "tok".to_string())).unwrap();

        assert_eq!(json["id"], "u1");
        assert_eq!(json["email"], "ana@example.com");
        assert_eq!(json["access_token"], "tok");
        assert_eq!(json["token_type"], "bearer");
        assert!(json.get("password_hash").is_none());
    }
}
