use argon2::{
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand_core::OsRng;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::PlatformError;

const SESSION_KEY_PREFIX: &str = "session:";
const ACCOUNT_KEY_PREFIX: &str = "account:";
const MAX_USERNAME_LEN: usize = 64;
pub const MIN_PASSWORD_LEN: usize = 8;

/// A signed-in user. Lives for the session TTL on the platform side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(username: &str) -> Result<Self, PlatformError> {
        let username = username.trim();
        let user_id = normalize_username(username)?;
        Ok(Self {
            token: Uuid::new_v4().to_string(),
            user_id,
            username: username.to_string(),
            created_at: Utc::now(),
        })
    }
}

/// Registered user. Only the argon2 PHC string of the password is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub user_id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Lowercases and checks a username so it can be embedded in KV keys and blob paths.
pub fn normalize_username(username: &str) -> Result<String, PlatformError> {
    let normalized = username.trim().to_lowercase();
    let valid = !normalized.is_empty()
        && normalized.len() <= MAX_USERNAME_LEN
        && normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(PlatformError::InvalidUsername(username.to_string()));
    }
    Ok(normalized)
}

pub fn check_password(password: &str) -> Result<(), PlatformError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PlatformError::WeakPassword(MIN_PASSWORD_LEN));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, PlatformError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PlatformError::PasswordHash(e.to_string()))
}

/// `Ok(false)` on a wrong password; `Err` only when the stored hash is unusable.
pub fn verify_password(password: &str, hashed: &str) -> Result<bool, PlatformError> {
    let parsed =
        PasswordHash::new(hashed).map_err(|e| PlatformError::PasswordHash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(e) => Err(PlatformError::PasswordHash(e.to_string())),
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Registers `username` and opens a session for it.
    async fn sign_up(&self, username: &str, password: &str) -> Result<Session, PlatformError>;

    async fn sign_in(&self, username: &str, password: &str) -> Result<Session, PlatformError>;

    async fn session(&self, token: &str) -> Result<Option<Session>, PlatformError>;

    async fn sign_out(&self, token: &str) -> Result<(), PlatformError>;

    async fn ping(&self) -> Result<(), PlatformError>;
}

/// Accounts under `account:<user_id>` and sessions under `session:<token>`
/// with an expiry, both in Redis.
pub struct RedisSessionStore {
    client: Client,
    ttl_secs: u64,
}

impl RedisSessionStore {
    pub fn new(client: Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }

    async fn conn(&self) -> Result<MultiplexedConnection, PlatformError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    async fn open_session(&self, username: &str) -> Result<Session, PlatformError> {
        let session = Session::new(username)?;
        let value = serde_json::to_string(&session)?;

        let mut conn = self.conn().await?;
        let _: () = conn
            .set_ex(
                format!("{SESSION_KEY_PREFIX}{}", session.token),
                value,
                self.ttl_secs,
            )
            .await?;

        info!("User {} signed in", session.user_id);
        Ok(session)
    }
}

/// Runs argon2 work on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, PlatformError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PlatformError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PlatformError::PasswordHash(e.to_string()))?
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn sign_up(&self, username: &str, password: &str) -> Result<Session, PlatformError> {
        let user_id = normalize_username(username)?;
        check_password(password)?;

        let password = password.to_string();
        let account = Account {
            user_id: user_id.clone(),
            username: username.trim().to_string(),
            password_hash: blocking(move || hash_password(&password)).await?,
            created_at: Utc::now(),
        };
        let value = serde_json::to_string(&account)?;

        let mut conn = self.conn().await?;
        let created: bool = conn
            .set_nx(format!("{ACCOUNT_KEY_PREFIX}{user_id}"), value)
            .await?;
        if !created {
            return Err(PlatformError::UsernameTaken(user_id));
        }

        info!("Registered user {user_id}");
        self.open_session(&account.username).await
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<Session, PlatformError> {
        let user_id = normalize_username(username)?;

        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(format!("{ACCOUNT_KEY_PREFIX}{user_id}")).await?;
        let Some(raw) = raw else {
            return Err(PlatformError::InvalidCredentials);
        };
        let account: Account = serde_json::from_str(&raw)?;

        let password = password.to_string();
        let hashed = account.password_hash.clone();
        if !blocking(move || verify_password(&password, &hashed)).await? {
            warn!("Rejected sign-in for {user_id}");
            return Err(PlatformError::InvalidCredentials);
        }

        self.open_session(&account.username).await
    }

    async fn session(&self, token: &str) -> Result<Option<Session>, PlatformError> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(format!("{SESSION_KEY_PREFIX}{token}")).await?;
        raw.map(|value| serde_json::from_str(&value))
            .transpose()
            .map_err(PlatformError::from)
    }

    async fn sign_out(&self, token: &str) -> Result<(), PlatformError> {
        let mut conn = self.conn().await?;
        let _: () = conn.del(format!("{SESSION_KEY_PREFIX}{token}")).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), PlatformError> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_username_lowercases() {
        assert_eq!(normalize_username("  Alice_01 ").unwrap(), "alice_01");
    }

    #[test]
    fn test_normalize_username_rejects_glob_and_path_chars() {
        for bad in ["", "   ", "a*b", "../etc", "a:b", "a/b", "sp ace"] {
            assert!(normalize_username(bad).is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn test_normalize_username_rejects_overlong() {
        let long = "x".repeat(MAX_USERNAME_LEN + 1);
        assert!(normalize_username(&long).is_err());
    }

    #[test]
    fn test_session_new_keeps_display_name() {
        let session = Session::new("Alice").unwrap();
        assert_eq!(session.username, "Alice");
        assert_eq!(session.user_id, "alice");
        assert!(Uuid::parse_str(&session.token).is_ok());
    }

    #[test]
    fn test_check_password_enforces_minimum_length() {
        assert!(matches!(
            check_password("short"),
            Err(PlatformError::WeakPassword(MIN_PASSWORD_LEN))
        ));
        assert!(check_password("long enough").is_ok());
    }

    #[test]
    fn test_password_hash_verifies_only_the_original() {
        let hashed = hash_password("correct horse").unwrap();
        assert!(hashed.starts_with("$argon2"));
        assert!(!hashed.contains("correct horse"));
        assert!(verify_password("correct horse", &hashed).unwrap());
        assert!(!verify_password("wrong horse", &hashed).unwrap());
    }

    #[test]
    fn test_verify_password_rejects_malformed_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(PlatformError::PasswordHash(_))
        ));
    }
}
