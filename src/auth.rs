//! Editor sessions.
//!
//! Every write-side operation (saving, publishing, revalidation, uploads)
//! requires a signed-in editor. Handlers only see the [`SessionVerifier`]
//! trait; [`PasswordGate`] is the built-in implementation, a single editor
//! account whose password hash comes from `[admin] password_sha256`.
//!
//! Tokens are ULIDs held in memory. They do not survive a restart.

use crate::config::AdminConfig;
use chrono::{DateTime, TimeDelta, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("sign-in is disabled: no admin password is configured")]
    Disabled,
    #[error("invalid email or password")]
    InvalidCredentials,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

pub trait SessionVerifier: Send + Sync {
    /// The live session for `token`, if any.
    fn verify(&self, token: &str) -> Option<Session>;
}

/// Hex SHA-256 of a password, the format `password_sha256` expects.
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Password sign-in for the single editor account.
#[derive(Debug)]
pub struct PasswordGate {
    email: Option<String>,
    password_sha256: Option<String>,
    ttl: TimeDelta,
    sessions: Mutex<HashMap<String, Session>>,
}

impl PasswordGate {
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            email: config.email.clone(),
            password_sha256: config
                .password_sha256
                .as_deref()
                .map(|h| h.trim().to_lowercase())
                .filter(|h| !h.is_empty()),
            ttl: i64::try_from(config.session_ttl_secs)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .unwrap_or(TimeDelta::MAX),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Check credentials and issue a token.
    ///
    /// When an admin email is configured it must match (case-insensitive);
    /// otherwise any email is accepted and recorded on the session.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let Some(expected) = &self.password_sha256 else {
            tracing::warn!(email, "sign-in attempted with no admin password configured");
            return Err(AuthError::Disabled);
        };
        let email_ok = self
            .email
            .as_deref()
            .is_none_or(|e| e.eq_ignore_ascii_case(email.trim()));
        if !email_ok || hash_password(password) != *expected {
            tracing::warn!(email, "rejected sign-in");
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        let session = Session {
            token: ulid::Ulid::new().to_string(),
            email: email.trim().to_string(),
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        let mut sessions = self.lock();
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(session.token.clone(), session.clone());
        drop(sessions);
        tracing::info!(email = %session.email, expires_at = %session.expires_at, "editor signed in");
        Ok(session)
    }

    /// Drop a session. Unknown tokens are ignored.
    pub fn sign_out(&self, token: &str) {
        if self.lock().remove(token).is_some() {
            tracing::info!("editor signed out");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionVerifier for PasswordGate {
    fn verify(&self, token: &str) -> Option<Session> {
        let mut sessions = self.lock();
        let session = sessions.get(token)?;
        if session.expires_at <= Utc::now() {
            sessions.remove(token);
            return None;
        }
        Some(session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(email: Option<&str>, password: Option<&str>, ttl: u64) -> PasswordGate {
        PasswordGate::new(&AdminConfig {
            email: email.map(String::from),
            password_sha256: password.map(hash_password),
            session_ttl_secs: ttl,
        })
    }

    #[test]
    fn hash_is_hex_sha256() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sign_in_then_verify() {
        let gate = gate(Some("m@example.com"), Some("secret"), 60);
        let session = gate.sign_in("M@example.com", "secret").unwrap();
        assert_eq!(gate.verify(&session.token), Some(session));
    }

    #[test]
    fn wrong_password_or_email_is_rejected() {
        let gate = gate(Some("m@example.com"), Some("secret"), 60);
        assert_eq!(
            gate.sign_in("m@example.com", "nope"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            gate.sign_in("x@example.com", "secret"),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn no_configured_hash_rejects_everything() {
        let gate = gate(None, None, 60);
        assert_eq!(gate.sign_in("a@b.c", ""), Err(AuthError::Disabled));
    }

    #[test]
    fn unknown_and_signed_out_tokens_fail() {
        let gate = gate(None, Some("secret"), 60);
        assert!(gate.verify("bogus").is_none());
        let session = gate.sign_in("a@b.c", "secret").unwrap();
        gate.sign_out(&session.token);
        assert!(gate.verify(&session.token).is_none());
    }

    #[test]
    fn expired_tokens_fail() {
        let gate = gate(None, Some("secret"), 0);
        let session = gate.sign_in("a@b.c", "secret").unwrap();
        assert!(gate.verify(&session.token).is_none());
    }

    #[test]
    fn huge_ttl_saturates_instead_of_overflowing() {
        for ttl in [u64::MAX, 10_000_000_000_000] {
            let gate = gate(None, Some("secret"), ttl);
            let session = gate.sign_in("a@b.c", "secret").unwrap();
            assert!(session.expires_at > Utc::now());
            assert!(gate.verify(&session.token).is_some());
        }
    }

    #[test]
    fn sign_in_prunes_expired_sessions() {
        let gate = gate(None, Some("secret"), 0);
        for _ in 0..3 {
            gate.sign_in("a@b.c", "secret").unwrap();
        }
        assert_eq!(gate.lock().len(), 1);
    }
}
