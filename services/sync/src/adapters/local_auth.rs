//! services/sync/src/adapters/local_auth.rs
//!
//! This module contains the local authentication adapter, the concrete
//! implementation of the `AuthProvider` port. It keeps argon2-hashed
//! credentials in process memory and publishes every auth-state change on a
//! watch channel, standing in for the hosted auth service.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use madrasa_console_core::domain::Session;
use madrasa_console_core::ports::{AuthError, AuthProvider, SessionStream};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::watch;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

struct StoredUser {
    subject_id: Uuid,
    display_name: String,
    password_hash: String,
}

/// An in-process adapter that implements the `AuthProvider` port.
pub struct LocalAuthProvider {
    users: Mutex<HashMap<String, StoredUser>>,
    current: watch::Sender<Option<Session>>,
}

impl LocalAuthProvider {
    /// Creates a new provider with no registered users and no active session.
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            users: Mutex::new(HashMap::new()),
            current,
        }
    }
}

impl Default for LocalAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================================
// `AuthProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = {
            let users = self.users.lock().expect("auth lock poisoned");
            let user = users.get(email).ok_or(AuthError::InvalidCredentials)?;

            let parsed_hash = PasswordHash::new(&user.password_hash)
                .map_err(|e| AuthError::Network(e.to_string()))?;
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .map_err(|_| AuthError::InvalidCredentials)?;

            Session {
                subject_id: user.subject_id,
                display_name: user.display_name.clone(),
                email: email.to_string(),
            }
        };

        self.current.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, AuthError> {
        let session = {
            let mut users = self.users.lock().expect("auth lock poisoned");
            if users.contains_key(email) {
                return Err(AuthError::InvalidCredentials);
            }

            let salt = SaltString::generate(&mut OsRng);
            let password_hash = Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| AuthError::Network(e.to_string()))?
                .to_string();

            let subject_id = Uuid::new_v4();
            users.insert(
                email.to_string(),
                StoredUser {
                    subject_id,
                    display_name: display_name.to_string(),
                    password_hash,
                },
            );

            Session {
                subject_id,
                display_name: display_name.to_string(),
                email: email.to_string(),
            }
        };

        self.current.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.current.send_replace(None);
        Ok(())
    }

    fn sessions(&self) -> SessionStream {
        let mut rx = self.current.subscribe();
        let stream = async_stream::stream! {
            loop {
                let value = rx.borrow_and_update().clone();
                yield value;
                if rx.changed().await.is_err() {
                    break;
                }
            }
        };
        Box::pin(stream)
    }
}

//=========================================================================================
// Tests
//=========================================================================================
