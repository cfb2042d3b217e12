use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{StoredCredentials, UserProfile};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
///
/// Lookups only return active accounts; emails passed in are already normalized.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>, AuthError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, AuthError>;
    /// Create the user together with its password hash. Both are stored or neither is.
    async fn create_user_with_password(
        &self,
        email: &str,
        full_name: &str,
        role: &str,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<UserProfile, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<StoredCredentials>, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, MutexGuard};

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, UserProfile>>,       // key: email
        creds: Mutex<HashMap<Uuid, StoredCredentials>>,   // key: user_id
        fail_credential_writes: AtomicBool,
    }

    fn guard<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, AuthError> {
        m.lock().map_err(|_| AuthError::Repository("mock repository lock poisoned".into()))
    }

    impl MockAuthRepository {
        pub fn user_count(&self) -> usize {
            self.users.lock().map(|u| u.len()).unwrap_or_default()
        }

        /// Make credential writes fail, as a dropped database connection would.
        pub fn fail_credential_writes(&self, fail: bool) {
            self.fail_credential_writes.store(fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>, AuthError> {
            Ok(guard(&self.users)?.get(email).cloned())
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, AuthError> {
            Ok(guard(&self.users)?.values().find(|u| u.id == id).cloned())
        }

        async fn create_user_with_password(
            &self,
            email: &str,
            full_name: &str,
            role: &str,
            password_hash: String,
            password_algorithm: String,
        ) -> Result<UserProfile, AuthError> {
            // Both maps stay locked so the pair is written as one unit
            let mut users = guard(&self.users)?;
            let mut creds = guard(&self.creds)?;
            if users.contains_key(email) {
                return Err(AuthError::Conflict);
            }
            if self.fail_credential_writes.load(Ordering::SeqCst) {
                return Err(AuthError::Repository("credential write failed".into()));
            }
            let user = UserProfile { id: Uuid::new_v4(), email: email.to_string(), full_name: full_name.to_string(), role: role.to_string() };
            creds.insert(user.id, StoredCredentials { user_id: user.id, password_hash, password_algorithm });
            users.insert(email.to_string(), user.clone());
            Ok(user)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<StoredCredentials>, AuthError> {
            Ok(guard(&self.creds)?.get(&user_id).cloned())
        }
    }
}
