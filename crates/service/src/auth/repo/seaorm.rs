use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::domain::{StoredCredentials, UserProfile};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn to_profile(u: models::user::Model) -> UserProfile {
    UserProfile { id: u.id, email: u.email, full_name: u.full_name, role: u.role }
}

fn to_credentials(c: models::user_credentials::Model) -> StoredCredentials {
    StoredCredentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>, AuthError> {
        let res = models::user::find_active_by_email(&self.db, email).await?;
        Ok(res.map(to_profile))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, AuthError> {
        let res = models::user::find_active_by_id(&self.db, id).await?;
        Ok(res.map(to_profile))
    }

    async fn create_user_with_password(
        &self,
        email: &str,
        full_name: &str,
        role: &str,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<UserProfile, AuthError> {
        let (created, _) =
            models::user::create_with_password(&self.db, email, full_name, role, password_hash, &password_algorithm).await?;
        Ok(to_profile(created))
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<StoredCredentials>, AuthError> {
        let res = models::user_credentials::find_by_user(&self.db, user_id).await?;
        Ok(res.map(to_credentials))
    }
}
