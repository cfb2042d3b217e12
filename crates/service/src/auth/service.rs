use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use tracing::{debug, info, instrument, warn};

use super::domain::{
    normalize_email, AuthenticatedUser, LoginInput, RegisterInput, TokenClaims, UserProfile, DEFAULT_ROLE,
};
use super::errors::AuthError;
use super::repository::AuthRepository;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// Hash verified when the email is unknown, so both failure paths cost one argon2 run.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"timing-equalizer", &salt)
        .ok()
        .map(|h| h.to_string())
});

/// Auth service configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// `None` disables token issuing; login then returns the user only.
    pub jwt_secret: Option<String>,
    pub password_algorithm: String,
    pub token_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: None, password_algorithm: "argon2".into(), token_ttl: Duration::hours(12) }
    }
}

impl AuthConfig {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self { jwt_secret: Some(secret.into()), ..Self::default() }
    }
}

/// What the HTTP layer needs from the account backend.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Check credentials and return the user, plus a token when issuing is enabled.
    async fn authenticate(&self, credentials: LoginInput) -> Result<AuthenticatedUser, AuthError>;
    /// Create a new account. Never issues a token.
    async fn create_account(&self, registration: RegisterInput) -> Result<AuthenticatedUser, AuthError>;
    /// Resolve a previously issued token back to its (still active) user.
    async fn resolve_token(&self, token: &str) -> Result<UserProfile, AuthError>;
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

fn validate_registration(input: &RegisterInput, email: &str) -> Result<(), AuthError> {
    common::validation::check_email(email).map_err(|msg| AuthError::Validation(msg.into()))?;
    common::validation::check_full_name(&input.full_name).map_err(|msg| AuthError::Validation(msg.into()))?;
    let len = input.password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("password too long (<={MAX_PASSWORD_LEN})")));
    }
    if let Some(confirm) = &input.confirm_password {
        if confirm != &input.password {
            return Err(AuthError::Validation("passwords do not match".into()));
        }
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::Unauthorized)
}

fn burn_verification(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::default());
    /// let input = RegisterInput { full_name: "Test".into(), email: "User@Example.com".into(), password: "Secret123".into(), confirm_password: None };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// assert_eq!(user.role, "USER");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<UserProfile, AuthError> {
        let email = normalize_email(&input.email);
        validate_registration(&input, &email)?;
        // Early conflict check; the unique index still guards concurrent registrations
        if let Some(existing) = self.repo.find_user_by_email(&email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let hash = hash_password(&input.password)?;
        // user row and credentials land together; a failed write leaves nothing behind
        let user = self
            .repo
            .create_user_with_password(&email, input.full_name.trim(), DEFAULT_ROLE, hash, self.cfg.password_algorithm.clone())
            .await?;
        info!(user_id = %user.id, email = %user.email, "user_registered");
        Ok(user)
    }

    /// Authenticate a user and optionally issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig::with_secret("secret"));
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { full_name: "N".into(), email: "u@e.com".into(), password: "Passw0rd".into(), confirm_password: None }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(session.token.is_some());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthenticatedUser, AuthError> {
        let email = normalize_email(&input.email);
        // Unknown email still pays for one hash verification
        let Some(user) = self.repo.find_user_by_email(&email).await? else {
            burn_verification(&input.password);
            debug!("unknown email");
            return Err(AuthError::Unauthorized);
        };

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %user.id, "user has no stored credentials");
                AuthError::Unauthorized
            })?;
        verify_password(&input.password, &cred.password_hash)?;

        // No secret configured: user only, no token
        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, token_issued = token.is_some(), "user_logged_in");
        Ok(AuthenticatedUser { user, token })
    }

    fn issue_token(&self, user: &UserProfile) -> Result<Option<String>, AuthError> {
        let Some(secret) = &self.cfg.jwt_secret else { return Ok(None) };
        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.cfg.token_ttl)
            .ok_or_else(|| AuthError::TokenError("token ttl out of range".into()))?;
        let claims = TokenClaims {
            sub: user.email.clone(),
            uid: user.id,
            role: user.role.clone(),
            iat: now.timestamp() as usize,
            exp: expires.timestamp() as usize,
        };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok(Some(token))
    }

    /// Verify signature and expiry of a token issued by [`AuthService::login`].
    pub fn decode_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let secret = self.cfg.jwt_secret.as_ref()
            .ok_or_else(|| AuthError::TokenError("token issuing is disabled".into()))?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<TokenClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    #[instrument(skip(self, token))]
    pub async fn current_user(&self, token: &str) -> Result<UserProfile, AuthError> {
        let claims = self.decode_token(token)?;
        self.repo
            .find_user_by_id(claims.uid)
            .await?
            .ok_or(AuthError::Unauthorized)
    }
}

#[async_trait]
impl<R: AuthRepository + 'static> Authenticator for AuthService<R> {
    async fn authenticate(&self, credentials: LoginInput) -> Result<AuthenticatedUser, AuthError> {
        self.login(credentials).await
    }

    async fn create_account(&self, registration: RegisterInput) -> Result<AuthenticatedUser, AuthError> {
        let user = self.register(registration).await?;
        Ok(AuthenticatedUser { user, token: None })
    }

    async fn resolve_token(&self, token: &str) -> Result<UserProfile, AuthError> {
        self.current_user(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn service(secret: Option<&str>) -> AuthService<MockAuthRepository> {
        let cfg = AuthConfig { jwt_secret: secret.map(str::to_string), ..AuthConfig::default() };
        AuthService::new(Arc::new(MockAuthRepository::default()), cfg)
    }

    fn registration(email: &str, password: &str) -> RegisterInput {
        RegisterInput { full_name: "Tran Thi B".into(), email: email.into(), password: password.into(), confirm_password: None }
    }

    fn login(email: &str, password: &str) -> LoginInput {
        LoginInput { email: email.into(), password: password.into() }
    }

    #[tokio::test]
    async fn register_then_login_issues_token() {
        let svc = service(Some("secret"));
        let user = svc.register(registration("b@shop.vn", "Passw0rd!")).await.unwrap();
        let session = svc.authenticate(login("B@Shop.vn ", "Passw0rd!")).await.unwrap();
        assert_eq!(session.user, user);
        let claims = svc.decode_token(session.token.as_deref().unwrap()).unwrap();
        assert_eq!(claims.uid, user.id);
        assert_eq!(claims.role, "USER");
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn login_without_secret_returns_no_token() {
        let svc = service(None);
        svc.register(registration("c@shop.vn", "Passw0rd!")).await.unwrap();
        let session = svc.login(login("c@shop.vn", "Passw0rd!")).await.unwrap();
        assert!(session.token.is_none());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let svc = service(Some("secret"));
        svc.register(registration("d@shop.vn", "Passw0rd!")).await.unwrap();
        let wrong = svc.login(login("d@shop.vn", "nope")).await.unwrap_err();
        let unknown = svc.login(login("ghost@shop.vn", "nope")).await.unwrap_err();
        assert_eq!(wrong.to_string(), "invalid credentials");
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let svc = service(None);
        svc.register(registration("e@shop.vn", "Passw0rd!")).await.unwrap();
        let err = svc.register(registration("E@SHOP.VN", "Another1!")).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict));
    }

    #[tokio::test]
    async fn registration_validation() {
        let svc = service(None);
        let short = svc.register(registration("f@shop.vn", "short")).await.unwrap_err();
        assert_eq!(short.to_string(), "validation failed: password too short (>=8)");

        let bad_email = svc.register(registration("not-an-email", "Passw0rd!")).await.unwrap_err();
        assert!(matches!(bad_email, AuthError::Validation(_)));

        let mut nameless = registration("g@shop.vn", "Passw0rd!");
        nameless.full_name = "  ".into();
        assert!(matches!(svc.register(nameless).await, Err(AuthError::Validation(_))));

        let mut mismatch = registration("h@shop.vn", "Passw0rd!");
        mismatch.confirm_password = Some("Passw0rd?".into());
        let err = svc.register(mismatch).await.unwrap_err();
        assert_eq!(err.to_string(), "validation failed: passwords do not match");
    }

    #[tokio::test]
    async fn create_account_never_returns_token() {
        let svc = service(Some("secret"));
        let out = svc.create_account(registration("i@shop.vn", "Passw0rd!")).await.unwrap();
        assert!(out.token.is_none());
        assert_eq!(out.user.full_name, "Tran Thi B");
    }

    #[tokio::test]
    async fn resolve_token_round_trip_and_rejections() {
        let svc = service(Some("secret"));
        svc.register(registration("j@shop.vn", "Passw0rd!")).await.unwrap();
        let token = svc.login(login("j@shop.vn", "Passw0rd!")).await.unwrap().token.unwrap();
        let me = svc.resolve_token(&token).await.unwrap();
        assert_eq!(me.email, "j@shop.vn");

        assert!(matches!(svc.resolve_token("garbage").await, Err(AuthError::TokenError(_))));

        let other = service(Some("other-secret"));
        assert!(matches!(other.resolve_token(&token).await, Err(AuthError::TokenError(_))));
    }

    #[tokio::test]
    async fn failed_credential_write_leaves_no_account() {
        let repo = Arc::new(MockAuthRepository::default());
        let svc = AuthService::new(repo.clone(), AuthConfig::with_secret("secret"));

        repo.fail_credential_writes(true);
        let err = svc.register(registration("l@shop.vn", "Passw0rd!")).await.unwrap_err();
        assert!(matches!(err, AuthError::Repository(_)));
        assert_eq!(repo.user_count(), 0);
        assert!(matches!(svc.login(login("l@shop.vn", "Passw0rd!")).await, Err(AuthError::Unauthorized)));

        // Once the store recovers the same email registers and logs in normally
        repo.fail_credential_writes(false);
        svc.register(registration("l@shop.vn", "Passw0rd!")).await.unwrap();
        let session = svc.login(login("l@shop.vn", "Passw0rd!")).await.unwrap();
        assert!(session.token.is_some());
    }

    #[tokio::test]
    async fn oversized_ttl_is_token_error_not_panic() {
        let cfg = AuthConfig { token_ttl: Duration::hours(10_000_000_000), ..AuthConfig::with_secret("secret") };
        let svc = AuthService::new(Arc::new(MockAuthRepository::default()), cfg);
        svc.register(registration("m@shop.vn", "Passw0rd!")).await.unwrap();
        let err = svc.login(login("m@shop.vn", "Passw0rd!")).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenError(_)));
    }

    #[tokio::test]
    async fn dotless_domain_rejected() {
        let svc = service(None);
        let err = svc.register(registration("a@b", "Passw0rd!")).await.unwrap_err();
        assert_eq!(err.to_string(), "validation failed: invalid email");
    }

    #[tokio::test]
    async fn expired_token_rejected() {
        let svc = service(Some("secret"));
        let user = svc.register(registration("k@shop.vn", "Passw0rd!")).await.unwrap();
        let past = (Utc::now() - Duration::hours(2)).timestamp() as usize;
        let claims = TokenClaims { sub: user.email, uid: user.id, role: user.role, iat: past - 60, exp: past };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(b"secret")).unwrap();
        assert!(matches!(svc.resolve_token(&token).await, Err(AuthError::TokenError(_))));
    }
}
