use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(Serialize, ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileDoc { pub id: Uuid, pub email: String, pub full_name: String, pub role: String }

#[derive(Serialize, ToSchema)]
pub struct AuthenticatedUserDoc {
    pub user: UserProfileDoc,
    /// Present after login when token issuing is enabled.
    pub token: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::register,
        crate::routes::auth::logout,
        crate::routes::auth::me,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            RegisterRequest,
            UserProfileDoc,
            AuthenticatedUserDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_auth_paths() {
        let doc = ApiDoc::openapi();
        for p in ["/api/auth/login", "/api/auth/register", "/api/auth/logout", "/api/auth/me", "/health"] {
            assert!(doc.paths.paths.contains_key(p), "missing {p}");
        }
    }
}
