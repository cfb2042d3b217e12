use std::path::Path;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
/// Longest token lifetime accepted from config (one year).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            run_migrations: true,
        }
    }
}

/// Token and cookie settings for the login flow.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Empty means "take `JWT_SECRET` from the environment".
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_password_algorithm")]
    pub password_algorithm: String,
    #[serde(default)]
    pub cookie_secure: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
            password_algorithm: default_password_algorithm(),
            cookie_secure: false,
        }
    }
}

/// The single browser origin allowed to call the API with credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_cors_origin")]
    pub allowed_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { allowed_origin: default_cors_origin() }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_true() -> bool { true }
fn default_token_ttl_hours() -> i64 { 12 }
fn default_password_algorithm() -> String { "argon2".into() }
fn default_cors_origin() -> String { DEFAULT_CORS_ORIGIN.into() }

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`) when present, otherwise start from
    /// defaults; then fill gaps from the environment and validate.
    pub fn load_and_validate() -> Result<Self> {
        let path = config_path();
        let mut cfg = if Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize_from_env();
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.validate()?;
        self.cors.normalize_from_env();
        self.cors.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            if !host.trim().is_empty() {
                self.host = host;
            }
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthSettings {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.token_ttl_hours) {
            return Err(anyhow!("auth.token_ttl_hours must be in 1..={MAX_TOKEN_TTL_HOURS}"));
        }
        if self.password_algorithm != "argon2" {
            return Err(anyhow!("auth.password_algorithm `{}` is not supported", self.password_algorithm));
        }
        Ok(())
    }
}

impl CorsConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(origin) = std::env::var("CORS_ALLOWED_ORIGIN") {
            if !origin.trim().is_empty() {
                self.allowed_origin = origin;
            }
        }
        self.allowed_origin = self.allowed_origin.trim().trim_end_matches('/').to_string();
    }

    pub fn validate(&self) -> Result<()> {
        let o = &self.allowed_origin;
        if o == "*" {
            return Err(anyhow!("cors.allowed_origin cannot be `*` when credentials are allowed"));
        }
        if !(o.starts_with("http://") || o.starts_with("https://")) {
            return Err(anyhow!("cors.allowed_origin must be an http(s) origin, got `{o}`"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.auth.token_ttl_hours, 12);
        assert_eq!(cfg.auth.password_algorithm, "argon2");
        assert_eq!(cfg.cors.allowed_origin, DEFAULT_CORS_ORIGIN);
        assert!(cfg.database.run_migrations);
    }

    #[test]
    fn parses_all_sections() {
        let cfg = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [database]
            url = "postgres://u:p@db:5432/store"
            max_connections = 5
            min_connections = 1

            [auth]
            jwt_secret = "s3cret"
            token_ttl_hours = 2

            [cors]
            allowed_origin = "https://shop.example.com/"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.bind_addr(), "0.0.0.0:9000");
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.auth.jwt_secret, "s3cret");
        assert_eq!(cfg.auth.token_ttl_hours, 2);
        assert_eq!(cfg.cors.allowed_origin, "https://shop.example.com/");
    }

    #[test]
    fn database_validation_rejects_non_postgres() {
        let db = DatabaseConfig { url: "mysql://x".into(), ..DatabaseConfig::default() };
        assert!(db.validate().is_err());
        let db = DatabaseConfig { url: "postgres://x".into(), ..DatabaseConfig::default() };
        assert!(db.validate().is_ok());
    }

    #[test]
    fn pool_bounds_are_checked() {
        let db = DatabaseConfig {
            url: "postgres://x".into(),
            min_connections: 5,
            max_connections: 2,
            ..DatabaseConfig::default()
        };
        assert!(db.validate().is_err());
    }

    #[test]
    fn wildcard_origin_rejected() {
        let cors = CorsConfig { allowed_origin: "*".into() };
        assert!(cors.validate().is_err());
        let cors = CorsConfig { allowed_origin: "localhost:5173".into() };
        assert!(cors.validate().is_err());
    }

    #[test]
    fn auth_settings_validation() {
        let auth = AuthSettings { token_ttl_hours: 0, ..AuthSettings::default() };
        assert!(auth.validate().is_err());
        let auth = AuthSettings { password_algorithm: "md5".into(), ..AuthSettings::default() };
        assert!(auth.validate().is_err());
        assert!(AuthSettings::default().validate().is_ok());
    }

    #[test]
    fn token_ttl_is_capped_at_one_year() {
        let cfg = parse("[auth]\ntoken_ttl_hours = 10000000000\n").unwrap();
        let err = cfg.auth.validate().unwrap_err();
        assert!(err.to_string().contains("token_ttl_hours"));
        let auth = AuthSettings { token_ttl_hours: MAX_TOKEN_TTL_HOURS, ..AuthSettings::default() };
        assert!(auth.validate().is_ok());
        let auth = AuthSettings { token_ttl_hours: MAX_TOKEN_TTL_HOURS + 1, ..AuthSettings::default() };
        assert!(auth.validate().is_err());
    }

    #[test]
    fn zero_worker_threads_normalized() {
        let mut s = ServerConfig { worker_threads: Some(0), ..ServerConfig::default() };
        s.normalize().unwrap();
        assert_eq!(s.worker_threads, Some(4));
    }
}
