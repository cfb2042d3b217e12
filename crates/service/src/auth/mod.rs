//! Auth module: three-layer architecture (domain, repository, service).
//!
//! `Authenticator` is the contract HTTP handlers call; `AuthService` is its
//! implementation over any `AuthRepository`.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
#[cfg(feature = "seaorm")]
pub mod repo;

pub use errors::AuthError;
pub use service::{AuthConfig, AuthService, Authenticator};
