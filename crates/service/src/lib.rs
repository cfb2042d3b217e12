//! Service layer for storefront accounts.
//! - Keeps registration and login rules independent of the web framework.
//! - Persists through the `AuthRepository` abstraction (sea-orm backed with the `seaorm` feature).

pub mod auth;
