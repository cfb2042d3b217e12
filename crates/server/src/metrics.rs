use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};
use service::auth::AuthError;

// Prometheus metrics (default registry)
pub static LOGIN_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "storefront_auth_login_total",
        "Login attempts by outcome",
        &["outcome"]
    )
    .expect("register login_total")
});

pub static REGISTER_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "storefront_auth_register_total",
        "Registration attempts by outcome",
        &["outcome"]
    )
    .expect("register register_total")
});

/// `success`, `rejected` (caller's fault) or `error` (backend failure).
pub fn outcome<T>(res: &Result<T, AuthError>) -> &'static str {
    match res {
        Ok(_) => "success",
        Err(e) if e.is_internal() => "error",
        Err(_) => "rejected",
    }
}

pub fn record_login<T>(res: &Result<T, AuthError>) {
    LOGIN_TOTAL.with_label_values(&[outcome(res)]).inc();
}

pub fn record_register<T>(res: &Result<T, AuthError>) {
    REGISTER_TOTAL.with_label_values(&[outcome(res)]).inc();
}

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
