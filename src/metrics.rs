//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("warbler_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "warbler_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Auth Metrics
    pub static ref AUTH_ATTEMPTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("warbler_auth_attempts_total", "Total number of login attempts"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref SIGNUPS_TOTAL: IntCounter = IntCounter::new(
        "warbler_signups_total",
        "Total number of completed signups"
    ).expect("metric can be created");

    // Domain Metrics
    pub static ref MESSAGES_CREATED_TOTAL: IntCounter = IntCounter::new(
        "warbler_messages_created_total",
        "Total number of messages created"
    ).expect("metric can be created");
    pub static ref LIKES_TOGGLED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("warbler_likes_toggled_total", "Total number of like toggles"),
        &["action"]
    ).expect("metric can be created");
    pub static ref FOLLOW_CHANGES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("warbler_follow_changes_total", "Total number of follow edge changes"),
        &["action"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("warbler_errors_total", "Total number of errors"),
        &["error_type", "endpoint"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("HTTP_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(AUTH_ATTEMPTS_TOTAL.clone()))
        .expect("AUTH_ATTEMPTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SIGNUPS_TOTAL.clone()))
        .expect("SIGNUPS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(MESSAGES_CREATED_TOTAL.clone()))
        .expect("MESSAGES_CREATED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(LIKES_TOGGLED_TOTAL.clone()))
        .expect("LIKES_TOGGLED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(FOLLOW_CHANGES_TOTAL.clone()))
        .expect("FOLLOW_CHANGES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
