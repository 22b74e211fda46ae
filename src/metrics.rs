//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounterVec, IntGaugeVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("atelier_http_requests_total", "Total number of HTTP requests"),
        &["method", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "atelier_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method"]
    ).expect("metric can be created");

    // Database Metrics
    pub static ref DB_QUERIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("atelier_db_queries_total", "Total number of repository operations"),
        &["operation", "collection"]
    ).expect("metric can be created");
    pub static ref DB_QUERY_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "atelier_db_query_duration_seconds",
            "Repository operation duration in seconds"
        ).buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        &["operation", "collection"]
    ).expect("metric can be created");

    // Catalog Metrics
    pub static ref CONTENT_MUTATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("atelier_content_mutations_total", "Admin mutations applied to the catalog"),
        &["collection", "action"]
    ).expect("metric can be created");
    pub static ref CATALOG_SIZE: IntGaugeVec = IntGaugeVec::new(
        Opts::new("atelier_catalog_size", "Number of records per collection"),
        &["collection"]
    ).expect("metric can be created");
    pub static ref EVENT_SUBSCRIBERS: prometheus::IntGauge = prometheus::IntGauge::new(
        "atelier_event_subscribers",
        "Open change-feed subscriptions"
    ).expect("metric can be created");

    // AI Metrics
    pub static ref AI_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("atelier_ai_requests_total", "Text generation requests"),
        &["kind", "status"]
    ).expect("metric can be created");
    pub static ref AI_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "atelier_ai_request_duration_seconds",
            "Text generation duration in seconds"
        ).buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["kind"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("atelier_errors_total", "Total number of errors"),
        &["error_type"]
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
        .register(Box::new(DB_QUERIES_TOTAL.clone()))
        .expect("DB_QUERIES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(DB_QUERY_DURATION_SECONDS.clone()))
        .expect("DB_QUERY_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(CONTENT_MUTATIONS_TOTAL.clone()))
        .expect("CONTENT_MUTATIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CATALOG_SIZE.clone()))
        .expect("CATALOG_SIZE can be registered");
    REGISTRY
        .register(Box::new(EVENT_SUBSCRIBERS.clone()))
        .expect("EVENT_SUBSCRIBERS can be registered");
    REGISTRY
        .register(Box::new(AI_REQUESTS_TOTAL.clone()))
        .expect("AI_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(AI_REQUEST_DURATION_SECONDS.clone()))
        .expect("AI_REQUEST_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}

/// Record one repository operation.
pub fn observe_db_query(operation: &str, collection: &str, elapsed: Duration) {
    DB_QUERIES_TOTAL
        .with_label_values(&[operation, collection])
        .inc();
    DB_QUERY_DURATION_SECONDS
        .with_label_values(&[operation, collection])
        .observe(elapsed.as_secs_f64());
}

/// Record one text generation call.
pub fn observe_ai_request(kind: &str, status: &str, elapsed: Duration) {
    AI_REQUESTS_TOTAL.with_label_values(&[kind, status]).inc();
    AI_REQUEST_DURATION_SECONDS
        .with_label_values(&[kind])
        .observe(elapsed.as_secs_f64());
}
