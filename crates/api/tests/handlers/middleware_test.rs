use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::http::{
    header::{ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN},
    HeaderValue, StatusCode,
};
use chrono::{DateTime, Utc};
use rstest::rstest;
use slotbook_api::{
    config::{parse_log_level, ApiConfig},
    middleware::error_handling::{map_error, AppError},
};
use slotbook_core::{errors::TimeslotError, errors::TimeslotResult, models::timeslot::Timeslot};
use slotbook_db::{InMemoryTimeslotRepository, TimeslotRepository};
use tracing::Level;

use crate::test_utils::{test_config, TestContext};

#[rstest]
#[case(TimeslotError::NotFound("Timeslot with ID 1 not found".to_string()), StatusCode::NOT_FOUND)]
#[case(TimeslotError::Validation("Email cannot be empty".to_string()), StatusCode::BAD_REQUEST)]
#[case(TimeslotError::Conflict("Timeslot already occupied".to_string()), StatusCode::CONFLICT)]
#[case(TimeslotError::Database(eyre::eyre!("Database error")), StatusCode::INTERNAL_SERVER_ERROR)]
#[case(
    TimeslotError::Internal(Box::new(std::io::Error::new(std::io::ErrorKind::Other, "Internal error"))),
    StatusCode::INTERNAL_SERVER_ERROR
)]
fn test_error_status_mapping(#[case] error: TimeslotError, #[case] expected: StatusCode) {
    let response = map_error(error);

    assert_eq!(response.status(), expected);
}

#[test]
fn test_eyre_report_becomes_database_error() {
    let error: AppError = eyre::eyre!("pool timed out").into();

    assert!(matches!(error.0, TimeslotError::Database(_)));
    assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[rstest]
#[case("trace", Level::TRACE)]
#[case("DEBUG", Level::DEBUG)]
#[case("info", Level::INFO)]
#[case("warn", Level::WARN)]
#[case("error", Level::ERROR)]
#[case("verbose", Level::INFO)]
fn test_parse_log_level(#[case] value: &str, #[case] expected: Level) {
    assert_eq!(parse_log_level(value), expected);
}

#[test]
fn test_server_addr() {
    let config = ApiConfig {
        host: "127.0.0.1".to_string(),
        port: 8080,
        ..test_config()
    };

    assert_eq!(config.server_addr(), "127.0.0.1:8080");
}

fn config_from(vars: &[(&str, &str)]) -> eyre::Result<ApiConfig> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    ApiConfig::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn test_config_defaults() {
    let config = config_from(&[("DATABASE_URL", "postgres://localhost/slotbook")])
        .expect("Failed to load config");

    assert_eq!(config.server_addr(), "0.0.0.0:3000");
    assert_eq!(config.database_url, "postgres://localhost/slotbook");
    assert_eq!(config.log_level, Level::INFO);
    assert_eq!(config.cors_origins, None);
    assert_eq!(config.request_timeout, 30);
    assert_eq!(config.static_dir, "static");
    assert_eq!(config.event_capacity, 100);
}

#[test]
fn test_config_reads_overrides() {
    let config = config_from(&[
        ("DATABASE_URL", "postgres://localhost/slotbook"),
        ("API_PORT", "8080"),
        ("LOG_LEVEL", "debug"),
        ("API_CORS_ORIGINS", "http://a.test, ,http://b.test"),
        ("EVENT_CHANNEL_CAPACITY", "8"),
    ])
    .expect("Failed to load config");

    assert_eq!(config.port, 8080);
    assert_eq!(config.log_level, Level::DEBUG);
    assert_eq!(
        config.cors_origins,
        Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
    );
    assert_eq!(config.event_capacity, 8);
}

#[test]
fn test_config_requires_database_url() {
    let error = config_from(&[]).expect_err("DATABASE_URL is required");

    assert!(error.to_string().contains("DATABASE_URL"));
}

#[rstest]
#[case("0", "greater than zero")]
#[case("many", "Invalid EVENT_CHANNEL_CAPACITY")]
fn test_config_rejects_bad_event_capacity(#[case] capacity: &str, #[case] expected: &str) {
    let error = config_from(&[
        ("DATABASE_URL", "postgres://localhost/slotbook"),
        ("EVENT_CHANNEL_CAPACITY", capacity),
    ])
    .expect_err("capacity should be rejected");

    assert!(error.to_string().contains(expected), "{error}");
}

#[test]
fn test_config_rejects_bad_port() {
    let result = config_from(&[
        ("DATABASE_URL", "postgres://localhost/slotbook"),
        ("API_PORT", "70000"),
    ]);

    assert!(result.is_err());
}

#[rstest]
#[case("http://allowed.test", Some("http://allowed.test"))]
#[case("http://other.test", None)]
#[tokio::test]
async fn test_cors_origin_list(#[case] origin: &str, #[case] expected: Option<&str>) {
    let config = ApiConfig {
        cors_origins: Some(vec!["http://allowed.test".to_string()]),
        ..test_config()
    };
    let ctx = TestContext::with_config(Arc::new(InMemoryTimeslotRepository::new()), config);

    let response = ctx
        .server
        .get("/health")
        .add_header(ORIGIN, HeaderValue::from_str(origin).expect("valid origin"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let allowed = response
        .headers()
        .get(ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|value| value.to_str().ok());
    assert_eq!(allowed, expected);
}

#[tokio::test]
async fn test_unconfigured_cors_allows_any_origin() {
    let ctx = TestContext::with_repository(Arc::new(InMemoryTimeslotRepository::new()));

    let response = ctx
        .server
        .get("/health")
        .add_header(ORIGIN, HeaderValue::from_static("http://anywhere.test"))
        .await;

    assert_eq!(
        response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(&HeaderValue::from_static("*"))
    );
}

/// Listing stalls; everything else goes to the in-memory registry.
#[derive(Default)]
struct StalledListing {
    inner: InMemoryTimeslotRepository,
}

#[async_trait]
impl TimeslotRepository for StalledListing {
    async fn list_timeslots(&self) -> TimeslotResult<Vec<Timeslot>> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        self.inner.list_timeslots().await
    }

    async fn get_timeslot_by_id(&self, id: i64) -> TimeslotResult<Option<Timeslot>> {
        self.inner.get_timeslot_by_id(id).await
    }

    async fn get_timeslot_by_email(&self, email: &str) -> TimeslotResult<Option<Timeslot>> {
        self.inner.get_timeslot_by_email(email).await
    }

    async fn create_timeslot(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> TimeslotResult<Timeslot> {
        self.inner.create_timeslot(start_time, end_time).await
    }

    async fn occupy_timeslot(&self, id: i64, email: &str) -> TimeslotResult<Timeslot> {
        self.inner.occupy_timeslot(id, email).await
    }

    async fn release_timeslot(&self, id: i64, email: &str) -> TimeslotResult<Timeslot> {
        self.inner.release_timeslot(id, email).await
    }
}

#[tokio::test]
async fn test_slow_request_times_out() {
    let config = ApiConfig {
        request_timeout: 1,
        ..test_config()
    };
    let ctx = TestContext::with_config(Arc::new(StalledListing::default()), config);

    let response = ctx.server.get("/timeslots").await;
    assert_eq!(response.status_code(), StatusCode::REQUEST_TIMEOUT);

    let health = ctx.server.get("/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
}
