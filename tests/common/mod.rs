#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use shorturls::audit::{AuditEvent, AuditLogger};
use shorturls::config::LinkConfig;
use shorturls::registry::{LinkRegistry, ManualClock};
use shorturls::routes::app_router;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct TestApp {
    pub router: Router,
    pub registry: Arc<LinkRegistry>,
    pub clock: Arc<ManualClock>,
    pub audit_events: mpsc::Receiver<AuditEvent>,
}

/// Helper to create an app on a frozen clock with an observable audit channel
pub fn create_test_app() -> TestApp {
    create_test_app_with(|registry| registry)
}

pub fn create_test_app_with(customize: impl FnOnce(LinkRegistry) -> LinkRegistry) -> TestApp {
    let (audit, audit_events) = AuditLogger::detached("backend", 1024);
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
    ));
    let registry = LinkRegistry::new(&LinkConfig::default(), audit.clone())
        .with_clock(clock.clone());
    let registry = Arc::new(customize(registry));

    TestApp {
        router: app_router(Arc::clone(&registry), audit),
        registry,
        clock,
        audit_events,
    }
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn drain_audit(events: &mut mpsc::Receiver<AuditEvent>) -> Vec<AuditEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}
