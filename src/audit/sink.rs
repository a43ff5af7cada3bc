use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use super::models::{AuditEvent, AuditLevel};

/// Destination the shipper task delivers audit events to
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn deliver(&self, event: &AuditEvent) -> Result<()>;
}

/// Posts each event as JSON to a remote collection endpoint
pub struct HttpAuditSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAuditSink {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build audit HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl AuditSink for HttpAuditSink {
    async fn deliver(&self, event: &AuditEvent) -> Result<()> {
        self.client
            .post(&self.endpoint)
            .json(event)
            .send()
            .await
            .context("audit request failed")?
            .error_for_status()
            .context("audit collector rejected event")?;
        Ok(())
    }
}

/// Re-emits events through tracing; used when no collector is configured
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn deliver(&self, event: &AuditEvent) -> Result<()> {
        match event.level {
            AuditLevel::Debug => tracing::debug!(
                target: "audit",
                stack = %event.stack,
                package = %event.package,
                "{}",
                event.message
            ),
            AuditLevel::Info => tracing::info!(
                target: "audit",
                stack = %event.stack,
                package = %event.package,
                "{}",
                event.message
            ),
            AuditLevel::Warn => tracing::warn!(
                target: "audit",
                stack = %event.stack,
                package = %event.package,
                "{}",
                event.message
            ),
            AuditLevel::Error | AuditLevel::Fatal => tracing::error!(
                target: "audit",
                stack = %event.stack,
                package = %event.package,
                level = %event.level,
                "{}",
                event.message
            ),
        }
        Ok(())
    }
}
