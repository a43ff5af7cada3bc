use axum::http::HeaderValue;
use chrono::TimeDelta;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

use super::clock::{Clock, SystemClock};
use super::generator::{CodeGenerator, RandomCodeGenerator};
use crate::audit::{AuditLevel, AuditLogger};
use crate::config::LinkConfig;
use crate::models::{ClickEvent, CreatedLink, LinkRecord, LinkStats};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("Shortcode already in use")]
    CodeConflict(String),
    #[error("Shortcode not found")]
    NotFound(String),
    #[error("Link expired")]
    Expired(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// In-memory mapping from short code to link record
///
/// Records are never removed. Expiry is only checked when a link is resolved,
/// and an expired code keeps blocking new links that ask for it.
pub struct LinkRegistry {
    links: DashMap<String, LinkRecord>,
    generator: Arc<dyn CodeGenerator>,
    clock: Arc<dyn Clock>,
    audit: AuditLogger,
    base_url: String,
    default_validity_minutes: i64,
}

impl LinkRegistry {
    pub fn new(config: &LinkConfig, audit: AuditLogger) -> Self {
        Self {
            links: DashMap::new(),
            generator: Arc::new(RandomCodeGenerator::new(config.short_code_length)),
            clock: Arc::new(SystemClock),
            audit,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_validity_minutes: config.default_validity_minutes,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register `url` under `requested_code`, or under a generated code when none is given
    pub fn create(
        &self,
        url: Option<&str>,
        validity_minutes: Option<f64>,
        requested_code: Option<&str>,
    ) -> RegistryResult<CreatedLink> {
        // The destination ends up in a `Location` header, so it must be a valid header value
        let Some(url) = url.filter(|u| !u.trim().is_empty() && HeaderValue::from_str(u).is_ok())
        else {
            self.audit
                .log(AuditLevel::Error, "handler", "Invalid URL input");
            return Err(RegistryError::InvalidInput("Invalid URL"));
        };

        let Some(validity) = self.validity_delta(validity_minutes) else {
            self.audit
                .log(AuditLevel::Error, "handler", "Invalid validity input");
            return Err(RegistryError::InvalidInput("Invalid validity"));
        };

        let code = match requested_code.filter(|c| !c.is_empty()) {
            Some(code) => code.to_string(),
            None => self.generator.generate(),
        };

        let created_at = self.clock.now();
        let Some(expiry) = created_at.checked_add_signed(validity) else {
            self.audit
                .log(AuditLevel::Error, "handler", "Invalid validity input");
            return Err(RegistryError::InvalidInput("Invalid validity"));
        };

        match self.links.entry(code.clone()) {
            Entry::Occupied(_) => {
                self.audit.log(
                    AuditLevel::Error,
                    "handler",
                    format!("Shortcode already exists: {code}"),
                );
                return Err(RegistryError::CodeConflict(code));
            }
            Entry::Vacant(slot) => {
                slot.insert(LinkRecord {
                    code: code.clone(),
                    original_url: url.to_string(),
                    created_at,
                    expiry,
                    clicks: Vec::new(),
                });
            }
        }

        tracing::debug!(short_code = %code, %expiry, "short link created");
        self.audit.log(
            AuditLevel::Info,
            "controller",
            format!("Created short URL: {code}"),
        );

        Ok(CreatedLink {
            short_link: format!("{}/{}", self.base_url, code),
            code,
            expiry,
        })
    }

    /// Record a click on a live link and return its stats
    ///
    /// The expiry check and the append run under the record's shard lock, so
    /// concurrent lookups never record a click past expiry or lose one.
    pub fn resolve(&self, code: &str, source: Option<&str>) -> RegistryResult<LinkStats> {
        let Some(mut record) = self.links.get_mut(code) else {
            self.audit.log(
                AuditLevel::Warn,
                "repository",
                format!("Shortcode not found: {code}"),
            );
            return Err(RegistryError::NotFound(code.to_string()));
        };

        let now = self.clock.now();
        if record.is_expired_at(now) {
            drop(record);
            self.audit.log(
                AuditLevel::Warn,
                "handler",
                format!("Link expired: {code}"),
            );
            return Err(RegistryError::Expired(code.to_string()));
        }

        record.clicks.push(ClickEvent::new(now, source));
        let stats = record.stats();
        drop(record);

        self.audit.log(
            AuditLevel::Info,
            "service",
            format!("Shortcode accessed: {code}"),
        );

        Ok(stats)
    }

    /// Snapshot of a record without recording a click
    pub fn get(&self, code: &str) -> Option<LinkRecord> {
        self.links.get(code).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn validity_delta(&self, validity_minutes: Option<f64>) -> Option<TimeDelta> {
        let minutes = match validity_minutes {
            None => return TimeDelta::try_minutes(self.default_validity_minutes),
            Some(m) if m.is_finite() => m,
            Some(_) => return None,
        };

        // Zero or negative validity yields a link that is already expired
        let millis = (minutes * 60_000.0).round();
        if millis.abs() >= i64::MAX as f64 {
            return None;
        }
        TimeDelta::try_milliseconds(millis as i64)
    }
}
