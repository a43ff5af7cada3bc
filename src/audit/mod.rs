//! Best-effort audit event reporting
//!
//! The registry and HTTP layer describe what happened through
//! [`AuditLogger::log`]; events travel over a channel to a background task
//! that forwards them to a remote collector or the local log.

pub mod logger;
pub mod models;
pub mod sink;

pub use logger::AuditLogger;
pub use models::{AuditEvent, AuditLevel};
pub use sink::{AuditSink, HttpAuditSink, TracingAuditSink};
