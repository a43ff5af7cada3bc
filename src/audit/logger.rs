//! Fire-and-forget audit logger
//!
//! Callers hand events to a bounded mpsc channel and move on. A background
//! shipper task owns the receiving end and delivers events to an
//! [`AuditSink`] one at a time. Nothing about delivery ever reaches the
//! caller: a full channel drops the event, a failed delivery is only noted
//! at debug level.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::models::{AuditEvent, AuditLevel};
use super::sink::{AuditSink, HttpAuditSink, TracingAuditSink};
use crate::config::AuditConfig;

/// Actor draining the audit channel into a sink
struct AuditShipper {
    receiver: mpsc::Receiver<AuditEvent>,
    sink: Arc<dyn AuditSink>,
}

impl AuditShipper {
    async fn run(mut self) {
        while let Some(event) = self.receiver.recv().await {
            if let Err(err) = self.sink.deliver(&event).await {
                debug!(error = %err, package = %event.package, "audit delivery failed");
            }
        }
        info!("Audit channel closed, shipper exiting");
    }
}

/// Handle used by the rest of the service to emit audit events
#[derive(Clone)]
pub struct AuditLogger {
    stack: Arc<str>,
    sender: mpsc::Sender<AuditEvent>,
    dropped: Arc<AtomicU64>,
}

impl AuditLogger {
    /// Build the logger described by `config` and spawn its shipper task
    pub fn spawn(config: &AuditConfig) -> anyhow::Result<Self> {
        let sink: Arc<dyn AuditSink> = match config.endpoint.as_deref() {
            Some(endpoint) => {
                info!("Shipping audit events to {}", endpoint);
                Arc::new(HttpAuditSink::new(
                    endpoint,
                    Duration::from_millis(config.timeout_ms),
                )?)
            }
            None => {
                info!("No AUDIT_ENDPOINT configured, audit events go to the local log");
                Arc::new(TracingAuditSink)
            }
        };

        Ok(Self::with_sink(
            config.stack.as_str(),
            config.buffer_size,
            sink,
        ))
    }

    /// Spawn a shipper delivering to `sink`. Must be called inside a tokio runtime.
    pub fn with_sink(stack: &str, buffer_size: usize, sink: Arc<dyn AuditSink>) -> Self {
        let (logger, receiver) = Self::detached(stack, buffer_size);

        let shipper = AuditShipper { receiver, sink };
        tokio::spawn(async move {
            shipper.run().await;
        });

        logger
    }

    /// Logger without a shipper; the caller owns the receiving end
    pub fn detached(stack: &str, buffer_size: usize) -> (Self, mpsc::Receiver<AuditEvent>) {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        let logger = Self {
            stack: Arc::from(stack),
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (logger, receiver)
    }

    /// Queue an event. Never blocks and never fails.
    pub fn log(&self, level: AuditLevel, package: &str, message: impl Into<String>) {
        let event = AuditEvent {
            stack: self.stack.to_string(),
            level,
            package: package.to_string(),
            message: message.into(),
        };

        if self.sender.try_send(event).is_err() {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if dropped.is_power_of_two() {
                warn!(dropped, "Audit buffer full or closed, dropping events");
            }
        }
    }

    /// Number of events discarded because the channel was full or closed
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    struct RecordingSink {
        events: Mutex<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl AuditSink for RecordingSink {
        async fn deliver(&self, event: &AuditEvent) -> anyhow::Result<()> {
            self.events.lock().await.push(event.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn deliver(&self, _event: &AuditEvent) -> anyhow::Result<()> {
            anyhow::bail!("collector unreachable")
        }
    }

    #[tokio::test]
    async fn test_detached_logger_queues_events() {
        let (logger, mut receiver) = AuditLogger::detached("backend", 8);

        logger.log(AuditLevel::Info, "service", "Shortcode accessed: abc123");

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.stack, "backend");
        assert_eq!(event.level, AuditLevel::Info);
        assert_eq!(event.package, "service");
        assert_eq!(event.message, "Shortcode accessed: abc123");
    }

    #[tokio::test]
    async fn test_full_buffer_drops_without_blocking() {
        let (logger, _receiver) = AuditLogger::detached("backend", 1);

        logger.log(AuditLevel::Info, "service", "first");
        logger.log(AuditLevel::Info, "service", "second");
        logger.log(AuditLevel::Info, "service", "third");

        assert_eq!(logger.dropped(), 2);
    }

    #[tokio::test]
    async fn test_closed_channel_is_swallowed() {
        let (logger, receiver) = AuditLogger::detached("backend", 4);
        drop(receiver);

        logger.log(AuditLevel::Error, "handler", "Invalid URL input");
        assert_eq!(logger.dropped(), 1);
    }

    #[tokio::test]
    async fn test_shipper_delivers_to_sink() {
        let sink = Arc::new(RecordingSink {
            events: Mutex::new(Vec::new()),
        });
        let logger = AuditLogger::with_sink("backend", 16, sink.clone());

        logger.log(AuditLevel::Info, "controller", "Created short URL: abc123");
        logger.log(AuditLevel::Warn, "handler", "Link expired: abc123");

        for _ in 0..50 {
            if sink.events.lock().await.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let events = sink.events.lock().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].level, AuditLevel::Info);
        assert_eq!(events[1].message, "Link expired: abc123");
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_surface() {
        let logger = AuditLogger::with_sink("backend", 16, Arc::new(FailingSink));

        logger.log(AuditLevel::Fatal, "controller", "boom");
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Shipper keeps accepting events after a failed delivery
        logger.log(AuditLevel::Info, "controller", "still alive");
        assert_eq!(logger.dropped(), 0);
    }
}
