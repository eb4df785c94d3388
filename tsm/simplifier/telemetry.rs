use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use tsm_events::{EventPublisher, EventRecord};
use tsm_logging::{JsonLogger, LogLevel, LogRecord, LogSink};
use uuid::Uuid;

/// Builder for simplifier telemetry sinks.
pub struct SimplifierTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    sink: Option<Arc<dyn LogSink>>,
    min_level: LogLevel,
    event_publisher: Option<Arc<dyn EventPublisher>>,
}

impl SimplifierTelemetryBuilder {
    /// Creates the builder.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            sink: None,
            min_level: LogLevel::Debug,
            event_publisher: None,
        }
    }

    /// Writes JSON lines to `path`.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Uses a custom sink instead of a log file.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Drops records below `level`.
    #[must_use]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Sets the event publisher.
    #[must_use]
    pub fn event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.event_publisher = Some(publisher);
        self
    }

    /// Builds the telemetry handle.
    pub fn build(self) -> Result<SimplifierTelemetry> {
        let sink: Option<Arc<dyn LogSink>> = match (self.sink, self.log_path) {
            (Some(sink), _) => Some(sink),
            (None, Some(path)) => Some(Arc::new(JsonLogger::new(path)?)),
            (None, None) => None,
        };
        Ok(SimplifierTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                sink,
                min_level: self.min_level,
                publisher: self.event_publisher,
            }),
            request_id: None,
        })
    }
}

/// Telemetry handle shared by the simplifier components.
///
/// Cloning is cheap; [`scoped`](Self::scoped) returns a copy that tags every
/// record and event with a request id.
#[derive(Clone)]
pub struct SimplifierTelemetry {
    inner: Arc<TelemetryInner>,
    request_id: Option<Uuid>,
}

struct TelemetryInner {
    module: String,
    sink: Option<Arc<dyn LogSink>>,
    min_level: LogLevel,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl fmt::Debug for SimplifierTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimplifierTelemetry")
            .field("module", &self.inner.module)
            .field("request_id", &self.request_id)
            .finish()
    }
}

impl SimplifierTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> SimplifierTelemetryBuilder {
        SimplifierTelemetryBuilder::new(module)
    }

    /// Copy of this handle bound to `request_id`.
    #[must_use]
    pub fn scoped(&self, request_id: Uuid) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            request_id: Some(request_id),
        }
    }

    /// Request id this handle is bound to.
    #[must_use]
    pub const fn request_id(&self) -> Option<Uuid> {
        self.request_id
    }

    /// Logs structured metadata.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        let Some(sink) = &self.inner.sink else {
            return Ok(());
        };
        if level < self.inner.min_level {
            return Ok(());
        }
        let mut record = LogRecord::new(&self.inner.module, level, message).with_metadata(metadata);
        record.request_id = self.request_id;
        sink.write(&record)
    }

    /// Publishes an event on the bus.
    pub async fn event(&self, event_type: &str, payload: Value) -> Result<()> {
        if let Some(publisher) = &self.inner.publisher {
            let record = EventRecord::new(&self.inner.module, event_type, self.request_id, payload);
            publisher.publish(record).await?;
        }
        Ok(())
    }
}
