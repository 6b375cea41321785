//! # Diagnostics
//!
//! Per-invocation trace of what a strategy did (hit, miss, fetch outcome),
//! delivered to an injected [`DiagnosticsSink`] as one grouped report.
//! Reports are only collected in development mode and never influence the
//! response path.

use once_cell::sync::Lazy;
use std::sync::Arc;

/// Grouped messages for one `handle` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticsReport {
    pub strategy: &'static str,
    pub url: String,
    pub messages: Vec<String>,
}

/// Receiver of diagnostics reports.
pub trait DiagnosticsSink: Send + Sync {
    fn report(&self, report: DiagnosticsReport);
}

/// Writes reports through `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn report(&self, report: DiagnosticsReport) {
        tracing::debug!(
            strategy = report.strategy,
            url = %report.url,
            "Using {} to respond to '{}'",
            report.strategy,
            report.url
        );
        for message in &report.messages {
            tracing::debug!(strategy = report.strategy, "{message}");
        }
    }
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticsSink for NoopSink {
    fn report(&self, _report: DiagnosticsReport) {}
}

static DEFAULT_SINK: Lazy<Arc<dyn DiagnosticsSink>> = Lazy::new(|| Arc::new(TracingSink));

/// Process-wide default sink.
pub fn default_sink() -> Arc<dyn DiagnosticsSink> {
    Arc::clone(&DEFAULT_SINK)
}

/// Message buffer for one invocation. Disabled buffers never format.
pub(crate) struct Trace {
    enabled: bool,
    messages: Vec<String>,
}

impl Trace {
    pub(crate) const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            messages: Vec::new(),
        }
    }

    pub(crate) fn note(&mut self, message: impl FnOnce() -> String) {
        if self.enabled {
            self.messages.push(message());
        }
    }

    pub(crate) fn finish(self, sink: &dyn DiagnosticsSink, strategy: &'static str, url: &url::Url) {
        if self.enabled {
            sink.report(DiagnosticsReport {
                strategy,
                url: url.to_string(),
                messages: self.messages,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<DiagnosticsReport>>);

    impl DiagnosticsSink for Collect {
        fn report(&self, report: DiagnosticsReport) {
            self.0.lock().push(report);
        }
    }

    #[test]
    fn test_disabled_trace_reports_nothing() {
        let sink = Collect::default();
        let url = url::Url::parse("https://example.com/").unwrap();

        let mut trace = Trace::new(false);
        trace.note(|| unreachable!("disabled traces must not format"));
        trace.finish(&sink, "CacheFirst", &url);

        assert!(sink.0.lock().is_empty());
    }

    #[test]
    fn test_enabled_trace_groups_messages() {
        let sink = Collect::default();
        let url = url::Url::parse("https://example.com/a").unwrap();

        let mut trace = Trace::new(true);
        trace.note(|| "first".to_string());
        trace.note(|| "second".to_string());
        trace.finish(&sink, "NetworkOnly", &url);

        let reports = sink.0.lock();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].strategy, "NetworkOnly");
        assert_eq!(reports[0].url, "https://example.com/a");
        assert_eq!(reports[0].messages, vec!["first", "second"]);
    }
}
