use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};

/// Pipeline counters — everything is gated behind `enabled`.
///
/// When `enabled = false` no registry or counters are allocated and
/// every record method is a no-op, keeping the capture path free of
/// metrics overhead.
pub struct PipelineMetrics {
    enabled: bool,
    registry: Option<Registry>,
    records_enqueued: Option<IntCounter>,
    records_dropped: Option<IntCounter>,
    batches_flushed: Option<IntCounter>,
    rows_written: Option<IntCounter>,
    flush_failures: Option<IntCounter>,
}

impl PipelineMetrics {
    /// Create a collector. When `enabled = false`, everything is None.
    pub fn new(enabled: bool) -> anyhow::Result<Self> {
        if !enabled {
            return Ok(Self::disabled());
        }

        let registry = Registry::new();

        let records_enqueued = IntCounter::with_opts(Opts::new(
            "rolebook_log_records_enqueued_total",
            "Request-log records accepted by the queue",
        ))?;
        let records_dropped = IntCounter::with_opts(Opts::new(
            "rolebook_log_records_dropped_total",
            "Request-log records dropped on a full queue",
        ))?;
        let batches_flushed = IntCounter::with_opts(Opts::new(
            "rolebook_log_batches_flushed_total",
            "Request-log batches persisted",
        ))?;
        let rows_written = IntCounter::with_opts(Opts::new(
            "rolebook_log_rows_written_total",
            "Request-log rows persisted",
        ))?;
        let flush_failures = IntCounter::with_opts(Opts::new(
            "rolebook_log_flush_failures_total",
            "Request-log batches lost to persistence failures",
        ))?;

        registry.register(Box::new(records_enqueued.clone()))?;
        registry.register(Box::new(records_dropped.clone()))?;
        registry.register(Box::new(batches_flushed.clone()))?;
        registry.register(Box::new(rows_written.clone()))?;
        registry.register(Box::new(flush_failures.clone()))?;

        Ok(Self {
            enabled: true,
            registry: Some(registry),
            records_enqueued: Some(records_enqueued),
            records_dropped: Some(records_dropped),
            batches_flushed: Some(batches_flushed),
            rows_written: Some(rows_written),
            flush_failures: Some(flush_failures),
        })
    }

    /// No-op collector.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            registry: None,
            records_enqueued: None,
            records_dropped: None,
            batches_flushed: None,
            rows_written: None,
            flush_failures: None,
        }
    }

    #[inline]
    pub fn record_enqueued(&self) {
        if let Some(ref c) = self.records_enqueued {
            c.inc();
        }
    }

    #[inline]
    pub fn record_dropped(&self) {
        if let Some(ref c) = self.records_dropped {
            c.inc();
        }
    }

    pub fn record_flush(&self, rows: usize) {
        if let Some(ref c) = self.batches_flushed {
            c.inc();
        }
        if let Some(ref c) = self.rows_written {
            c.inc_by(rows as u64);
        }
    }

    pub fn record_flush_failure(&self) {
        if let Some(ref c) = self.flush_failures {
            c.inc();
        }
    }

    /// Render prometheus text exposition format.
    pub fn render(&self) -> String {
        if let Some(ref registry) = self.registry {
            let encoder = TextEncoder::new();
            let metric_families = registry.gather();
            let mut buffer = Vec::new();
            encoder.encode(&metric_families, &mut buffer).unwrap_or(());
            String::from_utf8(buffer).unwrap_or_default()
        } else {
            String::new()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
