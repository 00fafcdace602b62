//! Asynchronous batched request logging.
//!
//! Every HTTP request is captured by [`capture::capture_request`]
//! (middleware), enriched off-path by [`enrich`], buffered in a bounded
//! drop-on-full queue, and persisted in batches by the single
//! [`writer`] loop. Logging is best-effort by design: a full queue or a
//! failed flush never touches the live request.

use std::sync::Arc;

use rolebook_core::config::RequestLogConfig;

pub mod capture;
pub mod enrich;
pub mod metrics;
pub mod queue;
pub mod record;
pub mod sink;
pub mod writer;

pub use capture::{RequestId, RequestLogState, capture_request};
pub use metrics::PipelineMetrics;
pub use queue::LogQueue;
pub use record::RequestLogRecord;
pub use sink::{LogSink, MemoryLogSink, PgLogSink, SinkError};
pub use writer::WriterConfig;

/// Wire the whole pipeline: bounded queue plus a background writer task
/// on the current runtime. The returned state is the producer half,
/// handed to the capture middleware; the writer runs until every clone
/// of it is dropped.
pub fn spawn_pipeline(
    config: &RequestLogConfig,
    sink: Arc<dyn LogSink>,
    metrics: Arc<PipelineMetrics>,
) -> RequestLogState {
    let (queue, rx) = LogQueue::bounded(config.queue_capacity, Arc::clone(&metrics));
    tokio::spawn(writer::run(rx, sink, WriterConfig::from(config), metrics));
    RequestLogState::new(queue, config)
}
