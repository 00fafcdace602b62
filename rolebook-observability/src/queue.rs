use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

use crate::metrics::PipelineMetrics;
use crate::record::RequestLogRecord;

/// Producer half of the bounded record queue.
///
/// Fixed capacity, allocated once at startup, shared by every in-flight
/// request. Enqueue never blocks: a full queue drops the record —
/// logging must not apply backpressure to live traffic.
#[derive(Clone)]
pub struct LogQueue {
    tx: mpsc::Sender<RequestLogRecord>,
    metrics: Arc<PipelineMetrics>,
}

impl LogQueue {
    /// Create the queue; the receiver goes to the single writer loop.
    pub fn bounded(
        capacity: usize,
        metrics: Arc<PipelineMetrics>,
    ) -> (Self, mpsc::Receiver<RequestLogRecord>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, metrics }, rx)
    }

    /// Non-blocking enqueue. Returns whether the record was accepted.
    pub fn enqueue(&self, record: RequestLogRecord) -> bool {
        match self.tx.try_send(record) {
            Ok(()) => {
                self.metrics.record_enqueued();
                true
            }
            Err(e) => {
                // Full or closed: either way the record is gone.
                let record = match e {
                    mpsc::error::TrySendError::Full(r)
                    | mpsc::error::TrySendError::Closed(r) => r,
                };
                trace!(request_id = %record.request_id, "request-log record dropped");
                self.metrics.record_dropped();
                false
            }
        }
    }
}
