//! The single background consumer.
//!
//! One loop iteration per batch: collect until the batch is full or the
//! flush timer fires, persist, repeat. Persistence failures are logged
//! and the batch is discarded — no retry, no dead-letter.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error};

use rolebook_core::config::RequestLogConfig;

use crate::metrics::PipelineMetrics;
use crate::record::RequestLogRecord;
use crate::sink::LogSink;

#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// A batch never grows past this.
    pub batch_size: usize,
    /// A non-empty batch waits at most this long before flushing.
    pub flush_interval: Duration,
}

impl From<&RequestLogConfig> for WriterConfig {
    fn from(config: &RequestLogConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            flush_interval: config.flush_interval(),
        }
    }
}

/// Run the writer until every producer handle is dropped.
///
/// The final partial batch is flushed on the way out; in production the
/// queue lives for the whole process, so this effectively runs forever.
pub async fn run(
    mut rx: mpsc::Receiver<RequestLogRecord>,
    sink: Arc<dyn LogSink>,
    config: WriterConfig,
    metrics: Arc<PipelineMetrics>,
) {
    loop {
        let mut batch: Vec<RequestLogRecord> = Vec::with_capacity(config.batch_size);
        let timer = tokio::time::sleep(config.flush_interval);
        tokio::pin!(timer);
        let mut closed = false;

        // Collecting: ends on batch full, timer, or channel closure.
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(record) => {
                        batch.push(record);
                        if batch.len() >= config.batch_size {
                            break;
                        }
                    }
                    None => {
                        closed = true;
                        break;
                    }
                },
                _ = &mut timer => break,
            }
        }

        flush(sink.as_ref(), batch, &metrics).await;

        if closed {
            return;
        }
    }
}

async fn flush(sink: &dyn LogSink, batch: Vec<RequestLogRecord>, metrics: &PipelineMetrics) {
    if batch.is_empty() {
        return;
    }
    match sink.insert_batch(&batch).await {
        Ok(()) => {
            debug!(count = batch.len(), "flushed request-log batch");
            metrics.record_flush(batch.len());
        }
        Err(e) => {
            // Non-fatal: the batch is dropped and the loop carries on.
            error!(error = %e, count = batch.len(), "failed to persist request-log batch");
            metrics.record_flush_failure();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::LogQueue;
    use crate::sink::MemoryLogSink;
    use chrono::Utc;

    fn record(n: u32) -> RequestLogRecord {
        RequestLogRecord {
            request_id: format!("req-{n}"),
            method: "GET".into(),
            path: "/books".into(),
            query_string: String::new(),
            status_code: 200,
            remote_ip: String::new(),
            user_agent: String::new(),
            request_time: 0.0,
            created_at: Utc::now(),
            file_name: None,
            file_size: None,
            file_content_json: None,
        }
    }

    fn config(batch_size: usize) -> WriterConfig {
        WriterConfig {
            batch_size,
            flush_interval: Duration::from_millis(500),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_batches_flush_on_size_trigger() {
        let metrics = Arc::new(PipelineMetrics::disabled());
        let (queue, rx) = LogQueue::bounded(1000, Arc::clone(&metrics));
        let sink = Arc::new(MemoryLogSink::new());

        for n in 0..250 {
            assert!(queue.enqueue(record(n)));
        }
        drop(queue);
        run(rx, sink.clone(), config(100), metrics).await;

        let batches = sink.batches();
        assert_eq!(sink.total_rows(), 250);
        assert!(batches.len() <= 3, "expected at most 3 batches, got {}", batches.len());
        assert!(batches.iter().all(|b| b.len() <= 100));
    }

    #[tokio::test(start_paused = true)]
    async fn partial_batch_flushes_when_timer_fires() {
        let metrics = Arc::new(PipelineMetrics::disabled());
        let (queue, rx) = LogQueue::bounded(100, Arc::clone(&metrics));
        let sink = Arc::new(MemoryLogSink::new());
        let writer = tokio::spawn(run(rx, sink.clone(), config(100), metrics));

        for n in 0..5 {
            assert!(queue.enqueue(record(n)));
        }
        // Well past one flush interval; paused time advances on idle.
        tokio::time::sleep(Duration::from_millis(600)).await;

        let batches = sink.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 5);

        drop(queue);
        writer.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn no_flush_happens_for_an_empty_cycle() {
        let metrics = Arc::new(PipelineMetrics::disabled());
        let (queue, rx) = LogQueue::bounded(100, Arc::clone(&metrics));
        let sink = Arc::new(MemoryLogSink::new());
        let writer = tokio::spawn(run(rx, sink.clone(), config(100), metrics));

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert!(sink.batches().is_empty());

        drop(queue);
        writer.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn batches_never_exceed_configured_size() {
        let metrics = Arc::new(PipelineMetrics::disabled());
        let (queue, rx) = LogQueue::bounded(1000, Arc::clone(&metrics));
        let sink = Arc::new(MemoryLogSink::new());

        for n in 0..95 {
            assert!(queue.enqueue(record(n)));
        }
        drop(queue);
        run(rx, sink.clone(), config(10), metrics).await;

        assert_eq!(sink.total_rows(), 95);
        assert!(sink.batches().iter().all(|b| b.len() <= 10));
    }

    #[tokio::test(start_paused = true)]
    async fn persistence_failure_is_non_fatal() {
        let metrics = Arc::new(PipelineMetrics::new(true).unwrap());
        let (queue, rx) = LogQueue::bounded(100, Arc::clone(&metrics));
        let sink = Arc::new(MemoryLogSink::new());
        sink.fail_next_flush();
        let writer = tokio::spawn(run(rx, sink.clone(), config(2), Arc::clone(&metrics)));

        // First batch fails and is dropped; the loop must keep going.
        assert!(queue.enqueue(record(0)));
        assert!(queue.enqueue(record(1)));
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(sink.total_rows(), 0);

        assert!(queue.enqueue(record(2)));
        assert!(queue.enqueue(record(3)));
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(sink.total_rows(), 2);
        assert!(metrics.render().contains("rolebook_log_flush_failures_total 1"));

        drop(queue);
        writer.await.unwrap();
    }
}
