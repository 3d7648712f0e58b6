use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use human_bytes::human_bytes;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::{MigrateError, Result};
use crate::es_client::EsClient;
use crate::models::bulk::{encode_record, BulkBuffer};
use crate::models::document::Document;
use crate::models::scroll_response::ScrollPage;

/// Which pipeline stage produced an error event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Scroll,
    Document,
    Bulk,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Stage::Scroll => "scroll",
            Stage::Document => "document",
            Stage::Bulk => "bulk",
        };
        f.write_str(label)
    }
}

/// A recoverable failure, reported and skipped. Never retried.
#[derive(Debug)]
pub struct ErrorEvent {
    pub stage: Stage,
    pub message: String,
}

/// Producer side of the error sink. Every stage funnels failures here; one
/// dedicated task logs them so the pipeline itself never stops to report.
#[derive(Clone)]
struct ErrorSink {
    tx: mpsc::UnboundedSender<ErrorEvent>,
}

impl ErrorSink {
    fn report(&self, stage: Stage, message: impl Into<String>) {
        // the reporter outlives every producer; a send can only fail during
        // teardown, when there is nobody left to read the event anyway
        let _ = self.tx.send(ErrorEvent {
            stage,
            message: message.into(),
        });
    }
}

/// What to do when the destination rejects a bulk flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FlushErrorPolicy {
    /// Report the failure and drop the batch (the original tool's behavior).
    Drop,
    /// Fail the run with the destination's response.
    Abort,
}

impl std::fmt::Display for FlushErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlushErrorPolicy::Drop => f.write_str("drop"),
            FlushErrorPolicy::Abort => f.write_str("abort"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CopyOptions {
    pub page_size: u64,
    pub scroll_ttl: String,
    pub workers: usize,
    pub flush_error_policy: FlushErrorPolicy,
}

#[derive(Debug, Default, Clone)]
pub struct CopyStats {
    pub docs_written: u64,
    pub flushes: u64,
    pub bytes_flushed: u64,
    pub errors: u64,
    pub duration_secs: f64,
}

#[derive(Default)]
struct WriteCounters {
    docs_written: AtomicU64,
    flushes: AtomicU64,
    bytes_flushed: AtomicU64,
}

/// Stream every document matching `pattern` from the source into the
/// destination's bulk endpoint.
///
/// One reader task advances the scroll and feeds a bounded queue sized to
/// one page per worker; `workers` tasks compete for documents, serialize
/// them into private buffers and flush through a single shared mutex, so at
/// most one bulk request is in flight at any time. Closing the queue after
/// the scroll terminates is the only shutdown signal: workers drain what is
/// buffered, flush the residue and exit.
pub async fn copy_documents(
    source: &EsClient,
    dest: &EsClient,
    pattern: &str,
    opts: &CopyOptions,
) -> Result<CopyStats> {
    let started = Instant::now();

    // Opening state: one-shot initial query. A malformed open is fatal,
    // unlike anything that happens while streaming.
    let resp = source
        .open_scroll(pattern, &opts.scroll_ttl, opts.page_size)
        .await?;
    if !resp.is_success() {
        return Err(MigrateError::ScrollOpen(format!(
            "{}: {}",
            resp.status, resp.body
        )));
    }
    let opened = ScrollPage::parse(&resp.body)
        .map_err(|e| MigrateError::ScrollOpen(e.to_string()))?;
    info!(
        "scroll opened over {}: {} documents to copy",
        pattern, opened.total_hits
    );

    let progress = create_progress_bar(opened.total_hits);

    // enough of a buffer to hold one full page per worker
    let capacity = (opts.page_size as usize).saturating_mul(opts.workers).max(1);
    let (doc_tx, doc_rx) = async_channel::bounded::<Document>(capacity);

    let (err_tx, err_rx) = mpsc::unbounded_channel::<ErrorEvent>();
    let sink = ErrorSink { tx: err_tx };
    let reporter = spawn_reporter(err_rx);

    let counters = Arc::new(WriteCounters::default());
    let flush_lock = Arc::new(Mutex::new(()));

    let mut workers: Vec<JoinHandle<Result<()>>> = Vec::with_capacity(opts.workers);
    for worker_id in 0..opts.workers {
        workers.push(tokio::spawn(write_worker(
            worker_id,
            doc_rx.clone(),
            dest.clone(),
            sink.clone(),
            Arc::clone(&counters),
            Arc::clone(&flush_lock),
            progress.clone(),
            opts.flush_error_policy,
        )));
    }
    drop(doc_rx);

    // Streaming state: replay the current cursor until the server says the
    // cursor is gone (clean end) or a page comes back empty or broken.
    let mut scroll_id = opened.scroll_id;
    'streaming: loop {
        let resp = match source.continue_scroll(&scroll_id, &opts.scroll_ttl).await {
            Ok(resp) => resp,
            Err(err) => {
                sink.report(Stage::Scroll, err.to_string());
                break 'streaming;
            }
        };
        if resp.is_not_found() {
            // cursor exhausted or expired; end of stream, not an error
            break 'streaming;
        }
        if !resp.is_success() {
            sink.report(
                Stage::Scroll,
                format!("bad scroll response {}: {}", resp.status, resp.body),
            );
            break 'streaming;
        }
        let page = match ScrollPage::parse(&resp.body) {
            Ok(page) => page,
            Err(err) => {
                sink.report(Stage::Scroll, format!("undecodable scroll page: {err}"));
                break 'streaming;
            }
        };
        scroll_id = page.scroll_id;
        for reason in page.dropped {
            sink.report(Stage::Document, reason);
        }
        if page.docs.is_empty() {
            break 'streaming;
        }
        for doc in page.docs {
            if doc_tx.send(doc).await.is_err() {
                // every worker is gone; only happens when a flush aborted
                break 'streaming;
            }
        }
    }

    // close-then-drain contract: dropping the sender is the shutdown signal
    drop(doc_tx);

    let mut first_failure: Option<MigrateError> = None;
    for handle in workers {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
            Err(join_err) => {
                if first_failure.is_none() {
                    first_failure = Some(MigrateError::WorkerPool(format!(
                        "worker task panicked: {join_err}"
                    )));
                }
            }
        }
    }
    progress.finish_and_clear();

    drop(sink);
    let errors = reporter.await.unwrap_or(0);

    if let Some(err) = first_failure {
        return Err(err);
    }

    Ok(CopyStats {
        docs_written: counters.docs_written.load(Ordering::Relaxed),
        flushes: counters.flushes.load(Ordering::Relaxed),
        bytes_flushed: counters.bytes_flushed.load(Ordering::Relaxed),
        errors,
        duration_secs: started.elapsed().as_secs_f64(),
    })
}

fn spawn_reporter(mut rx: mpsc::UnboundedReceiver<ErrorEvent>) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut count = 0u64;
        while let Some(event) = rx.recv().await {
            count += 1;
            error!("{} error: {}", event.stage, event.message);
        }
        count
    })
}

#[allow(clippy::too_many_arguments)]
async fn write_worker(
    worker_id: usize,
    rx: async_channel::Receiver<Document>,
    dest: EsClient,
    sink: ErrorSink,
    counters: Arc<WriteCounters>,
    flush_lock: Arc<Mutex<()>>,
    progress: ProgressBar,
    policy: FlushErrorPolicy,
) -> Result<()> {
    let mut buffer = BulkBuffer::new();

    while let Ok(doc) = rx.recv().await {
        if let Err(reason) = doc.validate() {
            sink.report(Stage::Document, reason);
            continue;
        }
        let record = match encode_record(&doc) {
            Ok(record) => record,
            Err(err) => {
                sink.report(
                    Stage::Document,
                    format!("failed encoding document {}: {err}", doc.id),
                );
                continue;
            }
        };
        if buffer.wants_flush(record.len()) {
            flush(&dest, &flush_lock, &mut buffer, &sink, &counters, policy).await?;
        }
        buffer.push_record(&record);
        progress.inc(1);
    }

    // queue closed and drained; push out whatever is left
    flush(&dest, &flush_lock, &mut buffer, &sink, &counters, policy).await?;
    debug!("worker {} done", worker_id);
    Ok(())
}

async fn flush(
    dest: &EsClient,
    flush_lock: &Mutex<()>,
    buffer: &mut BulkBuffer,
    sink: &ErrorSink,
    counters: &WriteCounters,
    policy: FlushErrorPolicy,
) -> Result<()> {
    if buffer.is_empty() {
        return Ok(());
    }
    let (payload, docs) = buffer.take_payload();
    let bytes = payload.len() as u64;

    // one in-flight bulk request across the whole pool
    let _guard = flush_lock.lock().await;
    let outcome = dest.bulk(payload).await;
    match outcome {
        Ok(resp) if resp.is_success() => {
            counters.docs_written.fetch_add(docs, Ordering::Relaxed);
            counters.flushes.fetch_add(1, Ordering::Relaxed);
            counters.bytes_flushed.fetch_add(bytes, Ordering::Relaxed);
            debug!("flushed {} docs ({})", docs, human_bytes(bytes as f64));
            Ok(())
        }
        Ok(resp) => {
            let message = format!("bad bulk response {}: {}", resp.status, resp.body);
            fail_flush(sink, policy, message)
        }
        Err(err) => fail_flush(sink, policy, err.to_string()),
    }
}

// Default policy is report-and-drop, faithful to the original tool; the
// batch is already gone from the buffer either way.
fn fail_flush(sink: &ErrorSink, policy: FlushErrorPolicy, message: String) -> Result<()> {
    match policy {
        FlushErrorPolicy::Drop => {
            sink.report(Stage::Bulk, message);
            Ok(())
        }
        FlushErrorPolicy::Abort => Err(MigrateError::BulkRejected(message)),
    }
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = if total > 0 {
        ProgressBar::new(total)
    } else {
        ProgressBar::new_spinner()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
