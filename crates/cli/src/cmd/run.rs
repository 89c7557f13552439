//! Run command
//!
//! Feeds JSON-lines intents into an operation queue and writes every flushed
//! batch to stdout as one JSON object per line, keyed by document id. At end
//! of input (or on Ctrl-C) the queue is stopped and whatever is still
//! buffered is written as a final batch.

use crate::input::parse_line;
use anyhow::{Context, Result};
use opque::{ordered, Batch, DocumentId, OpKind, OpQueue, QueueConfig};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Counters reported at the end of a run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub accepted: usize,
    pub rejected: usize,
    pub batches: usize,
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl Summary {
    fn record_batch(&mut self, batch: &Batch) {
        self.batches += 1;
        for op in batch.values() {
            match op.kind {
                OpKind::Create => self.creates += 1,
                OpKind::Update => self.updates += 1,
                OpKind::Delete => self.deletes += 1,
            }
        }
    }

    fn delivered(&self) -> usize {
        self.creates + self.updates + self.deletes
    }
}

pub async fn run(config: QueueConfig, input: Option<PathBuf>) -> Result<()> {
    let (tx, rx) = mpsc::unbounded_channel::<Batch>();

    let handler_tx = tx.clone();
    let queue = OpQueue::from_config(config, move |batch: Batch| {
        // Receiver only goes away after the queue is stopped
        let _ = handler_tx.send(batch);
    })
    .context("Failed to start operation queue")?;

    let printer = tokio::spawn(print_batches(rx));

    let reader: Box<dyn AsyncRead + Unpin + Send> = match &input {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };

    let mut summary = feed(&queue, reader).await?;

    if let Some(remaining) = queue.stop() {
        let _ = tx.send(remaining);
    }
    drop(tx);
    drop(queue);

    let printed = printer.await.context("Output task failed")??;
    summary.batches = printed.batches;
    summary.creates = printed.creates;
    summary.updates = printed.updates;
    summary.deletes = printed.deletes;

    print_summary(&summary);
    Ok(())
}

/// Submit every input line until end of input or Ctrl-C
async fn feed(queue: &OpQueue, reader: impl AsyncRead + Unpin) -> Result<Summary> {
    let mut lines = BufReader::new(reader).lines();
    let mut summary = Summary::default();
    let mut line_no = 0usize;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read input")?,
            _ = &mut shutdown => {
                info!("Interrupted, draining queue");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };
        line_no += 1;

        match submit_line(queue, &line) {
            Ok(Some(id)) => {
                summary.accepted += 1;
                debug!(line = line_no, id = %id, "queued");
            }
            Ok(None) => {}
            Err(e) => {
                summary.rejected += 1;
                warn!(line = line_no, "Rejected input: {:#}", e);
                eprintln!("{} line {}: {:#}", "skipped".yellow(), line_no, e);
            }
        }
    }

    Ok(summary)
}

fn submit_line(queue: &OpQueue, line: &str) -> Result<Option<DocumentId>> {
    let Some(intent) = parse_line(line)? else {
        return Ok(None);
    };
    let (operation, document, metadata) = intent.into_parts()?;
    let id = queue.submit_named(&operation, document, metadata)?;
    Ok(Some(id))
}

/// Write each batch as one JSON line, in id order
async fn print_batches(mut rx: mpsc::UnboundedReceiver<Batch>) -> Result<Summary> {
    let mut stdout = tokio::io::stdout();
    let mut summary = Summary::default();

    while let Some(batch) = rx.recv().await {
        summary.record_batch(&batch);

        let mut line = serde_json::to_vec(&ordered(&batch)).context("Failed to encode batch")?;
        line.push(b'\n');
        stdout.write_all(&line).await.context("Failed to write batch")?;
        stdout.flush().await?;
    }

    Ok(summary)
}

fn print_summary(summary: &Summary) {
    eprintln!(
        "{} {} accepted, {} rejected",
        "opq".bold(),
        summary.accepted.to_string().green(),
        if summary.rejected > 0 {
            summary.rejected.to_string().red().to_string()
        } else {
            summary.rejected.to_string()
        },
    );
    eprintln!(
        "{} {} in {} batch(es) {}",
        "delivered".dimmed(),
        summary.delivered().to_string().cyan(),
        summary.batches,
        format!(
            "({} create, {} update, {} delete)",
            summary.creates, summary.updates, summary.deletes
        )
        .dimmed(),
    );
}
