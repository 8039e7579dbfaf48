use crate::error::{ProcessingError, Result};
use crate::models::{Accumulator, Record, RunningStats, StationSummary};
use crate::processors::messages::{collect_messages, DiagnosticLog, OrchestrationMessage};
use crate::processors::store::AggregationStore;
use crate::readers::ChunkSource;
use crate::utils::{ProcessorConfig, ProgressReporter};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use validator::Validate;

/// Result of one orchestrated run.
#[derive(Debug)]
pub struct AggregationReport {
    pub stations: BTreeMap<String, StationSummary>,
    pub diagnostics: DiagnosticLog,
    pub lines_read: u64,
    pub bytes_read: u64,
    pub workers: usize,
    pub elapsed: Duration,
}

impl AggregationReport {
    pub fn records_aggregated(&self) -> u64 {
        self.stations.values().map(|s| s.count).sum()
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Aggregation Report ===\n");
        summary.push_str(&format!("Workers: {}\n", self.workers));
        summary.push_str(&format!(
            "Lines Read: {} ({} bytes)\n",
            self.lines_read, self.bytes_read
        ));
        summary.push_str(&format!(
            "Records Aggregated: {}\n",
            self.records_aggregated()
        ));
        summary.push_str(&format!("Stations: {}\n", self.stations.len()));
        summary.push_str(&format!(
            "Parse Errors: {}\nRead Errors: {}\n",
            self.diagnostics.parse_errors, self.diagnostics.read_errors
        ));
        summary.push_str(&format!("Elapsed: {:.2?}\n", self.elapsed));

        let errors: Vec<_> = self
            .diagnostics
            .messages
            .iter()
            .filter(|m| m.is_error())
            .take(10)
            .collect();

        if !errors.is_empty() {
            summary.push_str("\nFirst Errors:\n");
            for (i, message) in errors.iter().enumerate() {
                summary.push_str(&format!("  {}. {}\n", i + 1, message));
            }
        }

        summary
    }
}

/// Drives one chunk source per worker over a shared, round-robin offset.
pub struct Orchestrator<A = RunningStats> {
    sources: Vec<ChunkSource>,
    seek_pos: u64,
    file_len: u64,
    store: Arc<AggregationStore<A>>,
    delimiter: u8,
    max_field_len: usize,
}

impl<A: Accumulator> Orchestrator<A> {
    /// Open one chunk source per configured worker. Failing to open the input
    /// is fatal.
    pub async fn open(path: &Path, config: &ProcessorConfig) -> Result<Self> {
        config.validate()?;

        let file_len = tokio::fs::metadata(path)
            .await
            .map_err(|source| ProcessingError::InputUnavailable {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        let mut sources = Vec::with_capacity(config.workers);
        for worker in 0..config.workers {
            sources.push(ChunkSource::open(path, worker, config.terminator_byte()).await?);
        }

        info!(
            path = %path.display(),
            workers = sources.len(),
            bytes = file_len,
            "Opened input file"
        );

        Ok(Self {
            sources,
            seek_pos: 0,
            file_len,
            store: Arc::new(AggregationStore::new()),
            delimiter: config.delimiter_byte(),
            max_field_len: config.max_field_len,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.sources.len()
    }

    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    /// Read, parse and aggregate the whole file, then reduce the store.
    pub async fn run(mut self, progress: Option<&ProgressReporter>) -> Result<AggregationReport> {
        let started = Instant::now();
        let workers = self.sources.len();

        let (sender, receiver) = mpsc::channel(workers);
        let collector = tokio::spawn(collect_messages(receiver));

        let scanned = self.scan(&sender, progress).await;

        // Dropping the last sender ends the collector loop
        drop(sender);
        let diagnostics = collector.await?;

        for source in self.sources.drain(..) {
            source.close();
        }

        let lines_read = scanned?;

        let store = Arc::try_unwrap(self.store).map_err(|store| ProcessingError::StoreInUse {
            holders: Arc::strong_count(&store),
        })?;
        let stations = store.snapshot()?;

        if let Some(p) = progress {
            p.finish_with_message(&format!("Aggregated {} stations", stations.len()));
        }

        let report = AggregationReport {
            stations,
            diagnostics,
            lines_read,
            bytes_read: self.seek_pos,
            workers,
            elapsed: started.elapsed(),
        };

        info!(
            stations = report.stations.len(),
            lines = report.lines_read,
            errors = report.diagnostics.error_count(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Aggregation complete"
        );

        Ok(report)
    }

    /// Round-robin read cycles until every worker has retired. Returns the
    /// number of lines read.
    async fn scan(
        &mut self,
        messages: &mpsc::Sender<OrchestrationMessage>,
        progress: Option<&ProgressReporter>,
    ) -> Result<u64> {
        let mut retired = vec![false; self.sources.len()];
        let mut lines_read = 0u64;

        while retired.iter().any(|r| !r) {
            let mut tasks = JoinSet::new();

            for (worker, source) in self.sources.iter().enumerate() {
                if retired[worker] {
                    continue;
                }

                if let Err(e) = source.set_position(self.seek_pos).await {
                    join_cycle(tasks).await?;
                    return Err(e);
                }

                match source.read_line().await {
                    Ok(Some(line)) => {
                        self.seek_pos += line.consumed;
                        lines_read += 1;

                        tasks.spawn(parse_and_insert(
                            worker,
                            line.bytes,
                            Arc::clone(&self.store),
                            messages.clone(),
                            self.delimiter,
                            self.max_field_len,
                        ));
                    }
                    Ok(None) => {
                        // The shared offset has reached the end of the file,
                        // so every remaining worker would read nothing too.
                        debug!(worker, offset = self.seek_pos, "End of file reached");
                        if let Some(p) = progress {
                            p.set_message("Draining parse tasks...");
                        }
                        send(messages, OrchestrationMessage::EndOfFile { worker }).await;
                        retired[worker] = true;

                        for (other, done) in retired.iter_mut().enumerate() {
                            if !*done {
                                *done = true;
                                send(messages, OrchestrationMessage::EndOfFile { worker: other })
                                    .await;
                            }
                        }
                        break;
                    }
                    Err(e) => {
                        warn!(worker, offset = self.seek_pos, error = %e, "Read failed");
                        send(
                            messages,
                            OrchestrationMessage::ReadError {
                                worker,
                                reason: e.to_string(),
                            },
                        )
                        .await;
                        retired[worker] = true;
                    }
                }
            }

            join_cycle(tasks).await?;

            if let Some(p) = progress {
                p.update(self.seek_pos);
            }
        }

        Ok(lines_read)
    }
}

/// Wait for every task of a read cycle. All tasks are joined even when one
/// fails; the first failure is returned afterwards.
async fn join_cycle(mut tasks: JoinSet<Result<()>>) -> Result<()> {
    let mut first_error = None;

    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.map_err(ProcessingError::from).and_then(|r| r);
        if let Err(e) = outcome {
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn parse_and_insert<A: Accumulator>(
    worker: usize,
    line: Vec<u8>,
    store: Arc<AggregationStore<A>>,
    messages: mpsc::Sender<OrchestrationMessage>,
    delimiter: u8,
    max_field_len: usize,
) -> Result<()> {
    let reason = match Record::parse(&line, delimiter, max_field_len) {
        Ok(record) => return store.insert(record.station, record.value),
        Err(reason) => reason,
    };

    send(
        &messages,
        OrchestrationMessage::ParseError {
            worker,
            line,
            reason,
        },
    )
    .await;
    Ok(())
}

async fn send(messages: &mpsc::Sender<OrchestrationMessage>, message: OrchestrationMessage) {
    if messages.send(message).await.is_err() {
        debug!("Collector closed, dropping message");
    }
}
