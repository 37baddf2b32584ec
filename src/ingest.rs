//! Background log ingestion.
//!
//! One long-lived reader thread per open log performs the blocking file I/O
//! and per-line decoding, handing each successful record back over an mpsc
//! channel. The owning [`Log`] drains the channel on its own schedule
//! ([`Log::poll`]), so records become visible to the consumer strictly in
//! file line order, one at a time, and the consumer never blocks on the
//! reader.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use crate::playback::WindowCursor;
use crate::record::{DecodeError, Delimiter, Record};
use crate::store::RecordStore;

/// Events the reader thread sends back to the owning [`Log`], in file line
/// order.
#[derive(Debug)]
pub enum ReaderEvent {
    /// The reader thread is up and the file is about to be opened.
    Started,
    /// One line decoded successfully.
    Record(Box<Record>),
    /// One line failed to decode and was skipped. Never fatal to the run.
    LineSkipped { line: usize, error: DecodeError },
    /// The run failed with a reportable reason (file open or read error).
    Error(String),
    /// The reader reached the terminator (empty line or EOF) or gave up.
    Finished { success: bool },
}

/// A log file being ingested and played back.
///
/// `parse` starts a background reader and returns immediately; progress
/// arrives through the event channel and is folded into the store by
/// [`poll`](Log::poll) / [`get_until`](Log::get_until).
#[derive(Debug, Default)]
pub struct Log {
    store: RecordStore,
    cursor: WindowCursor,
    delimiter: Delimiter,
    running: bool,
    completed: Option<bool>,
    skipped: usize,
    last_error: Option<String>,
    events: Option<Receiver<ReaderEvent>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Log {
    pub fn new() -> Self {
        Self {
            store: RecordStore::new(),
            ..Self::default()
        }
    }

    pub fn with_delimiter(delimiter: Delimiter) -> Self {
        Self {
            delimiter,
            ..Self::new()
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    /// Whether a reader thread is still producing for this log.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// `Some(success)` once a run has reported completion. A cancelled run
    /// never completes and leaves this `None`.
    pub fn completed(&self) -> Option<bool> {
        self.completed
    }

    /// Reason for the last fatal failure (file open or read error).
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Lines skipped so far in the current run.
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    /// Start ingesting `path` on a background thread and return immediately.
    /// Any previous run is cancelled first.
    pub fn parse(&mut self, path: impl AsRef<Path>) {
        if self.running {
            self.stop();
        }

        let path = path.as_ref().to_path_buf();
        let delimiter = self.delimiter;
        let cancel = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = channel();

        self.events = Some(receiver);
        self.cancel = Some(Arc::clone(&cancel));
        self.running = true;
        self.completed = None;
        self.skipped = 0;
        self.last_error = None;

        thread::spawn(move || read_log(path, delimiter, cancel, sender));
    }

    /// Drain pending reader events, appending records in arrival order.
    /// Returns how many records were appended by this drain.
    pub fn poll(&mut self) -> usize {
        let Some(receiver) = self.events.take() else {
            return 0;
        };

        let mut appended = 0;
        let mut keep_receiver = true;

        loop {
            match receiver.try_recv() {
                Ok(ReaderEvent::Started) => {
                    tracing::debug!("log ingestion started");
                }
                Ok(ReaderEvent::Record(record)) => {
                    let index = self.store.append(*record);
                    appended += 1;
                    tracing::trace!(index, "record appended");
                }
                Ok(ReaderEvent::LineSkipped { line, error }) => {
                    self.skipped += 1;
                    tracing::debug!(line, %error, "line skipped");
                }
                Ok(ReaderEvent::Error(reason)) => {
                    self.last_error = Some(reason);
                }
                Ok(ReaderEvent::Finished { success }) => {
                    tracing::info!(
                        success,
                        records = self.store.len(),
                        skipped = self.skipped,
                        "log ingestion finished"
                    );
                    self.running = false;
                    self.completed = Some(success);
                    keep_receiver = false;
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // Reader gone without a completion report (cancelled run)
                    self.running = false;
                    keep_receiver = false;
                    break;
                }
            }
        }

        if keep_receiver {
            self.events = Some(receiver);
        } else {
            self.cancel = None;
        }

        appended
    }

    /// All records newly available whose timestamp is within `elapsed`
    /// seconds of the first record's timestamp, plus whether the reader is
    /// still producing (so an empty slice tells the caller whether to keep
    /// polling).
    ///
    /// The cutoff is inclusive and the cursor only moves forward; two calls
    /// with growing `elapsed` return adjacent slices with no gap, overlap or
    /// duplicate. Store timestamps are assumed non-decreasing; out-of-order
    /// records behind the cutoff are skipped, not reordered.
    pub fn get_until(&mut self, elapsed: f64) -> (&[Record], bool) {
        self.poll();
        let due = self
            .cursor
            .take_due(self.store.records(), |r: &Record| r.time(), elapsed);
        (due, self.running)
    }

    /// Restart playback from the first record without re-ingesting.
    pub fn reset(&mut self) {
        self.cursor.reset();
    }

    /// Drop all records and cursor state. Does NOT stop an in-flight reader;
    /// its remaining records keep arriving. Use [`stop`](Log::stop) to cancel
    /// the run itself.
    pub fn clear(&mut self) {
        self.store.clear();
        self.cursor.clear();
    }

    /// Cancel the in-flight run, if any. The reader finishes the line it is
    /// on and never starts the next one; it is not torn down mid-I/O.
    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::Relaxed);
        }
        self.events = None;
        self.running = false;
    }
}

/// Reader-thread body: stream `path` line by line, decode, and report.
///
/// An empty line terminates the stream just like EOF; some producers append
/// trailing blank separators. The file-open failure is the only fatal error
/// that yields zero records.
fn read_log(path: PathBuf, delimiter: Delimiter, cancel: Arc<AtomicBool>, tx: Sender<ReaderEvent>) {
    let _ = tx.send(ReaderEvent::Started);

    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) => {
            let reason = format!("failed to open {}: {}", path.display(), e);
            tracing::warn!("{reason}");
            let _ = tx.send(ReaderEvent::Error(reason));
            let _ = tx.send(ReaderEvent::Finished { success: false });
            return;
        }
    };

    let mut lines = BufReader::new(file).lines();
    let mut line_no = 0usize;

    loop {
        // Finish the current line, never start the next one after a cancel
        if cancel.load(Ordering::Relaxed) {
            tracing::debug!(path = %path.display(), line = line_no, "ingestion cancelled");
            return;
        }

        let Some(line) = lines.next() else { break };
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                let reason = format!("read error in {}: {}", path.display(), e);
                tracing::warn!("{reason}");
                let _ = tx.send(ReaderEvent::Error(reason));
                let _ = tx.send(ReaderEvent::Finished { success: false });
                return;
            }
        };
        line_no += 1;

        // Empty line = end-of-stream sentinel
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if line.is_empty() {
            break;
        }

        match Record::decode_line(line, delimiter) {
            Ok(record) => {
                if tx.send(ReaderEvent::Record(Box::new(record))).is_err() {
                    // Consumer dropped the log; stop reading
                    return;
                }
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), line = line_no, %error, "skipping malformed line");
                let _ = tx.send(ReaderEvent::LineSkipped { line: line_no, error });
            }
        }
    }

    let _ = tx.send(ReaderEvent::Finished { success: true });
}
