use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use crate::domain::utils::id::SwitchId;

pub const HEADERS: [&str; 4] = ["TimeMs", "Event", "Switch", "Detail"];

/// One row of the statistics file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsRow {
    pub time_ms: i64,
    pub event: &'static str,
    pub switch: Option<SwitchId>,
    pub detail: String,
}

impl StatsRow {
    fn to_record(&self) -> [String; 4] {
        [
            self.time_ms.to_string(),
            self.event.to_string(),
            self.switch.map(|s| s.to_string()).unwrap_or_else(|| "NA".to_string()),
            self.detail.clone(),
        ]
    }
}

enum StatsMessage {
    Log(StatsRow),
    Shutdown,
}

/// Writes controller events as `;`-separated CSV on a background thread, so
/// the event loop never blocks on file I/O.
#[derive(Debug)]
pub struct StatsCollector {
    sender: mpsc::Sender<StatsMessage>,
    worker: Option<JoinHandle<()>>,
}

impl StatsCollector {
    pub fn to_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Self::to_writer(Box::new(file))
    }

    pub fn to_writer(writer: Box<dyn Write + Send>) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();

        let worker = thread::Builder::new().name("stats-writer".to_string()).spawn(move || {
            Self::worker_loop(rx, writer);
        })?;

        Ok(StatsCollector { sender: tx, worker: Some(worker) })
    }

    fn worker_loop(rx: mpsc::Receiver<StatsMessage>, writer: Box<dyn Write + Send>) {
        let mut csv_wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

        if let Err(e) = csv_wtr.write_record(HEADERS) {
            log::error!("Stats Error: Failed to write headers: {}", e);
        }

        for msg in rx {
            match msg {
                StatsMessage::Log(row) => {
                    if let Err(e) = csv_wtr.write_record(row.to_record()) {
                        log::error!("Stats Error: Failed to write record: {}", e);
                    }
                }
                StatsMessage::Shutdown => break,
            }
        }

        let _ = csv_wtr.flush();
    }

    pub fn record(&self, row: StatsRow) {
        // The worker only goes away on shutdown.
        let _ = self.sender.send(StatsMessage::Log(row));
    }

    /// Writes out everything recorded so far and stops the worker.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for StatsCollector {
    fn drop(&mut self) {
        let _ = self.sender.send(StatsMessage::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Stats Error: writer thread panicked");
            }
        }
    }
}
