//! Hands sealed-bucket snapshots to a store without blocking the pipeline

use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::record::SectionRecord;
use super::store::SectionStore;
use crate::common::traits::{SectionGetter, SectionListener};

/// [`SectionListener`] that snapshots every window on each seal
///
/// Snapshots go through a bounded channel to a writer task. When the channel
/// is full the snapshot is dropped with a warning.
pub struct SectionRecorder {
    symbol: String,
    sender: Mutex<Option<mpsc::Sender<SectionRecord>>>,
}

impl SectionRecorder {
    /// Create the recorder and spawn its writer task
    ///
    /// The writer exits once the recorder is closed or dropped and the
    /// channel is drained.
    pub fn spawn(
        symbol: impl Into<String>,
        store: Arc<dyn SectionStore>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let symbol = symbol.into();
        let (sender, mut receiver) = mpsc::channel::<SectionRecord>(capacity.max(1));

        let writer_symbol = symbol.clone();
        let handle = tokio::spawn(async move {
            while let Some(record) = receiver.recv().await {
                match store.create_section(&record).await {
                    Ok(id) => debug!(symbol = %writer_symbol, id, "Section recorded"),
                    Err(e) => error!(symbol = %writer_symbol, "Failed to record section: {}", e),
                }
            }
            info!(symbol = %writer_symbol, "Section writer stopped");
        });

        let recorder = Self {
            symbol,
            sender: Mutex::new(Some(sender)),
        };
        (recorder, handle)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Stop accepting snapshots so the writer can drain and exit
    pub fn close(&self) {
        if self.sender.lock().take().is_some() {
            debug!(symbol = %self.symbol, "Section recorder closed");
        }
    }
}

impl SectionListener for SectionRecorder {
    fn on_bucket_sealed(&self, symbol: &str, _last_price: Decimal, sections: &dyn SectionGetter) {
        let guard = self.sender.lock();
        let Some(sender) = guard.as_ref() else {
            debug!(symbol, "Section recorder closed, snapshot skipped");
            return;
        };
        let record = SectionRecord::from_sections(sections);
        match sender.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                warn!(symbol, end_time = record.end_time, "Section channel full, snapshot dropped");
            }
            Err(TrySendError::Closed(_)) => {
                warn!(symbol, "Section writer stopped, snapshot dropped");
            }
        }
    }
}
