//! Per-symbol pipelines and the registry that owns them

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::common::errors::{FlowError, Result};
use crate::common::traits::{Subscription, TickSource};
use crate::common::types::TickBatch;
use crate::config::{AppConfig, SymbolSubscription};
use crate::flow::FlowClient;
use crate::persistence::{SectionRecorder, SectionStore};
use crate::queue::QueueAccumulator;
use crate::strategy::Player;
use crate::watcher::{FlowWatcher, LogAlertListener};

const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// The aggregation components of one symbol
///
/// Only the pipeline task feeds them; everything else reads through the
/// query accessors.
pub struct Pipeline {
    symbol: String,
    subscriber_id: String,
    flow: Arc<FlowClient>,
    queue: Arc<QueueAccumulator>,
    watcher: Arc<FlowWatcher>,
    player: Option<Arc<Player>>,
    recorder: Option<Arc<SectionRecorder>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl Pipeline {
    /// Build and wire the components for one subscription
    ///
    /// With a store, every sealed flow bucket is recorded through a
    /// [`SectionRecorder`]; without one the windows are only tracked in memory.
    pub fn build(
        config: &AppConfig,
        subscription: &SymbolSubscription,
        store: Option<Arc<dyn SectionStore>>,
    ) -> Self {
        let symbol = subscription.symbol.clone();
        let subscriber_id = subscription.subscriber_id.clone();

        let flow = Arc::new(FlowClient::new(
            subscriber_id.clone(),
            symbol.clone(),
            config.flow.period_seconds,
        ));
        let (recorder, writer) = match store {
            Some(store) => {
                let (recorder, writer) = SectionRecorder::spawn(
                    symbol.clone(),
                    store,
                    config.settings.record_channel_size,
                );
                let recorder = Arc::new(recorder);
                flow.listen(&config.flow.durations, recorder.clone());
                (Some(recorder), Some(writer))
            }
            None => {
                flow.track(&config.flow.durations);
                (None, None)
            }
        };

        let queue = Arc::new(QueueAccumulator::new(config.queue_options(subscription)));
        let player = config.player.as_ref().map(|player| {
            let player = Arc::new(Player::new(
                player.name.clone(),
                player.initial_cash,
                player.buy.clone(),
                player.sell.clone(),
            ));
            queue.handle(player.clone());
            player
        });

        let watcher = Arc::new(FlowWatcher::new(config.watcher_options(subscription)));
        for rule in &config.watcher.rules {
            watcher.handle(rule.clone(), Arc::new(LogAlertListener));
        }

        Self {
            symbol,
            subscriber_id,
            flow,
            queue,
            watcher,
            player,
            recorder,
            writer: Mutex::new(writer),
        }
    }

    /// Feed one batch to every component
    pub fn feed(&self, batch: &TickBatch) {
        if batch.symbol != self.symbol {
            warn!(
                symbol = %self.symbol,
                batch_symbol = %batch.symbol,
                "Dropping batch for another symbol"
            );
            return;
        }
        let flow_sealed = self.flow.feed(batch);
        let queue_sealed = self.queue.feed(batch);
        let watcher_sealed = self.watcher.feed(batch);
        debug!(
            symbol = %self.symbol,
            ticks = batch.len(),
            flow_sealed,
            queue_sealed,
            watcher_sealed,
            "Batch processed"
        );
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }

    pub fn flow(&self) -> &FlowClient {
        &self.flow
    }

    pub fn queue(&self) -> &QueueAccumulator {
        &self.queue
    }

    pub fn watcher(&self) -> &FlowWatcher {
        &self.watcher
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_deref()
    }

    /// Close the section recorder and hand back its writer task
    fn finish_recording(&self) -> Option<JoinHandle<()>> {
        if let Some(recorder) = &self.recorder {
            recorder.close();
        }
        self.writer.lock().take()
    }
}

struct RunningPipeline {
    pipeline: Arc<Pipeline>,
    shutdown: mpsc::Sender<()>,
    task: JoinHandle<()>,
    subscription: Option<Subscription>,
}

/// Pipelines keyed by symbol, each with its own cancellation
#[derive(Default)]
pub struct PipelineRegistry {
    pipelines: RwLock<HashMap<String, RunningPipeline>>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the task feeding `pipeline` from `ticks`
    ///
    /// `subscription` is the feed producing the ticks; it is cancelled along
    /// with the pipeline.
    pub fn start(
        &self,
        pipeline: Pipeline,
        ticks: mpsc::Receiver<TickBatch>,
        subscription: Option<Subscription>,
    ) -> Result<Arc<Pipeline>> {
        let mut pipelines = self.pipelines.write();
        if pipelines.contains_key(pipeline.symbol()) {
            return Err(FlowError::Configuration(format!(
                "pipeline for '{}' is already running",
                pipeline.symbol()
            )));
        }

        let pipeline = Arc::new(pipeline);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let task = tokio::spawn(run_pipeline(pipeline.clone(), ticks, shutdown_rx));

        info!(
            symbol = %pipeline.symbol(),
            subscriber_id = %pipeline.subscriber_id(),
            "Pipeline started"
        );
        pipelines.insert(
            pipeline.symbol().to_string(),
            RunningPipeline {
                pipeline: pipeline.clone(),
                shutdown: shutdown_tx,
                task,
                subscription,
            },
        );
        Ok(pipeline)
    }

    /// Build a pipeline for `subscription`, subscribe it to `source` and start it
    #[instrument(skip(self, config, source, store), fields(symbol = %subscription.symbol))]
    pub async fn launch(
        &self,
        config: &AppConfig,
        subscription: &SymbolSubscription,
        source: &dyn TickSource,
        store: Option<Arc<dyn SectionStore>>,
    ) -> Result<Arc<Pipeline>> {
        if self.get(&subscription.symbol).is_some() {
            return Err(FlowError::Configuration(format!(
                "pipeline for '{}' is already running",
                subscription.symbol
            )));
        }
        let pipeline = Pipeline::build(config, subscription, store);
        let (sender, receiver) = mpsc::channel(config.settings.channel_size.max(1));
        let feed = source
            .subscribe(&subscription.symbol, &subscription.subscriber_id, sender)
            .await?;
        info!(source = source.source_name(), "Tick feed subscribed");
        self.start(pipeline, receiver, Some(feed))
    }

    /// Query access to a running pipeline
    pub fn get(&self, symbol: &str) -> Option<Arc<Pipeline>> {
        self.pipelines.read().get(symbol).map(|running| running.pipeline.clone())
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.pipelines.read().keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn len(&self) -> usize {
        self.pipelines.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.read().is_empty()
    }

    /// Cancel the feed and the task of one pipeline
    ///
    /// Batches already queued are processed before the task stops.
    pub async fn shutdown(&self, symbol: &str) -> Result<()> {
        let running = self
            .pipelines
            .write()
            .remove(symbol)
            .ok_or_else(|| FlowError::PipelineNotFound(symbol.to_string()))?;
        stop(running).await;
        Ok(())
    }

    /// Cancel every pipeline
    pub async fn shutdown_all(&self) {
        let drained: Vec<RunningPipeline> = self
            .pipelines
            .write()
            .drain()
            .map(|(_, running)| running)
            .collect();
        for running in drained {
            stop(running).await;
        }
    }
}

async fn stop(running: RunningPipeline) {
    let RunningPipeline {
        pipeline,
        shutdown,
        task,
        subscription,
    } = running;
    let symbol = pipeline.symbol().to_string();

    if let Some(subscription) = subscription {
        subscription.cancel().await;
    }
    if shutdown.send(()).await.is_err() {
        debug!(symbol = %symbol, "Pipeline task already stopped");
    }
    if let Err(e) = task.await {
        warn!(symbol = %symbol, "Pipeline task ended abnormally: {}", e);
    }

    if let Some(writer) = pipeline.finish_recording() {
        if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer).await.is_err() {
            warn!(symbol = %symbol, "Section writer still busy, leaving it behind");
        }
    }
    info!(symbol = %symbol, "Pipeline stopped");
}

async fn run_pipeline(
    pipeline: Arc<Pipeline>,
    mut ticks: mpsc::Receiver<TickBatch>,
    mut shutdown: mpsc::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            batch = ticks.recv() => match batch {
                Some(batch) => pipeline.feed(&batch),
                None => {
                    info!(symbol = %pipeline.symbol(), "Tick channel closed");
                    break;
                }
            },
            _ = shutdown.recv() => break,
        }
    }
}
