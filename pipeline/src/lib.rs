//! Analysis Request Queue: serializes played-move evaluations against a
//! single search oracle and emits one result per request.
//!
//! The pipeline is an explicitly constructed, explicitly torn-down unit:
//! `start` spawns the actor (and the engine boot inside it), `submit`
//! enqueues work, `subscribe` observes lifecycle and result events, and
//! `terminate` releases everything. There is no ambient global engine.

mod actor;
pub mod correlation;
pub mod messages;


use std::future::Future;
use std::sync::Arc;

use engine::{Oracle, OracleConfig, OracleError, SearchLimits, SearchOracle};
use tokio::sync::{broadcast, mpsc, watch};

use actor::run_pipeline_actor;
pub use correlation::CorrelationMap;
pub use messages::{AnalysisRequest, AnalysisResult, PipelineEvent};

const MAILBOX_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 256;

/// Pipeline tuning.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub oracle: OracleConfig,
    /// Per-search budget handed to the oracle.
    pub limits: SearchLimits,
    /// Full-move cap past which blunders are not recorded.
    pub recording_cap: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            oracle: OracleConfig::default(),
            limits: SearchLimits::default(),
            recording_cap: analysis::RECORDING_MOVE_CAP,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("analysis pipeline has been terminated")]
    Closed,
}

/// Handle to a running analysis pipeline.
pub struct AnalysisPipeline {
    cmd_tx: mpsc::Sender<AnalysisRequest>,
    terminate_tx: watch::Sender<bool>,
    event_tx: broadcast::Sender<PipelineEvent>,
    correlation: Arc<CorrelationMap>,
}

impl AnalysisPipeline {
    /// Start a pipeline backed by a freshly spawned search process.
    pub fn start(config: PipelineConfig) -> Self {
        let oracle_config = config.oracle.clone();
        Self::start_with_boot(config, async move {
            Oracle::spawn(oracle_config)
                .await
                .map(|oracle| Box::new(oracle) as Box<dyn SearchOracle>)
        })
    }

    /// Start a pipeline with an explicit oracle boot step.
    ///
    /// The boot runs inside the actor task; requests submitted while it is
    /// pending are buffered and drain in submission order once the oracle
    /// is ready. A boot failure moves the pipeline into its terminal error
    /// state.
    pub fn start_with_boot<F>(config: PipelineConfig, boot: F) -> Self
    where
        F: Future<Output = Result<Box<dyn SearchOracle>, OracleError>> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel(MAILBOX_CAPACITY);
        let (terminate_tx, terminate_rx) = watch::channel(false);
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let correlation = Arc::new(CorrelationMap::new());

        tokio::spawn(run_pipeline_actor(
            config,
            boot,
            cmd_rx,
            terminate_rx,
            event_tx.clone(),
            correlation.clone(),
        ));

        Self {
            cmd_tx,
            terminate_tx,
            event_tx,
            correlation,
        }
    }

    /// Observe lifecycle and result events. Subscribers only see events
    /// emitted after they subscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.event_tx.subscribe()
    }

    /// Enqueue a request for analysis. The caller-supplied move index is
    /// parked under the request id and stamped onto the eventual result.
    pub async fn submit(&self, request: AnalysisRequest) -> Result<(), PipelineError> {
        if *self.terminate_tx.borrow() {
            return Err(PipelineError::Closed);
        }
        self.correlation.insert(&request.id, request.move_index);
        self.cmd_tx.send(request).await.map_err(|e| {
            self.correlation.take(&e.0.id);
            PipelineError::Closed
        })
    }

    /// Tear the pipeline down: pending requests are discarded without
    /// results, parked correlations are dropped, and the engine process
    /// is released. Safe to call from any state, including repeatedly.
    pub fn terminate(&self) {
        let _ = self.terminate_tx.send(true);
    }
}
