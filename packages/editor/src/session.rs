//! # Live Session
//!
//! One task per document. Edit notifications, the periodic tick and the
//! end of the quiet period are branches of a single `select!` loop, so a
//! pass never overlaps another pass or an edit being recorded. The task
//! owns the host, the pipeline and the scheduler; nothing is shared.

use crate::config::SessionConfig;
use crate::evaluators::EvaluatorRegistry;
use crate::host::Host;
use crate::pipeline::Pipeline;
use crate::scheduler::UpdateScheduler;
use crate::EditorError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Cloneable handle for reporting edits to a running session
#[derive(Debug, Clone)]
pub struct EditSender {
    tx: mpsc::UnboundedSender<()>,
}

impl EditSender {
    /// Tell the session the buffer changed
    pub fn notify(&self) -> Result<(), EditorError> {
        self.tx.send(()).map_err(|_| EditorError::SessionClosed)
    }
}

/// Counters reported when a session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub edits: usize,
    pub passes: usize,
}

/// Owner's handle on a spawned session
#[derive(Debug)]
pub struct SessionHandle {
    edits: EditSender,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<SessionStats>,
}

impl SessionHandle {
    pub fn notify_edit(&self) -> Result<(), EditorError> {
        self.edits.notify()
    }

    pub fn edit_sender(&self) -> EditSender {
        self.edits.clone()
    }

    /// Stop the session and wait for it to finish
    pub async fn shutdown(self) -> Result<SessionStats, EditorError> {
        // the task may already have stopped on its own
        let _ = self.shutdown.send(());
        self.task.await.map_err(|_| EditorError::SessionClosed)
    }
}

/// Live annotation session for one host buffer
pub struct Session<H: Host> {
    host: H,
    registry: EvaluatorRegistry,
    pipeline: Pipeline,
    scheduler: UpdateScheduler,
    config: SessionConfig,
    stats: SessionStats,
}

impl<H: Host + 'static> Session<H> {
    /// Build a session with the default evaluators
    pub fn new(host: H, config: SessionConfig) -> Result<Self, EditorError> {
        Self::with_registry(host, config, &EvaluatorRegistry::default())
    }

    pub fn with_registry(
        host: H,
        config: SessionConfig,
        registry: &EvaluatorRegistry,
    ) -> Result<Self, EditorError> {
        config.validate()?;
        let pipeline = Pipeline::for_language(registry, &host.language_identifier(), &config)?;
        Ok(Self {
            host,
            registry: registry.clone(),
            pipeline,
            scheduler: UpdateScheduler::new(config.debounce),
            config,
            stats: SessionStats::default(),
        })
    }

    /// Run the session on the current tokio runtime
    pub fn spawn(self) -> SessionHandle {
        let (edit_tx, edit_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(edit_rx, shutdown_rx));

        SessionHandle {
            edits: EditSender { tx: edit_tx },
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(
        mut self,
        mut edits: mpsc::UnboundedReceiver<()>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> SessionStats {
        let mut ticker = time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            tick_ms = self.config.tick_interval.as_millis() as u64,
            debounce_ms = self.config.debounce.as_millis() as u64,
            "session started"
        );

        loop {
            let deadline = self.scheduler.deadline();

            tokio::select! {
                _ = &mut shutdown => {
                    debug!("session shutdown requested");
                    break;
                }
                edit = edits.recv() => match edit {
                    Some(()) => {
                        self.stats.edits += 1;
                        self.scheduler.on_edit(Instant::now());
                    }
                    None => {
                        debug!("all edit senders dropped");
                        break;
                    }
                },
                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.scheduler.on_deadline(Instant::now());
                }
                _ = ticker.tick() => {
                    if self.scheduler.on_tick() {
                        self.run_pass();
                        self.scheduler.finish_pass();
                    }
                }
            }
        }

        info!(edits = self.stats.edits, passes = self.stats.passes, "session stopped");
        self.stats
    }

    fn run_pass(&mut self) {
        // the buffer's language can change while the session runs
        let identifier = self.host.language_identifier();
        match self.registry.find(&identifier) {
            None => {
                warn!(language = %identifier, "no evaluator for language, skipping pass");
                return;
            }
            Some(evaluator) if evaluator.language() != self.pipeline.evaluator().language() => {
                match Pipeline::for_language(&self.registry, &identifier, &self.config) {
                    Ok(pipeline) => self.pipeline = pipeline,
                    Err(err) => {
                        warn!("cannot switch evaluator: {}", err);
                        return;
                    }
                }
            }
            Some(_) => {}
        }

        let document = self.host.snapshot();
        self.pipeline.run(&document);
        self.host.render_annotations(&self.pipeline.batch());
        self.stats.passes += 1;
    }
}
