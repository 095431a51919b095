use std::sync::{mpsc, Arc};
use std::thread;

use shelf_logging::{shelf_error, shelf_info};

use crate::archive::Archiver;
use crate::fetch::ChannelProgressSink;
use crate::{EngineEvent, JobFailure, JobId, JobProgress, Stage};

enum EngineCommand {
    Enqueue { job_id: JobId, url: String },
}

/// Runs archive jobs on a background tokio runtime.
///
/// Jobs run concurrently; results come back as [`EngineEvent`]s in completion
/// order. Dropping the handle shuts the runtime down; blocking store work
/// already started still runs to completion.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(archiver: Arc<Archiver>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    shelf_error!("Failed to start engine runtime: {}", err);
                    reject_all(cmd_rx, event_tx, &err.to_string());
                    return;
                }
            };

            while let Ok(command) = cmd_rx.recv() {
                let archiver = archiver.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(archiver.as_ref(), command, event_tx).await;
                });
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn enqueue(&self, job_id: JobId, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Enqueue {
            job_id,
            url: url.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks until the next event. `None` once the worker has gone away.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }
}

async fn handle_command(
    archiver: &Archiver,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Enqueue { job_id, url } => {
            let sink = ChannelProgressSink::new(event_tx.clone());
            let _ = event_tx.send(EngineEvent::Progress(JobProgress {
                job_id,
                stage: Stage::Queued,
                bytes: None,
            }));
            let result = archiver
                .archive(job_id, &url, &sink)
                .await
                .map_err(|err| JobFailure::from(&err));
            if let Err(failure) = &result {
                shelf_info!("job {} for {} failed: {}", job_id, url, failure);
            }
            let _ = event_tx.send(EngineEvent::JobCompleted { job_id, result });
        }
    }
}

fn reject_all(
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
    reason: &str,
) {
    while let Ok(EngineCommand::Enqueue { job_id, .. }) = cmd_rx.recv() {
        let _ = event_tx.send(EngineEvent::JobCompleted {
            job_id,
            result: Err(JobFailure {
                stage: Stage::Queued,
                message: format!("engine runtime unavailable: {reason}"),
            }),
        });
    }
}
