use crate::log_debug;
use crate::modules::data_import::domain::entities::RunStatus;
use crate::modules::data_import::domain::types::{ImportEvent, ImportResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;

/// Latest known state of a run, readable while the run is executing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub status: RunStatus,
    pub result: ImportResult,
}

impl RunState {
    pub fn new(result: ImportResult) -> Self {
        Self {
            status: RunStatus::Idle,
            result,
        }
    }
}

/// Publishes run snapshots to the caller's event stream and the shared run state
#[derive(Clone, Default)]
pub struct ProgressTracker {
    sender: Option<UnboundedSender<ImportEvent>>,
    state: Option<Arc<RwLock<RunState>>>,
}

impl ProgressTracker {
    pub fn new(sender: Option<UnboundedSender<ImportEvent>>) -> Self {
        Self {
            sender,
            state: None,
        }
    }

    pub fn with_state(mut self, state: Arc<RwLock<RunState>>) -> Self {
        self.state = Some(state);
        self
    }

    pub async fn started(&self) {
        if let Some(state) = &self.state {
            state.write().await.status = RunStatus::Running;
        }
    }

    pub async fn chunk_completed(&self, result: &ImportResult) {
        if let Some(state) = &self.state {
            state.write().await.result = result.clone();
        }
        self.emit(ImportEvent::Progress(result.clone()));
    }

    pub async fn finished(&self, status: &RunStatus, result: &ImportResult) {
        if let Some(state) = &self.state {
            let mut state = state.write().await;
            state.status = status.clone();
            state.result = result.clone();
        }

        let event = match status {
            RunStatus::Cancelled { resume_from } => ImportEvent::Cancelled {
                result: result.clone(),
                resume_from: *resume_from,
            },
            RunStatus::FailedPendingResume {
                failed_chunk,
                error,
            } => ImportEvent::Failed {
                result: result.clone(),
                failed_chunk: *failed_chunk,
                error: error.clone(),
            },
            _ => ImportEvent::Completed(result.clone()),
        };
        self.emit(event);
    }

    fn emit(&self, event: ImportEvent) {
        if let Some(sender) = &self.sender {
            if sender.send(event).is_err() {
                log_debug!("Import event dropped: receiver is gone");
            }
        }
    }
}
