use serde::{Deserialize, Serialize};
use std::ops::Range;
use uuid::Uuid;

/// Lifecycle of an import run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Cancelled { resume_from: usize },
    FailedPendingResume { failed_chunk: usize, error: String },
}

impl RunStatus {
    /// Chunk a resume continues from, if the run can be resumed at all
    pub fn resume_point(&self) -> Option<usize> {
        match self {
            RunStatus::Cancelled { resume_from } => Some(*resume_from),
            RunStatus::FailedPendingResume { failed_chunk, .. } => Some(*failed_chunk),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Idle | RunStatus::Running)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Idle => write!(f, "idle"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Cancelled { resume_from } => {
                write!(f, "cancelled (resume from chunk {})", resume_from)
            }
            RunStatus::FailedPendingResume { failed_chunk, .. } => {
                write!(f, "failed at chunk {}", failed_chunk)
            }
        }
    }
}

/// Contiguous slice of the reconciled records of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub run_id: Uuid,
    pub index: usize,
    pub range: Range<usize>,
}

impl ImportBatch {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// 1-based row number of the `offset`-th record in this batch
    pub fn row_number(&self, offset: usize) -> usize {
        self.range.start + offset + 1
    }
}

/// Split `total` records into ordered batches of at most `chunk_size`
pub fn partition(run_id: Uuid, total: usize, chunk_size: usize) -> Vec<ImportBatch> {
    let size = chunk_size.max(1);
    (0..total)
        .step_by(size)
        .enumerate()
        .map(|(index, start)| ImportBatch {
            run_id,
            index,
            range: start..(start + size).min(total),
        })
        .collect()
}
