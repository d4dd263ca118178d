use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Job ids are allocated from a monotonic counter and never reused.
pub type JobId = u64;

/// Printer ids are fixed at startup.
pub type PrinterId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    Active,
    Completed,
    Cancelled,
}

impl JobStatus {
    /// Terminal jobs stay in the store for lookup but are no longer owned
    /// by any queue or slot.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Active => write!(f, "active"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One print job: a unit of work submitted by an owner for a duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub owner_id: String,
    pub printer_id: PrinterId,
    pub status: JobStatus,
    pub duration_minutes: i64,
    pub submitted_at: DateTime<Utc>,
    /// Set when the job is promoted into a printer's slot.
    pub start_time: Option<DateTime<Utc>>,
    /// `start_time + duration_minutes`.
    pub end_time: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(
        id: JobId,
        owner_id: impl Into<String>,
        printer_id: PrinterId,
        duration_minutes: i64,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id: owner_id.into(),
            printer_id,
            status: JobStatus::Queued,
            duration_minutes,
            submitted_at,
            start_time: None,
            end_time: None,
        }
    }

    /// Move the job into a printer's active slot at `now`.
    pub(crate) fn activate(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Active;
        self.start_time = Some(now);
        self.end_time = Some(now + Duration::minutes(self.duration_minutes));
    }

    /// Whether an active job has run past its computed end time. A future
    /// end time means the job is still printing.
    pub fn is_finished_at(&self, now: DateTime<Utc>) -> bool {
        match self.end_time {
            Some(end) => now >= end,
            None => false,
        }
    }
}
