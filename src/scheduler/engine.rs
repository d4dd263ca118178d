use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::PrinterSpec;
use crate::error::{Result, SpoolError};
use crate::scheduler::job::{Job, JobId, JobStatus, PrinterId};
use crate::scheduler::printer::{Printer, PrinterState};

/// One year. Keeps `start_time + duration` inside chrono's range no matter
/// what a client sends.
const MAX_DURATION_MINUTES: i64 = 60 * 24 * 365;

/// A printer with its current active job, as returned by list queries.
#[derive(Debug, Clone, Serialize)]
pub struct PrinterSnapshot {
    pub id: PrinterId,
    pub name: String,
    pub active_job: Option<Job>,
}

/// Full dump of the scheduler state, for the debug endpoint and for
/// invariant checks in tests.
#[derive(Debug, Serialize)]
pub struct SchedulerSnapshot {
    pub printers: Vec<PrinterDump>,
    pub jobs: Vec<Job>,
    pub last_job_id: JobId,
}

#[derive(Debug, Serialize)]
pub struct PrinterDump {
    pub printer: Printer,
    pub active: Option<JobId>,
    pub queue: Vec<JobId>,
}

/// The queue reconciliation engine.
///
/// Owns the printer registry, one FIFO queue per printer, and the job store.
/// All jobs (queued, active, and terminal) live in the `jobs` map; printer
/// slots and queues reference them by id, so every update lands on the
/// single owned copy of a job.
#[derive(Debug)]
pub struct Scheduler {
    printers: Vec<PrinterState>,
    by_id: HashMap<PrinterId, usize>,
    jobs: HashMap<JobId, Job>,
    last_job_id: JobId,
}

impl Scheduler {
    pub fn new(specs: &[PrinterSpec]) -> Self {
        let printers: Vec<PrinterState> = specs
            .iter()
            .map(|spec| {
                PrinterState::new(Printer {
                    id: spec.id,
                    name: spec.name.clone(),
                })
            })
            .collect();
        let by_id = printers
            .iter()
            .enumerate()
            .map(|(idx, state)| (state.printer.id, idx))
            .collect();
        Self {
            printers,
            by_id,
            jobs: HashMap::new(),
            last_job_id: 0,
        }
    }

    /// Enqueue a new job at the tail of the target printer's queue.
    ///
    /// Never promotes the job directly, even if the slot is free; callers
    /// run `reconcile` right after so a free slot is filled promptly.
    pub fn submit(
        &mut self,
        owner_id: &str,
        printer_id: PrinterId,
        duration_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<JobId> {
        if !(1..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
            return Err(SpoolError::InvalidDuration(duration_minutes));
        }
        let idx = *self
            .by_id
            .get(&printer_id)
            .ok_or(SpoolError::PrinterNotFound(printer_id))?;

        self.last_job_id += 1;
        let job_id = self.last_job_id;
        self.jobs.insert(
            job_id,
            Job::new(job_id, owner_id, printer_id, duration_minutes, now),
        );
        self.printers[idx].queue.push_back(job_id);
        tracing::info!(job_id, printer_id, owner_id, duration_minutes, "Print queued");
        Ok(job_id)
    }

    /// Cancel a job owned by `owner_id`.
    ///
    /// An active job is cancelled without waiting for its end time, freeing
    /// the slot for the next reconcile pass. A queued job is removed from
    /// its queue, preserving the order of the remaining entries. Cancelling
    /// a job that already completed or was cancelled is a no-op success.
    pub fn cancel(&mut self, job_id: JobId, owner_id: &str) -> Result<()> {
        let job = self
            .jobs
            .get_mut(&job_id)
            .ok_or(SpoolError::JobNotFound(job_id))?;
        if job.owner_id != owner_id {
            return Err(SpoolError::NotJobOwner(job_id));
        }
        if job.status.is_terminal() {
            return Ok(());
        }

        let idx = self.by_id[&job.printer_id];
        let state = &mut self.printers[idx];
        match job.status {
            JobStatus::Active => {
                state.active = None;
            }
            JobStatus::Queued => {
                if let Some(pos) = state.queue.iter().position(|&id| id == job_id) {
                    state.queue.remove(pos);
                }
            }
            JobStatus::Completed | JobStatus::Cancelled => unreachable!(),
        }
        job.status = JobStatus::Cancelled;
        tracing::info!(job_id, printer_id = job.printer_id, "Print cancelled");
        Ok(())
    }

    /// Advance every printer's state to `now`.
    ///
    /// For each printer: complete the active job once its end time has
    /// passed, then promote the queue head into the freed slot. Idempotent
    /// for a fixed `now`; printers are reconciled independently.
    pub fn reconcile(&mut self, now: DateTime<Utc>) {
        for state in &mut self.printers {
            if let Some(job_id) = state.active {
                // Slots and queues only ever hold ids of jobs in the store.
                let job = self
                    .jobs
                    .get_mut(&job_id)
                    .expect("active job exists in the job store");
                if job.is_finished_at(now) {
                    job.status = JobStatus::Completed;
                    state.active = None;
                    tracing::info!(
                        job_id,
                        printer_id = state.printer.id,
                        "Print finished"
                    );
                }
            }

            if state.active.is_none() {
                if let Some(next_id) = state.queue.pop_front() {
                    let job = self
                        .jobs
                        .get_mut(&next_id)
                        .expect("queued job exists in the job store");
                    job.activate(now);
                    state.active = Some(next_id);
                    tracing::info!(
                        job_id = next_id,
                        printer_id = state.printer.id,
                        end_time = %job.end_time.unwrap_or(now),
                        "Print started"
                    );
                }
            }
        }
    }

    /// Active jobs belonging to `owner_id`, in printer registration order.
    /// Reconciles first so the answer reflects `now`.
    pub fn list_active_for_owner(&mut self, owner_id: &str, now: DateTime<Utc>) -> Vec<Job> {
        self.reconcile(now);
        self.printers
            .iter()
            .filter_map(|state| state.active.and_then(|id| self.jobs.get(&id)))
            .filter(|job| job.owner_id == owner_id)
            .cloned()
            .collect()
    }

    /// All printers with their current active job, in registration order.
    /// Reconciles first so the answer reflects `now`.
    pub fn list_printers(&mut self, now: DateTime<Utc>) -> Vec<PrinterSnapshot> {
        self.reconcile(now);
        self.printers
            .iter()
            .map(|state| PrinterSnapshot {
                id: state.printer.id,
                name: state.printer.name.clone(),
                active_job: state.active.and_then(|id| self.jobs.get(&id)).cloned(),
            })
            .collect()
    }

    /// Look up any job, including completed and cancelled ones.
    pub fn job(&self, job_id: JobId) -> Option<&Job> {
        self.jobs.get(&job_id)
    }

    /// Reconcile and dump the whole scheduler state.
    pub fn snapshot(&mut self, now: DateTime<Utc>) -> SchedulerSnapshot {
        self.reconcile(now);
        let mut jobs: Vec<Job> = self.jobs.values().cloned().collect();
        jobs.sort_by_key(|job| job.id);
        SchedulerSnapshot {
            printers: self
                .printers
                .iter()
                .map(|state| PrinterDump {
                    printer: state.printer.clone(),
                    active: state.active,
                    queue: state.queue.iter().copied().collect(),
                })
                .collect(),
            jobs,
            last_job_id: self.last_job_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn specs() -> Vec<PrinterSpec> {
        vec![
            PrinterSpec {
                id: 1,
                name: "Test Printer 1".to_string(),
            },
            PrinterSpec {
                id: 2,
                name: "Test Printer 2".to_string(),
            },
        ]
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn submit_rejects_non_positive_duration() {
        let mut sched = Scheduler::new(&specs());
        assert!(matches!(
            sched.submit("alice", 1, 0, t0()),
            Err(SpoolError::InvalidDuration(0))
        ));
        assert!(matches!(
            sched.submit("alice", 1, -5, t0()),
            Err(SpoolError::InvalidDuration(-5))
        ));
    }

    #[test]
    fn submit_rejects_oversized_duration() {
        let mut sched = Scheduler::new(&specs());
        assert!(matches!(
            sched.submit("alice", 1, i64::MAX, t0()),
            Err(SpoolError::InvalidDuration(_))
        ));
        assert!(matches!(
            sched.submit("alice", 1, MAX_DURATION_MINUTES + 1, t0()),
            Err(SpoolError::InvalidDuration(_))
        ));

        // Nothing was queued, so promotion has nothing to overflow on.
        sched.reconcile(t0());
        let snap = sched.snapshot(t0());
        assert!(snap.jobs.is_empty());

        // The boundary itself is accepted and promotes cleanly.
        let id = sched.submit("alice", 1, MAX_DURATION_MINUTES, t0()).unwrap();
        sched.reconcile(t0());
        assert_eq!(sched.job(id).unwrap().status, JobStatus::Active);
    }

    #[test]
    fn submit_rejects_unknown_printer() {
        let mut sched = Scheduler::new(&specs());
        assert!(matches!(
            sched.submit("alice", 99, 5, t0()),
            Err(SpoolError::PrinterNotFound(99))
        ));
    }

    #[test]
    fn submit_does_not_promote() {
        let mut sched = Scheduler::new(&specs());
        let id = sched.submit("alice", 1, 5, t0()).unwrap();
        assert_eq!(sched.job(id).unwrap().status, JobStatus::Queued);
        assert!(sched.job(id).unwrap().start_time.is_none());
    }

    #[test]
    fn job_ids_are_monotonic() {
        let mut sched = Scheduler::new(&specs());
        let a = sched.submit("alice", 1, 5, t0()).unwrap();
        let b = sched.submit("bob", 2, 5, t0()).unwrap();
        let c = sched.submit("alice", 1, 5, t0()).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn reconcile_promotes_queue_head() {
        let mut sched = Scheduler::new(&specs());
        let id = sched.submit("alice", 1, 5, t0()).unwrap();
        sched.reconcile(t0());
        let job = sched.job(id).unwrap();
        assert_eq!(job.status, JobStatus::Active);
        assert_eq!(job.start_time, Some(t0()));
        assert_eq!(job.end_time, Some(t0() + chrono::Duration::minutes(5)));
    }

    #[test]
    fn cancel_unknown_job_fails() {
        let mut sched = Scheduler::new(&specs());
        assert!(matches!(
            sched.cancel(42, "alice"),
            Err(SpoolError::JobNotFound(42))
        ));
    }

    #[test]
    fn cancel_checks_owner() {
        let mut sched = Scheduler::new(&specs());
        let id = sched.submit("alice", 1, 5, t0()).unwrap();
        assert!(matches!(
            sched.cancel(id, "mallory"),
            Err(SpoolError::NotJobOwner(_))
        ));
        // The failed cancel left the job untouched.
        assert_eq!(sched.job(id).unwrap().status, JobStatus::Queued);
    }

    #[test]
    fn cancel_queued_job_preserves_remaining_order() {
        let mut sched = Scheduler::new(&specs());
        let a = sched.submit("alice", 1, 5, t0()).unwrap();
        let b = sched.submit("bob", 1, 5, t0()).unwrap();
        let c = sched.submit("carol", 1, 5, t0()).unwrap();
        sched.cancel(b, "bob").unwrap();

        let snap = sched.snapshot(t0());
        assert_eq!(snap.printers[0].active, Some(a));
        assert_eq!(snap.printers[0].queue, vec![c]);
        assert_eq!(sched.job(b).unwrap().status, JobStatus::Cancelled);
    }

    #[test]
    fn cancel_terminal_job_is_idempotent() {
        let mut sched = Scheduler::new(&specs());
        let id = sched.submit("alice", 1, 1, t0()).unwrap();
        sched.reconcile(t0());
        sched.reconcile(t0() + chrono::Duration::minutes(1));
        assert_eq!(sched.job(id).unwrap().status, JobStatus::Completed);

        sched.cancel(id, "alice").unwrap();
        assert_eq!(sched.job(id).unwrap().status, JobStatus::Completed);
        sched.cancel(id, "alice").unwrap();
    }
}
