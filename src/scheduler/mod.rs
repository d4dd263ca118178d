pub mod engine;
pub mod job;
pub mod printer;

pub use engine::{PrinterSnapshot, Scheduler, SchedulerSnapshot};
pub use job::{Job, JobId, JobStatus, PrinterId};
pub use printer::{Printer, PrinterState};
