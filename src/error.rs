use thiserror::Error;

use crate::scheduler::{JobId, PrinterId};

#[derive(Error, Debug)]
pub enum SpoolError {
    #[error("Duration must be between 1 and 525600 minutes, got {0}")]
    InvalidDuration(i64),

    #[error("Printer not found: {0}")]
    PrinterNotFound(PrinterId),

    #[error("Print job not found: {0}")]
    JobNotFound(JobId),

    #[error("Print job {0} is not owned by the requesting user")]
    NotJobOwner(JobId),
}

pub type Result<T> = std::result::Result<T, SpoolError>;
