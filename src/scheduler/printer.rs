use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::scheduler::job::{JobId, PrinterId};

/// Static printer identity. The fleet is fixed for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Printer {
    pub id: PrinterId,
    pub name: String,
}

/// Per-printer mutable state: the single active slot plus the FIFO backlog.
/// Both hold job ids; the jobs themselves live in the scheduler's job store.
#[derive(Debug)]
pub struct PrinterState {
    pub printer: Printer,
    pub active: Option<JobId>,
    pub queue: VecDeque<JobId>,
}

impl PrinterState {
    pub fn new(printer: Printer) -> Self {
        Self {
            printer,
            active: None,
            queue: VecDeque::new(),
        }
    }
}
