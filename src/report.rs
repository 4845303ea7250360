//! Aggregate outcome reporting for multi-step operations.
//!
//! Orchestrating commands (assign, unassign, merge, split, cascade delete)
//! collect sub-operation outcomes here and present one consolidated notice
//! instead of surfacing every internal failure separately.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpReport {
    pub changed: usize,
    pub failures: Vec<String>,
}

impl OpReport {
    pub fn new() -> Self {
        OpReport::default()
    }

    pub fn note_change(&mut self) {
        self.changed += 1;
    }

    pub fn fail<S: Into<String>>(&mut self, msg: S) {
        let msg = msg.into();
        tracing::warn!("{msg}");
        self.failures.push(msg);
    }

    pub fn absorb(&mut self, other: OpReport) {
        self.changed += other.changed;
        self.failures.extend(other.failures);
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Display for OpReport {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} change(s) applied", self.changed)?;
        if !self.failures.is_empty() {
            write!(f, "; {} failure(s):", self.failures.len())?;
            for failure in &self.failures {
                write!(f, "\n- {failure}")?;
            }
        }
        Ok(())
    }
}
