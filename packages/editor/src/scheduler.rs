//! # Update Scheduler
//!
//! Decides when a pass runs. Edits mark the document dirty and stall
//! updates until a quiet period has passed; a periodic tick then starts the
//! pass. A burst of edits therefore costs one pass, not one per keystroke.
//!
//! ```text
//! idle ──edit──▶ pending ──quiet period──▶ pending-unstalled ──tick──▶ running ──▶ idle
//!                  ▲  │                          │
//!                  └──┘ edit re-arms             └── edit ──▶ pending
//! ```
//!
//! The scheduler is plain state; the session feeds it edits, deadlines and
//! ticks with explicit instants.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    /// Dirty, waiting for the quiet period
    Pending,
    /// Dirty and quiet; the next tick runs a pass
    PendingUnstalled,
    Running,
}

#[derive(Debug, Clone)]
pub struct UpdateScheduler {
    should_update: bool,
    stall_update: bool,
    running: bool,
    deadline: Option<Instant>,
    debounce: Duration,
}

impl UpdateScheduler {
    /// A new scheduler is dirty so the first tick renders the document
    pub fn new(debounce: Duration) -> Self {
        Self {
            should_update: true,
            stall_update: false,
            running: false,
            deadline: None,
            debounce,
        }
    }

    pub fn state(&self) -> SchedulerState {
        match (self.running, self.should_update, self.stall_update) {
            (true, _, _) => SchedulerState::Running,
            (false, true, true) => SchedulerState::Pending,
            (false, true, false) => SchedulerState::PendingUnstalled,
            (false, false, _) => SchedulerState::Idle,
        }
    }

    /// When the current quiet period ends, if one is running
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Record an edit at `now`, restarting the quiet period
    pub fn on_edit(&mut self, now: Instant) {
        self.should_update = true;
        self.stall_update = true;
        self.deadline = Some(now + self.debounce);
    }

    /// Lift the stall once the deadline has passed. True when it was lifted.
    pub fn on_deadline(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.stall_update = false;
                true
            }
            _ => false,
        }
    }

    /// Periodic tick; true when a pass should run now.
    /// The dirty flag is cleared before the pass so edits made while it
    /// runs schedule another one.
    pub fn on_tick(&mut self) -> bool {
        if self.running || !self.should_update || self.stall_update {
            return false;
        }
        self.should_update = false;
        self.running = true;
        true
    }

    pub fn finish_pass(&mut self) {
        self.running = false;
    }
}
