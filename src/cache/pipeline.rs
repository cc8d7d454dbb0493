//! Rebuild state machine.
//!
//! ```text
//!            trigger               outcome: ready         applied
//!   Idle ──(Triggered)──> InProgress ─────────────> Applying ───> Idle
//!                             │  outcome: unchanged / failed        ^
//!                             └─────────────────────────────────────┘
//!   any ──stop──> Stopped (terminal)
//! ```
//!
//! A trigger while a cycle is running only sets `pending`; [`settle`]
//! starts the follow-up cycle once the current one is back at `Idle`.
//!
//! [`settle`]: RebuildPipeline::settle

use std::fmt;

/// Identifies one dispatched worker so stale outcomes can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    InProgress(Ticket),
    Applying(Ticket),
    Stopped,
}

/// Result of [`RebuildPipeline::trigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerResult {
    /// Start a worker for this ticket.
    Dispatch(Ticket),
    /// A cycle is running; one more will follow it.
    Queued,
    /// The pipeline is stopped.
    Ignored,
}

#[derive(Debug)]
pub struct RebuildPipeline {
    phase: Phase,
    pending: bool,
    last_ticket: u64,
}

impl RebuildPipeline {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            pending: false,
            last_ticket: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_stopped(&self) -> bool {
        self.phase == Phase::Stopped
    }

    pub fn trigger(&mut self) -> TriggerResult {
        match self.phase {
            Phase::Idle => TriggerResult::Dispatch(self.start()),
            Phase::InProgress(_) | Phase::Applying(_) => {
                self.pending = true;
                TriggerResult::Queued
            }
            Phase::Stopped => TriggerResult::Ignored,
        }
    }

    /// Accept the outcome of `ticket`.
    ///
    /// Moves to `Applying` when the worker produced an atlas, to `Idle`
    /// otherwise. Returns false for anything but the in-flight ticket; such
    /// outcomes must be discarded.
    pub fn complete(&mut self, ticket: Ticket, ready: bool) -> bool {
        if self.phase != Phase::InProgress(ticket) {
            return false;
        }
        self.phase = if ready {
            Phase::Applying(ticket)
        } else {
            Phase::Idle
        };
        true
    }

    /// The swap for the current cycle is done.
    pub fn applied(&mut self) {
        if let Phase::Applying(_) = self.phase {
            self.phase = Phase::Idle;
        }
    }

    /// Start the queued follow-up cycle, if any, once back at `Idle`.
    pub fn settle(&mut self) -> Option<Ticket> {
        if self.phase != Phase::Idle || !self.pending {
            return None;
        }
        self.pending = false;
        Some(self.start())
    }

    pub fn stop(&mut self) {
        self.phase = Phase::Stopped;
        self.pending = false;
    }

    fn start(&mut self) -> Ticket {
        self.last_ticket += 1;
        let ticket = Ticket(self.last_ticket);
        self.phase = Phase::InProgress(ticket);
        ticket
    }
}

impl Default for RebuildPipeline {
    fn default() -> Self {
        Self::new()
    }
}
