//! Checkout workflow state machine.

use serde::{Deserialize, Serialize};

/// The state of one order-creation attempt.
///
/// State transitions:
/// ```text
/// Init ──► ValidatingInput ──► ResolvingStock ──► ComputingTotals ──► Persisting
///                                                                        │
///                                        Done ◄── NotifyBestEffort ◄─────┘
///
/// any non-terminal state ──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WorkflowState {
    /// Attempt created, nothing checked yet.
    #[default]
    Init,

    /// Required checkout fields are being checked.
    ValidatingInput,

    /// Cart lines are matched to variants and stock is taken.
    ResolvingStock,

    /// Subtotal, discount and total are computed.
    ComputingTotals,

    /// Order code is generated and the order written and committed.
    Persisting,

    /// Confirmation is being sent. Failures here do not fail the order.
    NotifyBestEffort,

    /// The order was created (terminal state).
    Done,

    /// The attempt failed (terminal state).
    Failed,
}

impl WorkflowState {
    /// Returns the state that follows on success, or `None` for terminal
    /// states.
    pub fn next(&self) -> Option<WorkflowState> {
        match self {
            WorkflowState::Init => Some(WorkflowState::ValidatingInput),
            WorkflowState::ValidatingInput => Some(WorkflowState::ResolvingStock),
            WorkflowState::ResolvingStock => Some(WorkflowState::ComputingTotals),
            WorkflowState::ComputingTotals => Some(WorkflowState::Persisting),
            WorkflowState::Persisting => Some(WorkflowState::NotifyBestEffort),
            WorkflowState::NotifyBestEffort => Some(WorkflowState::Done),
            WorkflowState::Done | WorkflowState::Failed => None,
        }
    }

    /// Returns true if the workflow may move from this state to `target`.
    pub fn can_transition_to(&self, target: WorkflowState) -> bool {
        if self.is_terminal() {
            return false;
        }
        target == WorkflowState::Failed || self.next() == Some(target)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Done | WorkflowState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Init => "Init",
            WorkflowState::ValidatingInput => "ValidatingInput",
            WorkflowState::ResolvingStock => "ResolvingStock",
            WorkflowState::ComputingTotals => "ComputingTotals",
            WorkflowState::Persisting => "Persisting",
            WorkflowState::NotifyBestEffort => "NotifyBestEffort",
            WorkflowState::Done => "Done",
            WorkflowState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks the current state of an attempt and logs every move.
#[derive(Debug, Default)]
pub(crate) struct Progress {
    state: WorkflowState,
}

impl Progress {
    pub(crate) fn state(&self) -> WorkflowState {
        self.state
    }

    /// Moves to the next state on the happy path.
    pub(crate) fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            tracing::debug!(from = %self.state, to = %next, "checkout state");
            self.state = next;
        }
    }

    /// Moves to `Failed`, returning the state the failure happened in.
    pub(crate) fn fail(&mut self) -> WorkflowState {
        let failed_in = self.state;
        if self.state.can_transition_to(WorkflowState::Failed) {
            self.state = WorkflowState::Failed;
        }
        failed_in
    }
}
