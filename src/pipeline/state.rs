//! Orchestrator run state

use parking_lot::Mutex;

/// Lifecycle of the verification pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Engines not initialized
    NotReady,
    /// Engines initialized, no run yet
    Ready,
    /// A run is in flight
    Running,
    /// Last run produced a result
    Completed,
    /// Last run aborted
    Failed,
}

impl PipelineState {
    /// Engines are initialized
    pub fn is_initialized(&self) -> bool {
        !matches!(self, PipelineState::NotReady)
    }
}

/// Marks the pipeline as Running for its lifetime. Unless finished with an
/// explicit outcome, dropping it records Failed, which covers error returns
/// and run futures that are dropped mid-flight.
pub(crate) struct RunGuard<'a> {
    state: &'a Mutex<PipelineState>,
    outcome: PipelineState,
}

impl<'a> RunGuard<'a> {
    pub(crate) fn new(state: &'a Mutex<PipelineState>) -> Self {
        Self {
            state,
            outcome: PipelineState::Failed,
        }
    }

    pub(crate) fn complete(mut self) {
        self.outcome = PipelineState::Completed;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock() = self.outcome;
    }
}
