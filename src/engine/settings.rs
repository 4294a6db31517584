use std::num::NonZeroUsize;

/// What a worker failure does to the rest of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Failed workers stop; the others finish.
    #[default]
    BestEffort,
    /// The first failed worker stops the whole run.
    FailFast,
}

/// Where worker tasks run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConcurrencyStrategy {
    /// Tasks on the caller's tokio runtime.
    #[default]
    SharedRuntime,
    /// A multi-thread runtime built for the run on its own OS thread.
    DedicatedRuntime { worker_threads: NonZeroUsize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineSettings {
    pub policy: CompletionPolicy,
    pub strategy: ConcurrencyStrategy,
    /// On cancellation, let an in-flight request finish and emit its result
    /// instead of dropping it.
    pub wait_in_flight: bool,
}
