//! Runs a scenario with one worker task per virtual user.
mod orchestrator;
mod settings;
mod worker;


pub use orchestrator::{Orchestrator, RunCanceller, RunHandle, RunReport};
pub use settings::{CompletionPolicy, ConcurrencyStrategy, EngineSettings};
