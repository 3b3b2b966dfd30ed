//! Front ends of the requeue engine.
//!
//! Each adapter turns its parameter source into a [`RunConfig`] and turns the
//! finished [`RunReport`] into its caller's signalling convention: an exit
//! status for operators, a task outcome for the scheduler.
//!
//! [`RunConfig`]: crate::engine::RunConfig
//! [`RunReport`]: crate::engine::RunReport

pub mod on_demand;
pub mod scheduled;
pub mod settings;

pub use on_demand::{ResendRequest, exit_code, resend};
pub use scheduled::{ResendJob, ResendTask, TaskError, TaskOutcome, task_outcome};
pub use settings::ResendSettings;
