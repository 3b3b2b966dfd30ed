//! The batch requeue engine.
//!
//! [`RunController`] composes the Filter Builder, [`Paginator`], [`Mover`]
//! and [`RuntimeGovernor`] into one sequential scan/move/report loop. Both
//! the on-demand and the scheduled front ends drive this same controller.

pub mod config;
pub mod controller;
pub mod governor;
pub mod mover;
pub mod paginator;

pub use config::{DEFAULT_BATCH_SIZE, RunConfig};
pub use controller::{BatchOutcome, BatchRecord, RunController, RunCounters, RunReport, RunStatus};
pub use governor::{Clock, ManualClock, RuntimeGovernor, SystemClock};
pub use mover::{MoveOutcome, Mover};
pub use paginator::Paginator;
