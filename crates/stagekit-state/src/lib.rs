//! Stagekit State - server copy and draft copy of the assembly, kept in sync

pub mod error;
pub mod state;

pub use error::{StateError, StateResult};
pub use state::{AssemblyState, StateEvent, SubmitOutcome, TreeCopy};
