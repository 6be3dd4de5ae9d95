//! The halal marketplace's form wizards on top of `form_wizard`, plus the
//! plumbing the demo binary needs (configuration, logging, error hooks and a
//! simulated backend).

pub mod backend;
pub mod cli;
pub mod config;
pub mod demo;
pub mod errors;
pub mod forms;
pub mod logging;

pub use backend::SimulatedSubmission;
pub use config::Config;
pub use forms::FormKind;
