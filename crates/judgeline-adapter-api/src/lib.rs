//! Adapter contracts for the judgeline task runner.
//!
//! An adapter is a pluggable grading or provisioning strategy. The engine hands
//! it a task object that exposes inputs and reporting callbacks; the adapter
//! never talks to the control server directly.
//!
//! - [`JudgeAdapter`] grades one solution through a [`JudgeTask`].
//! - [`InstanceAdapter`] starts or destroys a long-lived environment through an
//!   [`InstanceTask`].
//!
//! Wire types ([`ProblemConfig`], [`SolutionInfo`], [`SolutionDetails`]) live here
//! as well so adapters and the engine agree on one JSON shape.

pub mod adapter;
pub mod error;
pub mod problem;
pub mod solution;
pub mod status;
pub mod task;

pub use adapter::{InstanceAdapter, JudgeAdapter};
pub use error::JudgeError;
pub use problem::{AdapterConfig, AdapterSection, ProblemConfig, SolutionConstraints};
pub use solution::{DetailsJob, DetailsTest, SolutionDetails, SolutionInfo, DETAILS_VERSION};
pub use task::{InstanceAction, InstanceTask, JudgeTask};
