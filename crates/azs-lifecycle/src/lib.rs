//! Resource group provisioning lifecycle.
//!
//! [`LifecycleOrchestrator`] creates, tags, lists and deletes resource groups through any
//! [`azs_core::provisioning::ResourceGroupProvisioner`], and always submits deletion of
//! the first group it tried to create.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod orchestrator;
pub mod session;

pub use orchestrator::{CleanupOutcome, LifecycleOrchestrator, RunReport, Step, StepError};
pub use session::ProvisioningSession;

/// Convenient result alias that reuses the shared error type.
pub type Result<T> = azs_core::Result<T>;
