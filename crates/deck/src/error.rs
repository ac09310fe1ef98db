//! Coordinator errors

use surface::DeviceError;

use crate::module::ModuleError;

/// Why [`Coordinator::start`](crate::Coordinator::start) or
/// [`Coordinator::stop`](crate::Coordinator::stop) failed.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// The event source ended: disconnect or transport failure
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// A handler failed and the policy is to drop the connection
    #[error("module {module} failed to handle an event: {source}")]
    Handler {
        /// Module id
        module: String,
        /// What the handler returned
        source: ModuleError,
    },

    /// `start` called while already running
    #[error("coordinator already started")]
    AlreadyStarted,

    /// One or more modules failed to stop; every module was still stopped
    #[error("{} module(s) failed to stop", failures.len())]
    ModuleStop {
        /// `(module id, error)` in registration order
        failures: Vec<(String, ModuleError)>,
    },

    /// The render or listener task panicked or was aborted
    #[error("coordinator task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CoordinatorError {
    /// Whether the device went away, as opposed to a module or task fault.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Device(e) if e.is_fatal())
    }
}
