//! Error taxonomy for the analysis core.
//!
//! Anything that can be localized to one record or one module is isolated
//! and reported through findings; anything that breaks deterministic
//! ordering (cycles, unknown dependency names) aborts the run before any
//! event is dispatched.

use thiserror::Error;

/// Registration/resolve-time failures. These are fatal: the run never
/// starts with an unresolved module graph.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No topological order exists for the declared dependencies.
    #[error("dependency cycle involving module `{0}`")]
    DependencyCycle(String),

    /// A module named a dependency that was never registered.
    #[error("module `{module}` depends on unregistered module `{dependency}`")]
    UnknownModule { module: String, dependency: String },

    /// Two modules were registered under the same name.
    #[error("module `{0}` registered twice")]
    DuplicateModule(String),
}

/// Failures of a whole analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The cancellation flag was raised mid-dispatch. No partial findings
    /// survive a cancelled run.
    #[error("analysis run cancelled")]
    Cancelled,
}

/// An internal fault inside one analysis module.
///
/// Caught at the bus boundary and converted into a single `module-failed`
/// finding; the rest of the run continues.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ModuleFault {
    message: String,
}

impl ModuleFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
