//! Unified runtime error type: one small enum, every fatal variant carries
//! the offending controller's type name so startup failures are
//! attributable without a debugger.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConductorError {
    /// A controller's `after(..)` constraint names the controller itself.
    #[error("controller '{controller}' requested the same priority; the after(..) target must differ")]
    SelfPriority { controller: &'static str },

    /// An `after(..)` constraint names a type that is not in the catalogue.
    #[error("ordering target '{target}' wasn't found for controller '{controller}'")]
    OrderTargetMissing {
        controller: &'static str,
        target: &'static str,
    },

    /// Two controllers each request to be constructed after the other.
    #[error("controllers '{first}' and '{second}' each requested to run after the other")]
    OrderCycle {
        first: &'static str,
        second: &'static str,
    },

    /// A controller's constructor requires a capability the controller
    /// itself provides.
    #[error("controller '{controller}' depends on itself via constructor")]
    SelfDependency { controller: &'static str },

    /// Two deferred controllers require each other's capabilities, so
    /// neither could ever construct first.
    #[error("controller '{controller}' has cross dependencies with '{other}'")]
    CrossDependency {
        controller: &'static str,
        other: &'static str,
    },

    /// A constructor parameter could not be resolved.
    #[error("dependency '{dependency}' wasn't found for the constructor of '{controller}'")]
    DependencyNotFound {
        controller: &'static str,
        dependency: &'static str,
    },

    /// An injected field could not be resolved.
    #[error("dependency '{dependency}' wasn't found for field '{field}' of '{controller}'")]
    FieldDependencyNotFound {
        controller: &'static str,
        field: &'static str,
        dependency: &'static str,
    },

    /// Registry lookup miss. Non-fatal: the caller decides whether the
    /// absence is acceptable.
    #[error("controller of type '{capability}' wasn't found")]
    NotFound { capability: &'static str },

    /// Direct creation was requested for a type with no registration.
    #[error("unknown controller type '{type_name}' for direct creation")]
    UnknownController { type_name: &'static str },

    /// The init pass stopped at the named controller.
    #[error("init failed at '{controller}'")]
    Init {
        controller: &'static str,
        #[source]
        source: Box<ConductorError>,
    },

    /// The current tick pass stopped at the named controller.
    #[error("tick loop failed at '{controller}'")]
    Tick {
        controller: &'static str,
        #[source]
        source: Box<ConductorError>,
    },

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// A controller-raised hook failure.
    #[error("{0}")]
    Failure(String),
}

impl ConductorError {
    /// Convenience constructor for controller hook failures.
    pub fn failure(message: impl Into<String>) -> Self {
        ConductorError::Failure(message.into())
    }
}

pub type Result<T = ()> = std::result::Result<T, ConductorError>;
