use thiserror::Error;

/// The main error type for the `fibre_di` library.
#[derive(Debug, Error)]
pub enum Error {
  /// A registration call was made with a malformed namespace or key.
  #[error("Invalid argument: {0}")]
  InvalidArgument(String),

  /// A manager definition does not expose the `extend` capability.
  #[error("Manager definition '{definition}' registered for '{namespace}' must implement `extend`")]
  IncompleteImplementation {
    namespace: String,
    definition: String,
  },

  /// A `make_func` target was not of the form `<namespace>.<method>`.
  #[error("Unable to make '{0}': expected <namespace>.<method>")]
  InvalidFormat(String),

  #[error("Cannot find module '{0}'")]
  ModuleNotFound(String),

  #[error("Method '{method}' is missing on '{namespace}'")]
  MethodNotFound { namespace: String, method: String },

  #[error("Maximum resolution depth of {depth} exceeded: {chain}")]
  MaxDepthExceeded { depth: usize, chain: String },

  #[error("Circular dependency detected: {chain}")]
  CircularDependency { chain: String },

  #[error("'{namespace}' did not resolve to a value of type {expected}")]
  TypeMismatch {
    namespace: String,
    expected: &'static str,
  },

  /// A definition's constructor refused to build an instance.
  #[error("Failed to construct '{definition}': {reason}")]
  Construction { definition: String, reason: String },

  #[error("Failed to parse module '{path}': {reason}")]
  ModuleParse { path: String, reason: String },

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(String),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  pub fn construction(definition: impl Into<String>, reason: impl Into<String>) -> Self {
    Error::Construction {
      definition: definition.into(),
      reason: reason.into(),
    }
  }
}

/// A specialized `Result` type for `fibre_di` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
