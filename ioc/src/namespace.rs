//! Namespace classification and the string conventions around namespaces.

use crate::error::{Error, Result};
use crate::registry::Registry;
use std::path::PathBuf;
use tracing::debug;

/// Where a requested name leads after alias substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolved {
  /// A registered binding and/or manager.
  Direct(String),
  /// A file below an autoload root, loaded on demand.
  Autoloaded { namespace: String, path: PathBuf },
  /// Neither; handed to the package loader.
  External(String),
}

impl Resolved {
  pub(crate) fn namespace(&self) -> &str {
    match self {
      Resolved::Direct(namespace) => namespace,
      Resolved::Autoloaded { namespace, .. } => namespace,
      Resolved::External(name) => name,
    }
  }
}

/// Classifies `name`, first match wins: alias (one hop), direct, autoloaded, external.
pub(crate) fn classify(registry: &Registry, name: &str) -> Resolved {
  let namespace = match registry.alias_target(name) {
    Some(target) => {
      debug!(alias = name, target = %target, "following alias");
      target
    }
    None => name.to_owned(),
  };

  if registry.is_direct(&namespace) {
    return Resolved::Direct(namespace);
  }

  if let Some((prefix, directory)) = registry.autoload_root(&namespace) {
    let rest = &namespace[prefix.len()..];
    // Relative segments could escape the autoloaded directory.
    if rest.split('/').any(|segment| matches!(segment, "." | "..")) {
      debug!(namespace = %namespace, "refusing relative path segments below autoload root");
      return Resolved::External(namespace);
    }
    let path = rest
      .split('/')
      .filter(|segment| !segment.is_empty())
      .fold(directory, |path, segment| path.join(segment));
    return Resolved::Autoloaded { namespace, path };
  }

  Resolved::External(namespace)
}

/// Maps a constructor parameter identifier onto a namespace: `App_Bar` is `App/Bar`.
pub(crate) fn parameter_to_namespace(parameter: &str) -> String {
  parameter.replace('_', "/")
}

/// Splits `Ns/Thing.method` into its namespace and method parts.
pub(crate) fn split_method_target(target: &str) -> Result<(&str, &str)> {
  let mut parts = target.split('.');
  match (parts.next(), parts.next(), parts.next()) {
    (Some(namespace), Some(method), None) if !namespace.is_empty() && !method.is_empty() => {
      Ok((namespace, method))
    }
    _ => Err(Error::InvalidFormat(target.to_owned())),
  }
}

/// Rejects names that could never be resolved or addressed by `make_func`.
pub(crate) fn validate(namespace: &str) -> Result<()> {
  if namespace.trim().is_empty() {
    return Err(Error::InvalidArgument(
      "namespace must be a non-empty string".to_owned(),
    ));
  }
  if namespace.contains('.') {
    return Err(Error::InvalidArgument(format!(
      "namespace '{}' must not contain '.'",
      namespace
    )));
  }
  Ok(())
}
