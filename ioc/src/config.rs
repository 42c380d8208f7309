//! Declarative container configuration.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default bound on nested resolutions before `MaxDepthExceeded` is reported.
pub const DEFAULT_MAX_DEPTH: usize = 64;

fn default_max_depth() -> usize {
  DEFAULT_MAX_DEPTH
}

/// Settings that can be applied to a [`Container`](crate::Container) up front.
///
/// ```yaml
/// max_depth: 32
/// aliases:
///   Db: Fibre/Database
/// autoload:
///   App: ./app
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
  #[serde(default = "default_max_depth")]
  pub max_depth: usize,
  /// Alias name to target namespace.
  #[serde(default)]
  pub aliases: BTreeMap<String, String>,
  /// Namespace prefix to directory.
  #[serde(default)]
  pub autoload: BTreeMap<String, PathBuf>,
}

impl Default for ContainerConfig {
  fn default() -> Self {
    Self {
      max_depth: DEFAULT_MAX_DEPTH,
      aliases: BTreeMap::new(),
      autoload: BTreeMap::new(),
    }
  }
}

impl ContainerConfig {
  pub fn from_yaml_str(source: &str) -> Result<Self> {
    serde_yaml::from_str(source).map_err(|e| Error::ConfigParse(e.to_string()))
  }

  pub fn from_json_str(source: &str) -> Result<Self> {
    serde_json::from_str(source).map_err(|e| Error::ConfigParse(e.to_string()))
  }

  /// Reads a `.yaml`/`.yml` or `.json` file.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
      Some("yaml") | Some("yml") => Self::from_yaml_str(&source),
      Some("json") => Self::from_json_str(&source),
      _ => Err(Error::ConfigParse(format!(
        "unsupported configuration format: {}",
        path.display()
      ))),
    }
  }

  pub(crate) fn validate(&self) -> Result<()> {
    if self.max_depth == 0 {
      return Err(Error::InvalidArgument(
        "max_depth must be at least 1".to_owned(),
      ));
    }
    Ok(())
  }
}
