use crate::config::{ContainerConfig, DEFAULT_MAX_DEPTH};
use crate::container::Container;
use crate::error::{Error, Result};
use crate::loader::{FsModuleLoader, ModuleLoader, PackageLoader, Packages};
use std::sync::Arc;

/// A builder for creating a [`Container`] with custom collaborators.
///
/// ```
/// use fibre_di::{Container, Packages};
/// use std::sync::Arc;
///
/// let packages = Arc::new(Packages::new());
/// packages.register("semver", || Ok(String::from("1.0.0")));
///
/// let container = Container::builder()
///   .package_loader(Arc::clone(&packages))
///   .max_depth(16)
///   .build()
///   .unwrap();
///
/// assert_eq!(*container.resolve_as::<String>("semver").unwrap(), "1.0.0");
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
  modules: Option<Arc<dyn ModuleLoader>>,
  packages: Option<Arc<dyn PackageLoader>>,
  max_depth: Option<usize>,
  config: Option<ContainerConfig>,
}

impl ContainerBuilder {
  /// Sets the loader used for names under an autoload root.
  /// Defaults to [`FsModuleLoader::new`].
  pub fn module_loader(mut self, loader: impl ModuleLoader) -> Self {
    self.modules = Some(Arc::new(loader));
    self
  }

  /// Sets the loader for names that are neither bound nor autoloaded.
  /// Defaults to an empty [`Packages`] table.
  pub fn package_loader(mut self, loader: impl PackageLoader) -> Self {
    self.packages = Some(Arc::new(loader));
    self
  }

  /// Bounds nested resolutions. Takes precedence over the configuration's value.
  pub fn max_depth(mut self, depth: usize) -> Self {
    self.max_depth = Some(depth);
    self
  }

  /// Registers the configuration's aliases and autoload roots on build.
  pub fn config(mut self, config: ContainerConfig) -> Self {
    self.config = Some(config);
    self
  }

  pub fn build(self) -> Result<Container> {
    let max_depth = self
      .max_depth
      .or(self.config.as_ref().map(|config| config.max_depth))
      .unwrap_or(DEFAULT_MAX_DEPTH);
    if max_depth == 0 {
      return Err(Error::InvalidArgument(
        "max_depth must be at least 1".to_owned(),
      ));
    }

    let container = Container::from_parts(
      self
        .modules
        .unwrap_or_else(|| Arc::new(FsModuleLoader::new())),
      self.packages.unwrap_or_else(|| Arc::new(Packages::new())),
      max_depth,
    );

    if let Some(config) = &self.config {
      container.apply_config(&ContainerConfig {
        max_depth,
        ..config.clone()
      })?;
    }
    Ok(container)
  }
}
