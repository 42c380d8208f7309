//! Collaborators that produce values for names the registry does not bind.
//!
//! Autoloaded paths are handed to a [`ModuleLoader`], anything else falls
//! through to a [`PackageLoader`].

use crate::core::Instance;
use crate::error::{Error, Result};
use dashmap::DashMap;
use std::any::Any;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Loads the module stored at a filesystem path.
pub trait ModuleLoader: Send + Sync + 'static {
  /// Fails with [`Error::ModuleNotFound`] when nothing exists at `path`.
  fn load_module(&self, path: &Path) -> Result<Instance>;
}

/// Resolves names that are neither registered nor autoloaded.
pub trait PackageLoader: Send + Sync + 'static {
  /// Fails with [`Error::ModuleNotFound`] when `name` is unknown.
  fn load_package(&self, name: &str) -> Result<Instance>;
}

impl<T: ModuleLoader + ?Sized> ModuleLoader for Arc<T> {
  fn load_module(&self, path: &Path) -> Result<Instance> {
    (**self).load_module(path)
  }
}

impl<T: PackageLoader + ?Sized> PackageLoader for Arc<T> {
  fn load_package(&self, name: &str) -> Result<Instance> {
    (**self).load_package(name)
  }
}

type ParserFn = dyn Fn(&Path, &str) -> Result<Instance> + Send + Sync;

fn parse_error(path: &Path, reason: impl ToString) -> Error {
  Error::ModuleParse {
    path: path.display().to_string(),
    reason: reason.to_string(),
  }
}

/// A [`ModuleLoader`] reading files from disk.
///
/// Lookups are extension-agnostic: `dir/a/b` matches the file `dir/a/b` itself,
/// or else `dir/a/b.<ext>` for each registered extension in registration order.
/// The parser registered for the matched extension turns the file contents
/// into a value. Out of the box:
///
/// | Extension | Value |
/// |---|---|
/// | `json` | `serde_json::Value` |
/// | `yaml`, `yml` | `serde_yaml::Value` |
/// | `txt` | `String` |
pub struct FsModuleLoader {
  parsers: Vec<(String, Arc<ParserFn>)>,
}

impl Default for FsModuleLoader {
  fn default() -> Self {
    Self::empty()
      .with_parser("json", |path, source| {
        serde_json::from_str::<serde_json::Value>(source).map_err(|e| parse_error(path, e))
      })
      .with_parser("yaml", |path, source| {
        serde_yaml::from_str::<serde_yaml::Value>(source).map_err(|e| parse_error(path, e))
      })
      .with_parser("yml", |path, source| {
        serde_yaml::from_str::<serde_yaml::Value>(source).map_err(|e| parse_error(path, e))
      })
      .with_parser("txt", |_, source| Ok(source.to_owned()))
  }
}

impl FsModuleLoader {
  /// A loader with the built-in parsers.
  pub fn new() -> Self {
    Self::default()
  }

  /// A loader with no parsers at all.
  pub fn empty() -> Self {
    Self {
      parsers: Vec::new(),
    }
  }

  /// Registers `parser` for files ending in `.extension`, replacing any
  /// parser previously registered for it.
  pub fn with_parser<T, F>(self, extension: &str, parser: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&Path, &str) -> Result<T> + Send + Sync + 'static,
  {
    self.with_erased_parser(extension, move |path, source| {
      parser(path, source).map(|value| Arc::new(value) as Instance)
    })
  }

  /// Like [`with_parser`](FsModuleLoader::with_parser), for parsers that already produce an [`Instance`].
  pub fn with_erased_parser<F>(mut self, extension: &str, parser: F) -> Self
  where
    F: Fn(&Path, &str) -> Result<Instance> + Send + Sync + 'static,
  {
    let extension = extension.trim_start_matches('.').to_owned();
    let parser: Arc<ParserFn> = Arc::new(parser);
    match self.parsers.iter().position(|(ext, _)| *ext == extension) {
      Some(index) => self.parsers[index].1 = parser,
      None => self.parsers.push((extension, parser)),
    }
    self
  }

  fn parser_for(&self, extension: &str) -> Option<Arc<ParserFn>> {
    self
      .parsers
      .iter()
      .find(|(ext, _)| ext == extension)
      .map(|(_, parser)| Arc::clone(parser))
  }

  /// Finds the file backing `path` and the parser able to read it.
  fn locate(&self, path: &Path) -> Result<(PathBuf, Arc<ParserFn>)> {
    if path.is_file() {
      let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
      let parser = self
        .parser_for(extension)
        .ok_or_else(|| parse_error(path, format!("no parser registered for extension '{}'", extension)))?;
      return Ok((path.to_path_buf(), parser));
    }

    self
      .parsers
      .iter()
      .map(|(extension, parser)| {
        let mut candidate = OsString::from(path.as_os_str());
        candidate.push(".");
        candidate.push(extension);
        (PathBuf::from(candidate), parser)
      })
      .find(|(candidate, _)| candidate.is_file())
      .map(|(candidate, parser)| (candidate, Arc::clone(parser)))
      .ok_or_else(|| Error::ModuleNotFound(path.display().to_string()))
  }
}

impl ModuleLoader for FsModuleLoader {
  fn load_module(&self, path: &Path) -> Result<Instance> {
    let (file, parser) = self.locate(path)?;
    debug!(path = %file.display(), "loading module");
    let source = fs::read_to_string(&file)?;
    parser(&file, &source)
  }
}

type PackageFn = dyn Fn() -> Result<Instance> + Send + Sync;

/// A [`PackageLoader`] serving a table of named package factories.
///
/// Each lookup calls the factory again; packages are not cached.
#[derive(Default)]
pub struct Packages {
  packages: DashMap<String, Arc<PackageFn>>,
}

impl Packages {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register<T, F>(&self, name: &str, factory: F)
  where
    T: Any + Send + Sync,
    F: Fn() -> Result<T> + Send + Sync + 'static,
  {
    let factory: Arc<PackageFn> = Arc::new(move || factory().map(|value| Arc::new(value) as Instance));
    self.packages.insert(name.to_owned(), factory);
  }

  pub fn contains(&self, name: &str) -> bool {
    self.packages.contains_key(name)
  }
}

impl PackageLoader for Packages {
  fn load_package(&self, name: &str) -> Result<Instance> {
    let factory = self
      .packages
      .get(name)
      .map(|f| Arc::clone(f.value()))
      .ok_or_else(|| Error::ModuleNotFound(name.to_owned()))?;
    factory()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;

  #[test]
  fn locates_files_regardless_of_extension() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("settings.json"), r#"{"port": 8080}"#).unwrap();
    fs::write(dir.path().join("motd.txt"), "hello").unwrap();

    let loader = FsModuleLoader::new();

    let settings = loader.load_module(&dir.path().join("settings")).unwrap();
    let settings = settings.downcast_ref::<serde_json::Value>().unwrap();
    assert_eq!(settings["port"], 8080);

    // A full file name works as well.
    let motd = loader.load_module(&dir.path().join("motd.txt")).unwrap();
    assert_eq!(motd.downcast_ref::<String>().unwrap(), "hello");
  }

  #[test]
  fn missing_files_are_module_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = FsModuleLoader::new()
      .load_module(&dir.path().join("nope"))
      .unwrap_err();
    assert!(matches!(err, Error::ModuleNotFound(_)));
  }

  #[test]
  fn malformed_files_are_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    let err = FsModuleLoader::new()
      .load_module(&dir.path().join("broken"))
      .unwrap_err();
    assert!(matches!(err, Error::ModuleParse { .. }));
  }

  #[test]
  fn custom_parsers_replace_builtins() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("count.txt"), "  42 ").unwrap();

    let loader = FsModuleLoader::new().with_parser("txt", |path, source| {
      source
        .trim()
        .parse::<u32>()
        .map_err(|e| parse_error(path, e))
    });

    let count = loader.load_module(&dir.path().join("count")).unwrap();
    assert_eq!(*count.downcast_ref::<u32>().unwrap(), 42);
  }

  #[test]
  fn packages_serve_registered_names_only() {
    let packages = Packages::new();
    packages.register("semver", || Ok(String::from("1.0.0")));

    let value = packages.load_package("semver").unwrap();
    assert_eq!(value.downcast_ref::<String>().unwrap(), "1.0.0");
    assert!(matches!(
      packages.load_package("leftpad"),
      Err(Error::ModuleNotFound(_))
    ));
  }
}
