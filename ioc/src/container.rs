//! The main `Container` struct and its associated methods.

use crate::builder::ContainerBuilder;
use crate::config::{ContainerConfig, DEFAULT_MAX_DEPTH};
use crate::core::{FactoryFn, Instance, Provider, ResolutionGuard};
use crate::definition::{self, Args, BoundMethod, Definition, Object, Target};
use crate::error::{Error, Result};
use crate::hooks::{self, Hook};
use crate::loader::{FsModuleLoader, ModuleLoader, PackageLoader, Packages};
use crate::namespace::{self, Resolved};
use crate::registry::{Extension, ExtensionInfo, ProviderInfo, Registry};
use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

static NEXT_CONTAINER_ID: AtomicUsize = AtomicUsize::new(0);

/// The Inversion of Control (IoC) container.
///
/// This struct maps namespaces to factories, singletons, managers and
/// autoloaded directories, and resolves them on demand. It is thread-safe
/// and allows registration at any point during the application's lifecycle.
pub struct Container {
  id: usize,
  registry: Registry,
  modules: Arc<dyn ModuleLoader>,
  packages: Arc<dyn PackageLoader>,
  max_depth: AtomicUsize,
}

impl Default for Container {
  fn default() -> Self {
    Self::from_parts(
      Arc::new(FsModuleLoader::new()),
      Arc::new(Packages::new()),
      DEFAULT_MAX_DEPTH,
    )
  }
}

fn downcast<T: Any + Send + Sync>(name: &str, instance: Instance) -> Result<Arc<T>> {
  instance.downcast::<T>().map_err(|_| Error::TypeMismatch {
    namespace: name.to_owned(),
    expected: type_name::<T>(),
  })
}

impl Container {
  /// Creates a new, empty `Container` reading autoloaded modules from disk.
  pub fn new() -> Self {
    Self::default()
  }

  pub fn builder() -> ContainerBuilder {
    ContainerBuilder::default()
  }

  pub(crate) fn from_parts(
    modules: Arc<dyn ModuleLoader>,
    packages: Arc<dyn PackageLoader>,
    max_depth: usize,
  ) -> Self {
    Self {
      id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
      registry: Registry::default(),
      modules,
      packages,
      max_depth: AtomicUsize::new(max_depth),
    }
  }

  // --- PRIVATE HELPERS ---

  fn register(&self, namespace: &str, provider: Provider) -> Result<()> {
    namespace::validate(namespace)?;
    let singleton = provider.is_singleton();
    if self.registry.insert_provider(namespace, provider) {
      debug!(namespace, singleton, "replaced existing binding");
    } else {
      debug!(namespace, singleton, "registered binding");
    }
    Ok(())
  }

  /// Hands every extension registered since the last call to the manager.
  ///
  /// The queue is unlocked while a callback runs, so callbacks may resolve
  /// other managers or register more extensions. When two threads race on the
  /// same entry, only the first result reaches the manager and the queue
  /// cursor advances once per entry.
  fn apply_extensions(&self, namespace: &str, manager: &dyn Definition) -> Result<()> {
    let Some(queue) = self.registry.extension_queue(namespace) else {
      return Ok(());
    };
    let extendable = manager
      .as_extendable()
      .ok_or_else(|| Error::IncompleteImplementation {
        namespace: namespace.to_owned(),
        definition: manager.name().to_owned(),
      })?;

    loop {
      let (index, extension) = {
        let pending = queue.lock();
        let Some(extension) = pending.entries.get(pending.applied).cloned() else {
          return Ok(());
        };
        (pending.applied, extension)
      };

      let driver = (extension.callback)(self)?;

      let mut pending = queue.lock();
      if pending.applied == index {
        extendable.extend(&extension.key, driver)?;
        pending.applied += 1;
        debug!(namespace, key = %extension.key, "applied extension");
      }
    }
  }

  fn resolve_direct(&self, namespace: &str) -> Result<Instance> {
    let manager = self.registry.manager(namespace);
    match &manager {
      Some(manager) => self.apply_extensions(namespace, manager.as_ref())?,
      None => {
        if self.registry.extension_queue(namespace).is_some() {
          warn!(namespace, "extensions registered without a manager are ignored");
        }
      }
    }

    match (self.registry.provider(namespace), manager) {
      (Some(provider), _) => provider.provide(self),
      // A manager on its own resolves to its definition.
      (None, Some(manager)) => Ok(Arc::new(manager) as Instance),
      (None, None) => Err(Error::ModuleNotFound(namespace.to_owned())),
    }
  }

  fn construct(&self, definition: &dyn Definition) -> Result<Instance> {
    let _guard = ResolutionGuard::enter_definition(self.id, definition.name(), self.max_depth())?;

    let dependencies = definition::dependency_names(definition);
    debug!(definition = definition.name(), ?dependencies, "constructing definition");

    let mut values = Vec::with_capacity(dependencies.len());
    for dependency in dependencies {
      let value = self.resolve(&dependency)?;
      values.push((dependency, value));
    }
    definition.construct(Args::new(definition.name(), values))
  }

  // --- PUBLIC API ---

  // --- Binding Registration ---

  /// Registers a factory invoked on every resolution of `namespace`.
  ///
  /// The factory receives the container so it can resolve nested dependencies.
  /// A later registration on the same namespace replaces this one.
  pub fn bind<T, F>(&self, namespace: &str, factory: F) -> Result<()>
  where
    T: Any + Send + Sync,
    F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
  {
    self.bind_erased(namespace, move |container| {
      factory(container).map(|value| Arc::new(value) as Instance)
    })
  }

  /// Like [`bind`](Container::bind), for factories that already produce an [`Instance`].
  pub fn bind_erased<F>(&self, namespace: &str, factory: F) -> Result<()>
  where
    F: Fn(&Container) -> Result<Instance> + Send + Sync + 'static,
  {
    let factory: Box<FactoryFn> = Box::new(factory);
    self.register(namespace, Provider::factory(factory))
  }

  /// Registers a factory whose first successful result is cached and returned
  /// by every later resolution of `namespace`.
  pub fn singleton<T, F>(&self, namespace: &str, factory: F) -> Result<()>
  where
    T: Any + Send + Sync,
    F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
  {
    self.singleton_erased(namespace, move |container| {
      factory(container).map(|value| Arc::new(value) as Instance)
    })
  }

  /// Like [`singleton`](Container::singleton), for factories that already produce an [`Instance`].
  pub fn singleton_erased<F>(&self, namespace: &str, factory: F) -> Result<()>
  where
    F: Fn(&Container) -> Result<Instance> + Send + Sync + 'static,
  {
    let factory: Box<FactoryFn> = Box::new(factory);
    self.register(namespace, Provider::singleton(factory))
  }

  /// Registers an already built value as a singleton.
  pub fn instance<T: Any + Send + Sync>(&self, namespace: &str, value: T) -> Result<()> {
    self.register(namespace, Provider::instance(Arc::new(value)))
  }

  // --- Managers and Extensions ---

  /// Registers `definition` as the manager of `namespace`.
  ///
  /// Fails with [`Error::IncompleteImplementation`] unless the definition
  /// exposes [`Extendable`](crate::Extendable).
  pub fn manager(&self, namespace: &str, definition: Arc<dyn Definition>) -> Result<()> {
    namespace::validate(namespace)?;
    if definition.as_extendable().is_none() {
      return Err(Error::IncompleteImplementation {
        namespace: namespace.to_owned(),
        definition: definition.name().to_owned(),
      });
    }
    debug!(namespace, definition = definition.name(), "registered manager");
    self.registry.insert_manager(namespace, definition);
    Ok(())
  }

  /// Queues a named driver for the manager of `namespace`.
  ///
  /// Nothing is resolved here. Before the next factory run for `namespace`,
  /// `callback` is invoked and its value handed to the manager's `extend`,
  /// in registration order.
  pub fn extend<T, F>(&self, namespace: &str, key: &str, callback: F) -> Result<()>
  where
    T: Any + Send + Sync,
    F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
  {
    namespace::validate(namespace)?;
    if key.trim().is_empty() {
      return Err(Error::InvalidArgument(format!(
        "extension key for '{}' must be a non-empty string",
        namespace
      )));
    }
    let extension = Extension {
      key: key.to_owned(),
      callback: Box::new(move |container| {
        callback(container).map(|value| Arc::new(value) as Instance)
      }),
    };
    debug!(namespace, key, "registered extension");
    self.registry.push_extension(namespace, extension);
    Ok(())
  }

  // --- Aliases and Autoloading ---

  /// Makes `alias` resolve as `target`. The target is not checked until resolution.
  pub fn alias(&self, alias: &str, target: &str) {
    debug!(alias, target, "registered alias");
    self.registry.insert_alias(alias, target);
  }

  pub fn aliases<I, A, T>(&self, mapping: I)
  where
    I: IntoIterator<Item = (A, T)>,
    A: AsRef<str>,
    T: AsRef<str>,
  {
    for (alias, target) in mapping {
      self.alias(alias.as_ref(), target.as_ref());
    }
  }

  /// Maps names under `prefix/` onto files below `directory`.
  ///
  /// The directory is not read until a name below the prefix is resolved.
  pub fn autoload(&self, prefix: &str, directory: impl Into<PathBuf>) {
    let directory = directory.into();
    debug!(prefix, directory = %directory.display(), "registered autoload root");
    self.registry.insert_autoload(prefix.trim_end_matches('/'), directory);
  }

  // --- Hooks ---

  /// Appends a transform applied to every resolution of `namespace`.
  ///
  /// Hooks run in registration order. A hook is skipped when the value it
  /// receives is not a `T`.
  pub fn add_hook<T, F>(&self, namespace: &str, transform: F)
  where
    T: Any + Send + Sync,
    F: Fn(Arc<T>) -> T + Send + Sync + 'static,
  {
    debug!(namespace, hook = type_name::<T>(), "registered hook");
    self.registry.push_hook(namespace, Hook::typed(transform));
  }

  // --- Lifecycle ---

  /// Registers the aliases and autoload roots of `config` and adopts its depth limit.
  pub fn apply_config(&self, config: &ContainerConfig) -> Result<()> {
    config.validate()?;
    self.max_depth.store(config.max_depth, Ordering::Relaxed);
    self.aliases(&config.aliases);
    for (prefix, directory) in &config.autoload {
      self.autoload(prefix, directory.clone());
    }
    Ok(())
  }

  /// Forgets every registration. Intended for test harnesses.
  pub fn clear(&self) {
    debug!("clearing container");
    self.registry.clear();
  }

  pub fn max_depth(&self) -> usize {
    self.max_depth.load(Ordering::Relaxed)
  }

  // --- Introspection ---

  pub fn get_providers(&self) -> BTreeMap<String, ProviderInfo> {
    self.registry.providers_snapshot()
  }

  /// Namespace to manager definition name.
  pub fn get_managers(&self) -> BTreeMap<String, String> {
    self.registry.managers_snapshot()
  }

  pub fn get_extenders(&self) -> BTreeMap<String, Vec<ExtensionInfo>> {
    self.registry.extenders_snapshot()
  }

  /// Namespace to the value type of each hook, in application order.
  pub fn get_hooks(&self) -> BTreeMap<String, Vec<&'static str>> {
    self.registry.hooks_snapshot()
  }

  pub fn get_aliases(&self) -> BTreeMap<String, String> {
    self.registry.aliases_snapshot()
  }

  pub fn get_autoloads(&self) -> BTreeMap<String, PathBuf> {
    self.registry.autoloads_snapshot()
  }

  pub fn has_binding(&self, namespace: &str) -> bool {
    self.registry.has_provider(namespace)
  }

  pub fn is_manager(&self, namespace: &str) -> bool {
    self.registry.has_manager(namespace)
  }

  /// Whether `name` would be served from an autoloaded directory.
  pub fn is_autoload_path(&self, name: &str) -> bool {
    matches!(
      namespace::classify(&self.registry, name),
      Resolved::Autoloaded { .. }
    )
  }

  // --- Resolution ---

  /// Resolves `name` to a value.
  ///
  /// Aliases are followed one hop, then the name is served by its binding or
  /// manager, by the module loader when it lies under an autoload root, or by
  /// the package loader. Hooks registered for the resolved namespace are
  /// applied to the result.
  pub fn resolve(&self, name: &str) -> Result<Instance> {
    let resolved = namespace::classify(&self.registry, name);
    let _guard = ResolutionGuard::enter_namespace(self.id, resolved.namespace(), self.max_depth())?;

    let value = match &resolved {
      Resolved::Direct(namespace) => self.resolve_direct(namespace)?,
      Resolved::Autoloaded { path, .. } => self.modules.load_module(path)?,
      Resolved::External(name) => self.packages.load_package(name)?,
    };

    let hooks = self.registry.hooks_for(resolved.namespace());
    Ok(hooks::apply(resolved.namespace(), &hooks, value))
  }

  /// Resolves `name` and downcasts the value to `T`.
  pub fn resolve_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    downcast(name, self.resolve(name)?)
  }

  /// Produces `target`.
  ///
  /// Namespaces are resolved, plain values are returned unchanged, and
  /// definitions are constructed with their dependencies resolved by name.
  /// Every call constructs a fresh instance of a definition.
  pub fn make(&self, target: impl Into<Target>) -> Result<Instance> {
    match target.into() {
      Target::Namespace(namespace) => self.resolve(&namespace),
      Target::Definition(definition) => self.construct(definition.as_ref()),
      Target::Value(value) => Ok(value),
    }
  }

  /// Like [`make`](Container::make), downcasting the result to `T`.
  pub fn make_as<T: Any + Send + Sync>(&self, target: impl Into<Target>) -> Result<Arc<T>> {
    let target = target.into();
    let name = target.describe();
    downcast(&name, self.make(target)?)
  }

  /// Resolves the namespace of `"Ns/Thing.method"` and pairs it with `method`.
  ///
  /// The instance must have been registered as an `Arc<dyn Object>` exposing
  /// `method`. The method is not invoked.
  pub fn make_func(&self, target: &str) -> Result<BoundMethod> {
    let (namespace, method) = namespace::split_method_target(target)?;
    let instance = self.resolve(namespace)?;

    let missing = || Error::MethodNotFound {
      namespace: namespace.to_owned(),
      method: method.to_owned(),
    };
    let object = instance
      .downcast_ref::<Arc<dyn Object>>()
      .ok_or_else(missing)?;
    if !object.has_method(method) {
      return Err(missing());
    }
    Ok(BoundMethod::new(namespace, method, Arc::clone(object)))
  }
}
