//! Constructable definitions and the capabilities a resolved value can expose.
//!
//! A namespace resolves to a plain [`Instance`]. To take part in injection a
//! value has to opt in through one of the traits below:
//!
//! - [`Definition`]: something [`Container::make`](crate::Container::make) can
//!   construct, given its dependencies.
//! - [`Extendable`]: the `extend` capability a manager definition must expose.
//! - [`Object`]: named methods, looked up by
//!   [`Container::make_func`](crate::Container::make_func).

use crate::core::Instance;
use crate::error::{Error, Result};
use crate::namespace;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// A class-like value that can be constructed by the container.
pub trait Definition: Send + Sync + 'static {
  /// A human readable name, used in errors and logs.
  fn name(&self) -> &str;

  /// An explicit, ordered list of dependency namespaces.
  ///
  /// When present it is used verbatim and [`parameters`](Definition::parameters)
  /// is ignored.
  fn inject(&self) -> Option<Vec<String>> {
    None
  }

  /// Constructor parameter identifiers. `App_Bar` is read as the namespace `App/Bar`.
  fn parameters(&self) -> Vec<String> {
    Vec::new()
  }

  /// Builds a new instance from the resolved dependencies, in declaration order.
  fn construct(&self, args: Args) -> Result<Instance>;

  /// The `extend` capability. Required for definitions registered as managers.
  fn as_extendable(&self) -> Option<&dyn Extendable> {
    None
  }
}

/// Accepts named drivers registered through [`Container::extend`](crate::Container::extend).
pub trait Extendable: Send + Sync {
  fn extend(&self, key: &str, driver: Instance) -> Result<()>;
}

/// A value exposing methods by name.
///
/// Register a value as `Arc<dyn Object>` for it to be reachable from
/// [`Container::make_func`](crate::Container::make_func).
pub trait Object: Send + Sync + 'static {
  fn methods(&self) -> &[&'static str];

  fn call(&self, method: &str, args: &[Instance]) -> Result<Instance>;

  fn has_method(&self, method: &str) -> bool {
    self.methods().contains(&method)
  }
}

/// The ordered dependency namespaces of `definition`.
pub(crate) fn dependency_names(definition: &dyn Definition) -> Vec<String> {
  match definition.inject() {
    Some(inject) => inject,
    None => definition
      .parameters()
      .iter()
      .map(|parameter| namespace::parameter_to_namespace(parameter))
      .collect(),
  }
}

/// The resolved dependencies handed to [`Definition::construct`].
pub struct Args {
  definition: String,
  values: std::vec::IntoIter<(String, Instance)>,
}

impl Args {
  pub(crate) fn new(definition: &str, values: Vec<(String, Instance)>) -> Self {
    Self {
      definition: definition.to_owned(),
      values: values.into_iter(),
    }
  }

  /// Number of dependencies not yet taken.
  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Takes the next dependency as it was resolved.
  pub fn take_instance(&mut self) -> Result<Instance> {
    self
      .values
      .next()
      .map(|(_, value)| value)
      .ok_or_else(|| Error::construction(&self.definition, "missing constructor argument"))
  }

  /// Takes the next dependency, downcast to `T`.
  pub fn take<T: Any + Send + Sync>(&mut self) -> Result<Arc<T>> {
    let (namespace, value) = self
      .values
      .next()
      .ok_or_else(|| Error::construction(&self.definition, "missing constructor argument"))?;
    value.downcast::<T>().map_err(|_| Error::TypeMismatch {
      namespace,
      expected: type_name::<T>(),
    })
  }
}

type ConstructorFn = dyn Fn(&mut Args) -> Result<Instance> + Send + Sync;

/// A [`Definition`] assembled from a constructor closure.
///
/// ```
/// use fibre_di::{Class, Container};
/// use std::sync::Arc;
///
/// struct Greeter {
///   greeting: Arc<String>,
/// }
///
/// let container = Container::new();
/// container.bind("App/Greeting", |_| Ok(String::from("hello"))).unwrap();
///
/// let greeter = Class::new("Greeter", |args| Ok(Greeter { greeting: args.take()? }))
///   .parameters(["App_Greeting"]);
///
/// let made = container.make_as::<Greeter>(greeter).unwrap();
/// assert_eq!(*made.greeting, "hello");
/// ```
pub struct Class {
  name: String,
  inject: Option<Vec<String>>,
  parameters: Vec<String>,
  constructor: Box<ConstructorFn>,
}

impl Class {
  pub fn new<T, F>(name: &str, constructor: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&mut Args) -> Result<T> + Send + Sync + 'static,
  {
    Self::erased(name, move |args| constructor(args).map(|value| Arc::new(value) as Instance))
  }

  /// Like [`Class::new`], for constructors that already produce an [`Instance`].
  pub fn erased<F>(name: &str, constructor: F) -> Self
  where
    F: Fn(&mut Args) -> Result<Instance> + Send + Sync + 'static,
  {
    Self {
      name: name.to_owned(),
      inject: None,
      parameters: Vec::new(),
      constructor: Box::new(constructor),
    }
  }

  /// Declares the dependency namespaces explicitly.
  pub fn inject<I, S>(mut self, namespaces: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.inject = Some(namespaces.into_iter().map(Into::into).collect());
    self
  }

  /// Declares constructor parameter identifiers, used when no `inject` list is set.
  pub fn parameters<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.parameters = names.into_iter().map(Into::into).collect();
    self
  }
}

impl Definition for Class {
  fn name(&self) -> &str {
    &self.name
  }

  fn inject(&self) -> Option<Vec<String>> {
    self.inject.clone()
  }

  fn parameters(&self) -> Vec<String> {
    self.parameters.clone()
  }

  fn construct(&self, mut args: Args) -> Result<Instance> {
    (self.constructor)(&mut args)
  }
}

impl fmt::Debug for Class {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Class")
      .field("name", &self.name)
      .field("inject", &self.inject)
      .field("parameters", &self.parameters)
      .finish_non_exhaustive()
  }
}

/// What [`Container::make`](crate::Container::make) is asked to produce.
pub enum Target {
  /// Resolved exactly like [`Container::resolve`](crate::Container::resolve).
  Namespace(String),
  /// Constructed with its dependencies injected.
  Definition(Arc<dyn Definition>),
  /// Returned unchanged.
  Value(Instance),
}

impl Target {
  pub fn value<T: Any + Send + Sync>(value: T) -> Self {
    Target::Value(Arc::new(value))
  }

  pub(crate) fn describe(&self) -> String {
    match self {
      Target::Namespace(namespace) => namespace.clone(),
      Target::Definition(definition) => format!("<{}>", definition.name()),
      Target::Value(_) => "<value>".to_owned(),
    }
  }
}

impl From<&str> for Target {
  fn from(namespace: &str) -> Self {
    Target::Namespace(namespace.to_owned())
  }
}

impl From<String> for Target {
  fn from(namespace: String) -> Self {
    Target::Namespace(namespace)
  }
}

impl From<Arc<dyn Definition>> for Target {
  fn from(definition: Arc<dyn Definition>) -> Self {
    Target::Definition(definition)
  }
}

impl From<Class> for Target {
  fn from(class: Class) -> Self {
    Target::Definition(Arc::new(class))
  }
}

impl From<Instance> for Target {
  fn from(value: Instance) -> Self {
    Target::Value(value)
  }
}

/// An instance paired with one of its methods, as produced by
/// [`Container::make_func`](crate::Container::make_func).
#[derive(Clone)]
pub struct BoundMethod {
  namespace: String,
  method: String,
  instance: Arc<dyn Object>,
}

impl BoundMethod {
  pub(crate) fn new(namespace: &str, method: &str, instance: Arc<dyn Object>) -> Self {
    Self {
      namespace: namespace.to_owned(),
      method: method.to_owned(),
      instance,
    }
  }

  pub fn namespace(&self) -> &str {
    &self.namespace
  }

  pub fn method(&self) -> &str {
    &self.method
  }

  pub fn instance(&self) -> &Arc<dyn Object> {
    &self.instance
  }

  pub fn call(&self, args: &[Instance]) -> Result<Instance> {
    self.instance.call(&self.method, args)
  }
}

impl fmt::Debug for BoundMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BoundMethod")
      .field("namespace", &self.namespace)
      .field("method", &self.method)
      .finish_non_exhaustive()
  }
}
