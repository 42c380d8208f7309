//! The global IoC container instance and access functions.

use crate::container::Container;
use once_cell::sync::Lazy;

// The one and only global container instance.
// It will be created on its first access in a thread-safe manner.
static GLOBAL_CONTAINER: Lazy<Container> = Lazy::new(Container::new);

/// Provides a reference to the global container instance.
///
/// Explicit [`Container`] values are the primary way to wire an application;
/// the global instance suits code that cannot thread one through.
///
/// # Examples
///
/// ```
/// use fibre_di::global;
///
/// fn register_services() {
///   // Get the global container and register a binding.
///   global()
///     .instance("Docs/Greeting", String::from("Hello from global!"))
///     .unwrap();
/// }
/// # register_services();
/// ```
pub fn global() -> &'static Container {
  &GLOBAL_CONTAINER
}
