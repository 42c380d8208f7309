//! Public macros for ergonomic typed resolution.

/// Resolves a namespace from the global container as an `Arc<$type>`.
///
/// # Panics
///
/// Panics if the namespace cannot be resolved or does not hold a `$type`.
/// For a non-panicking version, use [`maybe_resolve!`] or
/// `global().resolve_as(...)` directly.
///
/// # Examples
///
/// ```
/// use fibre_di::{global, resolve};
///
/// global().instance("Docs/Resolve", String::from("hello")).unwrap();
///
/// let message = resolve!(String, "Docs/Resolve");
/// assert_eq!(*message, "hello");
/// ```
#[macro_export]
macro_rules! resolve {
  ($type:ty, $namespace:expr) => {
    $crate::resolve_in!($crate::global(), $type, $namespace)
  };
}

/// Resolves a namespace from an explicit container, panicking on failure.
///
/// ```
/// use fibre_di::{resolve_in, Container};
///
/// let container = Container::new();
/// container.bind("App/Port", |_| Ok(8080_u16)).unwrap();
///
/// assert_eq!(*resolve_in!(container, u16, "App/Port"), 8080);
/// ```
#[macro_export]
macro_rules! resolve_in {
  ($container:expr, $type:ty, $namespace:expr) => {{
    let namespace: &str = $namespace;
    $container
      .resolve_as::<$type>(namespace)
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required namespace '{}' as {}: {}",
          namespace,
          std::any::type_name::<$type>(),
          err
        )
      })
  }};
}

/// Resolves a namespace from the global container, returning `None` on failure.
#[macro_export]
macro_rules! maybe_resolve {
  ($type:ty, $namespace:expr) => {
    $crate::global().resolve_as::<$type>($namespace).ok()
  };
}
