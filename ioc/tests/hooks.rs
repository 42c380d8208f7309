use fibre_di::Container;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

#[derive(Debug, Clone, PartialEq)]
struct Settings {
  debug: bool,
  origin: Vec<&'static str>,
}

fn container_with_settings() -> Container {
  let container = Container::new();
  container
    .bind("App/Settings", |_| {
      Ok(Settings {
        debug: false,
        origin: vec!["factory"],
      })
    })
    .unwrap();
  container
}

#[test]
fn test_hooks_compose_in_registration_order() {
  // Arrange
  let container = container_with_settings();
  container.add_hook("App/Settings", |settings: Arc<Settings>| {
    let mut next = (*settings).clone();
    next.origin.push("h1");
    next
  });
  container.add_hook("App/Settings", |settings: Arc<Settings>| {
    let mut next = (*settings).clone();
    next.origin.push("h2");
    next.debug = true;
    next
  });

  // Act
  let settings = container.resolve_as::<Settings>("App/Settings").unwrap();

  // Assert: h2(h1(base))
  assert_eq!(
    *settings,
    Settings {
      debug: true,
      origin: vec!["factory", "h1", "h2"],
    }
  );
}

#[test]
fn test_hook_for_another_type_is_skipped() {
  // Arrange
  let container = container_with_settings();
  let skipped = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&skipped);
  container.add_hook("App/Settings", move |port: Arc<u16>| {
    counter.fetch_add(1, Ordering::SeqCst);
    *port + 1
  });
  container.add_hook("App/Settings", |settings: Arc<Settings>| Settings {
    debug: true,
    ..(*settings).clone()
  });

  // Act
  let settings = container.resolve_as::<Settings>("App/Settings").unwrap();

  // Assert
  assert!(settings.debug);
  assert_eq!(skipped.load(Ordering::SeqCst), 0);
}

#[test]
fn test_hooks_apply_through_aliases() {
  let container = container_with_settings();
  container.alias("Settings", "App/Settings");
  container.add_hook("App/Settings", |settings: Arc<Settings>| Settings {
    debug: true,
    ..(*settings).clone()
  });

  assert!(container.resolve_as::<Settings>("Settings").unwrap().debug);
}

#[test]
fn test_hooks_run_on_every_resolution_of_a_singleton() {
  // Arrange
  let container = Container::new();
  let built = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&built);
  container
    .singleton("App/Base", move |_| {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(10_u32)
    })
    .unwrap();
  container.add_hook("App/Base", |base: Arc<u32>| *base * 2);

  // Act
  let first = container.resolve_as::<u32>("App/Base").unwrap();
  let second = container.resolve_as::<u32>("App/Base").unwrap();

  // Assert: the cached value itself is never rewritten.
  assert_eq!((*first, *second), (20, 20));
  assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn test_hooks_reach_autoloaded_modules() {
  let dir = tempfile::tempdir().unwrap();
  std::fs::write(dir.path().join("banner.txt"), "fibre").unwrap();
  let container = Container::new();
  container.autoload("App", dir.path());
  container.add_hook("App/banner", |banner: Arc<String>| banner.to_uppercase());

  assert_eq!(*container.resolve_as::<String>("App/banner").unwrap(), "FIBRE");
}

#[test]
fn test_hooks_snapshot_lists_value_types() {
  let container = Container::new();
  container.add_hook("App/Base", |base: Arc<u32>| *base);
  container.add_hook("App/Base", |name: Arc<String>| (*name).clone());

  assert_eq!(
    container.get_hooks(),
    BTreeMap::from([(
      "App/Base".to_owned(),
      vec!["u32", "alloc::string::String"]
    )])
  );
}
