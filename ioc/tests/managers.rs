use fibre_di::{Args, Class, Container, Definition, Error, Extendable, ExtensionInfo, Instance};
use pretty_assertions::assert_eq;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc, Barrier, Mutex,
};
use std::thread;

// --- Test Fixtures ---

/// A manager keeping its drivers in registration order.
#[derive(Default)]
struct CacheManager {
  drivers: Mutex<Vec<(String, Instance)>>,
}

impl CacheManager {
  fn keys(&self) -> Vec<String> {
    self
      .drivers
      .lock()
      .unwrap()
      .iter()
      .map(|(key, _)| key.clone())
      .collect()
  }

  fn driver(&self, key: &str) -> Option<Instance> {
    self
      .drivers
      .lock()
      .unwrap()
      .iter()
      .find(|(k, _)| k == key)
      .map(|(_, driver)| Arc::clone(driver))
  }
}

impl Definition for CacheManager {
  fn name(&self) -> &str {
    "CacheManager"
  }

  fn construct(&self, _args: Args) -> fibre_di::Result<Instance> {
    Err(Error::construction("CacheManager", "managers are not constructed directly"))
  }

  fn as_extendable(&self) -> Option<&dyn Extendable> {
    Some(self)
  }
}

impl Extendable for CacheManager {
  fn extend(&self, key: &str, driver: Instance) -> fibre_di::Result<()> {
    self.drivers.lock().unwrap().push((key.to_owned(), driver));
    Ok(())
  }
}

struct RedisDriver;
struct MemcachedDriver;

/// The value bound under the managed namespace.
struct Cache {
  driver: Instance,
  drivers_seen: Vec<String>,
}

fn register_cache(container: &Container) -> Arc<CacheManager> {
  let manager = Arc::new(CacheManager::default());
  container
    .manager("Fibre/Cache", Arc::clone(&manager) as Arc<dyn Definition>)
    .unwrap();

  let drivers = Arc::clone(&manager);
  container
    .bind("Fibre/Cache", move |c| {
      let selected = c.resolve_as::<String>("Config/CacheDriver")?;
      let driver = drivers
        .driver(&selected)
        .ok_or_else(|| Error::construction("Cache", format!("unknown driver '{}'", selected)))?;
      Ok(Cache {
        driver,
        drivers_seen: drivers.keys(),
      })
    })
    .unwrap();
  manager
}

// --- Manager Tests ---

#[test]
fn test_manager_requires_extend_capability() {
  let container = Container::new();
  let plain = Class::new("PlainProvider", |_| Ok(()));

  let err = container
    .manager("Fibre/Plain", Arc::new(plain))
    .unwrap_err();

  assert!(matches!(
    err,
    Error::IncompleteImplementation { ref namespace, ref definition }
      if namespace == "Fibre/Plain" && definition == "PlainProvider"
  ));
  assert!(!container.is_manager("Fibre/Plain"));
}

#[test]
fn test_extensions_reach_the_manager_in_order_before_the_factory() {
  // Arrange
  let container = Container::new();
  container
    .instance("Config/CacheDriver", String::from("redis"))
    .unwrap();
  register_cache(&container);
  container
    .extend("Fibre/Cache", "redis", |_| Ok(RedisDriver))
    .unwrap();
  container
    .extend("Fibre/Cache", "memcached", |_| Ok(MemcachedDriver))
    .unwrap();

  // Act
  let cache = container.resolve_as::<Cache>("Fibre/Cache").unwrap();

  // Assert: the factory already saw both drivers and picked the configured one.
  assert_eq!(cache.drivers_seen, vec!["redis", "memcached"]);
  assert!(cache.driver.downcast_ref::<RedisDriver>().is_some());
}

#[test]
fn test_extension_callbacks_receive_the_container() {
  // Arrange
  let container = Container::new();
  container
    .instance("Config/CacheDriver", String::from("memcached"))
    .unwrap();
  container
    .instance("Config/MemcachedHost", String::from("10.0.0.7"))
    .unwrap();
  register_cache(&container);
  container
    .extend("Fibre/Cache", "memcached", |c| {
      c.resolve_as::<String>("Config/MemcachedHost")
    })
    .unwrap();

  // Act
  let cache = container.resolve_as::<Cache>("Fibre/Cache").unwrap();

  // Assert
  let host = cache.driver.downcast_ref::<Arc<String>>().unwrap();
  assert_eq!(host.as_str(), "10.0.0.7");
}

#[test]
fn test_each_extension_is_applied_once() {
  // Arrange
  let container = Container::new();
  container
    .instance("Config/CacheDriver", String::from("redis"))
    .unwrap();
  let manager = register_cache(&container);
  let calls = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&calls);
  container
    .extend("Fibre/Cache", "redis", move |_| {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(RedisDriver)
    })
    .unwrap();

  // Act: the binding is not a singleton, so the factory runs every time.
  for _ in 0..3 {
    container.resolve("Fibre/Cache").unwrap();
  }

  // Assert
  assert_eq!(calls.load(Ordering::SeqCst), 1);
  assert_eq!(manager.keys(), vec!["redis"]);
  assert_eq!(
    container.get_extenders().get("Fibre/Cache"),
    Some(&vec![ExtensionInfo {
      key: "redis".to_owned(),
      applied: true,
    }])
  );
}

#[test]
fn test_late_extensions_are_applied_on_next_resolution() {
  // Arrange
  let container = Container::new();
  container
    .instance("Config/CacheDriver", String::from("redis"))
    .unwrap();
  let manager = register_cache(&container);
  container
    .extend("Fibre/Cache", "redis", |_| Ok(RedisDriver))
    .unwrap();
  container.resolve("Fibre/Cache").unwrap();

  // Act
  container
    .extend("Fibre/Cache", "memcached", |_| Ok(MemcachedDriver))
    .unwrap();
  let extenders_before = container.get_extenders();
  let cache = container.resolve_as::<Cache>("Fibre/Cache").unwrap();

  // Assert
  assert_eq!(
    extenders_before["Fibre/Cache"]
      .iter()
      .map(|info| info.applied)
      .collect::<Vec<_>>(),
    vec![true, false]
  );
  assert_eq!(cache.drivers_seen, vec!["redis", "memcached"]);
  assert_eq!(manager.keys(), vec!["redis", "memcached"]);
}

#[test]
fn test_extension_callback_may_register_further_extensions() {
  // Arrange
  let container = Container::new();
  container
    .instance("Config/CacheDriver", String::from("redis"))
    .unwrap();
  let manager = register_cache(&container);
  container
    .extend("Fibre/Cache", "redis", |c| {
      c.extend("Fibre/Cache", "memcached", |_| Ok(MemcachedDriver))?;
      Ok(RedisDriver)
    })
    .unwrap();

  // Act
  let cache = container.resolve_as::<Cache>("Fibre/Cache").unwrap();

  // Assert: the nested registration is picked up in the same pass.
  assert_eq!(cache.drivers_seen, vec!["redis", "memcached"]);
  assert_eq!(manager.keys(), vec!["redis", "memcached"]);
}

fn register_pool(container: &Container, namespace: &str, depends_on: &'static str) {
  container
    .manager(namespace, Arc::new(CacheManager::default()) as Arc<dyn Definition>)
    .unwrap();
  container
    .extend(namespace, "peer", move |c| {
      c.resolve(depends_on)?;
      Ok(RedisDriver)
    })
    .unwrap();
}

#[test]
fn test_mutually_dependent_extensions_fail_on_every_thread() {
  // Arrange: each manager's extension needs the other manager.
  let container = Container::new();
  register_pool(&container, "Pool/A", "Pool/B");
  register_pool(&container, "Pool/B", "Pool/A");
  let barrier = Barrier::new(2);

  // Act: resolve both at once, from two threads.
  let results: Vec<_> = thread::scope(|s| {
    let handles: Vec<_> = ["Pool/A", "Pool/B"]
      .into_iter()
      .map(|namespace| {
        let (container, barrier) = (&container, &barrier);
        s.spawn(move || {
          barrier.wait();
          container.resolve(namespace).map(|_| ())
        })
      })
      .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
  });

  // Assert
  for result in results {
    assert!(matches!(result, Err(Error::CircularDependency { .. })));
  }
  let applied: Vec<bool> = container
    .get_extenders()
    .values()
    .flatten()
    .map(|info| info.applied)
    .collect();
  assert_eq!(applied, vec![false, false]);
}

#[test]
fn test_missing_driver_fails_the_resolution() {
  // Arrange
  let container = Container::new();
  container
    .instance("Config/CacheDriver", String::from("dynamo"))
    .unwrap();
  register_cache(&container);
  container
    .extend("Fibre/Cache", "redis", |_| Ok(RedisDriver))
    .unwrap();

  // Act
  let err = container.resolve("Fibre/Cache").unwrap_err();

  // Assert
  assert!(matches!(err, Error::Construction { ref definition, .. } if definition == "Cache"));
}

#[test]
fn test_manager_without_binding_resolves_to_its_definition() {
  // Arrange
  let container = Container::new();
  let manager = Arc::new(CacheManager::default());
  container
    .manager("Fibre/Drivers", Arc::clone(&manager) as Arc<dyn Definition>)
    .unwrap();
  container
    .extend("Fibre/Drivers", "redis", |_| Ok(RedisDriver))
    .unwrap();

  // Act
  let definition = container
    .resolve_as::<Arc<dyn Definition>>("Fibre/Drivers")
    .unwrap();

  // Assert
  assert_eq!(definition.name(), "CacheManager");
  assert_eq!(manager.keys(), vec!["redis"]);
  assert_eq!(
    container.get_managers().get("Fibre/Drivers").map(String::as_str),
    Some("CacheManager")
  );
}

#[test]
fn test_extensions_without_a_manager_are_ignored() {
  // Arrange
  let container = Container::new();
  container.bind("Fibre/Plain", |_| Ok(5_u8)).unwrap();
  container
    .extend("Fibre/Plain", "redis", |_| Ok(RedisDriver))
    .unwrap();

  // Act
  let value = container.resolve_as::<u8>("Fibre/Plain").unwrap();

  // Assert
  assert_eq!(*value, 5);
  assert_eq!(
    container.get_extenders()["Fibre/Plain"],
    vec![ExtensionInfo {
      key: "redis".to_owned(),
      applied: false,
    }]
  );
}

#[test]
fn test_extend_rejects_blank_keys() {
  let container = Container::new();
  assert!(matches!(
    container.extend("Fibre/Cache", "", |_| Ok(RedisDriver)),
    Err(Error::InvalidArgument(_))
  ));
  assert!(container.get_extenders().is_empty());
}
