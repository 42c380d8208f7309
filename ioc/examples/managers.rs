use fibre_di::{Args, Container, Definition, Error, Extendable, Instance};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

trait Store: Send + Sync {
  fn describe(&self) -> String;
}

struct MemoryStore;
impl Store for MemoryStore {
  fn describe(&self) -> String {
    "in-process memory".to_string()
  }
}

struct RedisStore {
  host: Arc<String>,
}
impl Store for RedisStore {
  fn describe(&self) -> String {
    format!("redis at {}", self.host)
  }
}

/// Collects drivers by name so the `Cache/Store` binding can pick one.
#[derive(Default)]
struct StoreManager {
  drivers: Mutex<BTreeMap<String, Arc<dyn Store>>>,
}

impl Definition for StoreManager {
  fn name(&self) -> &str {
    "StoreManager"
  }

  fn construct(&self, _args: Args) -> fibre_di::Result<Instance> {
    Err(Error::construction("StoreManager", "managers are registered, not constructed"))
  }

  fn as_extendable(&self) -> Option<&dyn Extendable> {
    Some(self)
  }
}

impl Extendable for StoreManager {
  fn extend(&self, key: &str, driver: Instance) -> fibre_di::Result<()> {
    let store = driver
      .downcast_ref::<Arc<dyn Store>>()
      .ok_or_else(|| Error::construction("StoreManager", format!("driver '{}' is not a Store", key)))?;
    self.drivers.lock().insert(key.to_owned(), Arc::clone(store));
    Ok(())
  }
}

fn main() -> fibre_di::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter("fibre_di=debug")
    .init();

  let container = Container::new();
  container.instance("Config/Store", String::from("redis"))?;
  container.instance("Config/RedisHost", String::from("127.0.0.1:6379"))?;

  let manager = Arc::new(StoreManager::default());
  container.manager("Cache/Store", Arc::clone(&manager) as Arc<dyn Definition>)?;

  let drivers = Arc::clone(&manager);
  container.singleton("Cache/Store", move |c| {
    let selected = c.resolve_as::<String>("Config/Store")?;
    drivers
      .drivers
      .lock()
      .get(selected.as_str())
      .cloned()
      .ok_or_else(|| Error::construction("Cache/Store", format!("no driver named '{}'", selected)))
  })?;

  // Drivers are only built once the store is first resolved.
  container.extend("Cache/Store", "memory", |_| {
    Ok(Arc::new(MemoryStore) as Arc<dyn Store>)
  })?;
  container.extend("Cache/Store", "redis", |c| {
    let host = c.resolve_as::<String>("Config/RedisHost")?;
    Ok(Arc::new(RedisStore { host }) as Arc<dyn Store>)
  })?;

  let store = container.resolve_as::<Arc<dyn Store>>("Cache/Store")?;
  println!("Using store: {}", store.describe());

  for (namespace, extensions) in container.get_extenders() {
    println!("{}: {:?}", namespace, extensions);
  }
  Ok(())
}
