use fibre_di::{global, resolve};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A simple service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn main() -> fibre_di::Result<()> {
  // This factory runs once; its result is cached.
  global().singleton("Tracker/Singleton", |_| {
    println!("Creating SINGLETON RequestTracker...");
    Ok(RequestTracker {
      id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
    })
  })?;

  // This factory runs on every resolution.
  global().bind("Tracker/Transient", |_| {
    println!("Creating TRANSIENT RequestTracker...");
    Ok(RequestTracker {
      id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
    })
  })?;

  println!("--- Resolving Singletons ---");
  let s1 = resolve!(RequestTracker, "Tracker/Singleton");
  let s2 = resolve!(RequestTracker, "Tracker/Singleton");
  println!("Singleton 1 ID: {}, Singleton 2 ID: {}", s1.id, s2.id);
  assert!(
    Arc::ptr_eq(&s1, &s2),
    "Singleton instances should be identical"
  );

  println!("\n--- Resolving Transients ---");
  let t1 = resolve!(RequestTracker, "Tracker/Transient");
  let t2 = resolve!(RequestTracker, "Tracker/Transient");
  println!("Transient 1 ID: {}, Transient 2 ID: {}", t1.id, t2.id);
  assert!(
    !Arc::ptr_eq(&t1, &t2),
    "Transient instances should be different"
  );

  println!("\n--- Registered Providers ---");
  for (namespace, info) in global().get_providers() {
    println!("{:<20} {:?}", namespace, info);
  }
  Ok(())
}
