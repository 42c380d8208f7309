use fibre_di::{global, maybe_resolve, resolve, Error};
use std::panic;

struct UnregisteredService;

fn main() {
  // --- Using the panicking `resolve!` macro ---
  println!("Attempting to resolve a namespace that was never registered...");

  let result = panic::catch_unwind(|| {
    // This line will panic!
    let _service = resolve!(UnregisteredService, "App/Unregistered");
  });

  assert!(result.is_err(), "resolve! should have panicked.");
  println!("Successfully caught the expected panic from resolve!.");

  // --- Using the non-panicking variants ---
  assert!(maybe_resolve!(UnregisteredService, "App/Unregistered").is_none());
  println!("\n`maybe_resolve!` returned `None` for the missing namespace.");

  match global().resolve("App/Unregistered") {
    Err(Error::ModuleNotFound(name)) => println!("`resolve` reported: module not found: {}", name),
    Err(other) => panic!("Unexpected error: {}", other),
    Ok(_) => panic!("Should not have found the namespace!"),
  }
}
