use fibre_di::{Class, Container};
use std::sync::Arc;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation
struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<Arc<dyn Logger>>,
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    self.logger.log("Finished report generation.");
  }
}

fn main() -> fibre_di::Result<()> {
  let container = Container::new();

  // 4. Register the implementation under an abstract namespace
  container.singleton("Support/Logger", |_| {
    Ok(Arc::new(ConsoleLogger) as Arc<dyn Logger>)
  })?;

  // 5. Describe the service; `Support_Logger` names `Support/Logger`
  let reports = Class::new("ReportService", |args| {
    Ok(ReportService {
      logger: args.take()?,
    })
  })
  .parameters(["Support_Logger"]);

  // 6. Build it with its dependency injected
  let service = container.make_as::<ReportService>(reports)?;
  service.generate_report();
  Ok(())
}
