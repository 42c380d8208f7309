use fibre_di::{Container, ContainerConfig};
use std::fs;

fn main() -> fibre_di::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter("fibre_di=debug")
    .init();

  // Lay out a small application directory.
  let root = std::env::temp_dir().join("fibre-di-autoload-demo");
  fs::create_dir_all(root.join("config"))?;
  fs::write(
    root.join("config").join("database.json"),
    r#"{ "host": "localhost", "port": 5432 }"#,
  )?;
  fs::write(root.join("config").join("app.yaml"), "name: demo\nworkers: 4\n")?;

  let config = ContainerConfig::from_yaml_str(&format!(
    "aliases:\n  Database: App/config/database\nautoload:\n  App: {}\n",
    root.display()
  ))?;
  let container = Container::builder().config(config).build()?;

  let database = container.resolve_as::<serde_json::Value>("Database")?;
  println!("database host: {}", database["host"]);

  let app = container.resolve_as::<serde_yaml::Value>("App/config/app")?;
  println!("app name: {:?}", app["name"].as_str());

  fs::remove_dir_all(&root)?;
  Ok(())
}
