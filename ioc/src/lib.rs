//! # Fibre DI
//!
//! A namespace-based, thread-safe dependency injection container for Rust.
//!
//! Services are registered under `/`-delimited namespaces and resolved on
//! demand. Factories receive the container, so a service can pull in its own
//! dependencies while being built.
//!
//! ## Core Concepts
//!
//! - **Bindings**: `bind` registers a factory run on every resolution,
//!   `singleton` caches the first result, `instance` stores a ready value.
//! - **Managers**: a definition accepting named drivers. Drivers registered
//!   with `extend` are handed to the manager before its binding's factory runs.
//! - **Aliases**: a second name for a namespace, followed one hop.
//! - **Autoloading**: a prefix mapped onto a directory; `App/config/db` loads
//!   `<dir>/config/db` (any registered extension) on demand.
//! - **Injection**: `make` constructs a [`Definition`], resolving its
//!   dependencies from an explicit `inject` list or from constructor parameter
//!   names (`App_Bar` means `App/Bar`).
//! - **Hooks**: transforms applied, in order, to every resolution of a namespace.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_di::{Class, Container};
//! use std::sync::Arc;
//!
//! struct Config {
//!   database_url: String,
//! }
//!
//! struct Database {
//!   url: String,
//! }
//!
//! struct UserService {
//!   db: Arc<Database>,
//! }
//!
//! let container = Container::new();
//!
//! container
//!   .instance("App/Config", Config { database_url: "postgres://localhost/app".into() })
//!   .unwrap();
//!
//! // The factory resolves its own dependency through the container it receives.
//! container
//!   .singleton("App/Database", |c| {
//!     let config = c.resolve_as::<Config>("App/Config")?;
//!     Ok(Database { url: config.database_url.clone() })
//!   })
//!   .unwrap();
//!
//! // `App_Database` names the `App/Database` namespace.
//! let users = Class::new("UserService", |args| Ok(UserService { db: args.take()? }))
//!   .parameters(["App_Database"]);
//!
//! let service = container.make_as::<UserService>(users).unwrap();
//! assert_eq!(service.db.url, "postgres://localhost/app");
//! ```

mod builder;
mod config;
mod container;
mod core;
mod definition;
mod error;
mod global;
mod hooks;
mod loader;
mod macros;
mod namespace;
mod registry;

pub use builder::ContainerBuilder;
pub use config::{ContainerConfig, DEFAULT_MAX_DEPTH};
pub use container::Container;
pub use crate::core::Instance;
pub use definition::{Args, BoundMethod, Class, Definition, Extendable, Object, Target};
pub use error::{Error, Result};
pub use global::global;
pub use loader::{FsModuleLoader, ModuleLoader, PackageLoader, Packages};
pub use registry::{ExtensionInfo, ProviderInfo};
