//! The maps behind a [`Container`](crate::Container), and their read-only snapshots.

use crate::container::Container;
use crate::core::{Instance, Provider};
use crate::definition::Definition;
use crate::error::Result;
use crate::hooks::Hook;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

pub(crate) type ExtendFn = dyn Fn(&Container) -> Result<Instance> + Send + Sync;

pub(crate) struct Extension {
  pub(crate) key: String,
  pub(crate) callback: Box<ExtendFn>,
}

/// Extensions for one namespace, in registration order.
///
/// `applied` is the number of leading entries already handed to the manager.
#[derive(Default)]
pub(crate) struct ExtensionQueue {
  pub(crate) entries: Vec<Arc<Extension>>,
  pub(crate) applied: usize,
}

/// Snapshot of a single binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderInfo {
  pub singleton: bool,
  /// `true` once a singleton's cache has been filled. Always `false` for factories.
  pub resolved: bool,
}

/// Snapshot of a single registered extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionInfo {
  pub key: String,
  /// Whether the extension has already been handed to its manager.
  pub applied: bool,
}

#[derive(Default)]
pub(crate) struct Registry {
  providers: DashMap<String, Arc<Provider>>,
  managers: DashMap<String, Arc<dyn Definition>>,
  extenders: DashMap<String, Arc<Mutex<ExtensionQueue>>>,
  aliases: DashMap<String, String>,
  autoloads: DashMap<String, PathBuf>,
  hooks: DashMap<String, Vec<Arc<Hook>>>,
}

impl Registry {
  // --- Mutation ---

  /// Returns `true` if an existing binding was replaced.
  pub(crate) fn insert_provider(&self, namespace: &str, provider: Provider) -> bool {
    self
      .providers
      .insert(namespace.to_owned(), Arc::new(provider))
      .is_some()
  }

  pub(crate) fn insert_manager(&self, namespace: &str, definition: Arc<dyn Definition>) -> bool {
    self
      .managers
      .insert(namespace.to_owned(), definition)
      .is_some()
  }

  pub(crate) fn push_extension(&self, namespace: &str, extension: Extension) {
    let queue = self
      .extenders
      .entry(namespace.to_owned())
      .or_default()
      .clone();
    queue.lock().entries.push(Arc::new(extension));
  }

  pub(crate) fn insert_alias(&self, alias: &str, target: &str) {
    self.aliases.insert(alias.to_owned(), target.to_owned());
  }

  pub(crate) fn insert_autoload(&self, prefix: &str, directory: PathBuf) {
    self.autoloads.insert(prefix.to_owned(), directory);
  }

  pub(crate) fn push_hook(&self, namespace: &str, hook: Hook) {
    self
      .hooks
      .entry(namespace.to_owned())
      .or_default()
      .push(Arc::new(hook));
  }

  pub(crate) fn clear(&self) {
    self.providers.clear();
    self.managers.clear();
    self.extenders.clear();
    self.aliases.clear();
    self.autoloads.clear();
    self.hooks.clear();
  }

  // --- Lookup ---
  // Every lookup clones out of the map so no shard lock is held while user
  // factories run and re-enter the container.

  pub(crate) fn provider(&self, namespace: &str) -> Option<Arc<Provider>> {
    self.providers.get(namespace).map(|p| Arc::clone(p.value()))
  }

  pub(crate) fn manager(&self, namespace: &str) -> Option<Arc<dyn Definition>> {
    self.managers.get(namespace).map(|m| Arc::clone(m.value()))
  }

  pub(crate) fn extension_queue(&self, namespace: &str) -> Option<Arc<Mutex<ExtensionQueue>>> {
    self.extenders.get(namespace).map(|q| Arc::clone(q.value()))
  }

  pub(crate) fn alias_target(&self, alias: &str) -> Option<String> {
    self.aliases.get(alias).map(|t| t.value().clone())
  }

  pub(crate) fn hooks_for(&self, namespace: &str) -> Vec<Arc<Hook>> {
    self
      .hooks
      .get(namespace)
      .map(|h| h.value().clone())
      .unwrap_or_default()
  }

  pub(crate) fn is_direct(&self, namespace: &str) -> bool {
    self.providers.contains_key(namespace) || self.managers.contains_key(namespace)
  }

  pub(crate) fn has_provider(&self, namespace: &str) -> bool {
    self.providers.contains_key(namespace)
  }

  pub(crate) fn has_manager(&self, namespace: &str) -> bool {
    self.managers.contains_key(namespace)
  }

  /// Finds the longest autoload prefix `p` such that `name` starts with `p/`.
  pub(crate) fn autoload_root(&self, name: &str) -> Option<(String, PathBuf)> {
    self
      .autoloads
      .iter()
      .filter(|root| {
        name
          .strip_prefix(root.key().as_str())
          .is_some_and(|rest| rest.len() > 1 && rest.starts_with('/'))
      })
      .max_by_key(|root| root.key().len())
      .map(|root| (root.key().clone(), root.value().clone()))
  }

  // --- Snapshots ---

  pub(crate) fn providers_snapshot(&self) -> BTreeMap<String, ProviderInfo> {
    self
      .providers
      .iter()
      .map(|entry| {
        let info = ProviderInfo {
          singleton: entry.value().is_singleton(),
          resolved: entry.value().is_resolved(),
        };
        (entry.key().clone(), info)
      })
      .collect()
  }

  pub(crate) fn managers_snapshot(&self) -> BTreeMap<String, String> {
    self
      .managers
      .iter()
      .map(|entry| (entry.key().clone(), entry.value().name().to_owned()))
      .collect()
  }

  pub(crate) fn extenders_snapshot(&self) -> BTreeMap<String, Vec<ExtensionInfo>> {
    self
      .extenders
      .iter()
      .map(|entry| {
        let queue = entry.value().lock();
        let infos = queue
          .entries
          .iter()
          .enumerate()
          .map(|(index, extension)| ExtensionInfo {
            key: extension.key.clone(),
            applied: index < queue.applied,
          })
          .collect();
        (entry.key().clone(), infos)
      })
      .collect()
  }

  pub(crate) fn hooks_snapshot(&self) -> BTreeMap<String, Vec<&'static str>> {
    self
      .hooks
      .iter()
      .map(|entry| {
        let names = entry.value().iter().map(|hook| hook.type_name()).collect();
        (entry.key().clone(), names)
      })
      .collect()
  }

  pub(crate) fn aliases_snapshot(&self) -> BTreeMap<String, String> {
    self
      .aliases
      .iter()
      .map(|entry| (entry.key().clone(), entry.value().clone()))
      .collect()
  }

  pub(crate) fn autoloads_snapshot(&self) -> BTreeMap<String, PathBuf> {
    self
      .autoloads
      .iter()
      .map(|entry| (entry.key().clone(), entry.value().clone()))
      .collect()
  }
}
