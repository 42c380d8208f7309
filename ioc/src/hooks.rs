//! Post-resolution transforms.

use crate::core::Instance;
use std::any::{type_name, Any};
use std::sync::Arc;
use tracing::trace;

// Hands the value back untouched when it is not of the hook's type.
type TransformFn = dyn Fn(Instance) -> Result<Instance, Instance> + Send + Sync;

pub(crate) struct Hook {
  type_name: &'static str,
  transform: Box<TransformFn>,
}

impl Hook {
  pub(crate) fn typed<T, F>(transform: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(Arc<T>) -> T + Send + Sync + 'static,
  {
    Self {
      type_name: type_name::<T>(),
      transform: Box::new(move |value: Instance| {
        value
          .downcast::<T>()
          .map(|typed| Arc::new(transform(typed)) as Instance)
      }),
    }
  }

  pub(crate) fn type_name(&self) -> &'static str {
    self.type_name
  }
}

/// Folds `value` through `hooks` in registration order.
///
/// A hook that cannot accept the value is skipped and the value flows on to
/// the next hook unchanged.
pub(crate) fn apply(namespace: &str, hooks: &[Arc<Hook>], value: Instance) -> Instance {
  hooks
    .iter()
    .fold(value, |value, hook| match (hook.transform)(value) {
      Ok(transformed) => transformed,
      Err(untouched) => {
        trace!(namespace, hook = hook.type_name, "hook skipped, value type differs");
        untouched
      }
    })
}
