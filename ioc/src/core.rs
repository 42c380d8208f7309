//! Core, non-public data structures for the IoC container.

use crate::container::Container;
use crate::error::{Error, Result};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A resolved value. Every binding, module and package resolves to one of these.
///
/// Two resolutions of the same singleton namespace return `Arc`s for which
/// `Arc::ptr_eq` holds.
pub type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) type FactoryFn = dyn Fn(&Container) -> Result<Instance> + Send + Sync;

thread_local! {
  // The namespaces and definitions currently being resolved on this thread,
  // outermost first.
  static RESOLVING_STACK: RefCell<Vec<Frame>> = RefCell::new(Vec::new());
}

#[derive(Clone, PartialEq, Eq)]
enum FrameKind {
  Namespace(String),
  Definition(String),
}

#[derive(Clone)]
struct Frame {
  container: usize,
  kind: FrameKind,
}

impl fmt::Display for Frame {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.kind {
      FrameKind::Namespace(namespace) => f.write_str(namespace),
      FrameKind::Definition(name) => write!(f, "<{}>", name),
    }
  }
}

fn render_chain<'a>(frames: impl Iterator<Item = &'a Frame>, last: &'a Frame) -> String {
  frames
    .chain(std::iter::once(last))
    .map(|frame| frame.to_string())
    .collect::<Vec<_>>()
    .join(" -> ")
}

/// An RAII guard bounding recursive resolution.
///
/// When created, it pushes a frame onto the thread-local resolution stack.
/// Entering a namespace that is already on the stack for the same container
/// is a circular dependency; growing the stack past `max_depth` is reported as
/// `MaxDepthExceeded`. The frame is popped when the guard is dropped.
pub(crate) struct ResolutionGuard {
  _not_send: std::marker::PhantomData<*const ()>,
}

impl ResolutionGuard {
  pub(crate) fn enter_namespace(container: usize, namespace: &str, max_depth: usize) -> Result<Self> {
    Self::enter(
      Frame {
        container,
        kind: FrameKind::Namespace(namespace.to_owned()),
      },
      max_depth,
    )
  }

  pub(crate) fn enter_definition(container: usize, name: &str, max_depth: usize) -> Result<Self> {
    Self::enter(
      Frame {
        container,
        kind: FrameKind::Definition(name.to_owned()),
      },
      max_depth,
    )
  }

  fn enter(frame: Frame, max_depth: usize) -> Result<Self> {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      let same_container = |f: &&Frame| f.container == frame.container;

      // Definitions are anonymous constructions, only namespaces can repeat.
      if matches!(frame.kind, FrameKind::Namespace(_))
        && stack
          .iter()
          .filter(same_container)
          .any(|f| f.kind == frame.kind)
      {
        return Err(Error::CircularDependency {
          chain: render_chain(stack.iter().filter(same_container), &frame),
        });
      }

      // Frames of other containers nested on this thread do not count.
      let depth = stack.iter().filter(same_container).count();
      if depth >= max_depth {
        return Err(Error::MaxDepthExceeded {
          depth: max_depth,
          chain: render_chain(stack.iter().filter(same_container), &frame),
        });
      }

      trace!(depth = depth + 1, frame = %frame, "entering resolution frame");
      stack.push(frame);
      Ok(Self {
        _not_send: std::marker::PhantomData,
      })
    })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      stack.borrow_mut().pop();
    });
  }
}

pub(crate) enum Provider {
  Singleton {
    cell: OnceCell<Instance>,
    factory: Box<FactoryFn>,
  },
  Factory {
    factory: Box<FactoryFn>,
  },
}

impl Provider {
  pub(crate) fn singleton(factory: Box<FactoryFn>) -> Self {
    Provider::Singleton {
      cell: OnceCell::new(),
      factory,
    }
  }

  pub(crate) fn factory(factory: Box<FactoryFn>) -> Self {
    Provider::Factory { factory }
  }

  /// A singleton whose cache is already filled.
  pub(crate) fn instance(value: Instance) -> Self {
    Provider::Singleton {
      cell: OnceCell::with_value(value),
      factory: Box::new(|_| {
        Err(Error::InvalidArgument(
          "pre-initialized instance factory should not be called".to_owned(),
        ))
      }),
    }
  }

  pub(crate) fn is_singleton(&self) -> bool {
    matches!(self, Provider::Singleton { .. })
  }

  pub(crate) fn is_resolved(&self) -> bool {
    match self {
      Provider::Singleton { cell, .. } => cell.get().is_some(),
      Provider::Factory { .. } => false,
    }
  }

  /// Produces the binding's value, filling the singleton cache on first success.
  ///
  /// A failed singleton factory leaves the cache empty so a later call retries.
  pub(crate) fn provide(&self, container: &Container) -> Result<Instance> {
    match self {
      Provider::Singleton { cell, factory } => cell.get_or_try_init(|| factory(container)).cloned(),
      Provider::Factory { factory } => factory(container),
    }
  }
}
