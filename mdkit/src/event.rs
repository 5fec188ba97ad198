//! Synchronous, cancellable events.
//!
//! Listeners are registered per concrete event type and run in priority
//! order. Each listener decides whether the event keeps propagating by
//! returning a [`Propagation`]; returning [`Propagation::Stop`] skips every
//! listener after it for that dispatch.
use std::{any::Any, marker::PhantomData};

use crate::inject::Injectable;

/// Marker for types that can be dispatched through an environment.
///
/// Listeners are matched on the exact type, there is no dispatch to
/// "parent" event types.
pub trait Event: Any + Send {}

/// Whether dispatch continues after a listener ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
  #[default]
  Continue,
  Stop,
}

impl Propagation {
  #[must_use]
  pub const fn is_stopped(self) -> bool {
    matches!(self, Self::Stop)
  }
}

/// Error raised by a listener. It reaches the caller of `dispatch` as is.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for event listeners.
pub type ListenerResult = Result<Propagation, ListenerError>;

/// A listener object for events of type `E`.
///
/// Plain closures are registered with `add_event_listener`; implement this
/// trait when the listener needs injected dependencies.
pub trait EventListener<E: Event>: Injectable + Send + Sync {
  /// # Errors
  ///
  /// Any error is propagated unmodified to the dispatcher's caller.
  fn handle(&self, event: &mut E) -> ListenerResult;
}

/// Adapter turning a closure into an [`EventListener`].
pub(crate) struct FnListener<F>(pub(crate) F);

impl<F> Injectable for FnListener<F> {}

impl<E, F> EventListener<E> for FnListener<F>
where
  E: Event,
  F: Fn(&mut E) -> ListenerResult + Send + Sync,
{
  fn handle(&self, event: &mut E) -> ListenerResult {
    (self.0)(event)
  }
}

/// Listener with its event type erased, so listeners for different event
/// types can share one table keyed by `TypeId`.
pub(crate) trait ErasedListener: Send + Sync {
  fn call(&self, event: &mut dyn Any) -> ListenerResult;

  fn injectable(&mut self) -> &mut dyn Injectable;
}

pub(crate) struct TypedListener<E, L> {
  listener: L,
  _event:   PhantomData<fn(&mut E)>,
}

impl<E, L> TypedListener<E, L> {
  pub(crate) const fn new(listener: L) -> Self {
    Self {
      listener,
      _event: PhantomData,
    }
  }
}

impl<E, L> ErasedListener for TypedListener<E, L>
where
  E: Event,
  L: EventListener<E>,
{
  fn call(&self, event: &mut dyn Any) -> ListenerResult {
    // The table is keyed by `TypeId::of::<E>()`, so this always succeeds.
    event
      .downcast_mut::<E>()
      .map_or(Ok(Propagation::Continue), |event| self.listener.handle(event))
  }

  fn injectable(&mut self) -> &mut dyn Injectable {
    &mut self.listener
  }
}
