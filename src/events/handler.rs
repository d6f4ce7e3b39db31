//! # Callback abstraction and function-backed handler implementation.
//!
//! This module defines the [`Handler`] trait and a convenient function-backed
//! implementation [`HandlerFn`]. The common handle type is [`HandlerRef`], an
//! `Arc<dyn Handler>` suitable for sharing across registrations.
//!
//! A handler receives a clone of the [`EventBus`] it was dispatched from (so
//! it may re-enter the bus: register, remove, or dispatch further events) and
//! the dispatch arguments behind an `Arc`. Synchronous callbacks are handlers
//! whose future completes without suspending.
//!
//! Handler identity is the `Arc` allocation: [`CallbackRef::Handler`] matches
//! a registration only when built from a clone of the same [`HandlerRef`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use callbus::{CallbackError, EventBus, HandlerFn, HandlerRef};
//!
//! let shout: HandlerRef<String> = HandlerFn::arc(|_bus, msg: Arc<String>| async move {
//!     println!("{}", msg.to_uppercase());
//!     Ok::<_, CallbackError>(())
//! });
//!
//! let bus: EventBus<String> = EventBus::new();
//! bus.on("say", shout.clone());
//! assert!(bus.has_callback("say", &shout));
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::core::EventBus;
use crate::error::CallbackError;
use crate::events::key::Token;

/// Boxed future produced by one handler invocation.
pub type BoxHandlerFuture<R> = BoxFuture<'static, Result<R, CallbackError>>;

/// Shared handler handle (`Arc<dyn Handler>`).
pub type HandlerRef<A, R = ()> = Arc<dyn Handler<A, R>>;

/// # Asynchronous event callback.
///
/// A `Handler` is invoked with a clone of the dispatching bus and the
/// dispatch arguments; it returns a boxed future resolving to the handler's
/// value or a [`CallbackError`]. Each invocation must produce a fresh future.
///
/// Most callers use [`HandlerFn`] instead of implementing this directly.
pub trait Handler<A, R = ()>: Send + Sync + 'static {
    /// Starts one invocation of the callback.
    fn call(&self, bus: EventBus<A, R>, args: Arc<A>) -> BoxHandlerFuture<R>;
}

/// Function-backed handler implementation.
///
/// Wraps a closure that *creates* a new future per invocation.
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the handler and returns it as a shared handle.
    ///
    /// ## Example
    /// ```rust
    /// use callbus::{CallbackError, HandlerFn, HandlerRef};
    ///
    /// let h: HandlerRef<u32, u32> = HandlerFn::arc(|_bus, n| async move {
    ///     Ok::<_, CallbackError>(*n * 2)
    /// });
    /// ```
    pub fn arc<A, R, Fut>(f: F) -> HandlerRef<A, R>
    where
        A: Send + Sync + 'static,
        R: Send + 'static,
        F: Fn(EventBus<A, R>, Arc<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, CallbackError>> + Send + 'static,
    {
        Arc::new(Self::new(f))
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

impl<A, R, F, Fut> Handler<A, R> for HandlerFn<F>
where
    A: Send + Sync + 'static,
    R: Send + 'static,
    F: Fn(EventBus<A, R>, Arc<A>) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<R, CallbackError>> + Send + 'static,
{
    fn call(&self, bus: EventBus<A, R>, args: Arc<A>) -> BoxHandlerFuture<R> {
        let fut = (self.f)(bus, args);
        Box::pin(fut)
    }
}

/// Removal and lookup target: a registration sign or a handler handle.
///
/// Matching is by identity in both cases. A [`Token`] matches records whose
/// sign is a copy of it; a [`HandlerRef`] matches records holding a clone of
/// the same `Arc` allocation.
pub enum CallbackRef<A, R = ()> {
    /// Match records by registration sign.
    Sign(Token),
    /// Match records by handler identity.
    Handler(HandlerRef<A, R>),
}

impl<A, R> Clone for CallbackRef<A, R> {
    fn clone(&self) -> Self {
        match self {
            CallbackRef::Sign(sign) => CallbackRef::Sign(*sign),
            CallbackRef::Handler(handler) => CallbackRef::Handler(Arc::clone(handler)),
        }
    }
}

impl<A, R> fmt::Debug for CallbackRef<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackRef::Sign(sign) => f.debug_tuple("Sign").field(sign).finish(),
            CallbackRef::Handler(handler) => f
                .debug_tuple("Handler")
                .field(&Arc::as_ptr(handler))
                .finish(),
        }
    }
}

impl<A, R> From<Token> for CallbackRef<A, R> {
    fn from(sign: Token) -> Self {
        CallbackRef::Sign(sign)
    }
}

impl<A, R> From<HandlerRef<A, R>> for CallbackRef<A, R> {
    fn from(handler: HandlerRef<A, R>) -> Self {
        CallbackRef::Handler(handler)
    }
}

impl<A, R> From<&HandlerRef<A, R>> for CallbackRef<A, R> {
    fn from(handler: &HandlerRef<A, R>) -> Self {
        CallbackRef::Handler(Arc::clone(handler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_fn_produces_fresh_futures() {
        let h: HandlerRef<u32, u32> =
            HandlerFn::arc(|_bus, n: Arc<u32>| async move { Ok(*n + 1) });

        let bus = crate::EventBus::new();
        let a = h.call(bus.clone(), Arc::new(1));
        let b = h.call(bus, Arc::new(2));
        assert_eq!(futures::executor::block_on(a).unwrap(), 2);
        assert_eq!(futures::executor::block_on(b).unwrap(), 3);
    }

    #[test]
    fn test_callback_ref_identity() {
        let h: HandlerRef<(), ()> = HandlerFn::arc(|_bus, _| async { Ok(()) });
        let same = CallbackRef::from(&h);
        let other: HandlerRef<(), ()> = HandlerFn::arc(|_bus, _| async { Ok(()) });

        match (&same, &CallbackRef::from(&other)) {
            (CallbackRef::Handler(a), CallbackRef::Handler(b)) => {
                assert!(Arc::ptr_eq(a, &h));
                assert!(!Arc::ptr_eq(a, b));
            }
            _ => unreachable!(),
        }
    }
}
