//! # Bus facade: registration, removal, queries, and dispatch entry points.
//!
//! [`EventBus`] is a cheap cloneable handle over shared state (registry,
//! sinks, extensions). Handlers receive a clone of the bus on every
//! invocation, so they can re-enter it freely: register, remove, query, or
//! dispatch further events mid-pass.
//!
//! ## Rules
//! - The registry lock is never held while a handler or sink runs; every
//!   operation locks, mutates or reads, and releases before calling out.
//! - Removal and lookup match by identity only: a registration sign
//!   ([`Token`]) or a handler handle ([`HandlerRef`] `Arc` identity).
//! - An operation targeting an unknown key is a warning, not an error: it
//!   goes to the warning sink when configured (else a `tracing` warning) and
//!   the operation completes as a no-op.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::core::builder::BusBuilder;
use crate::core::context::Extensions;
use crate::core::dispatch;
use crate::error::DispatchError;
use crate::events::{CallbackRef, EventKey, HandlerRef, Registry, Settlement, Token};
use crate::notify::{Notice, NoticeSink, NotifyKind, NotifyPhase};

/// Shared state behind every clone of one bus.
pub(crate) struct Inner<A, R> {
    pub(crate) registry: Mutex<Registry<A, R>>,
    pub(crate) extensions: RwLock<Extensions>,
    pub(crate) on_error: Option<NoticeSink<A>>,
    pub(crate) on_warning: Option<NoticeSink<A>>,
}

/// # Typed publish/subscribe event bus.
///
/// `A` is the dispatch argument payload (handlers receive it as `Arc<A>`);
/// `R` is the handler return value aggregated by the awaiting strategies.
///
/// Cloning the bus clones a handle to the same registry; dropping the last
/// handle drops the registry with it.
///
/// ## Example
/// ```rust
/// # fn main() -> Result<(), callbus::DispatchError> {
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use callbus::{CallbackError, EventBus, HandlerFn};
///
/// let bus: EventBus<u32> = EventBus::new();
/// let total = Arc::new(AtomicU32::new(0));
///
/// let sum = total.clone();
/// bus.on("push", HandlerFn::arc(move |_bus, n: Arc<u32>| {
///     let sum = sum.clone();
///     async move {
///         sum.fetch_add(*n, Ordering::Relaxed);
///         Ok::<_, CallbackError>(())
///     }
/// }));
///
/// bus.emit("push", 2)?;
/// bus.emit("push", 3)?;
/// assert_eq!(total.load(Ordering::Relaxed), 5);
/// # Ok(())
/// # }
/// ```
pub struct EventBus<A, R = ()> {
    pub(crate) inner: Arc<Inner<A, R>>,
}

impl<A, R> EventBus<A, R>
where
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Creates an empty bus with no sinks configured.
    pub fn new() -> Self {
        Self::from_parts(None, None)
    }

    /// Returns a builder for a bus with seeded events, sinks, and an
    /// initialization callback.
    pub fn builder() -> BusBuilder<A, R> {
        BusBuilder::new()
    }

    pub(crate) fn from_parts(
        on_error: Option<NoticeSink<A>>,
        on_warning: Option<NoticeSink<A>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(Registry::new()),
                extensions: RwLock::new(Extensions::default()),
                on_error,
                on_warning,
            }),
        }
    }

    // ---- Registration ----

    /// Registers `handler` under `key`; it stays until removed.
    ///
    /// Returns the registration sign, the caller's sole removal handle
    /// (beyond the handler handle itself).
    pub fn on(&self, key: impl Into<EventKey>, handler: HandlerRef<A, R>) -> Token {
        self.inner
            .registry
            .lock()
            .register(key.into(), handler, false, None)
    }

    /// Registers `handler` under `key` for a single dispatch.
    ///
    /// The record is removed as part of the dispatch that invokes it,
    /// whether the invocation succeeds or fails.
    pub fn once(&self, key: impl Into<EventKey>, handler: HandlerRef<A, R>) -> Token {
        self.inner
            .registry
            .lock()
            .register(key.into(), handler, true, None)
    }

    /// Like [`EventBus::on`], pinning a caller-chosen sign.
    ///
    /// Sign uniqueness is the caller's responsibility: removal and lookup by
    /// a duplicated sign affect every record carrying it.
    pub fn on_signed(&self, key: impl Into<EventKey>, handler: HandlerRef<A, R>, sign: Token) -> Token {
        self.inner
            .registry
            .lock()
            .register(key.into(), handler, false, Some(sign))
    }

    /// Like [`EventBus::once`], pinning a caller-chosen sign.
    pub fn once_signed(
        &self,
        key: impl Into<EventKey>,
        handler: HandlerRef<A, R>,
        sign: Token,
    ) -> Token {
        self.inner
            .registry
            .lock()
            .register(key.into(), handler, true, Some(sign))
    }

    // ---- Removal ----

    /// Removes every record under `key` matching `reference` (a sign or a
    /// handler handle).
    ///
    /// Targeting an unknown key raises the off-phase unknown-key warning and
    /// removes nothing. Survivors keep their relative order; the key is
    /// deleted once its last record goes.
    pub fn off(&self, key: impl Into<EventKey>, reference: impl Into<CallbackRef<A, R>>) -> &Self {
        let key = key.into();
        let known = self
            .inner
            .registry
            .lock()
            .remove_by_ref(&key, &reference.into());
        if !known {
            self.notify_unknown(NotifyPhase::Off, &key, None);
        }
        self
    }

    /// Removes every record carrying `sign` from every key.
    ///
    /// A sign matching nothing is a no-op, not an error.
    pub fn off_by_sign(&self, sign: Token) -> &Self {
        self.inner.registry.lock().remove_by_sign_global(sign);
        self
    }

    // ---- Queries ----

    /// Returns `true` iff `key` has registered callbacks.
    pub fn has(&self, key: impl Into<EventKey>) -> bool {
        self.inner.registry.lock().exists(&key.into())
    }

    /// Returns `true` iff some record under `key` matches `reference`.
    pub fn has_callback(
        &self,
        key: impl Into<EventKey>,
        reference: impl Into<CallbackRef<A, R>>,
    ) -> bool {
        self.inner
            .registry
            .lock()
            .has_ref(&key.into(), &reference.into())
    }

    /// Returns `true` iff any key holds a record carrying `sign`.
    pub fn has_callback_by_sign(&self, sign: Token) -> bool {
        self.inner.registry.lock().has_sign_global(sign)
    }

    /// Number of keys with registered callbacks.
    pub fn len(&self) -> usize {
        self.inner.registry.lock().len()
    }

    /// Returns `true` when no key has registered callbacks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the extension of type `T` installed during construction, if
    /// any.
    pub fn extension<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.inner.extensions.read().get::<T>()
    }

    // ---- Dispatch ----

    /// Fire-and-forget dispatch: invokes every callback under `key` in
    /// registration order, driving each one to its first suspension point
    /// before moving on.
    ///
    /// A callback still pending after that first drive is detached to the
    /// current tokio runtime and finishes on its own; a later failure of a
    /// detached callback goes to the error sink when configured, else to a
    /// `tracing` error. With no runtime active, the pending remainder is
    /// dropped and that failure is routed like any other failure surfaced
    /// during the pass: error sink when configured, else accumulated.
    ///
    /// Failures surfaced during the pass go to the error sink when
    /// configured and dispatch continues. With no sink they accumulate, and
    /// the pass returns [`DispatchError::CallbackFailures`] carrying all of
    /// them; this is the only dispatch strategy whose outcome depends on
    /// sink configuration.
    pub fn emit(&self, key: impl Into<EventKey>, args: A) -> Result<(), DispatchError> {
        dispatch::immediate(self, key.into(), Arc::new(args))
    }

    /// Wait-all dispatch: launches every callback under `key` without
    /// sequencing between them, then waits for all of them to settle.
    ///
    /// Returns one [`Settlement`] per callback registered at call time, in
    /// registration order, regardless of completion timing. A rejection
    /// additionally notifies the error sink when configured; it never stops
    /// the other callbacks.
    pub async fn emit_wait(&self, key: impl Into<EventKey>, args: A) -> Vec<Settlement<R>> {
        dispatch::wait_all(self, key.into(), Arc::new(args)).await
    }

    /// Sequential fail-fast dispatch: awaits each callback in registration
    /// order, collecting their values; the first failure aborts the pass.
    ///
    /// The failing callback's cleanup (once-removal, empty-key deletion)
    /// runs before the error is returned; remaining callbacks are skipped.
    pub async fn emit_line_up(
        &self,
        key: impl Into<EventKey>,
        args: A,
    ) -> Result<Vec<R>, DispatchError> {
        dispatch::line_up(self, key.into(), Arc::new(args)).await
    }

    /// Sequential capture-errors dispatch: awaits each callback in
    /// registration order and records every outcome; never aborts.
    ///
    /// Returns one [`Settlement`] per callback, the same shape as
    /// [`EventBus::emit_wait`] but produced by strictly sequential
    /// execution.
    pub async fn emit_line_up_capture_err(
        &self,
        key: impl Into<EventKey>,
        args: A,
    ) -> Vec<Settlement<R>> {
        dispatch::line_up_capture_err(self, key.into(), Arc::new(args)).await
    }

    // ---- Notices ----

    /// Signals the unknown-key condition to the warning sink, falling back
    /// to a `tracing` warning.
    pub(crate) fn notify_unknown(&self, phase: NotifyPhase, key: &EventKey, args: Option<&A>) {
        match &self.inner.on_warning {
            Some(sink) => sink(Notice {
                phase,
                kind: NotifyKind::NotExist,
                key,
                args,
            }),
            None => {
                tracing::warn!(phase = phase.as_label(), key = %key, "event key does not exist");
            }
        }
    }

    /// Signals a callback failure to the error sink.
    ///
    /// Returns `true` when a sink consumed the notice; the caller owns the
    /// no-sink fallback, which differs per strategy.
    pub(crate) fn notify_exec_error(&self, phase: NotifyPhase, key: &EventKey, args: &A) -> bool {
        match &self.inner.on_error {
            Some(sink) => {
                sink(Notice {
                    phase,
                    kind: NotifyKind::ExecError,
                    key,
                    args: Some(args),
                });
                true
            }
            None => false,
        }
    }
}

impl<A, R> Clone for EventBus<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> Default for EventBus<A, R>
where
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> fmt::Debug for EventBus<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("keys", &self.inner.registry.lock().len())
            .field("error_sink", &self.inner.on_error.is_some())
            .field("warning_sink", &self.inner.on_warning.is_some())
            .finish()
    }
}
