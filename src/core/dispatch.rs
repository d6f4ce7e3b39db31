//! # Dispatch strategies over one key's callback records.
//!
//! All four strategies share the same pass structure: resolve the key (an
//! unknown key raises the warning notice and yields the strategy's empty
//! result), iterate the records by a live cursor, intercept failures at the
//! callback boundary, and run once-cleanup regardless of outcome.
//!
//! ## Rules
//! - The registry lock is re-acquired per cursor step and never held while a
//!   callback or sink runs, so callbacks may re-enter the bus.
//! - Panics are caught per callback and normalized into
//!   [`CallbackError::Panicked`].
//! - Cursor bookkeeping recomputes the invoked record's position by its
//!   registry slot after every invocation: a once-splice continues from the
//!   position that shifted in, a record drifted by re-entrant mutation is
//!   advanced past wherever it drifted to, and a record removed mid-flight
//!   leaves the cursor in place so nothing is skipped or run twice.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::{CatchUnwind, join_all};
use futures::task::noop_waker_ref;

use crate::core::bus::EventBus;
use crate::error::{CallbackError, DispatchError};
use crate::events::{BoxHandlerFuture, CallbackRecord, EventKey, Settlement};
use crate::notify::NotifyPhase;

/// Handler future with the panic boundary attached.
type Interception<R> = CatchUnwind<AssertUnwindSafe<BoxHandlerFuture<R>>>;

/// Fire-and-forget pass.
///
/// Drives each callback to its first suspension point in registration
/// order; pending remainders are detached to the runtime. Failures
/// surfaced during the pass go to the error sink, or accumulate into
/// [`DispatchError::CallbackFailures`] when no sink is configured.
pub(crate) fn immediate<A, R>(
    bus: &EventBus<A, R>,
    key: EventKey,
    args: Arc<A>,
) -> Result<(), DispatchError>
where
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    let known = bus.inner.registry.lock().exists(&key);
    if !known {
        bus.notify_unknown(NotifyPhase::Emit, &key, Some(&args));
        return Ok(());
    }

    let mut accumulated: Vec<CallbackError> = Vec::new();
    let mut index = 0usize;

    loop {
        let Some(record) = bus.inner.registry.lock().record_at(&key, index) else {
            break;
        };

        let mut fut = guard(record.handler.call(bus.clone(), Arc::clone(&args)));
        match drive_to_first_suspension(&mut fut) {
            Poll::Ready(outcome) => {
                if let Err(err) = normalize(outcome) {
                    intercept_immediate(bus, &key, &args, err, &mut accumulated);
                }
            }
            Poll::Pending => detach_remainder(bus, &key, &args, fut, &mut accumulated),
        }

        // once-cleanup runs whether the callback succeeded or not
        advance_cursor(bus, &key, &record, &mut index);
    }

    if accumulated.is_empty() {
        Ok(())
    } else {
        Err(DispatchError::CallbackFailures {
            key,
            errors: accumulated,
        })
    }
}

/// Wait-all pass.
///
/// Snapshots the records (consuming `once` entries in the same critical
/// section), launches every callback, and settles them jointly. The result
/// preserves registration order.
pub(crate) async fn wait_all<A, R>(
    bus: &EventBus<A, R>,
    key: EventKey,
    args: Arc<A>,
) -> Vec<Settlement<R>>
where
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    let snapshot = bus.inner.registry.lock().snapshot_consuming_once(&key);
    let Some(records) = snapshot else {
        bus.notify_unknown(NotifyPhase::EmitWait, &key, Some(&args));
        return Vec::new();
    };

    let invocations = records.into_iter().map(|record| {
        let bus = bus.clone();
        let key = key.clone();
        let args = Arc::clone(&args);
        async move {
            let outcome = guard(record.handler.call(bus.clone(), Arc::clone(&args))).await;
            match normalize(outcome) {
                Ok(value) => Settlement::Fulfilled(value),
                Err(err) => {
                    if !bus.notify_exec_error(NotifyPhase::EmitWait, &key, &args) {
                        tracing::debug!(key = %key, error = %err, "callback rejected during wait-all dispatch");
                    }
                    Settlement::Rejected(err)
                }
            }
        }
    });

    join_all(invocations).await
}

/// Sequential fail-fast pass.
///
/// Awaits each callback fully before invoking the next and collects their
/// values. The first failure aborts the pass after its cleanup ran.
pub(crate) async fn line_up<A, R>(
    bus: &EventBus<A, R>,
    key: EventKey,
    args: Arc<A>,
) -> Result<Vec<R>, DispatchError>
where
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    let known = bus.inner.registry.lock().exists(&key);
    if !known {
        bus.notify_unknown(NotifyPhase::EmitLineUp, &key, Some(&args));
        return Ok(Vec::new());
    }

    let mut values = Vec::new();
    let mut index = 0usize;

    loop {
        let Some(record) = bus.inner.registry.lock().record_at(&key, index) else {
            break;
        };

        let outcome = guard(record.handler.call(bus.clone(), Arc::clone(&args))).await;
        let failure = match normalize(outcome) {
            Ok(value) => {
                values.push(value);
                None
            }
            Err(err) => Some(err),
        };

        advance_cursor(bus, &key, &record, &mut index);

        if let Some(error) = failure {
            return Err(DispatchError::CallbackFailed { key, error });
        }
    }

    Ok(values)
}

/// Sequential capture-errors pass.
///
/// Same ordering and await discipline as [`line_up`], but every outcome is
/// recorded as a settlement and the pass never aborts.
pub(crate) async fn line_up_capture_err<A, R>(
    bus: &EventBus<A, R>,
    key: EventKey,
    args: Arc<A>,
) -> Vec<Settlement<R>>
where
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    let known = bus.inner.registry.lock().exists(&key);
    if !known {
        bus.notify_unknown(NotifyPhase::EmitLineUpCaptureErr, &key, Some(&args));
        return Vec::new();
    }

    let mut settlements = Vec::new();
    let mut index = 0usize;

    loop {
        let Some(record) = bus.inner.registry.lock().record_at(&key, index) else {
            break;
        };

        let outcome = guard(record.handler.call(bus.clone(), Arc::clone(&args))).await;
        settlements.push(match normalize(outcome) {
            Ok(value) => Settlement::Fulfilled(value),
            Err(err) => Settlement::Rejected(err),
        });

        advance_cursor(bus, &key, &record, &mut index);
    }

    settlements
}

/// Wraps one handler invocation with the panic boundary.
fn guard<R>(fut: BoxHandlerFuture<R>) -> Interception<R> {
    AssertUnwindSafe(fut).catch_unwind()
}

/// Polls `fut` once with a no-op waker: runs the callback to its first
/// suspension point without blocking.
fn drive_to_first_suspension<F>(fut: &mut F) -> Poll<F::Output>
where
    F: Future + Unpin,
{
    let mut cx = Context::from_waker(noop_waker_ref());
    fut.poll_unpin(&mut cx)
}

/// Collapses the panic boundary into a plain callback outcome.
fn normalize<R>(
    outcome: Result<Result<R, CallbackError>, Box<dyn Any + Send>>,
) -> Result<R, CallbackError> {
    match outcome {
        Ok(done) => done,
        Err(panic) => Err(CallbackError::from_panic(panic)),
    }
}

/// Routes one intercepted fire-and-forget failure: error sink when
/// configured, else accumulation for the end-of-pass fatal error.
fn intercept_immediate<A, R>(
    bus: &EventBus<A, R>,
    key: &EventKey,
    args: &Arc<A>,
    err: CallbackError,
    accumulated: &mut Vec<CallbackError>,
) where
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    if bus.notify_exec_error(NotifyPhase::Emit, key, args) {
        tracing::debug!(key = %key, error = %err, "callback failed; error sink notified");
    } else {
        accumulated.push(err);
    }
}

/// Hands a still-pending callback to the runtime so fire-and-forget
/// dispatch can return; a late failure of the detached part is reported
/// through the error path.
///
/// With no runtime active the remainder is dropped, and that failure
/// surfaces during the pass itself: it is intercepted like any other
/// pass failure (error sink, else accumulation).
fn detach_remainder<A, R>(
    bus: &EventBus<A, R>,
    key: &EventKey,
    args: &Arc<A>,
    fut: Interception<R>,
    accumulated: &mut Vec<CallbackError>,
) where
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let bus = bus.clone();
            let key = key.clone();
            let args = Arc::clone(args);
            handle.spawn(async move {
                if let Err(err) = normalize(fut.await) {
                    report_detached_failure(&bus, &key, &args, err);
                }
            });
        }
        Err(_) => {
            let err = CallbackError::fail("no async runtime to drive the suspended callback");
            intercept_immediate(bus, key, args, err, accumulated);
        }
    }
}

/// No-sink fallback for failures that outlive the fire-and-forget pass.
fn report_detached_failure<A, R>(bus: &EventBus<A, R>, key: &EventKey, args: &Arc<A>, err: CallbackError)
where
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    if !bus.notify_exec_error(NotifyPhase::Emit, key, args) {
        tracing::error!(key = %key, error = %err, "detached callback failed after fire-and-forget dispatch");
    }
}

/// Recomputes the cursor after an invocation.
///
/// Looks the invoked record up by slot: consumes it (and continues from the
/// position that shifted in) when it was a `once` record, advances past it
/// otherwise, and leaves the cursor untouched when the record was removed
/// re-entrantly during its own invocation.
fn advance_cursor<A, R>(
    bus: &EventBus<A, R>,
    key: &EventKey,
    record: &CallbackRecord<A, R>,
    index: &mut usize,
) where
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    let mut registry = bus.inner.registry.lock();
    if let Some(position) = registry.position_of_slot(key, record.slot) {
        if record.once {
            registry.remove_at(key, position);
            *index = position;
        } else {
            *index = position + 1;
        }
    }
}
