//! # Warning and error notices delivered to the bus sinks.
//!
//! The bus reports two recoverable conditions out of band instead of failing
//! the triggering call:
//!
//! - **unknown key** ([`NotifyKind::NotExist`]): a dispatch or removal
//!   targeted a key with no registered callbacks;
//! - **callback failure** ([`NotifyKind::ExecError`]): a callback failed
//!   during fire-and-forget or wait-all dispatch.
//!
//! A configured sink receives a borrowed [`Notice`] naming the phase, the
//! kind, the key, and the dispatch arguments (when the phase has any). With
//! no sink configured, unknown-key notices fall back to a `tracing` warning;
//! the fire-and-forget failure fallback is described on
//! [`EventBus::emit`](crate::EventBus::emit).

use std::fmt;
use std::sync::Arc;

use crate::events::EventKey;

/// Shared notification sink handle.
pub type NoticeSink<A> = Arc<dyn Fn(Notice<'_, A>) + Send + Sync>;

/// Bus operation during which a notice was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyPhase {
    /// Fire-and-forget dispatch.
    Emit,
    /// Wait-all dispatch.
    EmitWait,
    /// Sequential fail-fast dispatch.
    EmitLineUp,
    /// Sequential capture-errors dispatch.
    EmitLineUpCaptureErr,
    /// Targeted removal.
    Off,
}

impl NotifyPhase {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            NotifyPhase::Emit => "emit",
            NotifyPhase::EmitWait => "emit_wait",
            NotifyPhase::EmitLineUp => "emit_line_up",
            NotifyPhase::EmitLineUpCaptureErr => "emit_line_up_capture_err",
            NotifyPhase::Off => "off",
        }
    }
}

impl fmt::Display for NotifyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Classification of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyKind {
    /// The targeted key has no registered callbacks.
    NotExist,
    /// A callback failed while the strategy kept going.
    ExecError,
}

impl NotifyKind {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            NotifyKind::NotExist => "not_exist",
            NotifyKind::ExecError => "exec_error",
        }
    }
}

impl fmt::Display for NotifyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One notice delivered to a sink.
///
/// `args` is `None` for [`NotifyPhase::Off`] notices, which carry no
/// dispatch arguments.
#[derive(Debug)]
pub struct Notice<'a, A> {
    /// Operation that raised the notice.
    pub phase: NotifyPhase,
    /// Notice classification.
    pub kind: NotifyKind,
    /// Key the operation targeted.
    pub key: &'a EventKey,
    /// Arguments of the dispatch that raised the notice.
    pub args: Option<&'a A>,
}

impl<A> Clone for Notice<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for Notice<'_, A> {}
