//! # Callback storage: ordered records per event key.
//!
//! The registry owns the mapping from [`EventKey`] to an ordered list of
//! [`CallbackRecord`]s. Insertion order is dispatch order.
//!
//! ## Rules
//! - A key present in the map always has a non-empty record list; every
//!   mutation that can empty a list deletes the key in the same step.
//! - Removal matches by identity only: sign equality or handler `Arc`
//!   identity. Survivors keep their relative order.
//! - Each record carries a private `slot` id unique within the registry, so
//!   dispatch can find and remove exactly the record it invoked even when
//!   several records share a caller-supplied sign.
//!
//! Locking lives in the bus; the registry itself is plain single-threaded
//! state.

use std::collections::HashMap;
use std::sync::Arc;

use crate::events::handler::{CallbackRef, HandlerRef};
use crate::events::key::{EventKey, Token};

/// One registered callback under a key.
pub(crate) struct CallbackRecord<A, R> {
    /// Shared handler to invoke.
    pub(crate) handler: HandlerRef<A, R>,
    /// Remove the record as part of its single dispatch.
    pub(crate) once: bool,
    /// Identity sign returned to the registering caller.
    pub(crate) sign: Token,
    /// Registry-unique id for exact removal during dispatch.
    pub(crate) slot: u64,
}

impl<A, R> CallbackRecord<A, R> {
    /// Returns `true` if the record matches the removal/lookup reference.
    pub(crate) fn matches(&self, reference: &CallbackRef<A, R>) -> bool {
        match reference {
            CallbackRef::Sign(sign) => self.sign == *sign,
            CallbackRef::Handler(handler) => Arc::ptr_eq(&self.handler, handler),
        }
    }
}

impl<A, R> Clone for CallbackRecord<A, R> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            once: self.once,
            sign: self.sign,
            slot: self.slot,
        }
    }
}

/// Ordered callback storage for one bus.
pub(crate) struct Registry<A, R> {
    map: HashMap<EventKey, Vec<CallbackRecord<A, R>>>,
    next_slot: u64,
}

impl<A, R> Registry<A, R> {
    pub(crate) fn new() -> Self {
        Self {
            map: HashMap::new(),
            next_slot: 0,
        }
    }

    /// Appends a record under `key`, creating the list if absent.
    ///
    /// Generates a fresh sign when the caller did not pin one. The sign is
    /// returned unconditionally; it is the caller's sole removal handle.
    pub(crate) fn register(
        &mut self,
        key: EventKey,
        handler: HandlerRef<A, R>,
        once: bool,
        sign: Option<Token>,
    ) -> Token {
        let sign = sign.unwrap_or_else(Token::next);
        let slot = self.next_slot;
        self.next_slot += 1;
        self.map.entry(key).or_default().push(CallbackRecord {
            handler,
            once,
            sign,
            slot,
        });
        sign
    }

    /// Removes every record under `key` matching `reference`.
    ///
    /// Returns `false` when the key is unknown (the caller signals the
    /// unknown-key condition); performs no mutation in that case.
    pub(crate) fn remove_by_ref(&mut self, key: &EventKey, reference: &CallbackRef<A, R>) -> bool {
        let Some(records) = self.map.get_mut(key) else {
            return false;
        };
        records.retain(|record| !record.matches(reference));
        self.prune(key);
        true
    }

    /// Removes every record carrying `sign` across all keys.
    ///
    /// No-op when the sign matches nothing.
    pub(crate) fn remove_by_sign_global(&mut self, sign: Token) {
        self.map.retain(|_, records| {
            records.retain(|record| record.sign != sign);
            !records.is_empty()
        });
    }

    /// Unconditionally deletes one key with all its records.
    pub(crate) fn remove_key(&mut self, key: &EventKey) -> bool {
        self.map.remove(key).is_some()
    }

    /// Unconditionally deletes every key.
    pub(crate) fn remove_all_keys(&mut self) {
        self.map.clear();
    }

    /// Returns `true` iff `key` currently maps to a non-empty record list.
    pub(crate) fn exists(&self, key: &EventKey) -> bool {
        self.map.contains_key(key)
    }

    /// Returns `true` iff some record under `key` matches `reference`.
    pub(crate) fn has_ref(&self, key: &EventKey, reference: &CallbackRef<A, R>) -> bool {
        self.map
            .get(key)
            .is_some_and(|records| records.iter().any(|record| record.matches(reference)))
    }

    /// Returns `true` iff any key holds a record carrying `sign`.
    pub(crate) fn has_sign_global(&self, sign: Token) -> bool {
        self.map
            .values()
            .any(|records| records.iter().any(|record| record.sign == sign))
    }

    /// Number of registered keys.
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    // ---- Dispatch support ----

    /// Clones the record currently at `index` under `key`, if any.
    pub(crate) fn record_at(&self, key: &EventKey, index: usize) -> Option<CallbackRecord<A, R>> {
        self.map.get(key).and_then(|records| records.get(index)).cloned()
    }

    /// Current position of the record with `slot` under `key`, if it is
    /// still registered.
    pub(crate) fn position_of_slot(&self, key: &EventKey, slot: u64) -> Option<usize> {
        self.map
            .get(key)
            .and_then(|records| records.iter().position(|record| record.slot == slot))
    }

    /// Removes the record at `index` under `key`, deleting the key if its
    /// list empties.
    pub(crate) fn remove_at(&mut self, key: &EventKey, index: usize) {
        if let Some(records) = self.map.get_mut(key) {
            if index < records.len() {
                records.remove(index);
            }
        }
        self.prune(key);
    }

    /// Clones the full record list for `key` and consumes its `once` records
    /// in the same step, deleting the key if the list empties.
    ///
    /// Used by the wait-all strategy: the snapshot launches concurrently, so
    /// once records must be gone before any re-entrant dispatch can observe
    /// them.
    pub(crate) fn snapshot_consuming_once(
        &mut self,
        key: &EventKey,
    ) -> Option<Vec<CallbackRecord<A, R>>> {
        let records = self.map.get_mut(key)?;
        let snapshot = records.clone();
        records.retain(|record| !record.once);
        self.prune(key);
        Some(snapshot)
    }

    /// Deletes `key` if its record list became empty.
    fn prune(&mut self, key: &EventKey) {
        if self.map.get(key).is_some_and(Vec::is_empty) {
            self.map.remove(key);
        }
    }
}

impl<A, R> Default for Registry<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::handler::HandlerFn;

    fn noop() -> HandlerRef<(), ()> {
        HandlerFn::arc(|_bus, _args| async { Ok(()) })
    }

    #[test]
    fn test_register_creates_and_appends() {
        let mut reg: Registry<(), ()> = Registry::new();
        let key = EventKey::from("push");

        let first = reg.register(key.clone(), noop(), false, None);
        let second = reg.register(key.clone(), noop(), false, None);

        assert_ne!(first, second);
        assert!(reg.exists(&key));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.record_at(&key, 0).map(|r| r.sign), Some(first));
        assert_eq!(reg.record_at(&key, 1).map(|r| r.sign), Some(second));
        assert!(reg.record_at(&key, 2).is_none());
    }

    #[test]
    fn test_pinned_sign_is_returned() {
        let mut reg: Registry<(), ()> = Registry::new();
        let pinned = Token::next();
        let sign = reg.register(EventKey::from("a"), noop(), false, Some(pinned));
        assert_eq!(sign, pinned);
    }

    #[test]
    fn test_remove_by_sign_keeps_order() {
        let mut reg: Registry<(), ()> = Registry::new();
        let key = EventKey::from("k");
        let a = reg.register(key.clone(), noop(), false, None);
        let b = reg.register(key.clone(), noop(), false, None);
        let c = reg.register(key.clone(), noop(), false, None);

        assert!(reg.remove_by_ref(&key, &CallbackRef::Sign(b)));
        let order: Vec<Token> = (0..2)
            .filter_map(|i| reg.record_at(&key, i).map(|r| r.sign))
            .collect();
        assert_eq!(order, vec![a, c]);
    }

    #[test]
    fn test_remove_by_handler_identity() {
        let mut reg: Registry<(), ()> = Registry::new();
        let key = EventKey::from("k");
        let shared = noop();
        reg.register(key.clone(), shared.clone(), false, None);
        reg.register(key.clone(), noop(), false, None);

        assert!(reg.has_ref(&key, &CallbackRef::from(&shared)));
        assert!(reg.remove_by_ref(&key, &CallbackRef::from(&shared)));
        assert!(!reg.has_ref(&key, &CallbackRef::from(&shared)));
        assert!(reg.exists(&key));
    }

    #[test]
    fn test_unknown_key_removal_reports_false() {
        let mut reg: Registry<(), ()> = Registry::new();
        assert!(!reg.remove_by_ref(&EventKey::from("nope"), &CallbackRef::Sign(Token::next())));
    }

    #[test]
    fn test_empty_key_is_deleted() {
        let mut reg: Registry<(), ()> = Registry::new();
        let key = EventKey::from("k");
        let sign = reg.register(key.clone(), noop(), false, None);

        assert!(reg.remove_by_ref(&key, &CallbackRef::Sign(sign)));
        assert!(!reg.exists(&key));
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn test_remove_by_sign_global_spans_keys() {
        let mut reg: Registry<(), ()> = Registry::new();
        let sign = Token::next();
        reg.register(EventKey::from("a"), noop(), false, Some(sign));
        reg.register(EventKey::from("b"), noop(), false, Some(sign));
        reg.register(EventKey::from("b"), noop(), false, None);

        assert!(reg.has_sign_global(sign));
        reg.remove_by_sign_global(sign);
        assert!(!reg.has_sign_global(sign));
        assert!(!reg.exists(&EventKey::from("a")));
        assert!(reg.exists(&EventKey::from("b")));

        // unmatched sign is a no-op
        reg.remove_by_sign_global(Token::next());
        assert!(reg.exists(&EventKey::from("b")));
    }

    #[test]
    fn test_duplicate_signs_all_match() {
        let mut reg: Registry<(), ()> = Registry::new();
        let key = EventKey::from("k");
        let dup = Token::next();
        reg.register(key.clone(), noop(), false, Some(dup));
        reg.register(key.clone(), noop(), false, Some(dup));

        assert!(reg.remove_by_ref(&key, &CallbackRef::Sign(dup)));
        assert!(!reg.exists(&key));
    }

    #[test]
    fn test_slot_position_tracks_shifts() {
        let mut reg: Registry<(), ()> = Registry::new();
        let key = EventKey::from("k");
        let a = reg.register(key.clone(), noop(), false, None);
        reg.register(key.clone(), noop(), false, None);

        let second = reg.record_at(&key, 1).unwrap();
        assert_eq!(reg.position_of_slot(&key, second.slot), Some(1));

        assert!(reg.remove_by_ref(&key, &CallbackRef::Sign(a)));
        assert_eq!(reg.position_of_slot(&key, second.slot), Some(0));

        reg.remove_at(&key, 0);
        assert_eq!(reg.position_of_slot(&key, second.slot), None);
        assert!(!reg.exists(&key));
    }

    #[test]
    fn test_snapshot_consumes_once_records() {
        let mut reg: Registry<(), ()> = Registry::new();
        let key = EventKey::from("k");
        let keep = reg.register(key.clone(), noop(), false, None);
        let gone = reg.register(key.clone(), noop(), true, None);

        let snapshot = reg.snapshot_consuming_once(&key).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].sign, keep);
        assert_eq!(snapshot[1].sign, gone);

        assert!(reg.has_sign_global(keep));
        assert!(!reg.has_sign_global(gone));
        assert!(reg.exists(&key));
    }

    #[test]
    fn test_snapshot_of_all_once_deletes_key() {
        let mut reg: Registry<(), ()> = Registry::new();
        let key = EventKey::from("k");
        reg.register(key.clone(), noop(), true, None);

        let snapshot = reg.snapshot_consuming_once(&key).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(!reg.exists(&key));
        assert!(reg.snapshot_consuming_once(&key).is_none());
    }

    #[test]
    fn test_remove_all_keys() {
        let mut reg: Registry<(), ()> = Registry::new();
        reg.register(EventKey::from("a"), noop(), false, None);
        reg.register(EventKey::from(Token::next()), noop(), false, None);
        assert_eq!(reg.len(), 2);

        reg.remove_all_keys();
        assert_eq!(reg.len(), 0);

        assert!(!reg.remove_key(&EventKey::from("a")));
    }
}
