use std::sync::Arc;

use crate::core::bus::EventBus;
use crate::core::context::BusContext;
use crate::events::{EventKey, HandlerRef};
use crate::notify::{Notice, NoticeSink};

/// Builder for constructing an [`EventBus`] with seeded events, sinks, and
/// an initialization callback.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use callbus::{CallbackError, EventBus, HandlerFn, Notice};
///
/// let bus: EventBus<String> = EventBus::builder()
///     .with_event(
///         "boot",
///         HandlerFn::arc(|_bus, msg: Arc<String>| async move {
///             println!("boot: {msg}");
///             Ok::<_, CallbackError>(())
///         }),
///     )
///     .with_warning_sink(|notice: Notice<'_, String>| {
///         eprintln!("warning: {} on {}", notice.kind, notice.key);
///     })
///     .build();
///
/// assert!(bus.has("boot"));
/// ```
pub struct BusBuilder<A, R = ()> {
    seeds: Vec<(EventKey, HandlerRef<A, R>)>,
    on_error: Option<NoticeSink<A>>,
    on_warning: Option<NoticeSink<A>>,
    init: Option<Box<dyn FnOnce(BusContext<'_, A, R>) + Send>>,
}

impl<A, R> BusBuilder<A, R>
where
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            seeds: Vec::new(),
            on_error: None,
            on_warning: None,
            init: None,
        }
    }

    /// Seeds a permanent record installed at build time.
    ///
    /// Seeded records get fresh signs the builder never exposes, so they are
    /// removable only wholesale (`BusContext::clear`/`clear_all`) or by the
    /// handler handle the caller kept.
    pub fn with_event(mut self, key: impl Into<EventKey>, handler: HandlerRef<A, R>) -> Self {
        self.seeds.push((key.into(), handler));
        self
    }

    /// Sets the sink receiving callback-failure notices.
    ///
    /// With a sink configured, fire-and-forget dispatch never returns the
    /// accumulated-failures error; failures are signaled here instead.
    pub fn with_error_sink(mut self, sink: impl Fn(Notice<'_, A>) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(sink));
        self
    }

    /// Sets the sink receiving unknown-key notices.
    ///
    /// Without it, unknown-key conditions fall back to a `tracing` warning.
    pub fn with_warning_sink(
        mut self,
        sink: impl Fn(Notice<'_, A>) + Send + Sync + 'static,
    ) -> Self {
        self.on_warning = Some(Arc::new(sink));
        self
    }

    /// Sets the initialization callback, invoked once, synchronously, at the
    /// end of [`BusBuilder::build`] with the capability context.
    pub fn with_init(mut self, init: impl FnOnce(BusContext<'_, A, R>) + Send + 'static) -> Self {
        self.init = Some(Box::new(init));
        self
    }

    /// Builds the bus: installs the seeded records, then runs the init
    /// callback.
    pub fn build(self) -> EventBus<A, R> {
        let bus = EventBus::from_parts(self.on_error, self.on_warning);

        {
            let mut registry = bus.inner.registry.lock();
            for (key, handler) in self.seeds {
                registry.register(key, handler, false, None);
            }
        }

        if let Some(init) = self.init {
            init(BusContext::new(&bus));
        }

        bus
    }
}

impl<A, R> Default for BusBuilder<A, R>
where
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::events::{HandlerFn, Token};

    #[test]
    fn test_seeded_events_exist_without_on() {
        let bus: EventBus<u32> = EventBus::<u32>::builder()
            .with_event("test", HandlerFn::arc(|_bus, _n: Arc<u32>| async { Ok(()) }))
            .build();

        assert!(bus.has("test"));
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn test_seeded_records_fire_on_emit() {
        let hits = Arc::new(AtomicU32::new(0));
        let counted = Arc::clone(&hits);

        let bus: EventBus<u32> = EventBus::<u32>::builder()
            .with_event(
                "tick",
                HandlerFn::arc(move |_bus, _n: Arc<u32>| {
                    let counted = counted.clone();
                    async move {
                        counted.fetch_add(1, Ordering::Relaxed);
                        Ok(())
                    }
                }),
            )
            .build();

        bus.emit("tick", 0).unwrap();
        bus.emit("tick", 0).unwrap();
        assert_eq!(hits.load(Ordering::Relaxed), 2);
        // seeded records are permanent, not once
        assert!(bus.has("tick"));
    }

    #[test]
    fn test_init_runs_once_with_capabilities() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        let bus: EventBus<u32> = EventBus::<u32>::builder()
            .with_event("a", HandlerFn::arc(|_bus, _n: Arc<u32>| async { Ok(()) }))
            .with_event("b", HandlerFn::arc(|_bus, _n: Arc<u32>| async { Ok(()) }))
            .with_init(move |ctx| {
                log.lock().push(ctx.bus().len());
                ctx.set_extension(String::from("configured"));
                assert!(ctx.clear("a"));
                assert!(!ctx.clear("a"));
            })
            .build();

        assert_eq!(*seen.lock(), vec![2]);
        assert!(!bus.has("a"));
        assert!(bus.has("b"));
        assert_eq!(
            bus.extension::<String>().as_deref().map(String::as_str),
            Some("configured")
        );
    }

    #[test]
    fn test_init_can_register_and_clear_all() {
        let bus: EventBus<u32> = EventBus::<u32>::builder()
            .with_event("stale", HandlerFn::arc(|_bus, _n: Arc<u32>| async { Ok(()) }))
            .with_init(|ctx| {
                ctx.clear_all();
                ctx.bus()
                    .on("fresh", HandlerFn::arc(|_bus, _n: Arc<u32>| async { Ok(()) }));
            })
            .build();

        assert!(!bus.has("stale"));
        assert!(bus.has("fresh"));
    }

    #[test]
    fn test_seeded_signs_are_not_exposed_but_removable_by_handler() {
        let handler = HandlerFn::arc(|_bus, _n: Arc<u32>| async { Ok(()) });
        let bus: EventBus<u32> = EventBus::<u32>::builder()
            .with_event("boot", handler.clone())
            .build();

        assert!(bus.has_callback("boot", &handler));
        assert!(!bus.has_callback("boot", Token::next()));

        bus.off("boot", &handler);
        assert!(!bus.has("boot"));
    }
}
