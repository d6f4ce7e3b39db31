//! Builder-seeded events, the init capability context, and typed extensions.
//!
//! Run with: `cargo run --example capabilities`

use std::sync::Arc;

use parking_lot::Mutex;

use callbus::{CallbackError, EventBus, HandlerFn, Notice};

/// Extension installed during construction and shared by all callbacks.
#[derive(Default)]
struct AuditTrail {
    entries: Mutex<Vec<String>>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1) Build a bus with a seeded permanent event, both sinks, and an init
    //    callback that installs the audit trail extension.
    let bus: EventBus<String> = EventBus::<String>::builder()
        .with_event(
            "audit",
            HandlerFn::arc(|bus: EventBus<String>, entry: Arc<String>| async move {
                let Some(trail) = bus.extension::<AuditTrail>() else {
                    return Err(CallbackError::fail("audit trail not installed"));
                };
                trail.entries.lock().push(entry.to_string());
                Ok(())
            }),
        )
        .with_warning_sink(|notice: Notice<'_, String>| {
            println!("warning sink: {} on {}", notice.kind, notice.key);
        })
        .with_error_sink(|notice: Notice<'_, String>| {
            println!("error sink: {} on {}", notice.kind, notice.key);
        })
        .with_init(|ctx| {
            ctx.set_extension(AuditTrail::default());
            println!("init: {} key(s) seeded", ctx.bus().len());
        })
        .build();

    // 2) The seeded key exists without any `on` call.
    assert!(bus.has("audit"));

    // 3) Dispatching appends to the extension through the bus handle every
    //    callback receives.
    bus.emit("audit", String::from("first"))?;
    bus.emit("audit", String::from("second"))?;

    // 4) An unknown key goes to the warning sink and stays a no-op.
    bus.emit("missing", String::from("ignored"))?;

    // 5) Read the extension back from outside.
    let trail = bus
        .extension::<AuditTrail>()
        .ok_or("audit trail not installed")?;
    let entries = trail.entries.lock().clone();
    println!("audit entries: {entries:?}");
    assert_eq!(entries, vec!["first".to_string(), "second".to_string()]);

    Ok(())
}
