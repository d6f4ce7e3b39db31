//! Register, dispatch, and remove callbacks on one bus.
//!
//! Run with: `cargo run --example basic`

use std::sync::Arc;

use callbus::{CallbackError, EventBus, HandlerFn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // 1) Create a bus dispatching String payloads.
    let bus: EventBus<String> = EventBus::new();

    // 2) Register a permanent logger and keep its sign for later removal.
    let logger_sign = bus.on(
        "line",
        HandlerFn::arc(|_bus, line: Arc<String>| async move {
            println!("logger: {line}");
            Ok::<_, CallbackError>(())
        }),
    );

    // 3) Register a one-shot greeter: consumed by the first dispatch.
    bus.once(
        "line",
        HandlerFn::arc(|_bus, line: Arc<String>| async move {
            println!("greeter (once): welcome, {line}!");
            Ok(())
        }),
    );

    // 4) Dispatch twice; the greeter only runs the first time.
    bus.emit("line", String::from("alpha"))?;
    bus.emit("line", String::from("beta"))?;

    // 5) Remove the logger by its sign; the key disappears with it.
    bus.off("line", logger_sign);
    assert!(!bus.has("line"));

    // 6) Dispatching an unknown key is a warning, not an error
    //    (no warning sink configured, so it lands in the tracing output).
    bus.emit("line", String::from("gamma"))?;

    println!("done: bus is empty = {}", bus.is_empty());
    Ok(())
}
