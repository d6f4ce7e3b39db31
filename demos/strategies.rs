//! The four dispatch strategies over the same three callbacks.
//!
//! Run with: `cargo run --example strategies`

use std::sync::Arc;
use std::time::Duration;

use callbus::{CallbackError, EventBus, HandlerFn, Notice, Settlement};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // 1) Build a bus whose callbacks return u32 values, with an error sink
    //    so fire-and-forget dispatch never turns failures into an Err.
    let bus: EventBus<u32, u32> = EventBus::<u32, u32>::builder()
        .with_error_sink(|notice: Notice<'_, u32>| {
            println!(
                "error sink: phase={} kind={} key={}",
                notice.phase, notice.kind, notice.key
            );
        })
        .build();

    // 2) Three callbacks: fast, slow, and one that always fails.
    bus.on(
        "fanout",
        HandlerFn::arc(|_bus, n: Arc<u32>| async move { Ok::<_, CallbackError>(*n + 1) }),
    );
    bus.on(
        "fanout",
        HandlerFn::arc(|_bus, n: Arc<u32>| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(*n + 2)
        }),
    );
    bus.on(
        "fanout",
        HandlerFn::arc(|_bus, _n: Arc<u32>| async move {
            Err::<u32, _>(CallbackError::fail("flaky callback"))
        }),
    );

    // 3) Fire-and-forget: returns immediately; the slow callback finishes
    //    detached, and the failure went to the error sink.
    bus.emit("fanout", 10)?;
    println!("emit returned before the slow callback finished");
    tokio::time::sleep(Duration::from_millis(80)).await;

    // 4) Wait-all: every callback settles; order follows registration.
    let settlements = bus.emit_wait("fanout", 10).await;
    for (i, s) in settlements.iter().enumerate() {
        match s {
            Settlement::Fulfilled(v) => println!("wait-all [{i}] fulfilled: {v}"),
            Settlement::Rejected(e) => println!("wait-all [{i}] rejected: {e}"),
        }
    }

    // 5) Sequential fail-fast: values until the first failure aborts.
    match bus.emit_line_up("fanout", 10).await {
        Ok(values) => println!("line-up values: {values:?}"),
        Err(err) => println!("line-up aborted: {err}"),
    }

    // 6) Sequential capture-errors: the full outcome list, never aborts.
    let captured = bus.emit_line_up_capture_err("fanout", 10).await;
    let labels: Vec<&str> = captured.iter().map(Settlement::as_label).collect();
    println!("capture-err labels: {labels:?}");

    assert_eq!(labels, vec!["fulfilled", "fulfilled", "rejected"]);
    Ok(())
}
