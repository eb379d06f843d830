use rand::Rng;
use sdx_client::{CounterConfig, CounterError, MemoryGrid, PNCounterClient};
use std::sync::Arc;

fn main() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async_main());
}

async fn async_main() {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║         SARDONYX PN-COUNTER CLIENT SIMULATION              ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    let grid = Arc::new(MemoryGrid::with_data_members(3));
    grid.add_lite_member();

    let counter = PNCounterClient::new(
        "simulated-counter",
        grid.clone(),
        grid.clone(),
        CounterConfig::default(),
    );

    // Phase 1: random workload against the pinned replica
    println!("\n--- Phase 1: workload on a fresh session ---");
    let mut expected: i64 = 0;
    for _ in 0..50 {
        let delta: i64 = rand::thread_rng().gen_range(-10..=10);
        expected += delta;
        counter.add_and_get(delta).await.unwrap();
    }
    let value = counter.get().await.unwrap();
    let pinned = counter.current_target().await.unwrap();
    println!("value after 50 random deltas: {value} (expected {expected})");
    println!("session pinned to replica:    {pinned}");
    assert_eq!(value, expected);

    // Phase 2: pinned replica goes away mid-session
    println!("\n--- Phase 2: failover ---");
    grid.disconnect(&pinned);
    let value = counter.get().await.unwrap();
    let new_target = counter.current_target().await.unwrap();
    println!("read after disconnect:        {value} (served by {new_target})");
    assert_eq!(value, expected);
    assert_ne!(pinned, new_target);

    // Phase 3: counter state wiped; session cannot continue
    println!("\n--- Phase 3: consistency loss and recovery ---");
    grid.wipe_counter("simulated-counter");
    match counter.get().await {
        Err(CounterError::ConsistencyLost(detail)) => {
            println!("consistency lost as expected: {detail}");
        }
        other => panic!("expected consistency loss, got {other:?}"),
    }
    counter.reset().await;
    let value = counter.increment_and_get().await.unwrap();
    println!("fresh session after reset:    counter restarted at {value}");
    assert_eq!(value, 1);

    println!("\n✓ Simulation completed successfully!");
}
