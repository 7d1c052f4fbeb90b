//! Merge stress demo for the packet document.
//!
//! Covers: concurrent appends from N editors and JSON/binary persistence cost.
//!
//! Run with: cargo run --release --example merge_stress

use packet_sequencer::{has_dense_positions, PacketManager, SequentialIds};
use std::time::Instant;

fn main() {
    println!("========================================");
    println!(" Packet Sequencer Merge Stress Suite");
    println!("========================================\n");

    test_concurrent_appends(20);
    test_persistence_overhead();
}

// -----------------------------------------------------------------------------
// 1. Concurrent appends
// -----------------------------------------------------------------------------
fn test_concurrent_appends(editors: usize) {
    println!("Test: {} editors appending an exhibit to the same snapshot", editors);

    let mut server = PacketManager::new().with_id_generator(SequentialIds::new("base"));
    for _ in 0..5 {
        server.add_page().unwrap();
    }
    let snapshot = server.save();

    let start = Instant::now();
    for i in 0..editors {
        // Every editor forks from the same snapshot, so all append at position 6
        let mut client = PacketManager::from_bytes(&snapshot)
            .unwrap()
            .with_id_generator(SequentialIds::new(format!("editor{}", i)));
        let page = client.add_page().unwrap();
        client
            .set_description(&page.id, &format!("Exhibit from editor {}", i))
            .unwrap();
        server.merge(&mut client).unwrap();
    }
    let merge_time = start.elapsed();

    let merged = server.pages().unwrap();
    println!("   Pages after merge: {} (Expected: {})", merged.len(), 5 + editors);
    println!("   Dense positions:   {}", has_dense_positions(&merged));

    let start = Instant::now();
    let changed = server.normalize().unwrap();
    let normalize_time = start.elapsed();
    let normalized = server.pages().unwrap();

    println!("   Normalized:        {} in {:>8.2?}", changed, normalize_time);
    println!("   Dense positions:   {}", has_dense_positions(&normalized));
    println!("   Merge Time:        {:>8.2?}", merge_time);
    println!("   [Analysis]: Concurrent appends collide on position; normalize() restores 1..N.\n");
}

// -----------------------------------------------------------------------------
// 2. Persistence overhead
// -----------------------------------------------------------------------------
fn test_persistence_overhead() {
    println!("Test: Persistence (JSON page list vs Automerge binary)");

    let mut manager = PacketManager::new().with_id_generator(SequentialIds::new("p"));
    for i in 0..200 {
        let page = manager
            .add_page_with_hint(Some("IN THE SUPERIOR COURT OF THE STATE OF CALIFORNIA"))
            .unwrap();
        manager
            .set_description(&page.id, &format!("Exhibit {} - Correspondence", i + 1))
            .unwrap();
    }

    let start = Instant::now();
    let json = manager.to_json().unwrap();
    let json_time = start.elapsed();

    let start = Instant::now();
    let binary = manager.save();
    let save_time = start.elapsed();

    let start = Instant::now();
    let _ = PacketManager::from_json(&json).unwrap();
    let from_json_time = start.elapsed();

    let start = Instant::now();
    let _ = PacketManager::from_bytes(&binary).unwrap();
    let load_time = start.elapsed();

    println!("   Pages:            200");
    println!("   JSON Export:      {:>8.2?} ({} bytes)", json_time, json.len());
    println!("   JSON Import:      {:>8.2?}", from_json_time);
    println!("   Binary Save:      {:>8.2?} ({} bytes)", save_time, binary.len());
    println!("   Binary Load:      {:>8.2?}", load_time);
    println!("   [Analysis]: If > 16ms, UI may freeze during load/save.\n");
}
