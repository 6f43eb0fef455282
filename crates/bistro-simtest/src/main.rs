//! Bistro Headless Simulation Harness
//!
//! Validates the seating rules and floor data without any engine attached.
//! Runs entirely in-process — no rendering, no input, no scene loading.
//!
//! Usage:
//!   cargo run -p bistro-simtest
//!   cargo run -p bistro-simtest -- --verbose

use bistro_core::config::{SimConfig, Span};
use bistro_core::generation::FloorConfig;
use bistro_core::persistence::{self, FileStore, KvStore, MemoryStore};
use bistro_core::prelude::*;
use bistro_core::systems::LifecycleEvent;

// ── Floor fixture (same JSON a frontend would ship) ─────────────────────
const FLOOR_JSON: &str = include_str!("../../../data/floor_plan.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.to_string(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Bistro Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Floor fixture validation
    results.extend(validate_floor_fixture(verbose));

    // 2. Config sanity sweep
    results.extend(validate_config(verbose));

    // 3. Assignment rules sweep
    results.extend(validate_assignment(verbose));

    // 4. Lifecycle walkthrough
    results.extend(validate_lifecycle(verbose));

    // 5. Economy loop
    results.extend(validate_economy(verbose));

    // 6. Persistence roundtrip
    results.extend(validate_persistence(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Floor fixture ────────────────────────────────────────────────────

fn validate_floor_fixture(verbose: bool) -> Vec<TestResult> {
    if verbose {
        println!("[floor] parsing data/floor_plan.json");
    }
    let mut results = Vec::new();

    let config = match FloorConfig::from_json(FLOOR_JSON) {
        Ok(config) => config,
        Err(e) => {
            results.push(check("floor.parse", false, format!("{}", e)));
            return results;
        }
    };
    results.push(check(
        "floor.parse",
        true,
        format!(
            "'{}': {} tables, {} listings",
            config.name,
            config.tables.len(),
            config.listings.len()
        ),
    ));

    results.push(check(
        "floor.validate",
        config.validate().is_ok(),
        format!("{:?}", config.validate()),
    ));

    // The raw JSON and the typed config must agree on table count
    let raw: serde_json::Value = match serde_json::from_str(FLOOR_JSON) {
        Ok(raw) => raw,
        Err(e) => {
            results.push(check("floor.raw", false, format!("{}", e)));
            return results;
        }
    };
    let raw_tables = raw["tables"].as_array().map(|a| a.len()).unwrap_or(0);
    results.push(check(
        "floor.table_count",
        raw_tables == config.tables.len(),
        format!("json {} vs typed {}", raw_tables, config.tables.len()),
    ));

    match Simulation::with_seed(
        SimConfig::default(),
        config,
        Box::new(MemoryStore::new()),
        1,
    ) {
        Ok(sim) => results.push(check(
            "floor.generated",
            sim.table_count() == raw_tables && sim.free_table_count() == raw_tables,
            format!("{} open tables on a fresh floor", sim.table_count()),
        )),
        Err(e) => results.push(check("floor.generated", false, format!("{}", e))),
    }

    results
}

// ── 2. Config ───────────────────────────────────────────────────────────

fn validate_config(verbose: bool) -> Vec<TestResult> {
    if verbose {
        println!("[config] default and degenerate sweeps");
    }
    let mut results = Vec::new();

    results.push(check(
        "config.default",
        SimConfig::default().validate().is_ok(),
        "defaults validate",
    ));

    let mut bad = SimConfig::default();
    bad.quadruple_chance = 2.0;
    results.push(check(
        "config.rejects_bad_chance",
        bad.validate().is_err(),
        "chance 2.0 refused",
    ));

    let mut inverted = SimConfig::default();
    inverted.eating_time = Span::new(16.0, 8.0);
    results.push(check(
        "config.rejects_inverted_span",
        inverted.validate().is_err(),
        "inverted eating_time refused",
    ));

    results
}

// ── 3. Assignment ───────────────────────────────────────────────────────

fn validate_assignment(verbose: bool) -> Vec<TestResult> {
    if verbose {
        println!("[assignment] seating sweeps over the default floor");
    }
    let mut results = Vec::new();

    // Capacity: a quadruple only ever fits the four-seaters
    let mut fits = true;
    for seed in 0..25 {
        let mut sim = quiet_sim(seed);
        let group = sim.spawn_walk_in(PartyKind::Quadruple, TablePrefs::none());
        match sim.request_table(group) {
            Ok(table) => {
                let seats = sim.world.get::<&Seating>(table).unwrap().capacity();
                if seats < 4 {
                    fits = false;
                }
            }
            Err(_) => fits = false,
        }
    }
    results.push(check("assign.capacity", fits, "quadruples only on 4-tops"));

    // Preference: reserved seekers always land reserved
    let mut reserved_ok = true;
    for seed in 0..25 {
        let mut sim = quiet_sim(seed);
        let prefs = TablePrefs {
            reserved: true,
            ..TablePrefs::none()
        };
        let group = sim.spawn_walk_in(PartyKind::Single, prefs);
        match sim.request_table(group) {
            Ok(table) => {
                if !sim.world.get::<&Table>(table).unwrap().reserved {
                    reserved_ok = false;
                }
            }
            Err(_) => reserved_ok = false,
        }
    }
    results.push(check("assign.reserved", reserved_ok, "reserved pref honored"));

    // A full floor refuses the next group
    let mut sim = quiet_sim(77);
    let open_tables = sim.table_count();
    for _ in 0..open_tables {
        let group = sim.spawn_walk_in(PartyKind::Single, TablePrefs::none());
        if sim.request_table(group).is_err() {
            break;
        }
    }
    let extra = sim.spawn_walk_in(PartyKind::Single, TablePrefs::none());
    results.push(check(
        "assign.full_floor",
        sim.request_table(extra).is_err() && sim.free_table_count() == 0,
        format!("{} tables all busy, next group refused", open_tables),
    ));

    results
}

// ── 4. Lifecycle ────────────────────────────────────────────────────────

fn validate_lifecycle(verbose: bool) -> Vec<TestResult> {
    if verbose {
        println!("[lifecycle] full service and boredom walkthroughs");
    }
    let mut results = Vec::new();

    // Full service: waiting -> seated -> eating -> paid -> gone
    let mut sim = quiet_sim(5);
    let group = sim.spawn_walk_in(PartyKind::Couple, TablePrefs::none());
    let prize = sim.world.get::<&Group>(group).unwrap().prize;
    let seated = sim.request_table(group).is_ok();

    let mut served_prize = None;
    let mut departed = false;
    for _ in 0..1200 {
        for event in sim.update(0.1) {
            match event {
                LifecycleEvent::Served { prize, .. } => served_prize = Some(prize),
                LifecycleEvent::Departed { .. } => departed = true,
                LifecycleEvent::TimedOut { .. } => {}
            }
        }
    }
    results.push(check(
        "lifecycle.service",
        seated && served_prize == Some(prize) && departed && sim.balance() == prize,
        format!("prize {} credited once", prize),
    ));

    // Boredom: an impossible preference times out unpaid
    let mut sim = quiet_sim(6);
    let prefs = TablePrefs {
        number: Some(42),
        ..TablePrefs::none()
    };
    let group = sim.spawn_walk_in(PartyKind::Single, prefs);
    let refused = sim.request_table(group).is_err();

    let mut timed_out = false;
    for _ in 0..600 {
        for event in sim.update(0.1) {
            if matches!(event, LifecycleEvent::TimedOut { group: g } if g == group) {
                timed_out = true;
            }
        }
    }
    results.push(check(
        "lifecycle.boredom",
        refused && timed_out && sim.balance() == 0 && sim.group_count() == 0,
        "unseated group left unpaid",
    ));

    results
}

// ── 5. Economy ──────────────────────────────────────────────────────────

fn validate_economy(verbose: bool) -> Vec<TestResult> {
    if verbose {
        println!("[economy] wallet and purchase chain");
    }
    let mut results = Vec::new();

    let mut sim = quiet_sim(8);
    let listings = sim.floor().listings.clone();

    // Broke: first listing refused
    let refused_broke = sim.purchase(listings[0]).is_err();

    // Out of order: hidden listing refused even with money
    sim.grant(1_000_000);
    let refused_hidden = sim.purchase(listings[1]).is_err();

    let mut purchased = 0;
    for &listing in &listings {
        if sim.purchase(listing).is_ok() {
            purchased += 1;
        }
    }

    results.push(check(
        "economy.purchase_chain",
        refused_broke && refused_hidden && purchased == listings.len(),
        format!("{} listings bought in order", purchased),
    ));

    results.push(check(
        "economy.capacity_grows",
        sim.table_count() == 4 + listings.len(),
        format!("{} open tables after buyout", sim.table_count()),
    ));

    results
}

// ── 6. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(verbose: bool) -> Vec<TestResult> {
    if verbose {
        println!("[persistence] file store roundtrip");
    }
    let mut results = Vec::new();

    let path = std::env::temp_dir().join(format!("bistro-harness-{}.bin", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let wrote = (|| -> Result<(), Box<dyn std::error::Error>> {
        let mut store = FileStore::open(&path)?;
        persistence::set(&mut store, "PLAYER_MONEY", &4200i64);
        persistence::set(&mut store, "TABLE_LEVEL1_1", &true);
        store.flush()?;
        Ok(())
    })()
    .is_ok();

    let mut read_back = false;
    if wrote {
        if let Ok(store) = FileStore::open(&path) {
            read_back = persistence::get::<i64>(&store, "PLAYER_MONEY") == Some(4200)
                && persistence::get::<bool>(&store, "TABLE_LEVEL1_1") == Some(true)
                && !store.has_key("TABLE_LEVEL1_2");
        }
    }
    let _ = std::fs::remove_file(&path);

    results.push(check(
        "persistence.roundtrip",
        wrote && read_back,
        "money and purchase flags survive reopen",
    ));

    results
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Default floor, arrival timer parked out of the way
fn quiet_sim(seed: u64) -> Simulation {
    let mut config = SimConfig::default();
    config.spawn_interval = Span::new(100_000.0, 100_000.0);
    Simulation::with_seed(
        config,
        FloorConfig::default(),
        Box::new(MemoryStore::new()),
        seed,
    )
    .expect("default floor and config validate")
}
