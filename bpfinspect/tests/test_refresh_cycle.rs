mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use bpfinspect::data::enrich::Pass;
use bpfinspect::data::registry::Registry;
use bpfinspect::data::scheduler::{CycleEvent, ManualTicker, Scheduler};
use common::{collector, ScriptedTool};

#[test]
fn cycle_builds_enriched_snapshot() {
    let tool = ScriptedTool::new();
    tool.script_two_programs();
    let registry = Registry::new();

    let snapshot = registry.refresh(&collector(&tool)).unwrap();

    assert_eq!(snapshot.generation, 1);
    assert!(snapshot.report.is_complete());
    let ids: Vec<u32> = snapshot.programs().map(|p| p.id).collect();
    assert_eq!(ids, [1, 2]);
    assert_eq!(snapshot.get(1).unwrap().attach_points, ["do_sys_openat2"]);
    assert_eq!(snapshot.get(1).unwrap().map_ids, [10]);
    assert_eq!(snapshot.get(2).unwrap().interface, "eth0");
    assert_eq!(
        tool.calls(),
        ["-j prog show", "-j perf list", "-j cgroup tree", "-j net show"]
    );
}

#[test]
fn nothing_carries_over_between_cycles() {
    let tool = ScriptedTool::new();
    tool.script_two_programs();
    let registry = Registry::new();
    let collector = collector(&tool);
    registry.refresh(&collector).unwrap();

    // Program 2 unloaded, program 1 detached from its kprobe.
    tool.reply("-j prog show", r#"[{"id": 1, "type": "kprobe", "tag": "aa01"}]"#);
    tool.reply("-j perf list", "[]");
    tool.reply("-j net show", "[]");

    let snapshot = registry.refresh(&collector).unwrap();
    assert_eq!(snapshot.generation, 2);
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.get(2).is_none());
    let prog = snapshot.get(1).unwrap();
    assert!(prog.attach_points.is_empty());
    assert!(prog.map_ids.is_empty());
    assert!(prog.name.is_empty());
}

#[test]
fn failed_pass_leaves_defaults_and_later_passes_run() {
    let tool = ScriptedTool::new();
    tool.script_two_programs();
    tool.fail("-j perf list", "Error: can't get next link: Operation not permitted");

    let snapshot = Registry::new().refresh(&collector(&tool)).unwrap();

    assert_eq!(snapshot.generation, 1);
    assert!(!snapshot.report.is_complete());
    let failed: Vec<Pass> = snapshot.report.failed.iter().map(|f| f.pass).collect();
    assert_eq!(failed, [Pass::PerfEvents]);
    assert!(snapshot.get(1).unwrap().attach_points.is_empty());
    assert_eq!(snapshot.get(1).unwrap().kind, "kprobe");
    assert_eq!(snapshot.get(2).unwrap().interface, "eth0");
}

#[test]
fn readers_never_observe_a_partial_cycle() {
    let tool = ScriptedTool::new();
    tool.script_two_programs();
    // Stall the enrichment passes so readers poll mid-cycle.
    tool.stall("-j perf list", Duration::from_millis(3));
    tool.stall("-j net show", Duration::from_millis(3));

    let registry = Arc::new(Registry::new());
    let collector = collector(&tool);
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut last_generation = 0;
                let mut observed = 0u32;
                while !done.load(Ordering::Relaxed) {
                    let snapshot = registry.snapshot();
                    assert!(snapshot.generation >= last_generation);
                    last_generation = snapshot.generation;
                    if snapshot.generation == 0 {
                        assert!(snapshot.is_empty());
                        continue;
                    }
                    assert_eq!(snapshot.len(), 2);
                    assert_eq!(snapshot.get(1).unwrap().attach_points.len(), 1);
                    assert_eq!(snapshot.get(2).unwrap().interface, "eth0");
                    observed += 1;
                }
                observed
            })
        })
        .collect();

    for _ in 0..20 {
        registry.refresh(&collector).unwrap();
    }
    done.store(true, Ordering::Relaxed);

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(registry.snapshot().generation, 20);
}

#[test]
fn scheduler_keeps_last_snapshot_when_listing_fails() {
    let tool = ScriptedTool::new();
    tool.script_two_programs();
    let registry = Arc::new(Registry::new());
    let (ticks, ticker) = ManualTicker::new();
    let (events_tx, events) = mpsc::channel();
    let scheduler = Scheduler::spawn(
        Arc::clone(&registry),
        Arc::new(collector(&tool)),
        ticker,
        events_tx,
    )
    .unwrap();

    ticks.send(()).unwrap();
    let first = match events.recv_timeout(Duration::from_secs(5)).unwrap() {
        CycleEvent::Published(snapshot) => snapshot,
        CycleEvent::Failed(e) => panic!("first cycle failed: {e}"),
    };

    tool.fail("-j prog show", "Error: can't get next program: Operation not permitted");
    ticks.send(()).unwrap();
    match events.recv_timeout(Duration::from_secs(5)).unwrap() {
        CycleEvent::Failed(e) => assert!(e.contains("prog show")),
        CycleEvent::Published(_) => panic!("published despite listing failure"),
    }

    scheduler.stop();
    assert!(Arc::ptr_eq(&registry.snapshot(), &first));
}
