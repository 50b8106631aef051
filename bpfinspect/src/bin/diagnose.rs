//! Diagnostic binary for the bpftool probe pipeline.
//!
//! Runs every probe the inspector depends on, one step at a time, and prints
//! PASS/FAIL with the full error for each. Useful when the TUI shows empty
//! panes or an "incomplete" warning.
//!
//! Run: ./target/release/diagnose [path-to-bpftool]

use std::path::PathBuf;

use bpfinspect::data::collector::Collector;
use bpfinspect::data::enrich::ProcFs;
use bpfinspect::probe::schema::{
    CgroupTree, MapDump, MapShow, NetShow, PerfList, ProgDumpXlated, ProgShow, Version,
};
use bpfinspect::probe::{invoke, Bpftool, Probe, ToolRunner};

const TOTAL: u32 = 9;

fn main() {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("BPFTOOL_PATH").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("bpftool"));
    let tool = Bpftool::new(&path, true);

    let mut pass = 0u32;
    let mut fail = 0u32;

    println!("=== bpftool probe diagnostic ===");
    println!("  tool: {}", path.display());
    println!("  sudo: {}\n", tool.uses_sudo());

    print_step(1, "bpftool version");
    let version = run(&tool, &Version, |v| {
        format!(
            "{} (libbpf {}), skeletons={}",
            v.version, v.libbpf_version, v.features.skeletons
        )
    });
    if let Ok(msg) = &version {
        if msg.ends_with("skeletons=false") {
            println!("  note: built without skeletons, owning processes will be empty");
        }
    }
    report(&version, &mut pass, &mut fail);
    if version.is_err() {
        summary(pass, fail);
        return;
    }

    print_step(2, "prog show");
    let programs = invoke(&tool, &ProgShow).map(|out| out.records);
    report(
        &programs
            .as_ref()
            .map(|p| format!("{} programs", p.len()))
            .map_err(|e| e.to_string()),
        &mut pass,
        &mut fail,
    );

    print_step(3, "map show");
    let maps = invoke(&tool, &MapShow).map(|out| out.records);
    report(
        &maps
            .as_ref()
            .map(|m| format!("{} maps", m.len()))
            .map_err(|e| e.to_string()),
        &mut pass,
        &mut fail,
    );

    print_step(4, "perf list");
    report(&run(&tool, &PerfList, |r| format!("{} perf links", r.len())), &mut pass, &mut fail);

    print_step(5, "cgroup tree");
    report(&run(&tool, &CgroupTree, |r| format!("{} cgroups with programs", r.len())), &mut pass, &mut fail);

    print_step(6, "net show");
    report(
        &run(&tool, &NetShow, |r| {
            let xdp: usize = r.iter().map(|n| n.xdp.len()).sum();
            let tc: usize = r.iter().map(|n| n.tc.len()).sum();
            format!("{xdp} xdp, {tc} tc attachments")
        }),
        &mut pass,
        &mut fail,
    );

    print_step(7, "prog dump xlated (first program)");
    let first_prog = programs.as_ref().ok().and_then(|p| p.first()).map(|p| p.id);
    let step7 = match first_prog {
        Some(id) => run(&tool, &ProgDumpXlated { id }, |insns| {
            format!("program {id}: {} instructions", insns.len())
        }),
        None => Ok("skipped, no programs loaded".to_string()),
    };
    report(&step7, &mut pass, &mut fail);

    print_step(8, "map dump (first map)");
    let first_map = maps.as_ref().ok().and_then(|m| m.first()).map(|m| m.id);
    let step8 = match first_map {
        Some(id) => run(&tool, &MapDump { id }, |entries| {
            format!("map {id}: {} entries", entries.len())
        }),
        None => Ok("skipped, no maps loaded".to_string()),
    };
    report(&step8, &mut pass, &mut fail);

    print_step(9, "full refresh cycle");
    let collector = Collector::new(std::sync::Arc::new(tool)).with_procfs(ProcFs::default());
    let step9 = match collector.collect() {
        Ok((programs, passes)) if passes.is_complete() => {
            let owners: usize = programs.values().map(|p| p.owners.len()).sum();
            Ok(format!("{} programs, {owners} owning processes", programs.len()))
        }
        Ok((_, passes)) => Err(passes
            .failed
            .iter()
            .map(|f| format!("{}: {}", f.pass.label(), f.error))
            .collect::<Vec<_>>()
            .join("; ")),
        Err(e) => Err(e.to_string()),
    };
    report(&step9, &mut pass, &mut fail);

    summary(pass, fail);
}

fn run<P: Probe>(
    tool: &dyn ToolRunner,
    probe: &P,
    describe: impl FnOnce(&P::Output) -> String,
) -> Result<String, String> {
    let output = invoke(tool, probe).map_err(|e| {
        let mut msg = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(s) = source {
            msg.push_str(&format!("\n    caused by: {s}"));
            source = std::error::Error::source(s);
        }
        msg
    })?;
    if !output.stderr.trim().is_empty() {
        println!("  stderr: {}", output.stderr.trim());
    }
    Ok(describe(&output.records))
}

fn print_step(n: u32, desc: &str) {
    println!("[Step {n:>2}] {desc}");
}

fn report(result: &Result<String, String>, pass: &mut u32, fail: &mut u32) {
    match result {
        Ok(msg) => {
            println!("  ✓ PASS: {msg}\n");
            *pass += 1;
        }
        Err(msg) => {
            println!("  ✗ FAIL: {msg}\n");
            *fail += 1;
        }
    }
}

fn summary(pass: u32, fail: u32) {
    println!("=== Summary: {pass}/{TOTAL} passed, {fail} failed ===");
    if fail > 0 {
        std::process::exit(1);
    }
}
