//! Secondary passes that annotate a freshly listed program set.
//!
//! Each pass looks programs up by id. Ids a probe mentions that are not in
//! the listing are skipped. A pass whose probe fails is logged and recorded
//! in the [`EnrichReport`]; the remaining passes still run.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use super::program::ProgramEntity;
use crate::probe::schema::{CgroupRecord, CgroupTree, NetRecord, NetShow, PerfList, PerfRecord};
use crate::probe::{invoke, Probe, ToolRunner};

/// Program set keyed by id, as built by one refresh cycle.
pub type Programs = BTreeMap<u32, ProgramEntity>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pass {
    ProcessLinkage,
    PerfEvents,
    Cgroups,
    Network,
}

impl Pass {
    pub fn label(self) -> &'static str {
        match self {
            Self::ProcessLinkage => "process linkage",
            Self::PerfEvents => "perf events",
            Self::Cgroups => "cgroup attachment",
            Self::Network => "network attachment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassFailure {
    pub pass: Pass,
    pub error: String,
}

/// Outcome of the enrichment passes of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichReport {
    pub failed: Vec<PassFailure>,
}

impl EnrichReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Read access to `/proc`, rooted elsewhere in tests.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Command line with NUL separators turned into spaces.
    pub fn cmdline(&self, pid: u32) -> Option<String> {
        let raw = fs::read(self.root.join(pid.to_string()).join("cmdline")).ok()?;
        let text = String::from_utf8_lossy(&raw).replace('\0', " ");
        Some(text.trim().to_string())
    }

    /// Target of the `exe` link. Needs privilege for other users' processes.
    pub fn exe_path(&self, pid: u32) -> Option<String> {
        fs::read_link(self.root.join(pid.to_string()).join("exe"))
            .ok()
            .map(|p| p.display().to_string())
    }
}

/// Run every pass against `programs` in order.
pub fn enrich(programs: &mut Programs, runner: &dyn ToolRunner, procfs: &ProcFs) -> EnrichReport {
    let mut report = EnrichReport::default();

    link_processes(programs, procfs);
    run_pass(Pass::PerfEvents, runner, &PerfList, programs, apply_perf_events, &mut report);
    run_pass(Pass::Cgroups, runner, &CgroupTree, programs, apply_cgroups, &mut report);
    run_pass(Pass::Network, runner, &NetShow, programs, apply_network, &mut report);

    report
}

fn run_pass<P: Probe>(
    pass: Pass,
    runner: &dyn ToolRunner,
    probe: &P,
    programs: &mut Programs,
    apply: fn(&mut Programs, P::Output) -> usize,
    report: &mut EnrichReport,
) {
    match invoke(runner, probe) {
        Ok(output) => {
            let matched = apply(programs, output.records);
            log::debug!("{} pass annotated {matched} programs", pass.label());
            if !output.stderr.trim().is_empty() {
                log::debug!("{} stderr: {}", pass.label(), output.stderr.trim());
            }
        }
        Err(e) => {
            log::warn!("{} pass skipped: {e}", pass.label());
            report.failed.push(PassFailure {
                pass,
                error: e.to_string(),
            });
        }
    }
}

/// Fill in command line and executable path of every owning process. A
/// process that has exited keeps empty fields.
pub fn link_processes(programs: &mut Programs, procfs: &ProcFs) -> usize {
    let mut linked = 0;
    for owner in programs.values_mut().flat_map(|p| p.owners.iter_mut()) {
        if let Some(cmdline) = procfs.cmdline(owner.pid) {
            owner.cmdline = cmdline;
            linked += 1;
        }
        if let Some(path) = procfs.exe_path(owner.pid) {
            owner.exe_path = path;
        }
    }
    linked
}

pub fn apply_perf_events(programs: &mut Programs, records: Vec<PerfRecord>) -> usize {
    let mut matched = 0;
    for record in records {
        let Some(prog) = programs.get_mut(&record.prog_id) else {
            continue;
        };
        prog.fd = record.fd;
        match record.fd_type.as_str() {
            "kprobe" | "kretprobe" => {
                prog.attach_points.push(record.func);
                prog.offset = record.offset;
            }
            "uprobe" | "uretprobe" => {
                prog.attach_points.push(record.filename);
                prog.offset = record.offset;
            }
            _ => prog.attach_points.push(record.tracepoint),
        }
        prog.kind = record.fd_type;
        matched += 1;
    }
    matched
}

pub fn apply_cgroups(programs: &mut Programs, records: Vec<CgroupRecord>) -> usize {
    let mut matched = 0;
    for cgroup in records {
        for attached in cgroup.programs {
            if let Some(prog) = programs.get_mut(&attached.id) {
                prog.cgroup = cgroup.cgroup.clone();
                prog.cgroup_attach_type = attached.attach_type;
                prog.cgroup_attach_flags = attached.attach_flags;
                matched += 1;
            }
        }
    }
    matched
}

pub fn apply_network(programs: &mut Programs, records: Vec<NetRecord>) -> usize {
    let mut matched = 0;
    for record in records {
        for xdp in record.xdp {
            if let Some(prog) = programs.get_mut(&xdp.id) {
                prog.interface = xdp.devname;
                matched += 1;
            }
        }
        for tc in record.tc {
            if let Some(prog) = programs.get_mut(&tc.id) {
                prog.interface = tc.devname;
                prog.name = tc.name;
                prog.tc_kind = tc.kind;
                matched += 1;
            }
        }
    }
    matched
}
