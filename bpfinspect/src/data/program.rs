use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::probe::schema::ProgRecord;

/// Merged view of one loaded BPF program: the `prog show` listing plus
/// whatever the enrichment passes could attach to it this cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgramEntity {
    pub id: u32,
    /// Program type, e.g. "kprobe", "xdp", "cgroup_skb". Replaced by the perf
    /// fd type when the program is attached through a perf event.
    pub kind: String,
    pub tag: String,
    pub name: String,
    /// Unix seconds.
    pub loaded_at: i64,
    pub uid: u32,
    pub gpl_compatible: bool,
    pub bytes_xlated: u64,
    pub jited: bool,
    pub bytes_jited: u64,
    pub bytes_memlock: u64,
    pub btf_id: u32,
    pub map_ids: Vec<u32>,
    pub pinned: Vec<String>,
    pub owners: Vec<OwnerProcess>,

    // Perf attachment
    pub attach_points: Vec<String>,
    pub offset: u64,
    pub fd: i32,

    // Network attachment
    pub interface: String,
    pub tc_kind: String,

    // Cgroup attachment
    pub cgroup: String,
    pub cgroup_attach_type: String,
    pub cgroup_attach_flags: String,
}

/// A process holding a reference to the program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OwnerProcess {
    pub pid: u32,
    pub comm: String,
    pub cmdline: String,
    pub exe_path: String,
}

impl From<ProgRecord> for ProgramEntity {
    fn from(r: ProgRecord) -> Self {
        Self {
            id: r.id,
            kind: r.kind,
            tag: r.tag,
            name: r.name,
            loaded_at: r.loaded_at,
            uid: r.uid,
            gpl_compatible: r.gpl_compatible,
            bytes_xlated: r.bytes_xlated,
            jited: r.jited,
            bytes_jited: r.bytes_jited,
            bytes_memlock: r.bytes_memlock,
            btf_id: r.btf_id,
            map_ids: r.map_ids,
            pinned: r.pinned,
            owners: r
                .pids
                .into_iter()
                .map(|p| OwnerProcess {
                    pid: p.pid,
                    comm: p.comm,
                    ..OwnerProcess::default()
                })
                .collect(),
            ..Self::default()
        }
    }
}

impl ProgramEntity {
    /// Attached through a perf event (kprobe, uprobe, tracepoint families).
    pub fn is_tracing(&self) -> bool {
        matches!(
            self.kind.as_str(),
            "kprobe" | "kretprobe" | "uprobe" | "uretprobe" | "tracepoint" | "raw_tracepoint"
        )
    }

    /// XDP or traffic-control program.
    pub fn is_network(&self) -> bool {
        self.kind.contains("xdp") || self.kind.contains("sched")
    }

    pub fn is_cgroup(&self) -> bool {
        self.kind.contains("cgroup")
    }

    /// Attach points joined for a single-line listing.
    pub fn attach_summary(&self) -> String {
        if !self.attach_points.is_empty() {
            self.attach_points.join(", ")
        } else if !self.interface.is_empty() {
            self.interface.clone()
        } else {
            self.cgroup.clone()
        }
    }

    /// Key/value lines for the info pane, in display order. Kind-specific
    /// fields only appear for programs of that kind.
    pub fn info_lines(&self) -> Vec<(&'static str, String)> {
        let mut lines = vec![
            ("Name", self.name.clone()),
            ("Tag", self.tag.clone()),
            ("Id", self.id.to_string()),
            ("Type", self.kind.clone()),
            ("Uid", self.uid.to_string()),
            ("GplCompat", self.gpl_compatible.to_string()),
            ("LoadedAt", format_load_time(self.loaded_at)),
            ("BytesXlated", self.bytes_xlated.to_string()),
            ("Jited", self.jited.to_string()),
            ("BytesJited", self.bytes_jited.to_string()),
            ("BytesMemlock", self.bytes_memlock.to_string()),
            ("BtfId", self.btf_id.to_string()),
        ];

        for owner in &self.owners {
            lines.push(("Owner", owner.comm.clone()));
            lines.push(("OwnerPid", owner.pid.to_string()));
            lines.push(("OwnerCmdline", owner.cmdline.clone()));
            lines.push(("OwnerPath", owner.exe_path.clone()));
        }
        if !self.map_ids.is_empty() {
            let ids: Vec<String> = self.map_ids.iter().map(u32::to_string).collect();
            lines.push(("MapIds", ids.join(", ")));
        }
        if !self.pinned.is_empty() {
            lines.push(("Pinned", self.pinned.join(", ")));
        }
        if self.is_tracing() {
            for point in &self.attach_points {
                lines.push(("AttachPoint", point.clone()));
            }
            lines.push(("Offset", self.offset.to_string()));
            lines.push(("Fd", self.fd.to_string()));
        }
        if self.is_network() {
            lines.push(("Interface", self.interface.clone()));
            if !self.tc_kind.is_empty() {
                lines.push(("TcKind", self.tc_kind.clone()));
            }
        }
        if self.is_cgroup() {
            lines.push(("Cgroup", self.cgroup.clone()));
            lines.push(("CgroupAttachType", self.cgroup_attach_type.clone()));
            lines.push(("CgroupAttachFlags", self.cgroup_attach_flags.clone()));
        }
        lines
    }
}

/// Format a unix timestamp as `YYYY-MM-DD HH:MM:SS` UTC. Values chrono
/// cannot represent fall back to the raw seconds.
pub fn format_load_time(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| format!("@{secs}"))
}
