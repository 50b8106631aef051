//! JSON schemas of the bpftool subcommands we run, one probe type each.
//!
//! Required fields are the ones the registry keys on or always displays;
//! everything bpftool omits on some kernels is `#[serde(default)]`. Fields we
//! do not know about are ignored so newer bpftool releases still decode.

use serde::{Deserialize, Deserializer};

use super::{json_args, Probe};

/// `bpftool -j prog show`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgShow;

impl Probe for ProgShow {
    type Output = Vec<ProgRecord>;

    fn args(&self) -> Vec<String> {
        json_args("prog", ["show"])
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgRecord {
    pub id: u32,
    #[serde(rename = "type", deserialize_with = "name_or_number")]
    pub kind: String,
    pub tag: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gpl_compatible: bool,
    #[serde(default)]
    pub loaded_at: i64,
    #[serde(default)]
    pub uid: u32,
    #[serde(default)]
    pub bytes_xlated: u64,
    #[serde(default)]
    pub jited: bool,
    #[serde(default)]
    pub bytes_jited: u64,
    #[serde(default)]
    pub bytes_memlock: u64,
    #[serde(default)]
    pub map_ids: Vec<u32>,
    #[serde(default)]
    pub btf_id: u32,
    #[serde(default)]
    pub pinned: Vec<String>,
    #[serde(default)]
    pub pids: Vec<PidRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PidRecord {
    pub pid: u32,
    #[serde(default)]
    pub comm: String,
}

/// `bpftool -j map show`
#[derive(Debug, Clone, Copy, Default)]
pub struct MapShow;

impl Probe for MapShow {
    type Output = Vec<MapRecord>;

    fn args(&self) -> Vec<String> {
        json_args("map", ["show"])
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapRecord {
    pub id: u32,
    #[serde(rename = "type", deserialize_with = "name_or_number")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub flags: u32,
    #[serde(rename = "bytes_key")]
    pub key_size: u32,
    #[serde(rename = "bytes_value")]
    pub value_size: u32,
    pub max_entries: u32,
    #[serde(default)]
    pub bytes_memlock: u64,
    #[serde(default)]
    pub btf_id: u32,
    #[serde(default)]
    pub frozen: u8,
    #[serde(default)]
    pub pinned: Vec<String>,
}

/// `bpftool -j map dump id <id>`
#[derive(Debug, Clone, Copy)]
pub struct MapDump {
    pub id: u32,
}

impl Probe for MapDump {
    type Output = Vec<MapDumpRecord>;

    fn args(&self) -> Vec<String> {
        json_args("map", ["dump".to_string(), "id".to_string(), self.id.to_string()])
    }
}

/// One dumped entry; bytes arrive as `"0x41"` strings.
#[derive(Debug, Clone, Deserialize)]
pub struct MapDumpRecord {
    pub key: Vec<String>,
    pub value: Vec<String>,
}

/// `bpftool -j perf list`
#[derive(Debug, Clone, Copy, Default)]
pub struct PerfList;

impl Probe for PerfList {
    type Output = Vec<PerfRecord>;

    fn args(&self) -> Vec<String> {
        json_args("perf", ["list"])
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerfRecord {
    pub pid: u32,
    pub fd: i32,
    pub prog_id: u32,
    pub fd_type: String,
    #[serde(default)]
    pub func: String,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub tracepoint: String,
}

/// `bpftool -j cgroup tree`
#[derive(Debug, Clone, Copy, Default)]
pub struct CgroupTree;

impl Probe for CgroupTree {
    type Output = Vec<CgroupRecord>;

    fn args(&self) -> Vec<String> {
        json_args("cgroup", ["tree"])
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CgroupRecord {
    pub cgroup: String,
    #[serde(default)]
    pub programs: Vec<CgroupProgRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CgroupProgRecord {
    pub id: u32,
    #[serde(default)]
    pub attach_type: String,
    #[serde(default)]
    pub attach_flags: String,
    #[serde(default)]
    pub name: String,
}

/// `bpftool -j net show`
#[derive(Debug, Clone, Copy, Default)]
pub struct NetShow;

impl Probe for NetShow {
    type Output = Vec<NetRecord>;

    fn args(&self) -> Vec<String> {
        json_args("net", ["show"])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetRecord {
    #[serde(default)]
    pub xdp: Vec<XdpRecord>,
    #[serde(default)]
    pub tc: Vec<TcRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XdpRecord {
    pub devname: String,
    #[serde(default)]
    pub ifindex: u32,
    #[serde(default)]
    pub mode: String,
    pub id: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TcRecord {
    pub devname: String,
    #[serde(default)]
    pub ifindex: u32,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    pub id: u32,
}

/// `bpftool -j prog dump xlated id <id>`
#[derive(Debug, Clone, Copy)]
pub struct ProgDumpXlated {
    pub id: u32,
}

impl Probe for ProgDumpXlated {
    type Output = Vec<XlatedInsn>;

    fn args(&self) -> Vec<String> {
        json_args(
            "prog",
            [
                "dump".to_string(),
                "xlated".to_string(),
                "id".to_string(),
                self.id.to_string(),
            ],
        )
    }
}

/// One translated instruction. With BTF available bpftool interleaves the
/// function prototype and source line annotations.
#[derive(Debug, Clone, Deserialize)]
pub struct XlatedInsn {
    #[serde(default)]
    pub proto: Option<String>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub disasm: Option<String>,
}

/// `bpftool -j version`
#[derive(Debug, Clone, Copy, Default)]
pub struct Version;

impl Probe for Version {
    type Output = VersionInfo;

    fn args(&self) -> Vec<String> {
        vec!["-j".to_string(), "version".to_string()]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    #[serde(default)]
    pub libbpf_version: String,
    #[serde(default)]
    pub features: VersionFeatures,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionFeatures {
    #[serde(default)]
    pub libbfd: bool,
    #[serde(default)]
    pub llvm: bool,
    /// Built with skeletons: required for the `pids` field of `prog show`.
    #[serde(default)]
    pub skeletons: bool,
    #[serde(default)]
    pub bootstrap: bool,
}

/// bpftool prints an unknown program/map type as its raw number.
fn name_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NameOrNumber {
        Name(String),
        Number(u64),
    }

    Ok(match NameOrNumber::deserialize(deserializer)? {
        NameOrNumber::Name(name) => name,
        NameOrNumber::Number(n) => n.to_string(),
    })
}
