#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bpfinspect::data::collector::Collector;
use bpfinspect::data::enrich::ProcFs;
use bpfinspect::error::ProbeError;
use bpfinspect::probe::{ToolOutput, ToolRunner};

/// Stand-in for bpftool: answers by joined argument list, records every call
/// and can stall chosen commands to widen race windows.
#[derive(Default)]
pub struct ScriptedTool {
    replies: Mutex<HashMap<String, Result<String, String>>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, args: &str, stdout: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(args.to_string(), Ok(stdout.to_string()));
    }

    pub fn fail(&self, args: &str, stderr: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(args.to_string(), Err(stderr.to_string()));
    }

    pub fn stall(&self, args: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(args.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Programs 1 (kprobe) and 2 (xdp), each attached once.
    pub fn script_two_programs(&self) {
        self.reply(
            "-j prog show",
            r#"[{"id": 1, "type": "kprobe", "tag": "aa01", "name": "trace_open", "map_ids": [10]},
                {"id": 2, "type": "xdp", "tag": "bb02", "name": "xdp_pass"}]"#,
        );
        self.reply(
            "-j perf list",
            r#"[{"pid": 1, "fd": 5, "prog_id": 1, "fd_type": "kprobe", "func": "do_sys_openat2", "offset": 0}]"#,
        );
        self.reply("-j cgroup tree", "[]");
        self.reply(
            "-j net show",
            r#"[{"xdp": [{"devname": "eth0", "ifindex": 2, "mode": "generic", "id": 2}], "tc": []}]"#,
        );
    }
}

impl ToolRunner for ScriptedTool {
    fn run(&self, args: &[String]) -> Result<ToolOutput, ProbeError> {
        let key = args.join(" ");
        self.calls.lock().unwrap().push(key.clone());

        let delay = self.delays.lock().unwrap().get(&key).copied();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let reply = self.replies.lock().unwrap().get(&key).cloned();
        match reply {
            Some(Ok(stdout)) => Ok(ToolOutput {
                stdout: stdout.into_bytes(),
                stderr: Vec::new(),
            }),
            Some(Err(stderr)) => Err(ProbeError::Exit {
                command: self.command_line(args),
                code: Some(255),
                stderr,
            }),
            None => Err(ProbeError::Launch {
                command: self.command_line(args),
                source: io::Error::new(io::ErrorKind::NotFound, "unscripted command"),
            }),
        }
    }
}

/// Collector over `tool` with an empty /proc, so process linkage is a no-op.
pub fn collector(tool: &Arc<ScriptedTool>) -> Collector {
    Collector::new(Arc::clone(tool) as Arc<dyn ToolRunner>).with_procfs(ProcFs::new("/nonexistent"))
}
