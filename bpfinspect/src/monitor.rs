//! The handle the UI and headless modes talk to.

use std::io;
use std::sync::mpsc::Sender;
use std::sync::{Arc, PoisonError, RwLock};

use bpfinspect_common::{format_bytes, RenderConfig};

use crate::data::collector::Collector;
use crate::data::map::{hex_args, MapEntity, MapEntry};
use crate::data::program::ProgramEntity;
use crate::data::registry::{Registry, Snapshot};
use crate::data::scheduler::{CycleEvent, IntervalTicker, Scheduler};
use crate::error::{EditError, ProbeError};
use crate::probe::schema::{MapDump, MapShow, ProgDumpXlated, XlatedInsn};
use crate::probe::{invoke, run_action, run_text, Probe, ToolRunner};

/// Shared access to the registry, on-demand map queries and the active
/// render configuration. Cheap to clone.
#[derive(Clone)]
pub struct Monitor {
    registry: Arc<Registry>,
    collector: Arc<Collector>,
    render: Arc<RwLock<RenderConfig>>,
}

impl Monitor {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self::with_collector(Collector::new(runner))
    }

    pub fn with_collector(collector: Collector) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            collector: Arc::new(collector),
            render: Arc::new(RwLock::new(RenderConfig::default())),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    fn runner(&self) -> &dyn ToolRunner {
        self.collector.runner()
    }

    /// Start the background refresh thread. The first cycle runs after one
    /// interval; call [`Monitor::refresh_now`] first for an immediate one.
    pub fn spawn_scheduler(
        &self,
        interval: std::time::Duration,
        events: Sender<CycleEvent>,
    ) -> io::Result<Scheduler> {
        Scheduler::spawn(
            Arc::clone(&self.registry),
            Arc::clone(&self.collector),
            IntervalTicker::new(interval),
            events,
        )
    }

    /// Run one cycle on the calling thread.
    pub fn refresh_now(&self) -> Result<Arc<Snapshot>, ProbeError> {
        self.registry.refresh(&self.collector)
    }

    pub fn latest(&self) -> Arc<Snapshot> {
        self.registry.snapshot()
    }

    /// All programs of the published snapshot, ascending by id.
    pub fn snapshot(&self) -> Vec<ProgramEntity> {
        self.latest().programs().cloned().collect()
    }

    pub fn program(&self, id: u32) -> Option<ProgramEntity> {
        self.latest().get(id).cloned()
    }

    /// Maps with the given ids, in the order asked for. Ids bpftool does not
    /// list are skipped.
    pub fn get_maps(&self, ids: &[u32]) -> Result<Vec<MapEntity>, ProbeError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut listed = invoke(self.runner(), &MapShow)?.records;
        Ok(ids
            .iter()
            .filter_map(|id| {
                let idx = listed.iter().position(|m| m.id == *id)?;
                Some(MapEntity::from(listed.swap_remove(idx)))
            })
            .collect())
    }

    pub fn get_map(&self, id: u32) -> Result<Option<MapEntity>, ProbeError> {
        Ok(self.get_maps(&[id])?.pop())
    }

    /// Dump the map again; entries are never cached.
    pub fn get_map_entries(&self, id: u32) -> Result<Vec<MapEntry>, ProbeError> {
        let probe = MapDump { id };
        let records = invoke(self.runner(), &probe)?.records;
        records
            .into_iter()
            .map(MapEntry::try_from)
            .collect::<Result<_, _>>()
            .map_err(|reason| ProbeError::Malformed {
                command: self.runner().command_line(&probe.args()),
                reason,
            })
    }

    /// Translated instructions of a program as display lines.
    pub fn disassembly(&self, prog_id: u32) -> Result<Vec<String>, ProbeError> {
        let insns = invoke(self.runner(), &ProgDumpXlated { id: prog_id })?.records;
        Ok(disassembly_lines(&insns))
    }

    /// Write `value` under `key`. Sizes are checked against the map first.
    pub fn update_map_entry(
        &self,
        map: &MapEntity,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), EditError> {
        if map.frozen {
            return Err(EditError::Frozen(map.id));
        }
        check_size("key", map.key_size, key)?;
        check_size("value", map.value_size, value)?;

        let mut args = vec![
            "map".to_string(),
            "update".to_string(),
            "id".to_string(),
            map.id.to_string(),
            "key".to_string(),
        ];
        args.extend(hex_args(key));
        args.push("value".to_string());
        args.extend(hex_args(value));

        run_action(self.runner(), &args)?;
        log::info!("updated entry of map {}", map.id);
        Ok(())
    }

    pub fn delete_map_entry(&self, map: &MapEntity, key: &[u8]) -> Result<(), EditError> {
        if map.frozen {
            return Err(EditError::Frozen(map.id));
        }
        check_size("key", map.key_size, key)?;

        let mut args = vec![
            "map".to_string(),
            "delete".to_string(),
            "id".to_string(),
            map.id.to_string(),
            "key".to_string(),
        ];
        args.extend(hex_args(key));

        run_action(self.runner(), &args)?;
        log::info!("deleted entry of map {}", map.id);
        Ok(())
    }

    /// Plain-text report of what the kernel and bpftool support.
    pub fn features(&self) -> Result<String, ProbeError> {
        run_text(self.runner(), &["feature".to_string(), "probe".to_string()])
    }

    pub fn render_config(&self) -> RenderConfig {
        *self.render.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_render_config(&self, config: RenderConfig) {
        *self.render.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Render an entry under the current configuration.
    pub fn format_entry(&self, entry: &MapEntry) -> (String, String) {
        entry.render(&self.render_config())
    }

    pub fn format_bytes(&self, data: &[u8]) -> String {
        format_bytes(data, &self.render_config())
    }
}

fn check_size(what: &'static str, expected: u32, bytes: &[u8]) -> Result<(), EditError> {
    let expected = expected as usize;
    if bytes.len() != expected {
        return Err(EditError::SizeMismatch {
            what,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Number the instructions; prototypes and source lines are annotations
/// and do not advance the counter.
fn disassembly_lines(insns: &[XlatedInsn]) -> Vec<String> {
    let mut lines = Vec::with_capacity(insns.len());
    let mut idx = 0;
    for insn in insns {
        if let Some(proto) = &insn.proto {
            lines.push(format!("{proto}:"));
        }
        if let Some(src) = &insn.src {
            lines.push(format!("; {src}"));
        }
        if let Some(disasm) = &insn.disasm {
            lines.push(format!("{idx:>4}: {disasm}"));
            idx += 1;
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::testing::FakeRunner;
    use bpfinspect_common::{DataFormat, DataWidth, Endianness};

    const MAPS: &str = r#"[
        {"id": 3, "type": "hash", "name": "counts", "bytes_key": 4, "bytes_value": 8, "max_entries": 16},
        {"id": 4, "type": "array", "name": "cfg", "bytes_key": 4, "bytes_value": 4, "max_entries": 1, "frozen": 1}
    ]"#;

    fn monitor(runner: FakeRunner) -> (Arc<FakeRunner>, Monitor) {
        let runner = Arc::new(runner);
        let monitor = Monitor::new(Arc::clone(&runner) as Arc<dyn ToolRunner>);
        (runner, monitor)
    }

    #[test]
    fn get_maps_keeps_requested_order_and_skips_unknown() {
        let runner = FakeRunner::default();
        runner.respond("-j map show", MAPS);
        let (_, monitor) = monitor(runner);

        let maps = monitor.get_maps(&[4, 99, 3]).unwrap();
        let ids: Vec<u32> = maps.iter().map(|m| m.id).collect();
        assert_eq!(ids, [4, 3]);
        assert!(maps[0].frozen);
        assert!(monitor.get_map(99).unwrap().is_none());
        assert!(monitor.get_maps(&[]).unwrap().is_empty());
    }

    #[test]
    fn map_entries_are_fetched_every_time() {
        let runner = FakeRunner::default();
        runner.respond(
            "-j map dump id 3",
            r#"[{"key": ["0x01", "0x00", "0x00", "0x00"], "value": ["0x41", "0x00"]}]"#,
        );
        let (runner, monitor) = monitor(runner);

        let entries = monitor.get_map_entries(3).unwrap();
        assert_eq!(entries[0].key, [1, 0, 0, 0]);
        monitor.get_map_entries(3).unwrap();
        assert_eq!(runner.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn bad_hex_in_dump_is_malformed() {
        let runner = FakeRunner::default();
        runner.respond("-j map dump id 3", r#"[{"key": ["0xzz"], "value": []}]"#);
        let (_, monitor) = monitor(runner);
        assert!(matches!(
            monitor.get_map_entries(3),
            Err(ProbeError::Malformed { .. })
        ));
    }

    #[test]
    fn update_checks_sizes_before_running() {
        let runner = FakeRunner::default();
        runner.respond("map update id 3 key hex 01 00 00 00 value hex 2a 00 00 00 00 00 00 00", "");
        let (runner, monitor) = monitor(runner);
        let map = MapEntity {
            id: 3,
            key_size: 4,
            value_size: 8,
            ..MapEntity::default()
        };

        assert!(matches!(
            monitor.update_map_entry(&map, &[1], &[0; 8]),
            Err(EditError::SizeMismatch { what: "key", .. })
        ));
        assert!(runner.calls.lock().unwrap().is_empty());

        monitor
            .update_map_entry(&map, &[1, 0, 0, 0], &[42, 0, 0, 0, 0, 0, 0, 0])
            .unwrap();
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn frozen_maps_reject_edits() {
        let (runner, monitor) = monitor(FakeRunner::default());
        let map = MapEntity {
            id: 4,
            key_size: 4,
            frozen: true,
            ..MapEntity::default()
        };
        assert!(matches!(
            monitor.delete_map_entry(&map, &[0; 4]),
            Err(EditError::Frozen(4))
        ));
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn delete_failure_carries_probe_error() {
        let runner = FakeRunner::default();
        runner.fail("map delete id 3 key hex 01 00 00 00", 255, "Error: delete failed");
        let (_, monitor) = monitor(runner);
        let map = MapEntity {
            id: 3,
            key_size: 4,
            ..MapEntity::default()
        };
        let err = monitor.delete_map_entry(&map, &[1, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, EditError::Probe(ProbeError::Exit { .. })));
    }

    #[test]
    fn render_config_is_shared_between_clones() {
        let (_, monitor) = monitor(FakeRunner::default());
        let other = monitor.clone();
        other.set_render_config(RenderConfig::new(
            DataFormat::Hex,
            DataWidth::W16,
            Endianness::Big,
        ));
        let entry = MapEntry {
            key: vec![0x41],
            value: vec![0x41],
        };
        assert_eq!(
            monitor.format_entry(&entry),
            ("0x4100".to_string(), "0x4100".to_string())
        );
        assert_eq!(monitor.format_bytes(&[]), "");
    }

    #[test]
    fn disassembly_numbers_instructions_only() {
        let runner = FakeRunner::default();
        runner.respond(
            "-j prog dump xlated id 7",
            r#"[{"proto": "int handle(void * ctx)", "src": "int handle(void *ctx)", "disasm": "r0 = 0"},
                {"disasm": "exit"}]"#,
        );
        let (_, monitor) = monitor(runner);
        assert_eq!(
            monitor.disassembly(7).unwrap(),
            [
                "int handle(void * ctx):",
                "; int handle(void *ctx)",
                "   0: r0 = 0",
                "   1: exit"
            ]
        );
    }

    #[test]
    fn lookups_miss_before_first_refresh() {
        let (_, monitor) = monitor(FakeRunner::default());
        assert!(monitor.snapshot().is_empty());
        assert!(monitor.program(1).is_none());
        assert_eq!(monitor.latest().generation, 0);
    }

    #[test]
    fn features_return_plain_stdout() {
        let runner = FakeRunner::default();
        runner.respond("feature probe", "Scanning system configuration...\nJIT compiler is enabled\n");
        let (runner, monitor) = monitor(runner);
        let text = monitor.features().unwrap();
        assert!(text.ends_with("JIT compiler is enabled\n"));
        assert_eq!(*runner.calls.lock().unwrap(), ["feature probe"]);
    }
}
