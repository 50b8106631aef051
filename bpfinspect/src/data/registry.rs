use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::SystemTime;

use super::collector::Collector;
use super::enrich::{EnrichReport, Programs};
use super::program::ProgramEntity;
use crate::error::ProbeError;

/// The complete program set as of the end of one refresh cycle.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// 0 until the first successful cycle, then +1 per published snapshot.
    pub generation: u64,
    pub refreshed_at: Option<SystemTime>,
    pub programs: Programs,
    pub report: EnrichReport,
}

impl Snapshot {
    pub fn get(&self, id: u32) -> Option<&ProgramEntity> {
        self.programs.get(&id)
    }

    /// Programs in ascending id order.
    pub fn programs(&self) -> impl Iterator<Item = &ProgramEntity> {
        self.programs.values()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

/// Holder of the published snapshot.
///
/// A refresh cycle holds `cycle` from the listing probe until the swap, so
/// cycles never interleave. Readers only touch `current`, which changes in a
/// single write: they see the whole previous snapshot or the whole new one.
#[derive(Debug, Default)]
pub struct Registry {
    current: RwLock<Arc<Snapshot>>,
    cycle: Mutex<()>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run one full cycle and publish its result. On failure the previous
    /// snapshot stays in place.
    pub fn refresh(&self, collector: &Collector) -> Result<Arc<Snapshot>, ProbeError> {
        let _cycle = self.cycle.lock().unwrap_or_else(PoisonError::into_inner);

        let (programs, report) = match collector.collect() {
            Ok(collected) => collected,
            Err(e) => {
                log::error!("refresh failed, keeping previous snapshot: {e}");
                return Err(e);
            }
        };

        let next = Arc::new(Snapshot {
            generation: self.snapshot().generation + 1,
            refreshed_at: Some(SystemTime::now()),
            programs,
            report,
        });
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);

        log::debug!(
            "published snapshot {} with {} programs",
            next.generation,
            next.len()
        );
        Ok(next)
    }
}
