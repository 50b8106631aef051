use std::sync::Arc;

use super::enrich::{enrich, EnrichReport, ProcFs, Programs};
use crate::error::ProbeError;
use crate::probe::schema::ProgShow;
use crate::probe::{invoke, ToolRunner};

/// Builds the program set for one refresh cycle.
///
/// The primary `prog show` listing decides which programs exist; its failure
/// fails the whole cycle. The enrichment passes then annotate the owned set
/// in place and can only degrade it.
pub struct Collector {
    runner: Arc<dyn ToolRunner>,
    procfs: ProcFs,
}

impl Collector {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            runner,
            procfs: ProcFs::default(),
        }
    }

    /// Read owner process details from another proc root.
    pub fn with_procfs(mut self, procfs: ProcFs) -> Self {
        self.procfs = procfs;
        self
    }

    pub fn runner(&self) -> &dyn ToolRunner {
        self.runner.as_ref()
    }

    /// Collect and enrich all programs for one refresh cycle.
    pub fn collect(&self) -> Result<(Programs, EnrichReport), ProbeError> {
        let listing = invoke(self.runner(), &ProgShow)?;
        if !listing.stderr.trim().is_empty() {
            log::debug!("prog show stderr: {}", listing.stderr.trim());
        }

        let mut programs = Programs::new();
        for record in listing.records {
            let id = record.id;
            if programs.insert(id, record.into()).is_some() {
                log::warn!("prog show listed id {id} twice, keeping the last record");
            }
        }

        let report = enrich(&mut programs, self.runner(), &self.procfs);
        Ok((programs, report))
    }
}
