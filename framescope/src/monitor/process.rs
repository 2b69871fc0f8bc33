use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::{Error, ProcessEvent, Result, event::timestamp};

/// Samples CPU, thread and memory usage of the current process.
///
/// CPU usage is computed between two consecutive samples, the first one
/// always reports 0.
pub struct ProcessSampler {
    system: System,
    pid: Pid,
}

impl ProcessSampler {
    pub fn new() -> Result<Self> {
        let pid = sysinfo::get_current_pid().map_err(Error::ProcessSampling)?;
        Ok(Self {
            system: System::new(),
            pid,
        })
    }

    pub fn sample(&mut self) -> Result<ProcessEvent> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::everything(),
        );
        let process = self
            .system
            .process(self.pid)
            .ok_or(Error::ProcessSampling("current process not found"))?;

        Ok(ProcessEvent {
            timestamp: timestamp(),
            cpu_usage: process.cpu_usage().round() as u32,
            thread_count: process.tasks().map_or(1, |tasks| tasks.len().max(1)) as u32,
            vsz_memory: process.virtual_memory() / 1024,
            rss_memory: process.memory() / 1024,
        })
    }
}

impl std::fmt::Debug for ProcessSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSampler")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}
