use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use crate::{host::GpuTimer, internal::lock};

#[derive(Debug)]
struct TimerState {
    supported: bool,
    initialized: bool,
    elapsed: u64,
    starts: usize,
    finalize_delay: Duration,
}

/// A GPU timer returning a fixed, test-controlled duration.
///
/// Clones share the same state.
#[derive(Debug, Clone)]
pub struct ManualGpuTimer {
    state: Arc<Mutex<TimerState>>,
}

impl ManualGpuTimer {
    /// A timer measuring `elapsed` nanoseconds for every frame.
    pub fn new(elapsed: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(TimerState {
                supported: true,
                initialized: false,
                elapsed,
                starts: 0,
                finalize_delay: Duration::ZERO,
            })),
        }
    }

    /// A timer that fails to initialize, as on a context without timer
    /// queries.
    pub fn unsupported() -> Self {
        let timer = Self::new(0);
        lock(&timer.state).supported = false;
        timer
    }

    pub fn set_elapsed(&self, elapsed: u64) {
        lock(&self.state).elapsed = elapsed;
    }

    /// Makes [`finalize`](GpuTimer::finalize) block for `delay`, like a
    /// driver waiting for pending queries.
    pub fn set_finalize_delay(&self, delay: Duration) {
        lock(&self.state).finalize_delay = delay;
    }

    pub fn is_initialized(&self) -> bool {
        lock(&self.state).initialized
    }

    /// Number of measures started.
    pub fn starts(&self) -> usize {
        lock(&self.state).starts
    }
}

impl GpuTimer for ManualGpuTimer {
    fn initialize(&mut self) -> bool {
        let mut state = lock(&self.state);
        state.initialized = state.supported;
        state.initialized
    }

    fn finalize(&mut self) {
        let delay = lock(&self.state).finalize_delay;
        thread::sleep(delay);
        lock(&self.state).initialized = false;
    }

    fn start(&mut self) {
        lock(&self.state).starts += 1;
    }

    fn stop(&mut self) -> u64 {
        let state = lock(&self.state);
        if state.initialized { state.elapsed } else { 0 }
    }
}
