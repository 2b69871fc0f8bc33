use std::{
    sync::{Arc, Condvar, Mutex, PoisonError},
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{Result, internal::lock};

/// Shortest period between two ticks. A zero interval ticks at this pace.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

struct TimerState {
    interval: Duration,
    restart: bool,
    stop: bool,
}

struct Shared {
    state: Mutex<TimerState>,
    wake: Condvar,
}

/// Background thread calling a function periodically.
///
/// Dropping the timer stops and joins the thread. The tick function must
/// not drop the timer itself.
pub(crate) struct ProcessTimer {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl ProcessTimer {
    pub fn start(interval: Duration, tick: impl Fn() + Send + 'static) -> Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(TimerState {
                interval: interval.max(MIN_INTERVAL),
                restart: false,
                stop: false,
            }),
            wake: Condvar::new(),
        });
        let timer = shared.clone();
        let handle = thread::Builder::new()
            .name("framescope-process".into())
            .spawn(move || run(&timer, tick))?;
        tracing::debug!(interval_ms = interval.as_millis() as u64, "process timer started");
        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    /// Changes the period. The next tick happens one full period from now.
    pub fn set_interval(&self, interval: Duration) {
        let mut state = lock(&self.shared.state);
        state.interval = interval.max(MIN_INTERVAL);
        state.restart = true;
        self.shared.wake.notify_one();
    }
}

impl Drop for ProcessTimer {
    fn drop(&mut self) {
        {
            let mut state = lock(&self.shared.state);
            state.stop = true;
            self.shared.wake.notify_one();
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("process timer panicked");
            }
        }
        tracing::debug!("process timer stopped");
    }
}

fn run(shared: &Shared, tick: impl Fn()) {
    let mut state = lock(&shared.state);
    loop {
        let interval = state.interval;
        let (guard, _) = shared
            .wake
            .wait_timeout_while(state, interval, |s| !s.stop && !s.restart)
            .unwrap_or_else(PoisonError::into_inner);
        state = guard;

        if state.stop {
            return;
        }
        if state.restart {
            state.restart = false;
            continue;
        }

        drop(state);
        tick();
        state = lock(&shared.state);
    }
}
