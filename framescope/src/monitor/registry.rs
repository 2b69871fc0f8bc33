use std::sync::{Arc, Mutex};

use crate::{
    Error, Result,
    host::{HostWindow, same_window},
    internal::lock,
    monitor::{MAX_WINDOW_MONITORS, WindowMonitor},
};

struct Slots {
    monitors: [Option<Arc<WindowMonitor>>; MAX_WINDOW_MONITORS],
    len: usize,
}

/// Fixed-capacity set of the live window monitors.
///
/// Guarded by its own lock, distinct from the event queue's. Monitors are
/// always dropped after the lock is released.
pub(crate) struct MonitorRegistry {
    slots: Mutex<Slots>,
}

impl MonitorRegistry {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Slots {
                monitors: Default::default(),
                len: 0,
            }),
        }
    }

    /// Registers the monitor built by `create` for `window`.
    ///
    /// Returns `Ok(None)` without calling `create` if the window is already
    /// monitored.
    pub fn insert_with(
        &self,
        window: &Arc<dyn HostWindow>,
        create: impl FnOnce() -> Arc<WindowMonitor>,
    ) -> Result<Option<Arc<WindowMonitor>>> {
        let mut slots = lock(&self.slots);
        let len = slots.len;
        if slots.monitors[..len]
            .iter()
            .flatten()
            .any(|m| same_window(m.window(), window))
        {
            return Ok(None);
        }
        if len == MAX_WINDOW_MONITORS {
            tracing::warn!(capacity = MAX_WINDOW_MONITORS, "can't monitor more windows");
            return Err(Error::MonitorCapacity(MAX_WINDOW_MONITORS));
        }
        let monitor = create();
        slots.monitors[len] = Some(monitor.clone());
        slots.len += 1;
        Ok(Some(monitor))
    }

    /// Unregisters `monitor`. Returns `false` if it was not registered.
    pub fn remove(&self, monitor: &WindowMonitor) -> bool {
        let removed = {
            let mut slots = lock(&self.slots);
            let len = slots.len;
            let Some(index) = slots.monitors[..len]
                .iter()
                .position(|m| m.as_deref().is_some_and(|m| std::ptr::eq(m, monitor)))
            else {
                return false;
            };
            let removed = slots.monitors[index].take();
            slots.monitors[index..len].rotate_left(1);
            slots.len -= 1;
            removed
        };
        removed.is_some()
    }

    pub fn contains(&self, monitor: &WindowMonitor) -> bool {
        let slots = lock(&self.slots);
        slots.monitors[..slots.len]
            .iter()
            .flatten()
            .any(|m| std::ptr::eq(Arc::as_ptr(m), monitor))
    }

    /// Calls `f` on every monitor, with the registry locked.
    pub fn for_each(&self, mut f: impl FnMut(&Arc<WindowMonitor>)) {
        let slots = lock(&self.slots);
        slots.monitors[..slots.len].iter().flatten().for_each(&mut f);
    }

    pub fn len(&self) -> usize {
        lock(&self.slots).len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
