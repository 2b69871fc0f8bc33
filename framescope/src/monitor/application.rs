use std::{
    fmt,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicU32, Ordering},
    },
    thread,
    time::Duration,
};

use crate::{
    EventType, GenericEvent, LoggingFilter, LoggingThread, MonitorConfig, ProcessEvent, Result,
    Sink, SinkId,
    host::{Host, HostInfo, HostWindow},
    internal::lock,
    logging::SinkTable,
    monitor::{MonitorFlags, MonitorRegistry, ProcessSampler, ProcessTimer, WindowMonitor},
};

/// Events the application monitor logs on behalf of the host, as generic
/// events with the reserved id 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitorEvent {
    /// The user interface is fully loaded and displayed.
    UserInterfaceReady,
}

impl MonitorEvent {
    pub fn name(self) -> &'static str {
        match self {
            MonitorEvent::UserInterfaceReady => "UserInterfaceReady",
        }
    }
}

struct State {
    overlay: bool,
    logging: bool,
    started: bool,
    /// A stop is waiting for the window monitors to go away.
    stopping: bool,
    closing_down: bool,
    filter: LoggingFilter,
    sinks: SinkTable,
    logging_thread: Option<LoggingThread>,
    process_interval: i32,
    timer: Option<ProcessTimer>,
    config: MonitorConfig,
}

impl State {
    fn flags(&self) -> MonitorFlags {
        MonitorFlags {
            overlay: self.overlay,
            logging: self.logging,
            filter: self.filter,
        }
    }
}

struct Inner {
    host: Arc<dyn Host>,
    host_info: Arc<HostInfo>,
    registry: Arc<MonitorRegistry>,
    state: Mutex<State>,
    sampler: Mutex<Option<ProcessSampler>>,
    /// Last process sample, handed to new window monitors.
    process_event: Mutex<ProcessEvent>,
    next_window_id: AtomicU32,
    next_generic_id: AtomicU32,
}

/// Entry point of the library: turns monitoring of a host application on
/// and off.
///
/// Monitoring runs while the overlay or logging is enabled, the two can be
/// toggled independently. While running, every visible window of the host
/// gets a window monitor, a process sample is taken periodically and events
/// flow to the installed sinks.
///
/// The host must forward window show notifications to
/// [`on_window_shown`](Self::on_window_shown) and call
/// [`close_down`](Self::close_down) when its last window closes or it is
/// about to quit. Dropping the monitor closes it down.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use framescope::{ApplicationMonitor, LoggingFilter, MonitorConfig, sinks::TracingSink};
///
/// let monitor = ApplicationMonitor::new(host, MonitorConfig::default());
/// // Every visible window of the host is now monitored.
/// monitor.install_sink(Arc::new(TracingSink))?;
/// monitor.set_logging_filter(LoggingFilter::FRAME | LoggingFilter::PROCESS);
/// monitor.set_logging(true)?;
/// ```
pub struct ApplicationMonitor {
    inner: Arc<Inner>,
}

impl ApplicationMonitor {
    pub fn new(host: Arc<dyn Host>, config: MonitorConfig) -> Self {
        let host_info = Arc::new(HostInfo::from_host(host.as_ref()));
        let state = State {
            overlay: false,
            logging: false,
            started: false,
            stopping: false,
            closing_down: false,
            filter: config.logging_filter(),
            sinks: SinkTable::new(),
            logging_thread: None,
            process_interval: config.process_update_interval(),
            timer: None,
            config,
        };
        Self {
            inner: Arc::new(Inner {
                host,
                host_info,
                registry: Arc::new(MonitorRegistry::new()),
                state: Mutex::new(state),
                sampler: Mutex::new(None),
                process_event: Mutex::new(ProcessEvent::default()),
                next_window_id: AtomicU32::new(0),
                next_generic_id: AtomicU32::new(0),
            }),
        }
    }

    /// Shows or hides the overlay on every monitored window.
    pub fn set_overlay(&self, overlay: bool) -> Result {
        self.inner.toggle(overlay, |state| &mut state.overlay)
    }

    pub fn overlay(&self) -> bool {
        lock(&self.inner.state).overlay
    }

    /// Enables or disables delivery of events to the sinks.
    pub fn set_logging(&self, logging: bool) -> Result {
        self.inner.toggle(logging, |state| &mut state.logging)
    }

    pub fn logging(&self) -> bool {
        lock(&self.inner.state).logging
    }

    /// Returns `true` while the overlay or logging is enabled and the
    /// monitor has not been closed down.
    pub fn is_started(&self) -> bool {
        lock(&self.inner.state).started
    }

    /// Selects the event types delivered to the sinks.
    pub fn set_logging_filter(&self, filter: LoggingFilter) {
        let mut state = lock(&self.inner.state);
        if state.filter != filter {
            state.filter = filter;
            if state.started {
                self.inner.set_monitoring_flags(state.flags());
            }
        }
    }

    pub fn logging_filter(&self) -> LoggingFilter {
        lock(&self.inner.state).filter
    }

    /// Installed sinks, in delivery order.
    pub fn sinks(&self) -> Vec<(SinkId, Arc<dyn Sink>)> {
        lock(&self.inner.state)
            .sinks
            .entries()
            .map(|(id, sink)| (id, sink.clone()))
            .collect()
    }

    /// Appends a sink. Fails once [`MAX_SINKS`](crate::logging::MAX_SINKS)
    /// sinks are installed.
    pub fn install_sink(&self, sink: Arc<dyn Sink>) -> Result<SinkId> {
        let mut state = lock(&self.inner.state);
        let id = state.sinks.install(sink)?;
        update_thread_sinks(&state);
        Ok(id)
    }

    /// Removes a sink and hands it back. The sink is released once the
    /// returned handle and any delivery in progress are done with it.
    pub fn remove_sink(&self, id: SinkId) -> Result<Arc<dyn Sink>> {
        let mut state = lock(&self.inner.state);
        let sink = state.sinks.remove(id)?;
        update_thread_sinks(&state);
        Ok(sink)
    }

    /// Removes every sink and hands them back.
    pub fn clear_sinks(&self) -> Vec<Arc<dyn Sink>> {
        let mut state = lock(&self.inner.state);
        let sinks = state.sinks.clear();
        update_thread_sinks(&state);
        sinks
    }

    /// Returns a new generic event id. Ids start at 1, 0 is reserved for
    /// [`MonitorEvent`]s.
    pub fn register_generic_event(&self) -> u32 {
        self.inner.next_generic_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Logs a generic event. Strings longer than
    /// [`GenericEvent::MAX_STRING_SIZE`] are truncated.
    ///
    /// Returns `false` if generic events are not being logged.
    pub fn log_generic_event(&self, id: u32, string: &[u8]) -> bool {
        let thread = {
            let state = lock(&self.inner.state);
            if !state.flags().logs(EventType::Generic) {
                return false;
            }
            match &state.logging_thread {
                Some(thread) => thread.clone(),
                None => return false,
            }
        };
        thread.push(GenericEvent::new(id, string));
        true
    }

    pub fn log_event(&self, event: MonitorEvent) -> bool {
        self.log_generic_event(0, event.name().as_bytes())
    }

    /// Sets the sampling period of `event_type` in milliseconds. A negative
    /// interval disables sampling. Only process sampling is configurable,
    /// other types are ignored.
    pub fn set_update_interval(&self, event_type: EventType, interval: i32) -> Result {
        if event_type != EventType::Process {
            return Ok(());
        }
        let mut state = lock(&self.inner.state);
        if state.process_interval == interval {
            return Ok(());
        }
        state.process_interval = interval;

        let stopped = if !state.started {
            None
        } else if interval < 0 {
            state.timer.take()
        } else if let Some(timer) = &state.timer {
            timer.set_interval(millis(interval));
            None
        } else {
            state.timer = Some(self.inner.start_timer(interval)?);
            None
        };
        drop(state);
        drop(stopped);
        Ok(())
    }

    pub fn update_interval(&self, event_type: EventType) -> i32 {
        match event_type {
            EventType::Process => lock(&self.inner.state).process_interval,
            _ => -1,
        }
    }

    /// Starts monitoring a window that just became visible. Does nothing if
    /// monitoring is stopped or the window is already monitored.
    pub fn on_window_shown(&self, window: Arc<dyn HostWindow>) -> Result {
        let state = lock(&self.inner.state);
        let Some(thread) = state.logging_thread.clone() else {
            return Ok(());
        };
        self.inner.start_monitoring(&window, thread, &state)
    }

    /// Replaces the overlay template of every window, current and future.
    pub fn set_overlay_text(&self, text: &str) {
        let mut state = lock(&self.inner.state);
        state.config = state.config.clone().with_overlay_text(text);
        self.inner.registry.for_each(|monitor| monitor.set_overlay_text(text));
    }

    /// Number of windows currently monitored.
    pub fn window_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Stops monitoring for good. Enabling the overlay or logging afterwards
    /// has no effect on windows.
    pub fn close_down(&self) {
        let mut state = lock(&self.inner.state);
        state.closing_down = true;
        if state.started {
            self.inner.stop(state);
        }
    }
}

impl Drop for ApplicationMonitor {
    fn drop(&mut self) {
        self.close_down();
    }
}

impl fmt::Debug for ApplicationMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("ApplicationMonitor")
            .field("overlay", &state.overlay)
            .field("logging", &state.logging)
            .field("started", &state.started)
            .field("filter", &state.filter)
            .field("sinks", &state.sinks.len())
            .field("windows", &self.inner.registry.len())
            .finish()
    }
}

impl Inner {
    /// Flips one of the overlay / logging switches, starting monitoring when
    /// the first one turns on and stopping it when both are off.
    fn toggle(
        self: &Arc<Self>,
        enable: bool,
        switch: impl Fn(&mut State) -> &mut bool,
    ) -> Result {
        let mut state = lock(&self.state);
        if *switch(&mut *state) == enable {
            return Ok(());
        }
        *switch(&mut *state) = enable;
        if state.stopping {
            // Picked up by the stop in progress once the windows are gone.
            return Ok(());
        }

        if state.overlay || state.logging {
            if !state.started && !state.closing_down {
                if let Err(e) = self.start(&mut *state) {
                    *switch(&mut *state) = !enable;
                    return Err(e);
                }
            } else if state.started {
                self.set_monitoring_flags(state.flags());
            }
        } else if state.started {
            self.stop(state);
        }
        Ok(())
    }

    fn start(self: &Arc<Self>, state: &mut State) -> Result {
        debug_assert!(!state.started);

        let thread = LoggingThread::start()?;
        thread.set_sinks(state.sinks.sinks());
        state.logging_thread = Some(thread.clone());
        state.started = true;
        tracing::debug!(overlay = state.overlay, logging = state.logging, "monitoring started");

        for window in self.host.windows() {
            if window.is_visible() {
                // Windows beyond capacity are reported and skipped.
                let _ = self.start_monitoring(&window, thread.clone(), state);
            }
        }

        *lock(&self.process_event) = ProcessEvent::default();
        self.sample_process(state.flags(), &thread);
        if state.process_interval >= 0 {
            match self.start_timer(state.process_interval) {
                Ok(timer) => state.timer = Some(timer),
                Err(e) => tracing::warn!(error = %e, "periodic process sampling disabled"),
            }
        }
        Ok(())
    }

    /// Tears down every window monitor on its render thread and waits for
    /// all of them to be gone.
    ///
    /// Switches turned back on while waiting restart monitoring afterwards.
    fn stop(self: &Arc<Self>, mut state: MutexGuard<'_, State>) {
        debug_assert!(state.started && !state.stopping);

        state.started = false;
        state.stopping = true;
        let timer = state.timer.take();
        let thread = state.logging_thread.take();
        drop(state);
        drop(timer);

        let registry = Arc::downgrade(&self.registry);
        self.registry.for_each(|monitor| {
            let registry = registry.clone();
            let monitor = monitor.clone();
            let window = monitor.window().clone();
            window.schedule_render_job(Box::new(move || {
                let Some(registry) = registry.upgrade() else {
                    return;
                };
                if registry.contains(&monitor) {
                    monitor.teardown();
                    registry.remove(&monitor);
                }
            }));
        });
        drop(thread);

        while !self.registry.is_empty() {
            self.host.process_events();
            thread::yield_now();
        }

        let mut state = lock(&self.state);
        state.stopping = false;
        tracing::debug!("monitoring stopped");

        if (state.overlay || state.logging) && !state.closing_down {
            if let Err(e) = self.start(&mut *state) {
                tracing::warn!(error = %e, "monitoring restart failed");
                state.overlay = false;
                state.logging = false;
            }
        }
    }

    fn start_monitoring(
        &self,
        window: &Arc<dyn HostWindow>,
        thread: LoggingThread,
        state: &State,
    ) -> Result {
        let flags = state.flags();
        let created = self.registry.insert_with(window, || {
            let id = self.next_window_id.fetch_add(1, Ordering::Relaxed) + 1;
            WindowMonitor::new(
                id,
                window.clone(),
                Arc::downgrade(&self.registry),
                thread,
                flags,
                &state.config,
                self.host_info.clone(),
            )
        })?;

        if let Some(monitor) = created {
            monitor.set_process_event(&lock(&self.process_event));
            window.attach(monitor);
        }
        Ok(())
    }

    /// Schedules a flag update on every window's render thread. The update
    /// is dropped if the window stops being monitored before it runs.
    fn set_monitoring_flags(&self, flags: MonitorFlags) {
        let registry = Arc::downgrade(&self.registry);
        self.registry.for_each(|monitor| {
            let registry = registry.clone();
            let target = monitor.clone();
            monitor.window().schedule_render_job(Box::new(move || {
                if registry
                    .upgrade()
                    .is_some_and(|registry| registry.contains(&target))
                {
                    target.set_flags(flags);
                }
            }));
        });
    }

    fn start_timer(self: &Arc<Self>, interval: i32) -> Result<ProcessTimer> {
        let inner = Arc::downgrade(self);
        ProcessTimer::start(millis(interval), move || {
            if let Some(inner) = inner.upgrade() {
                inner.process_timeout();
            }
        })
    }

    fn process_timeout(&self) {
        let (flags, thread) = {
            let state = lock(&self.state);
            match (&state.logging_thread, state.started) {
                (Some(thread), true) => (state.flags(), thread.clone()),
                _ => return,
            }
        };
        self.sample_process(flags, &thread);
    }

    /// Takes a process sample, logs it and hands it to every overlay.
    fn sample_process(&self, flags: MonitorFlags, thread: &LoggingThread) {
        let logging = flags.logs(EventType::Process);
        if !logging && !flags.overlay {
            return;
        }

        let event = {
            let mut sampler = lock(&self.sampler);
            if sampler.is_none() {
                match ProcessSampler::new() {
                    Ok(created) => *sampler = Some(created),
                    Err(e) => {
                        tracing::warn!(error = %e, "process sampling unavailable");
                        return;
                    }
                }
            }
            let Some(sampler) = sampler.as_mut() else {
                return;
            };
            match sampler.sample() {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(error = %e, "process sample failed");
                    return;
                }
            }
        };
        *lock(&self.process_event) = event;

        if logging {
            thread.push(event);
        }
        if flags.overlay {
            self.registry.for_each(|monitor| monitor.set_process_event(&event));
        }
    }
}

fn update_thread_sinks(state: &State) {
    if let Some(thread) = &state.logging_thread {
        thread.set_sinks(state.sinks.sinks());
    }
}

fn millis(interval: i32) -> Duration {
    Duration::from_millis(interval.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::{
        Error, Event, WindowState,
        testing::{HeadlessHost, HeadlessWindow, ManualGpuTimer, RecordingSink},
    };

    fn config() -> MonitorConfig {
        MonitorConfig::default().with_process_update_interval(-1)
    }

    fn logging_monitor(
        host: &Arc<HeadlessHost>,
        config: MonitorConfig,
    ) -> (ApplicationMonitor, RecordingSink) {
        let sink = RecordingSink::new();
        let monitor = ApplicationMonitor::new(host.clone(), config);
        monitor.install_sink(Arc::new(sink.clone())).unwrap();
        monitor.set_logging(true).unwrap();
        (monitor, sink)
    }

    fn window_events(sink: &RecordingSink) -> Vec<(WindowState, u32, u32)> {
        sink.events_of(EventType::Window)
            .into_iter()
            .filter_map(|event| match event {
                Event::Window(e) => Some((e.state, e.width, e.height)),
                _ => None,
            })
            .collect()
    }

    fn frame_numbers(sink: &RecordingSink) -> Vec<u32> {
        sink.events_of(EventType::Frame)
            .into_iter()
            .filter_map(|event| match event {
                Event::Frame(e) => Some(e.frame_number),
                _ => None,
            })
            .collect()
    }

    fn render_frames(window: &HeadlessWindow, count: usize) {
        for _ in 0..count {
            window.render_frame();
        }
    }

    fn wait_for(condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met in time");
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// A window rendering on its own thread, whose GPU timer takes `delay`
    /// to finalize.
    fn slow_teardown_window(host: &HeadlessHost, delay: Duration) -> Arc<HeadlessWindow> {
        let timer = ManualGpuTimer::new(1_000_000);
        timer.set_finalize_delay(delay);
        host.add(HeadlessWindow::with_gpu_timer(320, 240, timer))
    }

    #[test]
    fn logging_delivers_window_and_frame_events() {
        let host = HeadlessHost::new();
        let window = host.add_window(800, 600);
        let (monitor, sink) = logging_monitor(&host, config());
        assert!(monitor.is_started());
        assert_eq!(monitor.window_count(), 1);
        assert!(window.is_attached());

        render_frames(&window, 3);
        monitor.set_logging(false).unwrap();

        assert!(!monitor.is_started());
        assert!(!window.is_attached());
        assert_eq!(frame_numbers(&sink), vec![1, 2]);
        assert_eq!(
            window_events(&sink),
            vec![(WindowState::Shown, 800, 600), (WindowState::Hidden, 800, 600)]
        );
        for event in sink.events_of(EventType::Frame) {
            if let Event::Frame(frame) = event {
                assert_eq!(frame.window_id, 1);
            }
        }
    }

    #[test]
    fn resizes_are_logged() {
        let host = HeadlessHost::new();
        let window = host.add_window(800, 600);
        let (monitor, sink) = logging_monitor(&host, config());

        window.render_frame();
        window.resize(1024, 768);
        window.render_frame();
        monitor.set_logging(false).unwrap();

        assert_eq!(
            window_events(&sink),
            vec![
                (WindowState::Shown, 800, 600),
                (WindowState::Resized, 1024, 768),
                (WindowState::Hidden, 1024, 768),
            ]
        );
    }

    #[test]
    fn filter_reaches_windows_on_their_render_thread() {
        let host = HeadlessHost::new();
        let window = host.add_window(800, 600);
        let (monitor, sink) = logging_monitor(&host, config());

        monitor.set_logging_filter(LoggingFilter::WINDOW);
        assert_eq!(window.pending_jobs(), 1);
        render_frames(&window, 3);
        monitor.set_logging(false).unwrap();

        assert_eq!(sink.count(EventType::Frame), 0);
        assert_eq!(window_events(&sink).len(), 2);
    }

    #[test]
    fn gpu_time_is_zero_without_gpu_timer() {
        let host = HeadlessHost::new();
        let window = host.add_window(800, 600);
        let (monitor, sink) = logging_monitor(&host, config().with_gpu_timer(false));

        render_frames(&window, 2);
        monitor.set_logging(false).unwrap();

        assert!(!window.gpu_timer().is_initialized());
        let frames = sink.events_of(EventType::Frame);
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], Event::Frame(frame) if frame.gpu_time == 0));
    }

    #[test]
    fn ninth_sink_is_rejected() {
        let monitor = ApplicationMonitor::new(HeadlessHost::new(), config());
        for expected in 0..8 {
            let id = monitor.install_sink(Arc::new(RecordingSink::new())).unwrap();
            assert_eq!(id, expected);
        }
        assert_eq!(
            monitor.install_sink(Arc::new(RecordingSink::new())),
            Err(Error::SinkCapacity(8))
        );
        assert_eq!(monitor.sinks().len(), 8);
    }

    #[test]
    fn removed_sink_stops_receiving() {
        let monitor = ApplicationMonitor::new(HeadlessHost::new(), config());
        let kept = RecordingSink::new();
        let removed = RecordingSink::new();
        monitor.install_sink(Arc::new(kept.clone())).unwrap();
        let id = monitor.install_sink(Arc::new(removed.clone())).unwrap();
        monitor.set_logging(true).unwrap();

        monitor.remove_sink(id).unwrap();
        assert_eq!(monitor.remove_sink(id).err(), Some(Error::UnknownSink(id)));
        assert!(monitor.log_generic_event(1, b"after"));
        monitor.set_logging(false).unwrap();

        assert_eq!(kept.count(EventType::Generic), 1);
        assert_eq!(removed.count(EventType::Generic), 0);
    }

    #[test]
    fn cleared_sinks_are_handed_back() {
        let monitor = ApplicationMonitor::new(HeadlessHost::new(), config());
        monitor.install_sink(Arc::new(RecordingSink::new())).unwrap();
        monitor.install_sink(Arc::new(RecordingSink::new())).unwrap();
        assert_eq!(monitor.clear_sinks().len(), 2);
        assert!(monitor.sinks().is_empty());
    }

    #[test]
    fn generic_ids_start_at_one() {
        let monitor = ApplicationMonitor::new(HeadlessHost::new(), config());
        assert_eq!(monitor.register_generic_event(), 1);
        assert_eq!(monitor.register_generic_event(), 2);
    }

    #[test]
    fn generic_events_need_logging() {
        let host = HeadlessHost::new();
        let sink = RecordingSink::new();
        let monitor = ApplicationMonitor::new(host, config());
        monitor.install_sink(Arc::new(sink.clone())).unwrap();
        let id = monitor.register_generic_event();
        assert!(!monitor.log_generic_event(id, b"too early"));

        monitor.set_logging(true).unwrap();
        assert!(monitor.log_generic_event(id, b"loaded"));
        assert!(monitor.log_event(MonitorEvent::UserInterfaceReady));
        monitor.set_logging(false).unwrap();

        let generic: Vec<(u32, String)> = sink
            .events_of(EventType::Generic)
            .into_iter()
            .filter_map(|event| match event {
                Event::Generic(e) => Some((e.id, e.string().into_owned())),
                _ => None,
            })
            .collect();
        assert_eq!(
            generic,
            vec![(1, "loaded".to_string()), (0, "UserInterfaceReady".to_string())]
        );
    }

    #[test]
    fn generic_events_follow_the_filter() {
        let host = HeadlessHost::new();
        let (monitor, _sink) =
            logging_monitor(&host, config().with_logging_filter(LoggingFilter::FRAME));
        assert!(!monitor.log_generic_event(1, b"filtered"));
    }

    #[test]
    fn seventeenth_window_is_not_monitored() {
        let host = HeadlessHost::new();
        let windows: Vec<_> = (0..17).map(|_| host.add_window(320, 240)).collect();
        let monitor = ApplicationMonitor::new(host.clone(), config());

        monitor.set_overlay(true).unwrap();
        assert_eq!(monitor.window_count(), 16);
        assert!(!windows[16].is_attached());
        assert_eq!(
            monitor.on_window_shown(windows[16].clone()),
            Err(Error::MonitorCapacity(16))
        );

        monitor.set_overlay(false).unwrap();
        assert_eq!(monitor.window_count(), 0);
    }

    #[test]
    fn window_is_monitored_once() {
        let host = HeadlessHost::new();
        let window = host.add_window(320, 240);
        let monitor = ApplicationMonitor::new(host.clone(), config());
        monitor.set_overlay(true).unwrap();

        monitor.on_window_shown(window.clone()).unwrap();
        assert_eq!(monitor.window_count(), 1);
    }

    #[test]
    fn shown_windows_join_a_running_monitor() {
        let host = HeadlessHost::new();
        let monitor = ApplicationMonitor::new(host.clone(), config());
        let window = host.add_window(320, 240);
        monitor.on_window_shown(window.clone()).unwrap();
        assert_eq!(monitor.window_count(), 0);

        monitor.set_overlay(true).unwrap();
        let late = host.add_window(640, 480);
        late.set_visible(false);
        monitor.on_window_shown(late.clone()).unwrap();
        assert_eq!(monitor.window_count(), 2);
        assert!(late.is_attached());
    }

    #[test]
    fn hidden_windows_are_skipped_at_start() {
        let host = HeadlessHost::new();
        let window = host.add_window(320, 240);
        window.set_visible(false);
        let monitor = ApplicationMonitor::new(host.clone(), config());
        monitor.set_overlay(true).unwrap();
        assert_eq!(monitor.window_count(), 0);
    }

    #[test]
    fn closed_down_monitor_never_restarts() {
        let host = HeadlessHost::new();
        let window = host.add_window(320, 240);
        let monitor = ApplicationMonitor::new(host.clone(), config());
        monitor.set_overlay(true).unwrap();

        monitor.close_down();
        assert!(!monitor.is_started());
        assert!(!window.is_attached());

        monitor.set_logging(true).unwrap();
        assert!(monitor.logging());
        assert!(!monitor.is_started());
        assert_eq!(monitor.window_count(), 0);
    }

    #[test]
    fn overlay_shows_frame_metrics() {
        let host = HeadlessHost::new();
        let window = host.add_window(640, 480);
        let monitor = ApplicationMonitor::new(
            host.clone(),
            config().with_overlay_text("#%windowId F:%5frameNumber"),
        );
        monitor.set_overlay(true).unwrap();

        // The first frame only sets up the overlay.
        window.render_frame();
        assert!(window.surface().is_initialized());
        assert_eq!(window.surface().render_count(), 0);
        assert!(window.update_requests() > 0);

        render_frames(&window, 2);
        assert_eq!(window.surface().text(), "# 1 F:    2");

        monitor.set_overlay_text("%9windowSize");
        window.render_frame();
        assert_eq!(window.surface().text(), "  640x480");

        monitor.set_overlay(false).unwrap();
        assert!(!window.surface().is_initialized());
    }

    #[test]
    fn stopped_scene_graph_unregisters_window() {
        let host = HeadlessHost::new();
        let window = host.add_window(320, 240);
        let (monitor, sink) = logging_monitor(&host, config());
        window.render_frame();
        assert!(window.surface().is_initialized());

        window.stop_scene_graph();
        assert_eq!(monitor.window_count(), 0);
        assert!(!window.is_attached());
        assert!(!window.surface().is_initialized());

        monitor.set_logging(false).unwrap();
        let states: Vec<_> = window_events(&sink).into_iter().map(|(s, _, _)| s).collect();
        assert_eq!(states, vec![WindowState::Shown, WindowState::Hidden]);
    }

    #[test]
    fn invalidated_scene_graph_reinitializes() {
        let host = HeadlessHost::new();
        let window = host.add_window(320, 240);
        let (monitor, sink) = logging_monitor(&host, config());
        render_frames(&window, 3);

        window.invalidate_scene_graph();
        assert!(!window.surface().is_initialized());
        window.initialize_scene_graph();
        render_frames(&window, 1);
        monitor.set_logging(false).unwrap();

        assert_eq!(frame_numbers(&sink), vec![1, 2, 1]);
    }

    #[test]
    fn update_interval_is_process_only() {
        let monitor = ApplicationMonitor::new(HeadlessHost::new(), config());
        assert_eq!(monitor.update_interval(EventType::Process), -1);

        monitor.set_update_interval(EventType::Frame, 10).unwrap();
        assert_eq!(monitor.update_interval(EventType::Frame), -1);

        monitor.set_update_interval(EventType::Process, 10).unwrap();
        assert_eq!(monitor.update_interval(EventType::Process), 10);
    }

    #[test]
    fn process_samples_are_periodic() {
        let host = HeadlessHost::new();
        let (monitor, sink) = logging_monitor(&host, config());
        monitor.set_update_interval(EventType::Process, 5).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while sink.count(EventType::Process) < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        monitor.set_update_interval(EventType::Process, -1).unwrap();
        assert!(sink.count(EventType::Process) >= 3);
    }

    #[test]
    fn stop_waits_for_render_thread_teardown() {
        let host = HeadlessHost::threaded();
        let window = slow_teardown_window(&host, Duration::from_millis(100));
        let monitor = ApplicationMonitor::new(host.clone(), config());
        monitor.set_overlay(true).unwrap();

        let render_loop = window.spawn_render_loop(Duration::from_millis(1));
        wait_for(|| window.gpu_timer().is_initialized());
        monitor.set_overlay(false).unwrap();

        assert!(!window.is_attached());
        assert!(!window.gpu_timer().is_initialized());
        assert!(!window.surface().is_initialized());

        let rendered = window.surface().render_count();
        let frames = render_loop.frames();
        wait_for(|| render_loop.frames() > frames + 5);
        assert_eq!(window.surface().render_count(), rendered);
    }

    #[test]
    fn immediate_restart_keeps_the_new_monitor() {
        let host = HeadlessHost::threaded();
        let window = slow_teardown_window(&host, Duration::from_millis(50));
        let monitor = ApplicationMonitor::new(host.clone(), config());
        monitor.set_overlay(true).unwrap();

        let _render_loop = window.spawn_render_loop(Duration::from_millis(1));
        wait_for(|| window.gpu_timer().is_initialized());
        monitor.set_overlay(false).unwrap();
        monitor.set_overlay(true).unwrap();
        assert_eq!(monitor.window_count(), 1);

        let rendered = window.surface().render_count();
        wait_for(|| window.surface().render_count() > rendered + 3);
        assert!(window.is_attached());
        assert_eq!(monitor.window_count(), 1);

        monitor.set_overlay(false).unwrap();
        assert!(!window.is_attached());
    }

    #[test]
    fn process_samples_reach_overlay_on_render_thread() {
        let host = HeadlessHost::threaded();
        let window = host.add_window(320, 240);
        let sink = RecordingSink::new();
        let monitor = ApplicationMonitor::new(
            host.clone(),
            MonitorConfig::default()
                .with_process_update_interval(2)
                .with_logging_filter(LoggingFilter::PROCESS)
                .with_overlay_text("%4threadCount"),
        );
        monitor.install_sink(Arc::new(sink.clone())).unwrap();
        monitor.set_overlay(true).unwrap();
        monitor.set_logging(true).unwrap();

        let _render_loop = window.spawn_render_loop(Duration::from_millis(1));
        wait_for(|| sink.count(EventType::Process) >= 5);
        wait_for(|| {
            window
                .surface()
                .text()
                .trim()
                .parse::<u32>()
                .is_ok_and(|threads| threads > 0)
        });

        monitor.set_overlay(false).unwrap();
        monitor.set_logging(false).unwrap();
        assert_eq!(monitor.window_count(), 0);
    }

    #[test]
    fn switch_turned_on_while_stopping_restarts_monitoring() {
        let host = HeadlessHost::threaded();
        let window = host.add_window(320, 240);
        let monitor = ApplicationMonitor::new(host.clone(), config());
        monitor.set_logging(true).unwrap();
        assert!(window.is_attached());

        thread::scope(|scope| {
            let stopping = scope.spawn(|| monitor.set_logging(false));
            // Teardown waits for the render thread, played by this one.
            wait_for(|| window.pending_jobs() == 1);
            assert!(!monitor.is_started());

            monitor.set_overlay(true).unwrap();
            assert!(monitor.overlay());
            window.run_jobs();
            stopping.join().unwrap().unwrap();
        });

        assert!(monitor.is_started());
        assert!(monitor.overlay());
        assert!(!monitor.logging());
        assert_eq!(monitor.window_count(), 1);
        assert!(window.is_attached());

        let _render_loop = window.spawn_render_loop(Duration::from_millis(1));
        monitor.close_down();
        assert!(!monitor.is_started());
        assert!(!window.is_attached());
    }
}
