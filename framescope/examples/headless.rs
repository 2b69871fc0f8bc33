//! Renders a few frames of two headless windows and prints the metrics.
//!
//! ```sh
//! cargo run --example headless --features test-harness -- frame,window --parsable
//! RUST_LOG=framescope=debug cargo run --example headless --features test-harness
//! ```

use std::{sync::Arc, thread, time::Duration};

use framescope::{
    ApplicationMonitor, LoggingFilter, MonitorConfig, MonitorEvent, Result, sinks::FileSink,
    testing::HeadlessHost,
};
use tracing_subscriber::EnvFilter;

const FRAMES: usize = 10;

fn main() -> Result {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut logging_filter = LoggingFilter::ALL;
    let mut parsable = false;
    for arg in std::env::args().skip(1) {
        if arg == "--parsable" {
            parsable = true;
        } else {
            logging_filter = arg.parse()?;
        }
    }

    let host = HeadlessHost::new();
    let main_window = host.add_window(1280, 720);
    let tool_window = host.add_window(320, 240);

    let monitor = ApplicationMonitor::new(
        host.clone(),
        MonitorConfig::default()
            .with_process_update_interval(50)
            .with_logging_filter(logging_filter)
            .with_overlay_text("frame %5frameNumber  %deltaTime ms  cpu %cpuUsage%%"),
    );
    monitor.install_sink(Arc::new(FileSink::stdout(parsable)))?;
    monitor.set_overlay(true)?;
    monitor.set_logging(true)?;

    let loaded = monitor.register_generic_event();
    monitor.log_generic_event(loaded, b"assets loaded");

    for frame in 0..FRAMES {
        main_window.render_frame();
        if frame % 2 == 0 {
            tool_window.render_frame();
        }
        if frame == 1 {
            monitor.log_event(MonitorEvent::UserInterfaceReady);
        }
        if frame == FRAMES / 2 {
            main_window.resize(1920, 1080);
        }
        thread::sleep(Duration::from_millis(16));
    }

    println!("overlay: {}", main_window.surface().text());

    // Closing the tool window stops its monitor.
    tool_window.stop_scene_graph();
    monitor.close_down();
    Ok(())
}
