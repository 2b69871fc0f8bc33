use std::{
    fmt,
    fs::File,
    io::{self, BufWriter, IsTerminal, Write},
    path::Path,
    sync::Mutex,
};

use crate::{Event, Result, Sink, internal::lock};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const PROCESS_COLOR: &str = "\x1b[33m";
const WINDOW_COLOR: &str = "\x1b[36m";
const FRAME_COLOR: &str = "\x1b[32m";
const GENERIC_COLOR: &str = "\x1b[35m";

/// A sink writing one line of text per event.
///
/// Two line formats are available:
///
/// - human readable, aligned and with durations in milliseconds. ANSI
///   colours are used when writing to a terminal.
/// - parsable, space separated raw values, starting with a one letter
///   record type (`P`, `W`, `F` or `G`). Durations are in nanoseconds.
///
/// ```text
/// [    2.016503] frame    1  #120  delta 16.67 ms  sync 0.11 ms  render 0.93 ms  gpu 0.52 ms  swap 0.08 ms
/// F 2016503421 1 120 16666667 110234 932113 520000 80112
/// ```
///
/// Lines are flushed as they are written.
pub struct FileSink {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    parsable: bool,
    colored: bool,
}

impl FileSink {
    /// Creates (or truncates) the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoError`](crate::Error::IoError) if the file cannot be
    /// created.
    pub fn create(path: impl AsRef<Path>, parsable: bool) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(file, parsable))
    }

    /// Writes to the standard output.
    pub fn stdout(parsable: bool) -> Self {
        let colored = !parsable && io::stdout().is_terminal();
        Self {
            colored,
            ..Self::from_writer(io::stdout(), parsable)
        }
    }

    pub fn from_writer(writer: impl Write + Send + 'static, parsable: bool) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(Box::new(writer))),
            parsable,
            colored: false,
        }
    }

    pub fn is_parsable(&self) -> bool {
        self.parsable
    }

    pub fn is_colored(&self) -> bool {
        self.colored
    }

    fn write_line(&self, event: &Event) -> io::Result<()> {
        let line = if self.parsable {
            parsable_line(event)
        } else {
            human_line(event, self.colored)
        };
        let mut writer = lock(&self.writer);
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

impl Sink for FileSink {
    fn log(&self, event: &Event) {
        if let Err(e) = self.write_line(event) {
            tracing::warn!(error = %e, "file sink failed to write event");
        }
    }
}

impl fmt::Debug for FileSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSink")
            .field("parsable", &self.parsable)
            .field("colored", &self.colored)
            .finish_non_exhaustive()
    }
}

fn parsable_line(event: &Event) -> String {
    match event {
        Event::Process(e) => format!(
            "P {} {} {} {} {}",
            e.timestamp, e.cpu_usage, e.thread_count, e.vsz_memory, e.rss_memory
        ),
        Event::Window(e) => format!(
            "W {} {} {} {} {}",
            e.timestamp, e.window_id, e.width, e.height, e.state
        ),
        Event::Frame(e) => format!(
            "F {} {} {} {} {} {} {} {}",
            e.timestamp,
            e.window_id,
            e.frame_number,
            e.delta_time,
            e.sync_time,
            e.render_time,
            e.gpu_time,
            e.swap_time
        ),
        Event::Generic(e) => format!("G {} {} {}", e.timestamp, e.id, e.string()),
    }
}

fn human_line(event: &Event, colored: bool) -> String {
    let (color, reset, bold) = if colored {
        let color = match event {
            Event::Process(_) => PROCESS_COLOR,
            Event::Window(_) => WINDOW_COLOR,
            Event::Frame(_) => FRAME_COLOR,
            Event::Generic(_) => GENERIC_COLOR,
        };
        (color, RESET, BOLD)
    } else {
        ("", "", "")
    };

    let timestamp = event.timestamp();
    let time = format!(
        "[{:>5}.{:06}]",
        timestamp / 1_000_000_000,
        timestamp % 1_000_000_000 / 1_000
    );

    let body = match event {
        Event::Process(e) => format!(
            "{color}process{reset}     cpu {bold}{}{reset} %  threads {bold}{}{reset}  \
             vsz {bold}{}{reset} kB  rss {bold}{}{reset} kB",
            e.cpu_usage, e.thread_count, e.vsz_memory, e.rss_memory
        ),
        Event::Window(e) => format!(
            "{color}window{reset} {:>3}  {} {bold}{}x{}{reset}",
            e.window_id, e.state, e.width, e.height
        ),
        Event::Frame(e) => {
            let gpu = if e.gpu_time == 0 {
                "N/A".to_string()
            } else {
                format!("{} ms", millis(e.gpu_time))
            };
            format!(
                "{color}frame{reset}  {:>3}  #{bold}{}{reset}  delta {} ms  sync {} ms  \
                 render {} ms  gpu {}  swap {} ms",
                e.window_id,
                e.frame_number,
                millis(e.delta_time),
                millis(e.sync_time),
                millis(e.render_time),
                gpu,
                millis(e.swap_time)
            )
        }
        Event::Generic(e) => format!(
            "{color}generic{reset} {:>3}  {bold}{}{reset}",
            e.id,
            e.string()
        ),
    };
    format!("{time} {body}")
}

fn millis(nanoseconds: u64) -> String {
    format!("{:.2}", nanoseconds as f64 / 1_000_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameEvent, GenericEvent, ProcessEvent, WindowEvent, WindowState};

    fn frame() -> Event {
        FrameEvent {
            timestamp: 2_016_503_421,
            window_id: 1,
            frame_number: 120,
            delta_time: 16_666_667,
            sync_time: 110_234,
            render_time: 932_113,
            gpu_time: 520_000,
            swap_time: 80_112,
        }
        .into()
    }

    #[test]
    fn parsable_lines() {
        assert_eq!(
            parsable_line(&frame()),
            "F 2016503421 1 120 16666667 110234 932113 520000 80112"
        );

        let window = WindowEvent {
            timestamp: 7,
            window_id: 2,
            width: 800,
            height: 600,
            state: WindowState::Resized,
        };
        assert_eq!(parsable_line(&window.into()), "W 7 2 800 600 resized");

        let process = ProcessEvent {
            timestamp: 9,
            cpu_usage: 120,
            thread_count: 14,
            vsz_memory: 204_800,
            rss_memory: 51_200,
        };
        assert_eq!(parsable_line(&process.into()), "P 9 120 14 204800 51200");
    }

    #[test]
    fn human_frame_line() {
        assert_eq!(
            human_line(&frame(), false),
            "[    2.016503] frame    1  #120  delta 16.67 ms  sync 0.11 ms  \
             render 0.93 ms  gpu 0.52 ms  swap 0.08 ms"
        );
    }

    #[test]
    fn human_line_without_gpu_time() {
        let mut event = FrameEvent::new(1);
        event.timestamp = 1_000;
        assert!(human_line(&event.into(), false).contains("gpu N/A"));
    }

    #[test]
    fn colors_wrap_the_record_type() {
        let line = human_line(&GenericEvent::new(3, b"ready").into(), true);
        assert!(line.contains("\x1b[35mgeneric\x1b[0m"));
        assert!(line.contains("\x1b[1mready\x1b[0m"));
    }

    #[test]
    fn writes_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.log");
        let sink = FileSink::create(&path, true).unwrap();
        assert!(sink.is_parsable());
        assert!(!sink.is_colored());

        sink.log(&frame());
        sink.log(&GenericEvent::new(4, b"loaded").into());

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("F "));
        assert!(lines[1].ends_with(" 4 loaded"));
    }

    #[test]
    fn create_fails_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("metrics.log");
        assert!(FileSink::create(path, false).is_err());
    }
}
