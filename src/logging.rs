/*
Logging for the annotator.

- `setup_logger()`: console logging through env_logger plus an in-memory
  buffer of the most recent lines.
- `setup_panic_hook()`: on panic, writes the message, a backtrace and the
  buffered lines to `<data dir>/setcard-annotator/logs/panic.log`.

RUST_LOG replaces the level defaults when set, e.g. `RUST_LOG=info`. Without
it: DEBUG and above in debug builds, INFO and above in release builds, and
other crates are silenced.
*/

use std::panic;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::collections::VecDeque;
use std::path::PathBuf;
use env_logger::fmt::{Color, Formatter};
use log::{Level, LevelFilter, Metadata, Record};
use backtrace::Backtrace;
use chrono::Utc;

use crate::config::MAX_LOG_LINES;

const LOG_TARGET: &str = "setcard_annotator";

pub type LogBuffer = Arc<Mutex<VecDeque<String>>>;

struct BufferLogger {
    log_buffer: LogBuffer,
}

impl BufferLogger {
    fn new() -> Self {
        Self {
            log_buffer: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES))),
        }
    }

    fn log_to_buffer(&self, message: &str, target: &str, line: Option<u32>) {
        // A poisoned buffer only means another thread panicked mid-push
        let mut buffer = match self.log_buffer.lock() {
            Ok(buffer) => buffer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if buffer.len() == MAX_LOG_LINES {
            buffer.pop_front();
        }

        let formatted_message = if let Some(line_num) = line {
            format!("{target}:{line_num} {message}")
        } else {
            format!("{target} {message}")
        };
        buffer.push_back(formatted_message);
    }

    fn get_shared_buffer(&self) -> LogBuffer {
        Arc::clone(&self.log_buffer)
    }
}

impl log::Log for BufferLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with(LOG_TARGET) && metadata.level() <= LevelFilter::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("{:<5} {}", record.level(), record.args());
            self.log_to_buffer(&message, record.target(), record.line());
        }
    }

    fn flush(&self) {}
}

struct CompositeLogger {
    console_logger: env_logger::Logger,
    buffer_logger: BufferLogger,
}

impl log::Log for CompositeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console_logger.enabled(metadata) || self.buffer_logger.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.console_logger.enabled(record.metadata()) {
            self.console_logger.log(record);
        }
        if self.buffer_logger.enabled(record.metadata()) {
            self.buffer_logger.log(record);
        }
    }

    fn flush(&self) {
        self.console_logger.flush();
        self.buffer_logger.flush();
    }
}

/// Console logger filtered by `rust_log` (RUST_LOG syntax) when given,
/// otherwise by the build profile defaults
fn console_logger(rust_log: Option<&str>) -> env_logger::Logger {
    let mut builder = env_logger::Builder::new();

    // Filter out all other crates' logs; RUST_LOG directives below may override this
    builder.filter(None, LevelFilter::Off);

    match rust_log {
        Some(filters) => {
            builder.parse_filters(filters);
        }
        None if cfg!(debug_assertions) => {
            builder.filter(Some(LOG_TARGET), LevelFilter::Debug);
        }
        None => {
            builder.filter(Some(LOG_TARGET), LevelFilter::Info);
        }
    }

    builder.format(|buf: &mut Formatter, record: &Record| {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");

        let module_info = match (record.module_path(), record.line()) {
            (Some(module), Some(line)) => format!("{module}:{line}"),
            (Some(module), None) => module.to_string(),
            _ => "unknown".to_string(),
        };

        let mut level_style = buf.style();
        let mut meta_style = buf.style();

        match record.level() {
            Level::Error => level_style.set_color(Color::Red).set_bold(true),
            Level::Warn => level_style.set_color(Color::Yellow).set_bold(true),
            Level::Info => level_style.set_color(Color::Green).set_bold(true),
            Level::Debug => level_style.set_color(Color::Blue).set_bold(true),
            Level::Trace => level_style.set_color(Color::White),
        };
        meta_style.set_color(Color::Black).set_intense(true);

        writeln!(
            buf,
            "{} {} {} {}",
            meta_style.value(timestamp),
            level_style.value(record.level()),
            meta_style.value(module_info),
            record.args()
        )
    });

    builder.build()
}

pub fn setup_logger() -> LogBuffer {
    let buffer_logger = BufferLogger::new();
    let shared_buffer = buffer_logger.get_shared_buffer();

    let rust_log = std::env::var("RUST_LOG").ok();
    let composite_logger = CompositeLogger {
        console_logger: console_logger(rust_log.as_deref()),
        buffer_logger,
    };

    if log::set_boxed_logger(Box::new(composite_logger)).is_ok() {
        // Always set the maximum level to Trace so that filtering works correctly
        log::set_max_level(LevelFilter::Trace);
    }

    shared_buffer
}

pub fn get_log_directory(app_name: &str) -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join(app_name).join("logs")
}

fn write_panic_log(log_file_path: &PathBuf, message: &str, log_buffer: &LogBuffer) -> std::io::Result<()> {
    if let Some(parent) = log_file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_file_path)?;

    writeln!(file, "Panic occurred: {}", message)?;
    writeln!(file, "Backtrace:\n{:?}\n", Backtrace::new())?;
    writeln!(file, "Last {} log entries:\n", MAX_LOG_LINES)?;

    let buffer = match log_buffer.lock() {
        Ok(buffer) => buffer,
        Err(poisoned) => poisoned.into_inner(),
    };
    for log in buffer.iter() {
        writeln!(file, "{}", log)?;
    }
    Ok(())
}

pub fn setup_panic_hook(app_name: &str, log_buffer: LogBuffer) {
    let log_file_path = get_log_directory(app_name).join("panic.log");
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        default_hook(info);
        match write_panic_log(&log_file_path, &info.to_string(), &log_buffer) {
            Ok(()) => eprintln!("Panic log written to {}", log_file_path.display()),
            Err(e) => eprintln!("Failed to write panic log {}: {}", log_file_path.display(), e),
        }
    }));
}
