//! Global logger
//!
//! The embedding kernel hands over its console writer; until then records
//! are dropped.

use core::fmt;

use log::{Level, LevelFilter, Log, Metadata, Record};
use spin::Mutex;

/// Where formatted log lines go
pub type Console = fn(fmt::Arguments);

static CONSOLE: Mutex<Option<Console>> = Mutex::new(None);

/// Add escape sequence to print with color in Linux console
macro_rules! with_color {
    ($args: ident, $color_code: ident) => {{
        format_args!("\u{1B}[{}m{}\u{1B}[0m", $color_code as u8, $args)
    }};
}

/// Print msg with color
pub fn print_in_color(args: fmt::Arguments, color_code: u8) {
    if let Some(console) = *CONSOLE.lock() {
        console(with_color!(args, color_code));
    }
}

/// a simple logger
struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }
    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let color = match record.level() {
            Level::Error => 31, // Red
            Level::Warn => 93,  // BrightYellow
            Level::Info => 34,  // Blue
            Level::Debug => 32, // Green
            Level::Trace => 90, // BrightBlack
        };
        print_in_color(
            format_args!(
                "[{:>5}][{}:{}] {}\n",
                record.level(),
                record.file().unwrap_or("?"),
                record.line().unwrap_or(0),
                record.args()
            ),
            color,
        );
    }
    fn flush(&self) {}
}

fn level_from_env(level: Option<&str>) -> LevelFilter {
    match level {
        Some("ERROR") => LevelFilter::Error,
        Some("WARN") => LevelFilter::Warn,
        Some("INFO") => LevelFilter::Info,
        Some("DEBUG") => LevelFilter::Debug,
        Some("TRACE") => LevelFilter::Trace,
        _ => LevelFilter::Error,
    }
}

/// initiate logger, writing through `console`
///
/// Calling it again only swaps the console.
pub fn init(console: Console) {
    static LOGGER: SimpleLogger = SimpleLogger;
    *CONSOLE.lock() = Some(console);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level_from_env(option_env!("LOG")));
    }
}
