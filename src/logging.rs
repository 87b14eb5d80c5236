use chrono::Local;
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::OnceLock;

// Custom logger structure
#[derive(Debug)]
struct VmLogger {
    level: LevelFilter,
    debug_filters: Option<HashSet<String>>,
}

impl VmLogger {
    /// Pulls the instruction pointer out of an "ip N" fragment, if the message has one
    fn extract_ip(message: &str) -> Option<u16> {
        let start = message.find("ip ")? + 3;
        let rest = &message[start..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        rest[..end].parse::<u16>().ok()
    }
}

impl log::Log for VmLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if metadata.level() <= self.level {
            // Topic filters only narrow the chatty levels
            if let Some(filters) = &self.debug_filters {
                if metadata.level() == log::Level::Debug || metadata.level() == log::Level::Trace {
                    return filters.contains(metadata.target())
                        || filters.iter().any(|f| metadata.target().starts_with(f));
                }
            }
            return true;
        }
        false
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let level_color = match record.level() {
                log::Level::Error => "\x1B[31m", // Red
                log::Level::Warn => "\x1B[33m",  // Yellow
                log::Level::Info => "\x1B[32m",  // Green
                log::Level::Debug => "\x1B[36m", // Cyan
                log::Level::Trace => "\x1B[35m", // Magenta
            };

            let reset = "\x1B[0m";
            let timestamp = Local::now().format("%H:%M:%S%.3f");
            let message = record.args().to_string();

            let context = match Self::extract_ip(&message) {
                Some(ip) => format!("[IP{:05}] ", ip),
                None => String::new(),
            };

            let output = format!(
                "{timestamp} {level_color}{level:5}{reset} {context}{target}: {message}",
                level = record.level(),
                target = record.target(),
            );

            // Program output owns stdout; diagnostics go to stderr
            let mut stderr = io::stderr();
            let _ = writeln!(stderr, "{}", output);
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

static LOGGER: OnceLock<VmLogger> = OnceLock::new();

/// Initialize the logger with optional comma-separated topic filters
pub fn init_logger(level: LevelFilter, debug_filter: Option<String>) -> Result<(), SetLoggerError> {
    let debug_filters = debug_filter.map(|filter_str| {
        filter_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<HashSet<String>>()
    });

    let logger = LOGGER.get_or_init(|| VmLogger {
        level,
        debug_filters,
    });

    log::set_logger(logger).map(|()| log::set_max_level(level))
}

// Helper macros for specific debug topics
#[macro_export]
macro_rules! debug_vm {
    (ip = $ip:expr; $($arg:tt)*) => {
        log::debug!(target: "vm", "ip {} {}", $ip, format_args!($($arg)*))
    };
    ($($arg:tt)*) => {
        log::debug!(target: "vm", "{}", format_args!($($arg)*))
    }
}

#[macro_export]
macro_rules! debug_instructions {
    (ip = $ip:expr; $($arg:tt)*) => {
        log::trace!(target: "instructions", "ip {} {}", $ip, format_args!($($arg)*))
    };
    ($($arg:tt)*) => {
        log::trace!(target: "instructions", "{}", format_args!($($arg)*))
    }
}

#[macro_export]
macro_rules! debug_debugger {
    ($($arg:tt)*) => {
        log::debug!(target: "debugger", "{}", format_args!($($arg)*))
    }
}
