use crate::severity::LogSeverity;
use crate::time::now;
use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::OnceCell;

static LOGGER: OnceCell<ConsoleLogger> = OnceCell::new();

/// `log` backend printing `[SEVERITY] <local time> <target>: <message>` lines.
pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    pub fn new(level: LevelFilter) -> Self {
        ConsoleLogger { level }
    }

    pub fn format(&self, record: &Record) -> String {
        format_line(
            LogSeverity::from(record.level()),
            &now(),
            record.target(),
            &record.args().to_string(),
        )
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.format(record);
        match record.level() {
            log::Level::Error | log::Level::Warn => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }

    fn flush(&self) {}
}

fn format_line(severity: LogSeverity, time: &str, target: &str, msg: &str) -> String {
    format!("[{}] {} {}: {}", severity, time, target, msg)
}

/// Installs the console logger as the global `log` backend. Later calls only adjust the level.
pub fn init(level: LevelFilter) {
    let mut installed = false;
    let logger = LOGGER.get_or_init(|| {
        installed = true;
        ConsoleLogger::new(level)
    });
    if installed {
        // another backend may already be registered by the host; keep it in that case
        let _ = log::set_logger(logger);
    }
    log::set_max_level(level);
}
