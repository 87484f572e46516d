use std::fmt;
use std::fmt::{Display, Formatter};

/// Log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSeverity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl From<log::Level> for LogSeverity {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace | log::Level::Debug => LogSeverity::Debug,
            log::Level::Info => LogSeverity::Info,
            log::Level::Warn => LogSeverity::Warning,
            log::Level::Error => LogSeverity::Error,
        }
    }
}

/// Display impl for LogSeverity
impl Display for LogSeverity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LogSeverity::Debug => write!(f, "DEBUG"),
            LogSeverity::Info => write!(f, "INFO"),
            LogSeverity::Warning => write!(f, "WARNING"),
            LogSeverity::Error => write!(f, "ERROR"),
            LogSeverity::Fatal => write!(f, "FATAL"),
        }
    }
}
