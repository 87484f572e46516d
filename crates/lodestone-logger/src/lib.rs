pub mod log;
pub mod severity;
pub mod time;

pub use crate::log::{init, ConsoleLogger};
pub use severity::LogSeverity;
