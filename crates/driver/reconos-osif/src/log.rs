//! Leveled logging for the OSIF driver.
//!
//! The driver owns no console. The embedding runtime installs a sink with
//! [`set_log_fn`]; until then messages are discarded. Messages are passed
//! as `fmt::Arguments`, so logging does not allocate and may be used from
//! the interrupt handler.

use core::fmt;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

/// Message severity. Lower variants are more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// An operation failed or the driver cannot start.
    Error = 1,
    /// Something unexpected that the driver recovered from.
    Warn,
    /// Boot progress.
    Info,
    /// Reset and configuration changes.
    Debug,
    /// Per-interrupt and per-arm detail.
    Trace,
}

impl fmt::Display for LogLevel {
    /// Five columns wide so consecutive lines align.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN ",
            Self::Info => "INFO ",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        })
    }
}

/// A log sink. Must be callable from interrupt context.
pub type LogFn = fn(LogLevel, fmt::Arguments<'_>);

/// Installed sink, or null.
static SINK: AtomicPtr<()> = AtomicPtr::new(ptr::null_mut());

/// Installs `sink`, replacing any earlier one.
pub fn set_log_fn(sink: LogFn) {
    SINK.store(sink as *mut (), Ordering::Release);
}

/// Removes the installed sink.
pub fn clear_log_fn() {
    SINK.store(ptr::null_mut(), Ordering::Release);
}

#[doc(hidden)]
pub fn _log(level: LogLevel, args: fmt::Arguments<'_>) {
    let raw = SINK.load(Ordering::Acquire);
    if raw.is_null() {
        return;
    }
    // SAFETY: the only non-null values stored are `LogFn`s from `set_log_fn`.
    let sink = unsafe { core::mem::transmute::<*mut (), LogFn>(raw) };
    sink(level, args);
}

/// Logs at `level` if it passes [`MAX_LOG_LEVEL`](crate::config::MAX_LOG_LEVEL).
#[macro_export]
macro_rules! olog {
    ($level:expr, $($arg:tt)*) => {{
        let level: $crate::log::LogLevel = $level;
        if level <= $crate::config::MAX_LOG_LEVEL {
            $crate::log::_log(level, format_args!($($arg)*));
        }
    }};
}

/// [`olog!`] at `Error`.
#[macro_export]
macro_rules! oerr {
    ($($arg:tt)*) => { $crate::olog!($crate::log::LogLevel::Error, $($arg)*) };
}

/// [`olog!`] at `Warn`.
#[macro_export]
macro_rules! owarn {
    ($($arg:tt)*) => { $crate::olog!($crate::log::LogLevel::Warn, $($arg)*) };
}

/// [`olog!`] at `Info`.
#[macro_export]
macro_rules! oinfo {
    ($($arg:tt)*) => { $crate::olog!($crate::log::LogLevel::Info, $($arg)*) };
}

/// [`olog!`] at `Debug`.
#[macro_export]
macro_rules! odebug {
    ($($arg:tt)*) => { $crate::olog!($crate::log::LogLevel::Debug, $($arg)*) };
}

/// [`olog!`] at `Trace`.
#[macro_export]
macro_rules! otrace {
    ($($arg:tt)*) => { $crate::olog!($crate::log::LogLevel::Trace, $($arg)*) };
}
