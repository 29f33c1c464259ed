//! Non-blocking diagnostic logging.
//!
//! # Architecture
//!
//! ```text
//! bring-up code          LogStream            console task
//! ─────────────          ─────────            ────────────
//!
//! bsp_warn!() ─────────▶ [L0][L1][L2] ──────▶ printf / UART
//! no allocation           lock-free           blocking ok
//! never blocks            ring buffer
//! ```
//!
//! Bring-up runs before the console is necessarily up (and possibly from an
//! interrupt-free boot context), so it only formats into a stack buffer and
//! pushes. Messages are dropped and counted when the ring is full.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 96;

/// Log buffer size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 32;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
pub struct LogEntry {
    /// Timestamp in microseconds since boot.
    pub timestamp_us: i64,
    pub level: LogLevel,
    /// Valid bytes in `msg`.
    pub len: u8,
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: LogEntry = LogEntry {
        timestamp_us: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text, `"<invalid utf8>"` if a multi-byte char was cut.
    pub fn text(&self) -> &str {
        core::str::from_utf8(&self.msg[..self.len as usize]).unwrap_or("<invalid utf8>")
    }
}

struct Slot {
    ready: AtomicBool,
    entry: UnsafeCell<LogEntry>,
}

/// Lock-free log ring: many producers, one consumer.
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    slots: [Slot; N],
    head: AtomicU32,
    tail: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: a slot is written only by the producer that reserved it through the
// `head` CAS, and read only by the single consumer after `ready` is set.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: u32 = N as u32 - 1;

    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        const EMPTY_SLOT: Slot = Slot {
            ready: AtomicBool::new(false),
            entry: UnsafeCell::new(LogEntry::EMPTY),
        };

        Self {
            slots: [EMPTY_SLOT; N],
            head: AtomicU32::new(0),
            tail: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Queue a message, never blocks.
    ///
    /// Returns `false` if the ring was full and the message was dropped.
    pub fn push(&self, timestamp_us: i64, level: LogLevel, msg: &[u8]) -> bool {
        let mut head = self.head.load(Ordering::Relaxed);
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            if head.wrapping_sub(tail) >= N as u32 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            match self.head.compare_exchange_weak(
                head,
                head.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => head = current,
            }
        }

        let slot = &self.slots[(head & Self::MASK) as usize];
        let len = msg.len().min(MAX_MSG_LEN);

        // SAFETY: the CAS above reserved this slot for us alone.
        unsafe {
            let entry = &mut *slot.entry.get();
            entry.timestamp_us = timestamp_us;
            entry.level = level;
            entry.len = len as u8;
            entry.msg[..len].copy_from_slice(&msg[..len]);
        }
        slot.ready.store(true, Ordering::Release);
        true
    }

    /// Next entry in push order, `None` if empty or the next producer has
    /// not finished writing yet.
    pub fn drain(&self) -> Option<LogEntry> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        let slot = &self.slots[(tail & Self::MASK) as usize];
        if !slot.ready.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: single consumer; `ready` orders the producer's writes.
        let entry = unsafe { *slot.entry.get() };
        slot.ready.store(false, Ordering::Relaxed);
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    pub fn pending(&self) -> u32 {
        let tail = self.tail.load(Ordering::Relaxed);
        self.head.load(Ordering::Acquire).wrapping_sub(tail)
    }

    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Format into `buf`, truncating silently. Returns bytes written.
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    use core::fmt::Write;

    struct Cursor<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl Write for Cursor<'_> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let n = s.len().min(self.buf.len() - self.pos);
            self.buf[self.pos..self.pos + n].copy_from_slice(&s.as_bytes()[..n]);
            self.pos += n;
            Ok(())
        }
    }

    let mut cursor = Cursor { buf, pos: 0 };
    let _ = core::fmt::write(&mut cursor, args);
    cursor.pos
}

/// Render an entry as `[timestamp_us] LEVEL: message\n`.
pub fn format_log_line(entry: &LogEntry, buf: &mut [u8]) -> usize {
    format_to_buffer(
        buf,
        format_args!(
            "[{:10}] {}: {}\n",
            entry.timestamp_us,
            entry.level.as_str(),
            entry.text()
        ),
    )
}

/// Microseconds since boot.
#[cfg(target_os = "espidf")]
#[inline]
pub fn now_us() -> i64 {
    // SAFETY: esp_timer is started by the ESP-IDF startup code.
    unsafe { esp_idf_svc::sys::esp_timer_get_time() }
}

/// Host builds have no boot clock.
#[cfg(not(target_os = "espidf"))]
#[inline]
pub fn now_us() -> i64 {
    0
}

/// Push a formatted message into a [`LogStream`].
///
/// ```ignore
/// bsp_log!(LogLevel::Info, BSP_LOG_STREAM, "I2S{} up at {} Hz", port, rate);
/// ```
#[macro_export]
macro_rules! bsp_log {
    ($level:expr, $stream:expr, $($arg:tt)*) => {{
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        $stream.push($crate::logging::now_us(), $level, &buf[..len]);
    }};
}

#[macro_export]
macro_rules! bsp_error {
    ($stream:expr, $($arg:tt)*) => {
        $crate::bsp_log!($crate::logging::LogLevel::Error, $stream, $($arg)*)
    };
}

#[macro_export]
macro_rules! bsp_warn {
    ($stream:expr, $($arg:tt)*) => {
        $crate::bsp_log!($crate::logging::LogLevel::Warn, $stream, $($arg)*)
    };
}

#[macro_export]
macro_rules! bsp_info {
    ($stream:expr, $($arg:tt)*) => {
        $crate::bsp_log!($crate::logging::LogLevel::Info, $stream, $($arg)*)
    };
}

#[macro_export]
macro_rules! bsp_debug {
    ($stream:expr, $($arg:tt)*) => {
        $crate::bsp_log!($crate::logging::LogLevel::Debug, $stream, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_drain() {
        let stream = LogStream::<8>::new();

        assert!(stream.push(42, LogLevel::Warn, b"set pin failed"));
        assert_eq!(stream.pending(), 1);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.timestamp_us, 42);
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.text(), "set pin failed");
        assert!(stream.drain().is_none());
    }

    #[test]
    fn test_full_ring_drops() {
        let stream = LogStream::<2>::new();

        assert!(stream.push(1, LogLevel::Info, b"a"));
        assert!(stream.push(2, LogLevel::Info, b"b"));
        assert!(!stream.push(3, LogLevel::Info, b"c"));
        assert_eq!(stream.dropped(), 1);

        assert_eq!(stream.drain().unwrap().text(), "a");
        assert!(stream.push(4, LogLevel::Info, b"d"));
        assert_eq!(stream.drain().unwrap().text(), "b");
        assert_eq!(stream.drain().unwrap().text(), "d");

        stream.reset_dropped();
        assert_eq!(stream.dropped(), 0);
    }

    #[test]
    fn test_long_message_truncated() {
        let stream = LogStream::<2>::new();
        let long = [b'x'; MAX_MSG_LEN + 20];

        assert!(stream.push(0, LogLevel::Debug, &long));
        assert_eq!(stream.drain().unwrap().len as usize, MAX_MSG_LEN);
    }

    #[test]
    fn test_format_to_buffer_truncates() {
        let mut buf = [0u8; 8];
        let len = format_to_buffer(&mut buf, format_args!("rate {} Hz", 44_100));
        assert_eq!(&buf[..len], b"rate 441");
    }

    #[test]
    fn test_format_log_line() {
        let stream = LogStream::<2>::new();
        stream.push(1_234_567, LogLevel::Error, b"I2S1: start failed");

        let mut buf = [0u8; 160];
        let len = format_log_line(&stream.drain().unwrap(), &mut buf);
        let line = core::str::from_utf8(&buf[..len]).unwrap();
        assert_eq!(line, "[   1234567] ERROR: I2S1: start failed\n");
    }

    #[test]
    fn test_macro_pushes() {
        let stream = LogStream::<4>::new();
        crate::bsp_warn!(stream, "I2S{}: {} failed", 0, "start");

        let entry = stream.drain().unwrap();
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.text(), "I2S0: start failed");
    }

    #[test]
    fn test_concurrent_producers() {
        use std::sync::Arc;
        use std::thread;

        let stream = Arc::new(LogStream::<64>::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let stream = Arc::clone(&stream);
                thread::spawn(move || {
                    for j in 0..10 {
                        let msg = format!("T{} msg {}", i, j);
                        stream.push(j, LogLevel::Info, msg.as_bytes());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let mut count = 0;
        while stream.drain().is_some() {
            count += 1;
        }
        assert_eq!(count, 40);
    }
}
