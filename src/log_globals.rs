//! Global log stream instance.

use crate::logging::LogStream;

/// Diagnostics from board bring-up.
///
/// Producers: `initialize` / `deinitialize` on any task.
/// Consumer: the console drain in the board binary.
pub static BSP_LOG_STREAM: LogStream = LogStream::new();
