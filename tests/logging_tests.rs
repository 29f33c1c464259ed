//! Bring-up diagnostics in the log stream

use bsp_i2s::hal::mock::{MockBackend, MockOp};
use bsp_i2s::logging::{LogLevel, LogStream};
use bsp_i2s::status::ESP_FAIL;
use bsp_i2s::{bsp_warn, initialize, I2sPort, BSP_LOG_STREAM};

// Single test touching the global stream, so nothing else drains it.
#[test]
fn test_failed_step_is_logged() {
    while BSP_LOG_STREAM.drain().is_some() {}

    let mut mock = MockBackend::new();
    mock.inject_fault(MockOp::SetPin, ESP_FAIL);
    initialize(&mut mock, I2sPort::I2s1, 16_000);

    let mut warnings = Vec::new();
    let mut debug = Vec::new();
    while let Some(entry) = BSP_LOG_STREAM.drain() {
        match entry.level {
            LogLevel::Warn => warnings.push(entry.text().to_string()),
            LogLevel::Debug => debug.push(entry.text().to_string()),
            _ => {}
        }
    }

    assert_eq!(warnings, vec!["I2S1: set pin failed: ESP_FAIL (0xffffffff)"]);
    assert_eq!(debug, vec!["I2S1: 16000 Hz, 3 slots, 4x256 frame DMA"]);
}

#[test]
fn test_macro_on_local_stream() {
    let stream = LogStream::<4>::new();
    bsp_warn!(stream, "{} Hz", 22_050);

    let entry = stream.drain().unwrap();
    assert_eq!(entry.text(), "22050 Hz");
    assert_eq!(entry.timestamp_us, 0);
}
