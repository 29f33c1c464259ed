//! bsp-i2s - board entry point
//!
//! 1. Bring up I2S0 for the codec at 16 kHz
//! 2. Print bring-up diagnostics to the console
//! 3. Idle (the audio tasks own the bus from here)
//!
//! On the host the same sequence runs against the mock backend, on the port
//! given as first argument (default 0), and the exit code reflects the status.

#![cfg_attr(target_os = "espidf", no_std)]
#![cfg_attr(target_os = "espidf", no_main)]

use bsp_i2s::logging::{format_log_line, MAX_MSG_LEN};
use bsp_i2s::{I2sBus, I2sPort, BSP_LOG_STREAM};

/// Codec sample rate.
const SAMPLE_RATE: u32 = 16_000;

/// Longest rendered log line: prefix + message + newline + NUL.
const LINE_LEN: usize = MAX_MSG_LEN + 32;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys as esp_idf_sys;

#[cfg(target_os = "espidf")]
fn drain_logs() {
    let mut line = [0u8; LINE_LEN];
    while let Some(entry) = BSP_LOG_STREAM.drain() {
        let len = format_log_line(&entry, &mut line[..LINE_LEN - 1]);
        line[len] = 0;
        // SAFETY: "%s" with a NUL-terminated buffer that outlives the call.
        unsafe {
            esp_idf_sys::esp_rom_printf(b"%s\0".as_ptr() as *const _, line.as_ptr());
        }
    }
}

#[cfg(target_os = "espidf")]
#[no_mangle]
fn main() {
    // Initialize ESP-IDF
    esp_idf_sys::link_patches();

    bsp_i2s::bsp_info!(BSP_LOG_STREAM, "{}", env!("VERSION_STRING"));
    let backend = bsp_i2s::hal::EspIdfBackend::new();
    let _bus = match I2sBus::init(backend, I2sPort::I2s0, SAMPLE_RATE) {
        Ok(bus) => Some(bus),
        Err(err) => {
            bsp_i2s::bsp_error!(BSP_LOG_STREAM, "{}", err);
            let (_, cleanup) = err.cleanup();
            if let Err(status) = cleanup.status.into_result() {
                bsp_i2s::bsp_error!(BSP_LOG_STREAM, "cleanup: {}", status);
            }
            None
        }
    };

    loop {
        drain_logs();
        unsafe {
            esp_idf_sys::vTaskDelay(100);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    use bsp_i2s::hal::MockBackend;

    // Optional first argument: I2S port number.
    let port = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .and_then(I2sPort::from_raw)
        .unwrap_or(I2sPort::I2s0);

    bsp_i2s::bsp_info!(BSP_LOG_STREAM, "{} (host)", env!("VERSION_STRING"));
    let status = match I2sBus::init(MockBackend::new(), port, SAMPLE_RATE) {
        Ok(bus) => bus.deinit().1.status,
        Err(err) => err.outcome().status,
    };

    let mut line = [0u8; LINE_LEN];
    while let Some(entry) = BSP_LOG_STREAM.drain() {
        let len = format_log_line(&entry, &mut line);
        print!("{}", String::from_utf8_lossy(&line[..len]));
    }
    if let Err(status) = status.into_result() {
        println!("{}: {}", port, status);
        std::process::exit(1);
    }
    println!("{}: ok", port);
}
