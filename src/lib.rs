//! # bsp-i2s
//!
//! I2S bring-up for the ESP32-S3 audio board codec.
//!
//! ## Architecture
//!
//! [`bringup`] sequences the vendor driver, TDM register and GPIO-matrix
//! calls through the [`hal`] traits:
//! - on target the calls go to ESP-IDF (`hal::EspIdfBackend`)
//! - on the host they go to an inspectable model (`hal::MockBackend`)
//!
//! The caller gets the OR of all driver statuses plus the set of steps that
//! failed. Failures are also pushed to [`BSP_LOG_STREAM`].

#![cfg_attr(not(test), no_std)]

#[cfg(not(feature = "esp32s3"))]
compile_error!("no chip selected, enable the `esp32s3` feature");

pub mod board;
pub mod bringup;
pub mod config;
pub mod hal;
pub mod log_globals;
pub mod logging;
pub mod status;

pub use board::{I2sPort, PinMap};
pub use bringup::{deinitialize, initialize, I2sBus, InitError};
pub use config::{PeripheralConfig, TdmChannelMask};
pub use hal::I2sBackend;
pub use log_globals::BSP_LOG_STREAM;
pub use status::{BringupStep, EspStatus, Outcome, StepFailures};
