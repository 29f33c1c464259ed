//! Hardware Abstraction Layer for the I2S bring-up.
//!
//! Thin seams around the three things bring-up touches: the vendor I2S
//! driver, the controller's TDM registers and the GPIO matrix.
//! Sequencing stays in [`crate::bringup`], the HAL is just I/O.

#[cfg(target_os = "espidf")]
pub mod esp_idf;
#[cfg(not(target_os = "espidf"))]
pub mod mock;

#[cfg(target_os = "espidf")]
pub use esp_idf::EspIdfBackend;
#[cfg(not(target_os = "espidf"))]
pub use mock::MockBackend;

use crate::board::{I2sPort, PinMap};
use crate::config::{PeripheralConfig, TdmChannelMask};
use crate::status::EspStatus;

/// Vendor I2S driver (ESP-IDF legacy `driver/i2s.h`).
pub trait I2sDriver {
    /// Allocate DMA descriptors, the interrupt and program the controller.
    fn driver_install(&mut self, port: I2sPort, config: &PeripheralConfig) -> EspStatus;

    /// Release everything `driver_install` allocated.
    fn driver_uninstall(&mut self, port: I2sPort) -> EspStatus;

    fn set_pin(&mut self, port: I2sPort, pins: &PinMap) -> EspStatus;

    fn start(&mut self, port: I2sPort) -> EspStatus;

    fn stop(&mut self, port: I2sPort) -> EspStatus;

    /// Fill every TX and RX DMA buffer with zeros.
    fn zero_dma_buffer(&mut self, port: I2sPort) -> EspStatus;
}

/// Direct TDM register access (`hal/i2s_ll.h`).
///
/// These writes bypass the driver and cannot fail.
pub trait TdmRegisters {
    fn set_tx_active_chan_mask(&mut self, port: I2sPort, mask: TdmChannelMask);

    fn set_rx_active_chan_mask(&mut self, port: I2sPort, mask: TdmChannelMask);
}

/// IO-mux and GPIO matrix routing.
pub trait GpioMatrix {
    /// Switch the pad's IO-mux function to plain GPIO.
    fn select_gpio_function(&mut self, pin: i32);

    fn set_direction_output(&mut self, pin: i32) -> EspStatus;

    /// Route peripheral output `signal` to `pin`.
    fn connect_out_signal(
        &mut self,
        pin: i32,
        signal: u32,
        out_inverted: bool,
        oen_inverted: bool,
    );
}

/// Everything bring-up needs from the hardware.
pub trait I2sBackend: I2sDriver + TdmRegisters + GpioMatrix {}

impl<T: I2sDriver + TdmRegisters + GpioMatrix> I2sBackend for T {}
