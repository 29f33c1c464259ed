//! ESP-IDF backend.
//!
//! Driver calls go through the legacy I2S driver (`driver/i2s.h`, ESP-IDF
//! v4.4). The TDM channel masks are written straight into the controller
//! registers, the same read-modify-write `i2s_ll_*_set_active_chan_mask`
//! performs.

use core::ptr::{self, null_mut};

use esp_idf_svc::sys::*;

use super::{GpioMatrix, I2sDriver, TdmRegisters};
use crate::board::{regs, I2sPort, PinMap};
use crate::config::{ChannelFormat, CommFormat, MclkMultiple, PeripheralConfig, TdmChannelMask};
use crate::status::EspStatus;

/// Hardware backend. Zero-sized; the state lives in the driver and the
/// registers.
#[derive(Debug, Default)]
pub struct EspIdfBackend {
    _private: (),
}

impl EspIdfBackend {
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl PeripheralConfig {
    /// Convert to the ESP-IDF SDK `i2s_driver_config_t` representation.
    pub(crate) fn as_sdk(&self) -> i2s_driver_config_t {
        let channel_format = match self.channel_format {
            ChannelFormat::RightLeft => i2s_channel_fmt_t_I2S_CHANNEL_FMT_RIGHT_LEFT,
            ChannelFormat::OnlyLeft => i2s_channel_fmt_t_I2S_CHANNEL_FMT_ONLY_LEFT,
            ChannelFormat::Multiple => i2s_channel_fmt_t_I2S_CHANNEL_FMT_MULTIPLE,
        };
        let communication_format = match self.communication_format {
            CommFormat::StandI2s => i2s_comm_format_t_I2S_COMM_FORMAT_STAND_I2S,
            CommFormat::StandMsb => i2s_comm_format_t_I2S_COMM_FORMAT_STAND_MSB,
            CommFormat::StandPcmShort => i2s_comm_format_t_I2S_COMM_FORMAT_STAND_PCM_SHORT,
            CommFormat::StandPcmLong => i2s_comm_format_t_I2S_COMM_FORMAT_STAND_PCM_LONG,
        };
        let mclk_multiple = match self.mclk_multiple {
            MclkMultiple::Default => i2s_mclk_multiple_t_I2S_MCLK_MULTIPLE_DEFAULT,
            MclkMultiple::X128 => i2s_mclk_multiple_t_I2S_MCLK_MULTIPLE_128,
            MclkMultiple::X256 => i2s_mclk_multiple_t_I2S_MCLK_MULTIPLE_256,
            MclkMultiple::X384 => i2s_mclk_multiple_t_I2S_MCLK_MULTIPLE_384,
        };

        i2s_driver_config_t {
            mode: self.mode.bits() as i2s_mode_t,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample as u32 as i2s_bits_per_sample_t,
            channel_format,
            communication_format,
            intr_alloc_flags: self.intr_alloc_flags.bits() as i32,
            dma_buf_count: self.dma_buf_count as i32,
            dma_buf_len: self.dma_buf_len as i32,
            use_apll: self.use_apll,
            tx_desc_auto_clear: self.tx_desc_auto_clear,
            fixed_mclk: self.fixed_mclk as i32,
            mclk_multiple,
            bits_per_chan: self.bits_per_chan as i2s_bits_per_chan_t,
            chan_mask: self.chan_mask.legacy_bits() as i2s_channel_t,
            total_chan: self.total_chan,
            left_align: self.left_align,
            big_edin: self.big_endian,
            bit_order_msb: self.bit_order_msb,
            skip_msk: self.skip_mask,
        }
    }
}

impl PinMap {
    fn as_sdk(&self) -> i2s_pin_config_t {
        i2s_pin_config_t {
            bck_io_num: self.bck,
            ws_io_num: self.ws,
            data_out_num: self.data_out,
            data_in_num: self.data_in,
            mck_io_num: self.mck,
        }
    }
}

#[inline]
fn status(code: esp_err_t) -> EspStatus {
    EspStatus::from_code(code)
}

impl I2sDriver for EspIdfBackend {
    fn driver_install(&mut self, port: I2sPort, config: &PeripheralConfig) -> EspStatus {
        let driver_cfg = config.as_sdk();

        // Safety: &driver_cfg is a valid pointer to an i2s_driver_config_t,
        // no event queue is requested.
        status(unsafe { i2s_driver_install(port.raw() as i2s_port_t, &driver_cfg, 0, null_mut()) })
    }

    fn driver_uninstall(&mut self, port: I2sPort) -> EspStatus {
        status(unsafe { i2s_driver_uninstall(port.raw() as i2s_port_t) })
    }

    fn set_pin(&mut self, port: I2sPort, pins: &PinMap) -> EspStatus {
        let pin_cfg = pins.as_sdk();

        // Safety: &pin_cfg is a valid pointer to an i2s_pin_config_t.
        status(unsafe { i2s_set_pin(port.raw() as i2s_port_t, &pin_cfg) })
    }

    fn start(&mut self, port: I2sPort) -> EspStatus {
        status(unsafe { i2s_start(port.raw() as i2s_port_t) })
    }

    fn stop(&mut self, port: I2sPort) -> EspStatus {
        status(unsafe { i2s_stop(port.raw() as i2s_port_t) })
    }

    fn zero_dma_buffer(&mut self, port: I2sPort) -> EspStatus {
        status(unsafe { i2s_zero_dma_buffer(port.raw() as i2s_port_t) })
    }
}

/// Replace the channel-enable bits of a TDM control register.
///
/// # Safety
///
/// `addr` must be a TDM control register of a clocked I2S controller that
/// nothing else is writing concurrently.
unsafe fn write_chan_mask(addr: usize, mask: TdmChannelMask) {
    let reg = addr as *mut u32;
    let val = ptr::read_volatile(reg);
    let val = (val & !regs::TDM_CHAN_EN_MASK) | (mask.bits() as u32 & regs::TDM_CHAN_EN_MASK);
    ptr::write_volatile(reg, val);
}

impl TdmRegisters for EspIdfBackend {
    fn set_tx_active_chan_mask(&mut self, port: I2sPort, mask: TdmChannelMask) {
        // SAFETY: fixed MMIO address of this port's TDM control register.
        // The write runs even when install failed; with the module clock
        // gated the register ignores it and the read returns 0.
        unsafe { write_chan_mask(port.register_base() + regs::TX_TDM_CTRL, mask) }
    }

    fn set_rx_active_chan_mask(&mut self, port: I2sPort, mask: TdmChannelMask) {
        // SAFETY: see `set_tx_active_chan_mask`.
        unsafe { write_chan_mask(port.register_base() + regs::RX_TDM_CTRL, mask) }
    }
}

impl GpioMatrix for EspIdfBackend {
    fn select_gpio_function(&mut self, pin: i32) {
        // SAFETY: pin is a board constant for a pad that exists on this chip.
        unsafe { esp_rom_gpio_pad_select_gpio(pin as u32) }
    }

    fn set_direction_output(&mut self, pin: i32) -> EspStatus {
        status(unsafe { gpio_set_direction(pin as gpio_num_t, gpio_mode_t_GPIO_MODE_OUTPUT) })
    }

    fn connect_out_signal(
        &mut self,
        pin: i32,
        signal: u32,
        out_inverted: bool,
        oen_inverted: bool,
    ) {
        // SAFETY: ROM routine, writes the GPIO matrix config of `pin` only.
        unsafe { esp_rom_gpio_connect_out_signal(pin as u32, signal, out_inverted, oen_inverted) }
    }
}
