//! Host model of the I2S driver, TDM registers and GPIO matrix.
//!
//! Behaves like the ESP-IDF legacy driver where bring-up can observe it:
//! - `driver_install` on an installed port fails with `ESP_ERR_INVALID_STATE`
//! - every other driver call on an uninstalled port fails the same way
//! - install programs both TDM masks from `chan_mask` and leaves the
//!   controller running, with DMA buffers full of junk
//! - `set_pin` routes WS through the matrix with normal polarity
//! - TDM register writes on an uninstalled port are dropped (module clock
//!   gated)
//!
//! Register and pad state survive uninstall, as on hardware.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use super::{GpioMatrix, I2sDriver, TdmRegisters};
use crate::board::{I2sPort, PinMap};
use crate::config::{PeripheralConfig, TdmChannelMask};
use crate::status::{EspStatus, ESP_ERR_INVALID_ARG, ESP_ERR_INVALID_STATE, ESP_OK};

/// Pads on the ESP32-S3 (GPIO0..=GPIO48).
#[cfg(feature = "esp32s3")]
pub const PAD_COUNT: usize = 49;

/// Content of freshly allocated, never-written DMA memory.
pub const DMA_JUNK: u8 = 0xA5;

const PORT_COUNT: usize = 2;

/// Fallible operation, for fault injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MockOp {
    Install = 0,
    Uninstall = 1,
    SetPin = 2,
    Start = 3,
    Stop = 4,
    ZeroDmaBuffer = 5,
    SetDirection = 6,
}

const OP_COUNT: usize = 7;

/// One recorded backend call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    Install(I2sPort),
    Uninstall(I2sPort),
    SetPin(I2sPort),
    Start(I2sPort),
    Stop(I2sPort),
    ZeroDmaBuffer(I2sPort),
    TxChanMask(I2sPort, TdmChannelMask),
    RxChanMask(I2sPort, TdmChannelMask),
    SelectGpio(i32),
    SetOutput(i32),
    ConnectOut { pin: i32, signal: u32, out_inverted: bool },
}

/// GPIO-matrix output routing of one pad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutRoute {
    pub signal: u32,
    pub out_inverted: bool,
    pub oen_inverted: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PadState {
    /// IO-mux function is GPIO (matrix), not a direct peripheral function.
    pub gpio_function: bool,
    pub output: bool,
    pub route: Option<OutRoute>,
}

/// Driver and register state of one controller.
#[derive(Debug, Clone, Default)]
pub struct PortState {
    pub installed: bool,
    pub running: bool,
    pub config: Option<PeripheralConfig>,
    pub pins: Option<PinMap>,
    pub tx_chan_mask: TdmChannelMask,
    pub rx_chan_mask: TdmChannelMask,
    pub tx_dma: Vec<u8>,
    pub rx_dma: Vec<u8>,
}

/// Host backend with inspectable state.
#[derive(Debug, Clone)]
pub struct MockBackend {
    ports: [PortState; PORT_COUNT],
    pads: [PadState; PAD_COUNT],
    faults: [Option<i32>; OP_COUNT],
    calls: Vec<Call>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            ports: Default::default(),
            pads: [PadState::default(); PAD_COUNT],
            faults: [None; OP_COUNT],
            calls: Vec::new(),
        }
    }

    /// Make every later `op` return `code`.
    pub fn inject_fault(&mut self, op: MockOp, code: i32) {
        self.faults[op as usize] = Some(code);
    }

    pub fn clear_faults(&mut self) {
        self.faults = [None; OP_COUNT];
    }

    pub fn port(&self, port: I2sPort) -> &PortState {
        &self.ports[port.index()]
    }

    /// Pad state, `None` for a pin the chip does not have.
    pub fn pad(&self, pin: i32) -> Option<&PadState> {
        usize::try_from(pin).ok().and_then(|p| self.pads.get(p))
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Pretend the application streamed `byte` through both DMA directions.
    pub fn fill_dma(&mut self, port: I2sPort, byte: u8) {
        let state = &mut self.ports[port.index()];
        state.tx_dma.iter_mut().for_each(|b| *b = byte);
        state.rx_dma.iter_mut().for_each(|b| *b = byte);
    }

    fn fault(&self, op: MockOp) -> Option<EspStatus> {
        self.faults[op as usize].map(EspStatus::from_code)
    }

    fn installed(&self, port: I2sPort) -> Result<(), EspStatus> {
        if self.ports[port.index()].installed {
            Ok(())
        } else {
            Err(EspStatus::from_code(ESP_ERR_INVALID_STATE))
        }
    }

    fn pad_mut(&mut self, pin: i32) -> Option<&mut PadState> {
        usize::try_from(pin).ok().and_then(|p| self.pads.get_mut(p))
    }

    fn route(&mut self, pin: i32, signal: u32, out_inverted: bool, oen_inverted: bool) {
        if let Some(pad) = self.pad_mut(pin) {
            pad.gpio_function = true;
            pad.output = true;
            pad.route = Some(OutRoute {
                signal,
                out_inverted,
                oen_inverted,
            });
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl I2sDriver for MockBackend {
    fn driver_install(&mut self, port: I2sPort, config: &PeripheralConfig) -> EspStatus {
        self.calls.push(Call::Install(port));
        if let Some(status) = self.fault(MockOp::Install) {
            return status;
        }
        if self.ports[port.index()].installed {
            return EspStatus::from_code(ESP_ERR_INVALID_STATE);
        }
        if config.sample_rate == 0 || config.dma_buf_count == 0 || config.dma_buf_len == 0 {
            return EspStatus::from_code(ESP_ERR_INVALID_ARG);
        }

        let bytes = config.dma_buf_count as usize * config.dma_buf_bytes();
        let state = &mut self.ports[port.index()];
        state.installed = true;
        state.running = true;
        state.config = Some(config.clone());
        state.tx_chan_mask = config.chan_mask;
        state.rx_chan_mask = config.chan_mask;
        state.tx_dma = vec![DMA_JUNK; bytes];
        state.rx_dma = vec![DMA_JUNK; bytes];
        EspStatus::OK
    }

    fn driver_uninstall(&mut self, port: I2sPort) -> EspStatus {
        self.calls.push(Call::Uninstall(port));
        if let Some(status) = self.fault(MockOp::Uninstall) {
            return status;
        }
        if let Err(status) = self.installed(port) {
            return status;
        }

        let state = &mut self.ports[port.index()];
        state.installed = false;
        state.running = false;
        state.config = None;
        state.pins = None;
        state.tx_dma = Vec::new();
        state.rx_dma = Vec::new();
        EspStatus::OK
    }

    fn set_pin(&mut self, port: I2sPort, pins: &PinMap) -> EspStatus {
        self.calls.push(Call::SetPin(port));
        if let Some(status) = self.fault(MockOp::SetPin) {
            return status;
        }
        if let Err(status) = self.installed(port) {
            return status;
        }
        let all = [pins.bck, pins.ws, pins.data_out, pins.data_in, pins.mck];
        if all.iter().any(|&p| self.pad(p).is_none()) {
            return EspStatus::from_code(ESP_ERR_INVALID_ARG);
        }

        self.ports[port.index()].pins = Some(*pins);
        self.route(pins.ws, port.tx_ws_signal(), false, false);
        EspStatus::OK
    }

    fn start(&mut self, port: I2sPort) -> EspStatus {
        self.calls.push(Call::Start(port));
        if let Some(status) = self.fault(MockOp::Start) {
            return status;
        }
        if let Err(status) = self.installed(port) {
            return status;
        }
        self.ports[port.index()].running = true;
        EspStatus::OK
    }

    fn stop(&mut self, port: I2sPort) -> EspStatus {
        self.calls.push(Call::Stop(port));
        if let Some(status) = self.fault(MockOp::Stop) {
            return status;
        }
        if let Err(status) = self.installed(port) {
            return status;
        }
        self.ports[port.index()].running = false;
        EspStatus::OK
    }

    fn zero_dma_buffer(&mut self, port: I2sPort) -> EspStatus {
        self.calls.push(Call::ZeroDmaBuffer(port));
        if let Some(status) = self.fault(MockOp::ZeroDmaBuffer) {
            return status;
        }
        if let Err(status) = self.installed(port) {
            return status;
        }
        self.fill_dma(port, 0);
        EspStatus::OK
    }
}

impl TdmRegisters for MockBackend {
    fn set_tx_active_chan_mask(&mut self, port: I2sPort, mask: TdmChannelMask) {
        self.calls.push(Call::TxChanMask(port, mask));
        let state = &mut self.ports[port.index()];
        if state.installed {
            state.tx_chan_mask = mask;
        }
    }

    fn set_rx_active_chan_mask(&mut self, port: I2sPort, mask: TdmChannelMask) {
        self.calls.push(Call::RxChanMask(port, mask));
        let state = &mut self.ports[port.index()];
        if state.installed {
            state.rx_chan_mask = mask;
        }
    }
}

impl GpioMatrix for MockBackend {
    fn select_gpio_function(&mut self, pin: i32) {
        self.calls.push(Call::SelectGpio(pin));
        if let Some(pad) = self.pad_mut(pin) {
            pad.gpio_function = true;
        }
    }

    fn set_direction_output(&mut self, pin: i32) -> EspStatus {
        self.calls.push(Call::SetOutput(pin));
        if let Some(status) = self.fault(MockOp::SetDirection) {
            return status;
        }
        match self.pad_mut(pin) {
            Some(pad) => {
                pad.output = true;
                EspStatus::from_code(ESP_OK)
            }
            None => EspStatus::from_code(ESP_ERR_INVALID_ARG),
        }
    }

    fn connect_out_signal(
        &mut self,
        pin: i32,
        signal: u32,
        out_inverted: bool,
        oen_inverted: bool,
    ) {
        self.calls.push(Call::ConnectOut {
            pin,
            signal,
            out_inverted,
        });
        if let Some(pad) = self.pad_mut(pin) {
            pad.route = Some(OutRoute {
                signal,
                out_inverted,
                oen_inverted,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_twice_is_invalid_state() {
        let mut mock = MockBackend::new();
        let cfg = PeripheralConfig::new(16_000);

        assert!(mock.driver_install(I2sPort::I2s0, &cfg).is_ok());
        assert_eq!(
            mock.driver_install(I2sPort::I2s0, &cfg).code(),
            ESP_ERR_INVALID_STATE
        );
        // other port is independent
        assert!(mock.driver_install(I2sPort::I2s1, &cfg).is_ok());
    }

    #[test]
    fn test_calls_need_installed_driver() {
        let mut mock = MockBackend::new();

        assert_eq!(mock.start(I2sPort::I2s0).code(), ESP_ERR_INVALID_STATE);
        assert_eq!(mock.stop(I2sPort::I2s0).code(), ESP_ERR_INVALID_STATE);
        assert_eq!(mock.zero_dma_buffer(I2sPort::I2s0).code(), ESP_ERR_INVALID_STATE);
        assert_eq!(mock.driver_uninstall(I2sPort::I2s0).code(), ESP_ERR_INVALID_STATE);
        assert_eq!(mock.calls().len(), 4);
    }

    #[test]
    fn test_install_leaves_junk_and_driver_masks() {
        let mut mock = MockBackend::new();
        let cfg = PeripheralConfig::new(16_000);
        mock.driver_install(I2sPort::I2s0, &cfg);

        let state = mock.port(I2sPort::I2s0);
        assert!(state.running);
        assert_eq!(state.tx_dma.len(), 4 * cfg.dma_buf_bytes());
        assert!(state.tx_dma.iter().all(|&b| b == DMA_JUNK));
        assert_eq!(state.tx_chan_mask, cfg.chan_mask);
    }

    #[test]
    fn test_injected_fault() {
        let mut mock = MockBackend::new();
        mock.inject_fault(MockOp::SetDirection, -1);
        assert_eq!(mock.set_direction_output(47).code(), -1);

        mock.clear_faults();
        assert!(mock.set_direction_output(47).is_ok());
        assert!(!mock.set_direction_output(60).is_ok());
    }

    #[test]
    fn test_set_pin_rejects_missing_pad() {
        let mut mock = MockBackend::new();
        mock.driver_install(I2sPort::I2s0, &PeripheralConfig::default());

        let pins = PinMap { ws: 99, ..PinMap::BOARD };
        assert_eq!(mock.set_pin(I2sPort::I2s0, &pins).code(), ESP_ERR_INVALID_ARG);
        assert!(mock.port(I2sPort::I2s0).pins.is_none());
    }

    #[cfg(feature = "esp32s3")]
    #[test]
    fn test_esp32s3_pad_range() {
        let mock = MockBackend::new();
        assert_eq!(PAD_COUNT, 49);
        assert!(mock.pad(48).is_some());
        assert!(mock.pad(49).is_none());
        assert!(mock.pad(-1).is_none());
    }
}
