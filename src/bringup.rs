//! I2S bring-up and tear-down for the board codec.
//!
//! # Sequence
//!
//! ```text
//! install ─▶ set pin ─▶ stop ─▶ TDM masks ─▶ WS polarity ─▶ zero DMA ─▶ start
//! ```
//!
//! Every step runs even if an earlier one failed; the statuses are OR-ed
//! into one `esp_err_t`; the failing steps are recorded in the returned
//! [`Outcome`] and logged to [`BSP_LOG_STREAM`].
//!
//! The driver programs every slot in `chan_mask` for both directions. The
//! codec DAC only listens on slot 0, so the TX mask is narrowed after
//! install. The driver also routes WS with normal polarity while the codec
//! expects the DSP-mode frame sync inverted, so WS is re-routed through the
//! GPIO matrix with the output inverted.

use crate::board::{I2sPort, PinMap};
use crate::config::{PeripheralConfig, TdmChannelMask};
use crate::hal::I2sBackend;
use crate::log_globals::BSP_LOG_STREAM;
use crate::status::{BringupStep, EspStatus, Outcome};
use crate::{bsp_debug, bsp_info, bsp_warn};

fn record(outcome: &mut Outcome, port: I2sPort, step: BringupStep, status: EspStatus) {
    if !status.is_ok() {
        outcome.failed.insert(step);
        bsp_warn!(BSP_LOG_STREAM, "{}: {} failed: {}", port, step, status);
    }
}

/// Run one step whose status counts towards the result.
fn step(outcome: &mut Outcome, port: I2sPort, step_id: BringupStep, status: EspStatus) {
    outcome.status |= status;
    record(outcome, port, step_id, status);
}

/// Bring up `port` at `sample_rate` Hz with the board pin map.
///
/// The sample rate is passed to the driver unchecked. A non-ok
/// `Outcome::status` means the port is in an unknown, partially configured
/// state; call [`deinitialize`] before trying again.
pub fn initialize<B: I2sBackend>(backend: &mut B, port: I2sPort, sample_rate: u32) -> Outcome {
    let config = PeripheralConfig::new(sample_rate);
    let pins = PinMap::BOARD;
    let mut outcome = Outcome::new();

    bsp_debug!(
        BSP_LOG_STREAM,
        "{}: {} Hz, {} slots, {}x{} frame DMA",
        port,
        sample_rate,
        config.total_chan,
        config.dma_buf_count,
        config.dma_buf_len
    );
    step(&mut outcome, port, BringupStep::DriverInstall, backend.driver_install(port, &config));
    step(&mut outcome, port, BringupStep::SetPin, backend.set_pin(port, &pins));

    // Known state before touching registers behind the driver's back.
    step(&mut outcome, port, BringupStep::Stop, backend.stop(port));

    backend.set_tx_active_chan_mask(port, TdmChannelMask::TX_ACTIVE);
    backend.set_rx_active_chan_mask(port, TdmChannelMask::RX_ACTIVE);

    // Invert WS polarity for DSP mode.
    backend.select_gpio_function(pins.ws);
    let direction = backend.set_direction_output(pins.ws);
    record(&mut outcome, port, BringupStep::WsDirection, direction);
    backend.connect_out_signal(pins.ws, port.tx_ws_signal(), true, false);

    step(&mut outcome, port, BringupStep::ZeroDmaBuffer, backend.zero_dma_buffer(port));
    step(&mut outcome, port, BringupStep::Start, backend.start(port));

    if outcome.is_ok() {
        bsp_info!(BSP_LOG_STREAM, "{}: up at {} Hz", port, sample_rate);
    }
    outcome
}

/// Stop `port` and uninstall its driver.
///
/// Also usable as cleanup after a failed [`initialize`]; on a port that was
/// never installed both steps report `ESP_ERR_INVALID_STATE` and nothing is
/// changed.
pub fn deinitialize<B: I2sBackend>(backend: &mut B, port: I2sPort) -> Outcome {
    let mut outcome = Outcome::new();

    step(&mut outcome, port, BringupStep::Stop, backend.stop(port));
    step(&mut outcome, port, BringupStep::DriverUninstall, backend.driver_uninstall(port));

    if outcome.is_ok() {
        bsp_info!(BSP_LOG_STREAM, "{}: down", port);
    }
    outcome
}

/// Why [`I2sBus::init`] did not hand out a bus.
#[derive(Debug)]
pub struct InitError<B: I2sBackend> {
    backend: B,
    port: I2sPort,
    outcome: Outcome,
}

impl<B: I2sBackend> InitError<B> {
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn port(&self) -> I2sPort {
        self.port
    }

    /// Tear the half-configured port down and get the backend back.
    pub fn cleanup(mut self) -> (B, Outcome) {
        let outcome = deinitialize(&mut self.backend, self.port);
        (self.backend, outcome)
    }

    /// Backend back without touching the hardware.
    pub fn into_backend(self) -> B {
        self.backend
    }
}

impl<B: I2sBackend> core::fmt::Display for InitError<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} bring-up failed: {}", self.port, self.outcome.status)?;
        for (i, step) in self.outcome.failed.iter().enumerate() {
            f.write_str(if i == 0 { " [" } else { ", " })?;
            f.write_str(step.as_str())?;
        }
        if !self.outcome.failed.is_empty() {
            f.write_str("]")?;
        }
        Ok(())
    }
}

/// A running I2S port.
///
/// Owns the backend from a successful [`initialize`] until [`I2sBus::deinit`]
/// consumes it.
#[derive(Debug)]
pub struct I2sBus<B: I2sBackend> {
    backend: B,
    port: I2sPort,
    config: PeripheralConfig,
}

impl<B: I2sBackend> I2sBus<B> {
    pub fn init(mut backend: B, port: I2sPort, sample_rate: u32) -> Result<Self, InitError<B>> {
        let outcome = initialize(&mut backend, port, sample_rate);
        if !outcome.is_ok() {
            return Err(InitError {
                backend,
                port,
                outcome,
            });
        }

        Ok(Self {
            backend,
            port,
            config: PeripheralConfig::new(sample_rate),
        })
    }

    pub fn port(&self) -> I2sPort {
        self.port
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Configuration handed to the driver.
    pub fn config(&self) -> &PeripheralConfig {
        &self.config
    }

    pub fn pins(&self) -> PinMap {
        PinMap::BOARD
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Stop and uninstall. Returns the backend with the tear-down outcome.
    pub fn deinit(mut self) -> (B, Outcome) {
        let outcome = deinitialize(&mut self.backend, self.port);
        (self.backend, outcome)
    }
}
