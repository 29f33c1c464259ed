//! Status codes for the I2S bring-up sequence.
//!
//! Every driver call returns an `esp_err_t`. The bring-up folds all of them
//! into one [`EspStatus`] with bitwise OR, so the caller-visible result is
//! "ok" or "something failed". Which step failed is kept separately in a
//! [`StepFailures`] set.

use core::fmt;
use core::ops::{BitOr, BitOrAssign};

/// `ESP_OK`
pub const ESP_OK: i32 = 0;
/// `ESP_FAIL`
pub const ESP_FAIL: i32 = -1;
/// `ESP_ERR_NO_MEM`
pub const ESP_ERR_NO_MEM: i32 = 0x101;
/// `ESP_ERR_INVALID_ARG`
pub const ESP_ERR_INVALID_ARG: i32 = 0x102;
/// `ESP_ERR_INVALID_STATE`
pub const ESP_ERR_INVALID_STATE: i32 = 0x103;

/// An `esp_err_t`, possibly the OR of several.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct EspStatus(i32);

impl EspStatus {
    pub const OK: Self = Self(ESP_OK);

    pub const fn from_code(code: i32) -> Self {
        Self(code)
    }

    #[inline]
    pub const fn code(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn is_ok(self) -> bool {
        self.0 == ESP_OK
    }

    /// Name of the code, if it is a single well-known one.
    ///
    /// An OR of two different codes is generally not a valid code anymore,
    /// in which case this returns `"UNKNOWN"`.
    pub fn name(self) -> &'static str {
        match self.0 {
            ESP_OK => "ESP_OK",
            ESP_FAIL => "ESP_FAIL",
            ESP_ERR_NO_MEM => "ESP_ERR_NO_MEM",
            ESP_ERR_INVALID_ARG => "ESP_ERR_INVALID_ARG",
            ESP_ERR_INVALID_STATE => "ESP_ERR_INVALID_STATE",
            _ => "UNKNOWN",
        }
    }

    /// `Ok(())` for `ESP_OK`, the status itself otherwise.
    pub fn into_result(self) -> Result<(), EspStatus> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl BitOr for EspStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EspStatus {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for EspStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:x})", self.name(), self.0)
    }
}

/// One step of the bring-up or tear-down sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BringupStep {
    /// `i2s_driver_install`
    DriverInstall = 0,
    /// `i2s_set_pin`
    SetPin = 1,
    /// `i2s_stop` before the register fixups.
    Stop = 2,
    /// `gpio_set_direction` on the WS pin.
    WsDirection = 3,
    /// `i2s_zero_dma_buffer`
    ZeroDmaBuffer = 4,
    /// `i2s_start`
    Start = 5,
    /// `i2s_driver_uninstall`
    DriverUninstall = 6,
}

impl BringupStep {
    pub const ALL: [BringupStep; 7] = [
        BringupStep::DriverInstall,
        BringupStep::SetPin,
        BringupStep::Stop,
        BringupStep::WsDirection,
        BringupStep::ZeroDmaBuffer,
        BringupStep::Start,
        BringupStep::DriverUninstall,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BringupStep::DriverInstall => "driver install",
            BringupStep::SetPin => "set pin",
            BringupStep::Stop => "stop",
            BringupStep::WsDirection => "ws direction",
            BringupStep::ZeroDmaBuffer => "zero dma buffer",
            BringupStep::Start => "start",
            BringupStep::DriverUninstall => "driver uninstall",
        }
    }

    #[inline]
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for BringupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of steps that returned something other than `ESP_OK`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct StepFailures(u8);

impl StepFailures {
    pub const NONE: Self = Self(0);

    #[inline]
    pub fn insert(&mut self, step: BringupStep) {
        self.0 |= step.bit();
    }

    #[inline]
    pub fn contains(self, step: BringupStep) -> bool {
        self.0 & step.bit() != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Failed steps in sequence order.
    pub fn iter(self) -> impl Iterator<Item = BringupStep> {
        BringupStep::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

/// Result of one `initialize` or `deinitialize` run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// OR of every status that counts towards the caller-visible result.
    pub status: EspStatus,
    /// Every step that did not return `ESP_OK`, including ones that do not
    /// contribute to `status`.
    pub failed: StepFailures,
}

impl Outcome {
    pub const fn new() -> Self {
        Self {
            status: EspStatus::OK,
            failed: StepFailures::NONE,
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}

impl Default for Outcome {
    fn default() -> Self {
        Self::new()
    }
}
