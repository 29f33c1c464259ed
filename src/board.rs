//! Board constants for the ESP32-S3 audio board.
//!
//! Codec wiring, I2S register map and GPIO-matrix signal indices.
//! Reference: ESP32-S3 TRM, chapter "I2S Controller" and `gpio_sig_map.h`.

use core::fmt;

/// I2S master clock.
pub const GPIO_I2S_MCLK: i32 = 2;
/// I2S bit clock.
pub const GPIO_I2S_SCLK: i32 = 17;
/// I2S word select (LRCK).
pub const GPIO_I2S_LRCK: i32 = 47;
/// Serial data towards the codec.
pub const GPIO_I2S_DOUT: i32 = 15;
/// Serial data from the codec.
pub const GPIO_I2S_SDIN: i32 = 16;

/// I2S controller register map (ESP32-S3).
#[cfg(feature = "esp32s3")]
#[allow(dead_code)]
pub(crate) mod regs {
    pub const I2S0_BASE: usize = 0x6000_F000;
    pub const I2S1_BASE: usize = 0x6002_D000;

    pub const RX_TDM_CTRL: usize = 0x0050;
    pub const TX_TDM_CTRL: usize = 0x0054;

    /// `I2S_{RX,TX}_TDM_CHAN{0..15}_EN`
    pub const TDM_CHAN_EN_MASK: u32 = 0xFFFF;
}

/// GPIO-matrix output signal indices (ESP32-S3 `gpio_sig_map.h`).
#[cfg(feature = "esp32s3")]
pub mod signals {
    pub const I2S0O_WS_OUT_IDX: u32 = 24;
    pub const I2S1O_WS_OUT_IDX: u32 = 29;
}

/// I2S controller instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum I2sPort {
    I2s0 = 0,
    I2s1 = 1,
}

impl I2sPort {
    /// Port from an `i2s_port_t` value.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(I2sPort::I2s0),
            1 => Some(I2sPort::I2s1),
            _ => None,
        }
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self as u32
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Base address of this controller's register block.
    pub const fn register_base(self) -> usize {
        match self {
            I2sPort::I2s0 => regs::I2S0_BASE,
            I2sPort::I2s1 => regs::I2S1_BASE,
        }
    }

    /// GPIO-matrix index of the TX word-select output.
    pub const fn tx_ws_signal(self) -> u32 {
        match self {
            I2sPort::I2s0 => signals::I2S0O_WS_OUT_IDX,
            I2sPort::I2s1 => signals::I2S1O_WS_OUT_IDX,
        }
    }
}

impl fmt::Display for I2sPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I2S{}", self.raw())
    }
}

/// Pin assignment of the five I2S signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    pub bck: i32,
    pub ws: i32,
    pub data_out: i32,
    pub data_in: i32,
    pub mck: i32,
}

impl PinMap {
    /// Wiring of the on-board codec.
    pub const BOARD: PinMap = PinMap {
        bck: GPIO_I2S_SCLK,
        ws: GPIO_I2S_LRCK,
        data_out: GPIO_I2S_DOUT,
        data_in: GPIO_I2S_SDIN,
        mck: GPIO_I2S_MCLK,
    };
}

impl Default for PinMap {
    fn default() -> Self {
        Self::BOARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_pins() {
        let pins = PinMap::default();
        assert_eq!(pins.bck, 17);
        assert_eq!(pins.ws, 47);
        assert_eq!(pins.data_out, 15);
        assert_eq!(pins.data_in, 16);
        assert_eq!(pins.mck, 2);
    }

    #[test]
    fn test_port_from_raw() {
        assert_eq!(I2sPort::from_raw(0), Some(I2sPort::I2s0));
        assert_eq!(I2sPort::from_raw(1), Some(I2sPort::I2s1));
        assert_eq!(I2sPort::from_raw(2), None);
    }

    #[test]
    fn test_port_lookup_tables() {
        assert_eq!(I2sPort::I2s0.register_base(), 0x6000_F000);
        assert_eq!(I2sPort::I2s1.register_base(), 0x6002_D000);
        assert_ne!(I2sPort::I2s0.tx_ws_signal(), I2sPort::I2s1.tx_ws_signal());
        assert_eq!(format!("{}", I2sPort::I2s1), "I2S1");
    }

    #[cfg(feature = "esp32s3")]
    #[test]
    fn test_esp32s3_register_map() {
        assert_eq!(regs::RX_TDM_CTRL, 0x50);
        assert_eq!(regs::TX_TDM_CTRL, 0x54);
        assert_eq!(regs::TDM_CHAN_EN_MASK, 0xFFFF);
        assert_eq!(I2sPort::I2s0.tx_ws_signal(), 24);
        assert_eq!(I2sPort::I2s1.tx_ws_signal(), 29);
    }
}
