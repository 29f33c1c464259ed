//! Module: config
//!
//! Purpose: I2S peripheral configuration for the board codec.
//!
//! Architecture:
//! - Fixed defaults live here as constants
//! - Only the sample rate comes from the caller
//! - A fresh [`PeripheralConfig`] is built for every `initialize` call
//!
//! Field values mirror the ESP-IDF legacy `i2s_driver_config_t`, so the
//! ESP-IDF backend converts them one to one.

use core::ops::BitOr;

/// DMA descriptors per direction.
pub const DMA_BUF_COUNT: u32 = 4;

/// Frames per DMA descriptor.
pub const DMA_BUF_LEN: u32 = 256;

/// Logical TDM channels on the bus.
pub const TOTAL_CHANNELS: u32 = 3;

/// `i2s_mode_t` flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct I2sMode(u32);

impl I2sMode {
    pub const MASTER: Self = Self(1 << 0);
    pub const SLAVE: Self = Self(1 << 1);
    pub const TX: Self = Self(1 << 2);
    pub const RX: Self = Self(1 << 3);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for I2sMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Sample width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum BitsPerSample {
    Bits8 = 8,
    Bits16 = 16,
    Bits24 = 24,
    Bits32 = 32,
}

/// Slot layout on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelFormat {
    RightLeft,
    OnlyLeft,
    /// TDM: more than two slots, selected by `chan_mask`.
    Multiple,
}

/// Frame format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommFormat {
    /// Philips I2S
    StandI2s,
    /// Left justified
    StandMsb,
    /// PCM, one-bit frame sync pulse
    StandPcmShort,
    /// PCM, slot-wide frame sync
    StandPcmLong,
}

/// MCLK as a multiple of the sample rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MclkMultiple {
    /// Driver default (256 × fs).
    Default,
    X128,
    X256,
    X384,
}

/// `ESP_INTR_FLAG_*` bits used for the driver interrupt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntrFlags(u32);

impl IntrFlags {
    pub const LEVEL1: Self = Self(1 << 1);
    pub const IRAM: Self = Self(1 << 10);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for IntrFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// TDM channel-enable mask, bit n = channel n.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TdmChannelMask(u16);

impl TdmChannelMask {
    pub const CH0: Self = Self(1 << 0);
    pub const CH1: Self = Self(1 << 1);
    pub const CH2: Self = Self(1 << 2);

    /// Active transmit slots: the codec DAC only listens on slot 0.
    pub const TX_ACTIVE: Self = Self::CH0;
    /// Active receive slots: codec ADC plus the two microphone slots.
    pub const RX_ACTIVE: Self = Self(Self::CH0.0 | Self::CH1.0 | Self::CH2.0);

    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Mask in the legacy `i2s_channel_t` layout (slot n at bit 16 + n).
    #[inline]
    pub const fn legacy_bits(self) -> u32 {
        (self.0 as u32) << 16
    }

    #[inline]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub const fn contains(self, channel: u8) -> bool {
        channel < 16 && self.0 & (1 << channel) != 0
    }
}

impl BitOr for TdmChannelMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Everything `i2s_driver_install` needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeripheralConfig {
    pub mode: I2sMode,
    /// Sample rate in Hz
    pub sample_rate: u32,
    pub bits_per_sample: BitsPerSample,
    pub channel_format: ChannelFormat,
    pub communication_format: CommFormat,
    pub intr_alloc_flags: IntrFlags,
    pub dma_buf_count: u32,
    /// Frames per descriptor
    pub dma_buf_len: u32,
    pub use_apll: bool,
    /// Send silence instead of stale data on TX underrun
    pub tx_desc_auto_clear: bool,
    /// 0 = derive MCLK from `mclk_multiple`
    pub fixed_mclk: u32,
    pub mclk_multiple: MclkMultiple,
    pub bits_per_chan: u32,
    pub chan_mask: TdmChannelMask,
    pub total_chan: u32,
    pub left_align: bool,
    pub big_endian: bool,
    pub bit_order_msb: bool,
    pub skip_mask: bool,
}

impl PeripheralConfig {
    /// Board defaults at the given sample rate.
    ///
    /// The rate is not range checked here; the driver rejects rates it
    /// cannot generate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            mode: I2sMode::MASTER | I2sMode::TX | I2sMode::RX,
            sample_rate,
            bits_per_sample: BitsPerSample::Bits16,
            channel_format: ChannelFormat::Multiple,
            communication_format: CommFormat::StandPcmShort,
            intr_alloc_flags: IntrFlags::LEVEL1 | IntrFlags::IRAM,
            dma_buf_count: DMA_BUF_COUNT,
            dma_buf_len: DMA_BUF_LEN,
            use_apll: false,
            tx_desc_auto_clear: true,
            fixed_mclk: 0,
            mclk_multiple: MclkMultiple::Default,
            bits_per_chan: 16,
            chan_mask: TdmChannelMask::RX_ACTIVE,
            total_chan: TOTAL_CHANNELS,
            left_align: false,
            big_endian: false,
            bit_order_msb: false,
            skip_mask: false,
        }
    }

    /// Bytes in one DMA descriptor.
    pub fn dma_buf_bytes(&self) -> usize {
        self.dma_buf_len as usize * self.total_chan as usize * (self.bits_per_chan as usize / 8)
    }
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self::new(16_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = PeripheralConfig::new(48_000);

        assert_eq!(cfg.sample_rate, 48_000);
        assert!(cfg.mode.contains(I2sMode::MASTER));
        assert!(cfg.mode.contains(I2sMode::TX | I2sMode::RX));
        assert!(!cfg.mode.contains(I2sMode::SLAVE));
        assert_eq!(cfg.bits_per_sample, BitsPerSample::Bits16);
        assert_eq!(cfg.channel_format, ChannelFormat::Multiple);
        assert_eq!(cfg.communication_format, CommFormat::StandPcmShort);
        assert_eq!(cfg.dma_buf_count, 4);
        assert_eq!(cfg.dma_buf_len, 256);
        assert!(cfg.tx_desc_auto_clear);
        assert!(!cfg.use_apll);
    }

    #[test]
    fn test_channel_mask_matches_total() {
        let cfg = PeripheralConfig::default();
        assert_eq!(cfg.chan_mask.count(), cfg.total_chan);
        assert!(cfg.chan_mask.contains(0));
        assert!(cfg.chan_mask.contains(2));
        assert!(!cfg.chan_mask.contains(3));
    }

    #[test]
    fn test_active_masks() {
        assert_eq!(TdmChannelMask::TX_ACTIVE.bits(), 0b001);
        assert_eq!(TdmChannelMask::RX_ACTIVE.bits(), 0b111);
        assert!(!TdmChannelMask::RX_ACTIVE.contains(16));
    }

    #[test]
    fn test_legacy_channel_layout() {
        assert_eq!(TdmChannelMask::TX_ACTIVE.legacy_bits(), 0x0001_0000);
        assert_eq!(TdmChannelMask::RX_ACTIVE.legacy_bits(), 0x0007_0000);
        assert_eq!(TdmChannelMask::default().legacy_bits(), 0);
    }

    #[test]
    fn test_intr_flags() {
        let cfg = PeripheralConfig::default();
        assert_eq!(cfg.intr_alloc_flags.bits(), (1 << 1) | (1 << 10));
    }

    #[test]
    fn test_dma_buf_bytes() {
        // 256 frames × 3 slots × 2 bytes
        assert_eq!(PeripheralConfig::default().dma_buf_bytes(), 1536);
    }
}
