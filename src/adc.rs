use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use thiserror::Error;
use tracing::info;

use crate::source::SampleSource;

pub const ADC_CHANNELS: usize = 8;
const SPI_CLOCK_HZ: u32 = 1_000_000;

#[derive(Debug, Error)]
pub enum AdcError {
    #[error("SPI error: {0}")]
    Spi(#[from] rppal::spi::Error),
    #[error("channel must be 0-7, got {0}")]
    InvalidChannel(u8),
}

/// 10-bit MCP3008 converter on SPI0, CE0.
pub struct Mcp3008 {
    spi: Spi,
}

impl Mcp3008 {
    pub fn new() -> Result<Self, AdcError> {
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)?;
        info!("MCP3008 ADC initialized on SPI0.0");
        Ok(Mcp3008 { spi })
    }

    pub fn read_channel(&mut self, channel: u8) -> Result<u16, AdcError> {
        let tx_buffer = request(channel)?;
        let mut rx_buffer = [0u8; 3];
        self.spi.transfer(&mut rx_buffer, &tx_buffer)?;
        Ok(decode(&rx_buffer))
    }

    pub fn read_all_channels(&mut self) -> Result<[u16; ADC_CHANNELS], AdcError> {
        let mut values = [0u16; ADC_CHANNELS];
        for (channel, value) in values.iter_mut().enumerate() {
            *value = self.read_channel(channel as u8)?;
        }
        Ok(values)
    }
}

impl SampleSource for Mcp3008 {
    type Error = AdcError;

    fn read(&mut self, channel: u8) -> Result<u16, AdcError> {
        self.read_channel(channel)
    }
}

/// Start bit, single-ended mode and channel select.
fn request(channel: u8) -> Result<[u8; 3], AdcError> {
    if usize::from(channel) >= ADC_CHANNELS {
        return Err(AdcError::InvalidChannel(channel));
    }
    Ok([0x01, (0x08 | channel) << 4, 0x00])
}

fn decode(rx: &[u8; 3]) -> u16 {
    (u16::from(rx[1] & 0x03) << 8) | u16::from(rx[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_selects_single_ended_channel() {
        assert_eq!(request(0).unwrap(), [0x01, 0x80, 0x00]);
        assert_eq!(request(7).unwrap(), [0x01, 0xf0, 0x00]);
    }

    #[test]
    fn request_rejects_out_of_range_channel() {
        assert!(matches!(request(8), Err(AdcError::InvalidChannel(8))));
    }

    #[test]
    fn decode_keeps_ten_bits() {
        assert_eq!(decode(&[0xff, 0x03, 0xff]), 1023);
        assert_eq!(decode(&[0x00, 0xfe, 0x00]), 512);
        assert_eq!(decode(&[0x00, 0x00, 0x2a]), 42);
    }

    #[test]
    #[ignore] // needs an MCP3008 on the SPI bus
    fn reads_all_channels() {
        let mut adc = Mcp3008::new().unwrap();
        let values = adc.read_all_channels().unwrap();
        assert!(values.iter().all(|&v| v <= 1023));
    }
}
