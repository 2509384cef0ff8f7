//! MAX31865 RTD-to-digital front-end (PT100/PT1000).
//!
//! Talks to the chip over any `embedded_hal::spi::SpiDevice`, so the same
//! driver runs against the ESP-IDF SPI master on target and a register
//! fake in tests.  Resistance is converted to temperature with the
//! Callendar–Van Dusen equation above 0 °C and a fitted polynomial below.

use embedded_hal::spi::SpiDevice;

use crate::error::{Result, SensorError};

// Register map (read address; write address = read | 0x80).
const REG_CONFIG: u8 = 0x00;
const REG_RTD_MSB: u8 = 0x01;
const REG_FAULT_STATUS: u8 = 0x07;
const WRITE: u8 = 0x80;

// Configuration bits
const CFG_VBIAS: u8 = 0x80;
const CFG_AUTO: u8 = 0x40;
const CFG_3WIRE: u8 = 0x10;
const CFG_FAULT_CYCLE: u8 = 0x0C;
const CFG_FAULT_CLEAR: u8 = 0x02;
const CFG_FILTER_50HZ: u8 = 0x01;

// Callendar–Van Dusen coefficients (IEC 60751)
const CVD_A: f32 = 3.9083e-3;
const CVD_B: f32 = -5.775e-7;

/// Sensor wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wires {
    Two,
    Three,
    Four,
}

/// Mains rejection filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Hz50,
    Hz60,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionMode {
    /// Free-running conversions (~50/60 per second).
    Continuous,
    /// Conversions only on request.
    OneShot,
}

pub struct Max31865<SPI> {
    spi: SPI,
    nominal_ohm: f32,
    reference_ohm: f32,
}

impl<SPI: SpiDevice> Max31865<SPI> {
    pub fn new(spi: SPI, nominal_ohm: f32, reference_ohm: f32) -> Self {
        Self {
            spi,
            nominal_ohm,
            reference_ohm,
        }
    }

    /// Program wiring, filter and conversion mode, with bias on.
    pub fn begin(&mut self, wires: Wires, filter: Filter, mode: ConversionMode) -> Result<()> {
        let mut cfg = CFG_VBIAS;
        if wires == Wires::Three {
            cfg |= CFG_3WIRE;
        }
        if filter == Filter::Hz50 {
            cfg |= CFG_FILTER_50HZ;
        }
        if mode == ConversionMode::Continuous {
            cfg |= CFG_AUTO;
        }
        self.write_reg(REG_CONFIG, cfg)?;
        self.clear_fault()
    }

    /// 15-bit ADC ratio code.  Bit 0 of the raw register (fault flag) is
    /// dropped.
    pub fn read_raw(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_regs(REG_RTD_MSB, &mut buf)?;
        Ok(u16::from_be_bytes(buf) >> 1)
    }

    /// RTD resistance in ohms.
    pub fn resistance(&mut self) -> Result<f32> {
        let raw = self.read_raw()?;
        Ok(f32::from(raw) / 32768.0 * self.reference_ohm)
    }

    /// Temperature in °C.
    pub fn temperature(&mut self) -> Result<f32> {
        let r = self.resistance()?;
        Ok(resistance_to_celsius(r, self.nominal_ohm))
    }

    /// Fault status register (0 = no fault).
    pub fn fault(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_regs(REG_FAULT_STATUS, &mut buf)?;
        Ok(buf[0])
    }

    pub fn clear_fault(&mut self) -> Result<()> {
        let mut cfg = [0u8; 1];
        self.read_regs(REG_CONFIG, &mut cfg)?;
        let cfg = (cfg[0] & !(CFG_FAULT_CYCLE | CFG_FAULT_CLEAR)) | CFG_FAULT_CLEAR;
        self.write_reg(REG_CONFIG, cfg)
    }

    fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> Result<()> {
        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&[reg]),
                embedded_hal::spi::Operation::Read(buf),
            ])
            .map_err(|_| SensorError::SpiTransfer.into())
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<()> {
        self.spi
            .write(&[reg | WRITE, value])
            .map_err(|_| SensorError::SpiTransfer.into())
    }
}

/// Convert an RTD resistance to °C.
pub fn resistance_to_celsius(resistance_ohm: f32, nominal_ohm: f32) -> f32 {
    let ratio = resistance_ohm / nominal_ohm;
    let disc = CVD_A * CVD_A - 4.0 * CVD_B * (1.0 - ratio);
    if ratio >= 1.0 && disc >= 0.0 {
        return (-CVD_A + disc.sqrt()) / (2.0 * CVD_B);
    }

    // Below 0 °C: fifth-order fit normalised to a 100 Ω element.
    let r = ratio * 100.0;
    let r2 = r * r;
    let r3 = r2 * r;
    let r4 = r3 * r;
    let r5 = r4 * r;
    -242.02 + 2.2228 * r + 2.5859e-3 * r2 - 4.8260e-6 * r3 - 2.8183e-8 * r4 + 1.5243e-10 * r5
}
