//! LSM6DSL accelerometer driver over `embedded-hal` I²C.
//!
//! Only the accelerometer half of the part is used.  Bring-up:
//!
//! 1. WHO_AM_I must read `0x6A`.
//! 2. CTRL3_C: block data update + register auto-increment.
//! 3. FIFO bypass.
//! 4. CTRL1_XL: 104 Hz, ±8 g.
//!
//! At ±8 g the sensitivity is 0.244 mg/LSB.

use embedded_hal::i2c::I2c;

use crate::config::Axis;
use crate::error::SensorError;

const REG_FIFO_CTRL5: u8 = 0x0A;
const REG_WHO_AM_I: u8 = 0x0F;
const REG_CTRL1_XL: u8 = 0x10;
const REG_CTRL3_C: u8 = 0x12;
const REG_OUTX_L_XL: u8 = 0x28;

const WHO_AM_I_VALUE: u8 = 0x6A;
/// BDU (bit 6) | IF_INC (bit 2).
const CTRL3_C_BDU_IF_INC: u8 = 0x44;
/// ODR_XL = 104 Hz (0100), FS_XL = ±8 g (11).
const CTRL1_XL_104HZ_8G: u8 = 0x4C;
const FIFO_BYPASS: u8 = 0x00;

/// Sensitivity at ±8 g, in micro-g per LSB.
const SENSITIVITY_UG_PER_LSB: i32 = 244;

/// One 3-axis sample in milli-g.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccelSample {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl AccelSample {
    pub fn axis(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

fn raw_to_mg(raw: i16) -> i32 {
    i32::from(raw) * SENSITIVITY_UG_PER_LSB / 1000
}

pub struct Lsm6dsl<I2C> {
    i2c: I2C,
    address: u8,
    ready: bool,
}

impl<I2C: I2c> Lsm6dsl<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            ready: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Verify the part and configure the accelerometer.
    pub fn init(&mut self) -> Result<(), SensorError> {
        self.ready = false;
        let id = self.read_reg(REG_WHO_AM_I)?;
        if id != WHO_AM_I_VALUE {
            log::error!("lsm6dsl: unexpected WHO_AM_I 0x{:02X}", id);
            return Err(SensorError::UnexpectedId(id));
        }
        self.write_reg(REG_CTRL3_C, CTRL3_C_BDU_IF_INC)?;
        self.write_reg(REG_FIFO_CTRL5, FIFO_BYPASS)?;
        self.write_reg(REG_CTRL1_XL, CTRL1_XL_104HZ_8G)?;
        self.ready = true;
        log::info!("lsm6dsl: accelerometer enabled (104 Hz, ±8 g)");
        Ok(())
    }

    /// Burst-read OUTX_L_XL..OUTZ_H_XL and convert to milli-g.
    pub fn read_axes(&mut self) -> Result<AccelSample, SensorError> {
        if !self.ready {
            return Err(SensorError::NotReady);
        }
        let mut buf = [0u8; 6];
        self.i2c
            .write_read(self.address, &[REG_OUTX_L_XL], &mut buf)
            .map_err(|_| SensorError::BusFailed)?;
        Ok(AccelSample {
            x: raw_to_mg(i16::from_le_bytes([buf[0], buf[1]])),
            y: raw_to_mg(i16::from_le_bytes([buf[2], buf[3]])),
            z: raw_to_mg(i16::from_le_bytes([buf[4], buf[5]])),
        })
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(|_| SensorError::BusFailed)?;
        Ok(buf[0])
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(|_| SensorError::BusFailed)
    }
}
