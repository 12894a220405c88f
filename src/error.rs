/// Possible errors from the AHT21 driver.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aht21Error<E> {
    /// The sensor did not answer the status query during initialization.
    NoResponse(E),
    /// The status byte read during initialization lacks the calibration bits (`0x18`).
    NotCalibrated {
        /// Raw status byte returned by the sensor.
        status: u8,
    },
    /// The measurement was read back while the sensor still reported busy.
    Busy {
        /// Raw status byte returned by the sensor.
        status: u8,
    },
    /// Error from the I2C bus.
    I2c(E),
}

impl<E> Aht21Error<E> {
    /// Returns the numeric error code used by the vendor Arduino library.
    ///
    /// `1` for no response or busy, `2` for bad calibration status and `3` for
    /// any other bus failure.
    pub fn code(&self) -> u8 {
        match self {
            Aht21Error::NoResponse(_) | Aht21Error::Busy { .. } => 1,
            Aht21Error::NotCalibrated { .. } => 2,
            Aht21Error::I2c(_) => 3,
        }
    }
}

impl<E> From<E> for Aht21Error<E> {
    fn from(value: E) -> Self {
        Self::I2c(value)
    }
}
