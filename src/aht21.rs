use embedded_hal::{delay::DelayNs, i2c::I2c};

use crate::clock::{Clock, elapsed_ms};
use crate::error::Aht21Error;

/// Factory-default I2C address of the AHT21.
pub const DEFAULT_ADDRESS: u8 = 0x38;

/// Status query command. The sensor answers with a single status byte.
const CMD_STATUS: u8 = 0x71;

/// Trigger measurement command followed by its two parameter bytes.
const CMD_TRIGGER: [u8; 3] = [0xAC, 0x33, 0x00];

/// Both bits must be set in the status byte for a calibrated, usable sensor.
const STATUS_CALIBRATED: u8 = 0x18;

/// Set while a conversion is still running.
const STATUS_BUSY: u8 = 0x80;

/// Minimum conversion time after a trigger before data may be read.
const MEASURE_TIME_MS: u32 = 80;

/// Wait time used by the blocking read and the polling cycle.
const WAIT_TIME_MS: u32 = 100;

/// Pause between the initial status check and the first trigger.
const SETTLE_TIME_MS: u32 = 10;

/// Full scale of the 20-bit raw values (2^20).
const RAW_FULL_SCALE: f32 = 1_048_576.0;

/// Progress of the non-blocking read cycle driven by [`Aht21::read`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MeasurementState {
    /// No conversion in flight. The next poll triggers one.
    #[default]
    Idle,
    /// A conversion was triggered and the wait time has not elapsed yet.
    Waiting,
    /// The wait time has elapsed. The next poll reads the result.
    ReadyToRead,
}

/// Reading decoded from the AHT21 sensor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub relative_humidity: f32,
}

impl Reading {
    /// Decodes the 7-byte measurement response.
    ///
    /// Layout: status byte, 20 bits of humidity, 20 bits of temperature
    /// (sharing the nibbles of byte 3), then a CRC byte which is ignored.
    /// The status byte is not inspected here.
    pub fn from_bytes(data: &[u8; 7]) -> Self {
        let raw_humidity = Self::raw_humidity(data);
        let raw_temperature = Self::raw_temperature(data);

        Reading {
            temperature: Self::temperature_from_raw(raw_temperature),
            relative_humidity: Self::humidity_from_raw(raw_humidity),
        }
    }

    /// Converts a raw temperature word to degrees Celsius.
    pub fn temperature_from_raw(raw: u32) -> f32 {
        (raw as f32 / RAW_FULL_SCALE) * 200.0 - 50.0
    }

    /// Converts a raw humidity word to percent relative humidity. Not clamped.
    pub fn humidity_from_raw(raw: u32) -> f32 {
        (raw as f32 / RAW_FULL_SCALE) * 100.0
    }

    fn raw_humidity(data: &[u8; 7]) -> u32 {
        (u32::from(data[1]) << 12) | (u32::from(data[2]) << 4) | (u32::from(data[3]) >> 4)
    }

    fn raw_temperature(data: &[u8; 7]) -> u32 {
        (u32::from(data[3] & 0x0F) << 16) | (u32::from(data[4]) << 8) | u32::from(data[5])
    }
}

/// Driver for the AHT21 temperature and humidity sensor.
///
/// The bus is injected by the caller. Pass `&mut bus` to keep ownership of it,
/// or hand the bus over and take it back with [`Aht21::release`].
pub struct Aht21<I2C, D, C> {
    i2c: I2C,
    delay: D,
    clock: C,
    address: u8,
    state: MeasurementState,
    reading: Reading,
    /// When the last trigger was sent, for the conversion time check.
    triggered_at: u32,
    /// When the polling cycle entered [`MeasurementState::Waiting`].
    waiting_since: u32,
}

impl<I2C, D, C, E> Aht21<I2C, D, C>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
    C: Clock,
{
    /// Creates a new instance of the AHT21 driver.
    ///
    /// No bus traffic happens until [`Aht21::init`] is called.
    ///
    /// # Arguments
    ///
    /// * `i2c` - The I2C bus the sensor is attached to.
    /// * `delay` - A delay provider, only used by the blocking paths.
    /// * `clock` - A millisecond time source for the non-blocking cycle.
    pub fn new(i2c: I2C, delay: D, clock: C) -> Self {
        Aht21 {
            i2c,
            delay,
            clock,
            address: DEFAULT_ADDRESS,
            state: MeasurementState::Idle,
            reading: Reading::default(),
            triggered_at: 0,
            waiting_since: 0,
        }
    }

    /// Initializes the sensor at `address` and takes a first reading.
    ///
    /// Resets the polling cycle, checks that the calibration bits are set in
    /// the status byte, then runs one blocking trigger, wait and read cycle to
    /// seed the cached reading.
    ///
    /// # Returns
    ///
    /// * `Ok(())` once the first reading has been stored.
    /// * `Err(Aht21Error::NoResponse)` if the status query was not answered.
    /// * `Err(Aht21Error::NotCalibrated)` if the calibration bits are clear.
    /// * Any error from the first measurement cycle.
    pub fn init(&mut self, address: u8) -> Result<(), Aht21Error<E>> {
        self.state = MeasurementState::Idle;
        self.address = address;

        let status = self.read_status()?;
        debug!("aht21 status at init: {:#x}", status);
        if status & STATUS_CALIBRATED != STATUS_CALIBRATED {
            return Err(Aht21Error::NotCalibrated { status });
        }

        self.delay.delay_ms(SETTLE_TIME_MS);
        self.read_blocking().map(|_| ())
    }

    /// Sends the trigger command, starting a conversion.
    ///
    /// The conversion timer is restarted even if the bus reports an error.
    pub fn trigger_measurement(&mut self) -> Result<(), Aht21Error<E>> {
        let result = self.i2c.write(self.address, &CMD_TRIGGER);
        self.triggered_at = self.clock.now_ms();
        result.map_err(Aht21Error::I2c)
    }

    /// Reads back and decodes the result of the last conversion.
    ///
    /// If less than 80 ms have passed since the last trigger this does nothing
    /// and returns `Ok(())`; the caller is expected to schedule the fetch. The
    /// cached reading is only replaced when the sensor reports not busy.
    pub fn fetch_measurement(&mut self) -> Result<(), Aht21Error<E>> {
        if elapsed_ms(self.clock.now_ms(), self.triggered_at) < MEASURE_TIME_MS {
            trace!("aht21 conversion time not expired");
            return Ok(());
        }

        let mut data = [0u8; 7];
        self.i2c.read(self.address, &mut data)?;

        let status = data[0];
        if status & STATUS_BUSY != 0 {
            warn!("aht21 is busy, status {:#x}", status);
            return Err(Aht21Error::Busy { status });
        }

        trace!(
            "aht21 raw humidity {:#x}, raw temperature {:#x}",
            Reading::raw_humidity(&data),
            Reading::raw_temperature(&data)
        );
        self.reading = Reading::from_bytes(&data);
        debug!(
            "aht21 temperature {} C, humidity {} %",
            self.reading.temperature,
            self.reading.relative_humidity
        );

        Ok(())
    }

    /// Returns the latest temperature and humidity.
    ///
    /// With `force_blocking` a full trigger, 100 ms wait and read cycle runs
    /// before returning. Otherwise the polling cycle advances by one step and
    /// the call never blocks, so several calls are needed per fresh reading.
    ///
    /// Failures are not reported. The cached reading is returned either way,
    /// which may be stale; use [`Aht21::try_read`] to see the failure.
    pub fn read(&mut self, force_blocking: bool) -> Reading {
        if let Err(e) = self.try_read(force_blocking) {
            warn!("aht21 read failed with code {}, returning cached reading", e.code());
        }
        self.reading
    }

    /// Same as [`Aht21::read`] but reports a failed step.
    ///
    /// An `Ok` value is the cached reading. In polling mode it is only fresh
    /// on the call that completes a cycle.
    pub fn try_read(&mut self, force_blocking: bool) -> Result<Reading, Aht21Error<E>> {
        if force_blocking {
            self.read_blocking()
        } else {
            self.poll()
        }
    }

    /// Address the driver currently talks to.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Position of the non-blocking read cycle.
    pub fn state(&self) -> MeasurementState {
        self.state
    }

    /// Last successfully decoded reading, without touching the bus.
    pub fn reading(&self) -> Reading {
        self.reading
    }

    /// Destroys the driver and gives back the bus, delay and clock.
    pub fn release(self) -> (I2C, D, C) {
        (self.i2c, self.delay, self.clock)
    }

    /// Queries the status byte. Any bus failure counts as no response.
    fn read_status(&mut self) -> Result<u8, Aht21Error<E>> {
        let mut status = [0u8; 1];
        self.i2c
            .write(self.address, &[CMD_STATUS])
            .map_err(Aht21Error::NoResponse)?;
        self.i2c
            .read(self.address, &mut status)
            .map_err(Aht21Error::NoResponse)?;
        Ok(status[0])
    }

    /// Trigger, wait and fetch in one go. Leaves the polling cycle alone.
    fn read_blocking(&mut self) -> Result<Reading, Aht21Error<E>> {
        self.trigger_measurement()?;
        self.delay.delay_ms(WAIT_TIME_MS);
        self.fetch_measurement()?;
        Ok(self.reading)
    }

    /// Advances the polling cycle by one step.
    fn poll(&mut self) -> Result<Reading, Aht21Error<E>> {
        match self.state {
            MeasurementState::Idle => {
                self.trigger_measurement()?;
                self.waiting_since = self.clock.now_ms();
                self.state = MeasurementState::Waiting;
            }
            MeasurementState::Waiting => {
                if elapsed_ms(self.clock.now_ms(), self.waiting_since) >= WAIT_TIME_MS {
                    self.state = MeasurementState::ReadyToRead;
                }
            }
            MeasurementState::ReadyToRead => {
                self.fetch_measurement()?;
                self.state = MeasurementState::Idle;
            }
        }
        Ok(self.reading)
    }
}
