//! AHT21 Sensor Driver for Embedded Rust
//!
//! This crate provides a platform-agnostic driver for the AHT21 temperature
//! and humidity sensor, built on top of the [`embedded-hal`] traits.
//!
//! # Features
//! - Non-blocking polling API: each call to [`Aht21::read`] advances the
//!   trigger, wait and fetch cycle by one step and returns the cached reading
//! - Blocking read that triggers, waits 100 ms and fetches in one call
//! - Designed for `no_std` environments
//! - Optional logging support via `defmt` or `log`
//!
//! # Dependencies
//! This driver depends on the following `embedded-hal` traits:
//! - [`I2c`] for bus access
//! - [`DelayNs`] for the blocking waits
//!
//! and on a millisecond [`Clock`], implemented for any `Fn() -> u32`.
//!
//! # Example
//!
//! ```ignore
//! let mut aht = Aht21::new(&mut i2c, delay, || millis());
//! aht.init(DEFAULT_ADDRESS)?;
//! loop {
//!     let reading = aht.read(false);
//!     // ...
//! }
//! ```
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` and emits driver logs through `defmt`
//! - `log`: Emits driver logs through the `log` facade
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`I2c`]: embedded_hal::i2c::I2c
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod aht21;
pub mod clock;
pub mod error;

pub use aht21::{Aht21, DEFAULT_ADDRESS, MeasurementState, Reading};
pub use clock::Clock;
pub use error::Aht21Error;
