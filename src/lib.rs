//! DHT22 Single-Wire Protocol Decoder
//!
//! This crate decodes the timed single-wire protocol of the DHT22 (AM2302)
//! temperature and humidity sensor over any digital line. The sensor answers
//! an 18 ms wake pulse with 40 pulse-width-encoded bits: a ~27 us high pulse
//! is a 0, a ~70 us high pulse is a 1. The decoder measures those widths
//! against an injectable clock, validates the five-byte frame's checksum and
//! converts the sign-magnitude temperature field, yielding a [`Reading`] or
//! a typed [`DhtError`]. No failure is ever papered over with a default
//! value.
//!
//! # Capabilities
//! The decoder borrows exactly two things and owns neither:
//! - a [`Line`]: one digital pin with direction control, level writes and
//!   level reads
//! - a [`Clock`]: monotonic microseconds plus the blocking delays of the
//!   protocol
//!
//! # Backends
//! - [`hal::HalLine`] runs the decoder over any `embedded-hal` pin that is
//!   both [`InputPin`] and [`OutputPin`]
//! - `sysfs::SysfsLine` (feature `sysfs`) runs it over the Linux control
//!   files under `/sys/class/gpio`
//! - `sim` (feature `sim`) provides scripted line and clock doubles that
//!   share one virtual timeline, for deterministic protocol tests
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` on the public types
//! - `std`: `StdClock` plus `std::error::Error` on the error types
//! - `sysfs`: the Linux backend and the `dht22-read` binary (implies `std`)
//! - `sim`: the scripted doubles (implies `std`)
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`OutputPin`]: embedded_hal::digital::OutputPin

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod clock;
pub mod dht22;
pub mod error;
pub mod gl5516;
pub mod hal;
pub mod line;
pub mod sensor;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
#[cfg(feature = "sysfs")]
pub mod sysfs;

pub use clock::Clock;
#[cfg(any(test, feature = "std"))]
pub use clock::StdClock;
pub use dht22::{Dht22, Frame, Reading};
pub use error::DhtError;
pub use gl5516::{Gl5516, LightLevel};
pub use line::{Direction, Level, Line};
pub use sensor::{Sensor, SensorData, SensorError};
