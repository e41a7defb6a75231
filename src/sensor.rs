//! Closed set of sensor kinds over one digital line.
//!
//! The kinds are a tagged enum rather than a trait object: the set is known
//! in full, dispatch is a `match`, and nothing virtual sits on the timing
//! path. Adding a kind means adding a variant and letting the compiler point
//! at every `match` that must learn about it.

use core::fmt;

use crate::clock::Clock;
use crate::dht22::{Dht22, Reading};
use crate::error::DhtError;
use crate::gl5516::{Gl5516, LightLevel};
use crate::line::Line;

/// One measurement from whichever kind was read.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SensorData {
    /// Temperature and humidity from a DHT22.
    Climate(Reading),
    /// Light level from a GL5516 divider.
    Light(LightLevel),
}

/// Failure from a sensor operation.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub enum SensorError<E> {
    /// The DHT22 exchange failed.
    Decode(DhtError<E>),
    /// The line itself faulted.
    Line(E),
}

impl<E> From<DhtError<E>> for SensorError<E> {
    fn from(value: DhtError<E>) -> Self {
        SensorError::Decode(value)
    }
}

impl<E: fmt::Display> fmt::Display for SensorError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Decode(e) => write!(f, "decode failed: {e}"),
            SensorError::Line(e) => write!(f, "line error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for SensorError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SensorError::Decode(e) => Some(e),
            SensorError::Line(e) => Some(e),
        }
    }
}

/// The sensor kinds this crate knows how to drive.
///
/// Selected at construction; `open`, `read` and `close` are the uniform
/// capability set across kinds.
pub enum Sensor<L, C> {
    /// DHT22 temperature and humidity sensor speaking the timed single-wire
    /// protocol.
    Dht22(Dht22<L, C>),
    /// GL5516 light stub sensing a bare level.
    Gl5516(Gl5516<L>),
}

impl<L, C> Sensor<L, C>
where
    L: Line,
    C: Clock,
{
    /// A DHT22 on `line`, timed by `clock`.
    pub fn dht22(line: L, clock: C) -> Self {
        Sensor::Dht22(Dht22::new(line, clock))
    }

    /// A GL5516 divider on `line`.
    pub fn gl5516(line: L) -> Self {
        Sensor::Gl5516(Gl5516::new(line))
    }

    /// Brings the line to the kind's idle state: driven high for the DHT22,
    /// sensed input for the light divider.
    pub fn open(&mut self) -> Result<(), SensorError<L::Error>> {
        match self {
            Sensor::Dht22(dht) => dht.open().map_err(SensorError::Line),
            Sensor::Gl5516(ldr) => ldr.open().map_err(SensorError::Line),
        }
    }

    /// Takes one measurement from the underlying kind.
    pub fn read(&mut self) -> Result<SensorData, SensorError<L::Error>> {
        match self {
            Sensor::Dht22(dht) => Ok(SensorData::Climate(dht.read()?)),
            Sensor::Gl5516(ldr) => ldr.read().map(SensorData::Light).map_err(SensorError::Line),
        }
    }

    /// Releases the line electrically: sensed input, nothing driven.
    pub fn close(&mut self) -> Result<(), SensorError<L::Error>> {
        match self {
            Sensor::Dht22(dht) => dht.close().map_err(SensorError::Line),
            Sensor::Gl5516(ldr) => ldr.close().map_err(SensorError::Line),
        }
    }
}
