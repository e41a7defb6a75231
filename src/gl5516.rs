//! GL5516 photoresistor stub.
//!
//! The divider circuit presents light as a bare digital level: above the
//! threshold the line reads high. One sample per read, no protocol, no
//! timing.

use crate::line::{Direction, Level, Line};

/// Coarse light level sensed from the divider.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightLevel {
    Dark,
    Bright,
}

impl From<Level> for LightLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => LightLevel::Dark,
            Level::High => LightLevel::Bright,
        }
    }
}

/// Driver for a GL5516 light-dependent resistor behind a digital divider.
pub struct Gl5516<L> {
    line: L,
}

impl<L: Line> Gl5516<L> {
    pub fn new(line: L) -> Self {
        Gl5516 { line }
    }

    /// Puts the line in sense mode.
    pub fn open(&mut self) -> Result<(), L::Error> {
        self.line.set_direction(Direction::Input)
    }

    /// Samples the light level once.
    pub fn read(&mut self) -> Result<LightLevel, L::Error> {
        Ok(LightLevel::from(self.line.read_level()?))
    }

    /// Leaves the line floating; a sensed line has nothing to undo.
    pub fn close(&mut self) -> Result<(), L::Error> {
        self.line.set_direction(Direction::Input)
    }
}
