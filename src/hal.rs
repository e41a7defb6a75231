//! Adapter for running the decoder over an `embedded-hal` pin.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::line::{Direction, Level, Line};

/// [`Line`] over a single `embedded-hal` pin that implements both
/// directions.
///
/// Suits open-drain style pins: the HAL reconfigures implicitly on the next
/// read or write, so explicit direction switches are no-ops here.
pub struct HalLine<P> {
    pin: P,
}

impl<P> HalLine<P> {
    pub fn new(pin: P) -> Self {
        HalLine { pin }
    }

    /// Returns the wrapped pin.
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P, E> Line for HalLine<P>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
{
    type Error = E;

    fn set_direction(&mut self, _direction: Direction) -> Result<(), E> {
        Ok(())
    }

    fn write_level(&mut self, level: Level) -> Result<(), E> {
        match level {
            Level::Low => self.pin.set_low(),
            Level::High => self.pin.set_high(),
        }
    }

    fn read_level(&mut self) -> Result<Level, E> {
        Ok(if self.pin.is_high()? {
            Level::High
        } else {
            Level::Low
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State as PinState, Transaction as PinTx};

    #[test]
    fn write_level_drives_the_pin() {
        let mut pin = PinMock::new(&[PinTx::set(PinState::Low), PinTx::set(PinState::High)]);

        let mut line = HalLine::new(pin.clone());
        line.write_level(Level::Low).unwrap();
        line.write_level(Level::High).unwrap();

        pin.done();
    }

    #[test]
    fn read_level_reports_the_sensed_state() {
        let mut pin = PinMock::new(&[PinTx::get(PinState::High), PinTx::get(PinState::Low)]);

        let mut line = HalLine::new(pin.clone());
        assert_eq!(line.read_level().unwrap(), Level::High);
        assert_eq!(line.read_level().unwrap(), Level::Low);

        pin.done();
    }

    #[test]
    fn direction_changes_touch_no_pin_state() {
        let mut pin = PinMock::new(&[]);

        let mut line = HalLine::new(pin.clone());
        line.set_direction(Direction::Output).unwrap();
        line.set_direction(Direction::Input).unwrap();

        pin.done();
    }
}
