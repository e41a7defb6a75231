//! The single digital I/O line the decoder runs over.

/// Electrical direction of a line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// The line is sensed; reads reflect the external level.
    Input,
    /// The line is driven; writes set the external level.
    Output,
}

/// Logical level of a line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Returns `true` for [`Level::High`].
    pub fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

/// A single digital I/O line with explicit direction control.
///
/// This is the only hardware capability the decoder asks for: set the
/// direction, drive a level, sample a level. Implementations own acquisition
/// and release of the underlying resource; the decoder borrows the handle
/// exclusively for the duration of one exchange, so no locking is layered on
/// top.
pub trait Line {
    /// Error produced by the underlying line.
    type Error;

    /// Switches the line between driven output and sensed input.
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;

    /// Drives the line to `level`. Meaningful only in [`Direction::Output`].
    fn write_level(&mut self, level: Level) -> Result<(), Self::Error>;

    /// Samples the current level. Meaningful only in [`Direction::Input`].
    fn read_level(&mut self) -> Result<Level, Self::Error>;
}

impl<T: Line + ?Sized> Line for &mut T {
    type Error = T::Error;

    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        T::set_direction(self, direction)
    }

    fn write_level(&mut self, level: Level) -> Result<(), Self::Error> {
        T::write_level(self, level)
    }

    fn read_level(&mut self) -> Result<Level, Self::Error> {
        T::read_level(self)
    }
}
